//! Facial landmark sets

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Number of points produced by the face-mesh model
pub const FACE_MESH_LANDMARKS: usize = 468;

/// A landmark in coordinates normalized to the frame size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth, same scale as `x`
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Upper and lower lid landmark indices of one eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeLandmarks {
    pub top: usize,
    pub bottom: usize,
}

/// Right eye lid centers in the face-mesh topology
pub const RIGHT_EYE: EyeLandmarks = EyeLandmarks { top: 159, bottom: 145 };

/// Left eye lid centers in the face-mesh topology
pub const LEFT_EYE: EyeLandmarks = EyeLandmarks { top: 386, bottom: 374 };

/// Landmarks of one detected face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Look up a landmark, failing if the detector did not produce it
    pub fn get(&self, index: usize) -> Result<&Landmark, DmsError> {
        self.points.get(index).ok_or(DmsError::LandmarkMissing {
            index,
            available: self.points.len(),
        })
    }

    /// Replace a landmark, growing the set with default points if needed
    pub fn set(&mut self, index: usize, landmark: Landmark) {
        if index >= self.points.len() {
            self.points.resize(index + 1, Landmark::default());
        }
        self.points[index] = landmark;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<Landmark> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = Landmark>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_index_is_an_error() {
        let set: LandmarkSet = (0..10).map(|i| Landmark::new(i as f32, 0.0, 0.0)).collect();

        assert_eq!(set.get(3).unwrap().x, 3.0);
        match set.get(RIGHT_EYE.top) {
            Err(DmsError::LandmarkMissing { index, available }) => {
                assert_eq!(index, 159);
                assert_eq!(available, 10);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_set_grows_the_set() {
        let mut set = LandmarkSet::default();
        assert!(set.is_empty());

        set.set(LEFT_EYE.top, Landmark::new(0.5, 0.4, 0.0));
        assert_eq!(set.len(), LEFT_EYE.top + 1);
        assert_eq!(set.get(LEFT_EYE.top).unwrap().y, 0.4);
        assert_eq!(set.get(0).unwrap(), &Landmark::default());
    }
}
