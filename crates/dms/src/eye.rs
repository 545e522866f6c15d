//! Eye-height estimation from lid landmarks

use crate::landmarks::{EyeLandmarks, Landmark, LandmarkSet, LEFT_EYE, RIGHT_EYE};
use crate::DmsError;

/// Convert a normalized landmark to integer pixel coordinates (truncated toward zero)
pub fn to_pixel(landmark: &Landmark, width: u32, height: u32) -> (i64, i64) {
    let x = (landmark.x as f64 * width as f64).trunc() as i64;
    let y = (landmark.y as f64 * height as f64).trunc() as i64;
    (x, y)
}

/// Pixel distance between the upper and lower lid of one eye
pub fn eye_height(
    landmarks: &LandmarkSet,
    eye: EyeLandmarks,
    width: u32,
    height: u32,
) -> Result<f64, DmsError> {
    let (x1, y1) = to_pixel(landmarks.get(eye.top)?, width, height);
    let (x2, y2) = to_pixel(landmarks.get(eye.bottom)?, width, height);
    let (dx, dy) = ((x2 - x1) as f64, (y2 - y1) as f64);
    Ok(dx.hypot(dy))
}

/// Mean lid distance of both eyes for one frame
pub fn average_eye_height(landmarks: &LandmarkSet, width: u32, height: u32) -> Result<f64, DmsError> {
    let right = eye_height(landmarks, RIGHT_EYE, width, height)?;
    let left = eye_height(landmarks, LEFT_EYE, width, height)?;
    Ok((right + left) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn face(right: (Landmark, Landmark), left: (Landmark, Landmark)) -> LandmarkSet {
        let mut set = LandmarkSet::default();
        set.set(RIGHT_EYE.top, right.0);
        set.set(RIGHT_EYE.bottom, right.1);
        set.set(LEFT_EYE.top, left.0);
        set.set(LEFT_EYE.bottom, left.1);
        set
    }

    fn point(x: f32, y: f32) -> Landmark {
        Landmark::new(x, y, 0.0)
    }

    #[test]
    fn test_vertical_lid_distance() {
        let set = face(
            (point(0.5, 0.25), point(0.5, 0.5)),
            (point(0.25, 0.25), point(0.25, 0.3)),
        );

        assert_eq!(eye_height(&set, RIGHT_EYE, 640, 480).unwrap(), 120.0);
        assert_eq!(eye_height(&set, LEFT_EYE, 640, 480).unwrap(), 24.0);
        assert_eq!(average_eye_height(&set, 640, 480).unwrap(), 72.0);
    }

    #[test]
    fn test_pixel_positions_truncate() {
        assert_eq!(to_pixel(&point(0.4999, 0.0199), 100, 100), (49, 1));
        // Diagonal 3-4-5 triangle after truncation
        let set = face(
            (point(0.101, 0.101), point(0.139, 0.149)),
            (point(0.0, 0.0), point(0.03, 0.04)),
        );
        assert!((eye_height(&set, RIGHT_EYE, 100, 100).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_lid_landmark_fails() {
        let mut set = LandmarkSet::default();
        set.set(RIGHT_EYE.top, point(0.5, 0.5));
        set.set(RIGHT_EYE.bottom, point(0.5, 0.6));

        assert!(eye_height(&set, RIGHT_EYE, 640, 480).is_ok());
        assert!(matches!(
            average_eye_height(&set, 640, 480),
            Err(DmsError::LandmarkMissing { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_distance_is_pixel_norm(
            x1 in 0.0f32..1.0, y1 in 0.0f32..1.0,
            x2 in 0.0f32..1.0, y2 in 0.0f32..1.0,
            width in 1u32..4000, height in 1u32..4000,
        ) {
            let set = face((point(x1, y1), point(x2, y2)), (point(x1, y1), point(x2, y2)));
            let (px1, py1) = to_pixel(&point(x1, y1), width, height);
            let (px2, py2) = to_pixel(&point(x2, y2), width, height);
            let expected = (((px2 - px1).pow(2) + (py2 - py1).pow(2)) as f64).sqrt();

            let h = eye_height(&set, RIGHT_EYE, width, height).unwrap();
            prop_assert!(h >= 0.0);
            prop_assert!((h - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_distance_scales_with_frame_size(
            px1 in 0u32..200, py1 in 0u32..200,
            px2 in 0u32..200, py2 in 0u32..200,
            k in 1u32..8,
        ) {
            // Offset points off the pixel grid so truncation is stable under scaling
            let (width, height) = (200u32, 200u32);
            let norm = |p: u32, size: u32| (p as f32 + 0.3) / size as f32;
            let top = point(norm(px1, width), norm(py1, height));
            let bottom = point(norm(px2, width), norm(py2, height));
            let set = face((top, bottom), (top, bottom));

            let base = eye_height(&set, RIGHT_EYE, width, height).unwrap();
            let scaled = eye_height(&set, RIGHT_EYE, width * k, height * k).unwrap();
            prop_assert!((scaled - base * k as f64).abs() < 1e-6);
        }

        #[test]
        fn prop_average_lies_between_eyes(a in 0.0f32..0.5, b in 0.0f32..0.5) {
            let set = face(
                (point(0.3, 0.2), point(0.3, 0.2 + a)),
                (point(0.6, 0.2), point(0.6, 0.2 + b)),
            );
            let right = eye_height(&set, RIGHT_EYE, 640, 480).unwrap();
            let left = eye_height(&set, LEFT_EYE, 640, 480).unwrap();
            let avg = average_eye_height(&set, 640, 480).unwrap();
            prop_assert!(avg >= right.min(left) && avg <= right.max(left));
        }
    }
}
