//! Face landmark detection

use camera_capture::frame::VideoFrame;
use image::imageops::{self, FilterType};
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::config::TensorLayout;
use crate::landmarks::{Landmark, LandmarkSet, FACE_MESH_LANDMARKS};
use crate::{DmsConfig, DmsError};

/// Source of facial landmarks.
///
/// Returns one `LandmarkSet` per detected face, coordinates normalized to the
/// frame size. An empty result means no face was found.
pub trait LandmarkDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DmsError>;
}

impl<D: LandmarkDetector + ?Sized> LandmarkDetector for Box<D> {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DmsError> {
        (**self).detect(frame)
    }
}

impl<D: LandmarkDetector + ?Sized> LandmarkDetector for &mut D {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DmsError> {
        (**self).detect(frame)
    }
}

type FaceMeshModel = TypedRunnableModel<TypedModel>;

/// 468-point face mesh running an ONNX export through tract.
///
/// The whole frame is resized to the model input, so the face should fill most of
/// the frame. Expected outputs: landmarks as `[.., 1404]` in input-pixel units,
/// and optionally a face-presence logit.
pub struct FaceMeshDetector {
    model: FaceMeshModel,
    input_size: u32,
    layout: TensorLayout,
    presence_threshold: f32,
}

impl FaceMeshDetector {
    /// Load the model named in the configuration
    pub fn new(config: &DmsConfig) -> Result<Self, DmsError> {
        let path = config
            .model_path
            .as_deref()
            .ok_or_else(|| DmsError::Config("no face-mesh model path configured".into()))?;
        Self::load(path, config)
    }

    /// Load a model from an explicit path
    pub fn load(path: &Path, config: &DmsConfig) -> Result<Self, DmsError> {
        info!("Loading face-mesh model from {}", path.display());

        let size = config.model_input_size as usize;
        let shape = match config.model_layout {
            TensorLayout::Nhwc => [1, size, size, 3],
            TensorLayout::Nchw => [1, 3, size, size],
        };

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact(shape).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| DmsError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            model,
            input_size: config.model_input_size,
            layout: config.model_layout,
            presence_threshold: config.face_presence_threshold,
        })
    }

    fn preprocess(&self, frame: &VideoFrame) -> Result<Tensor, DmsError> {
        let img = frame
            .to_image()
            .ok_or_else(|| DmsError::ImageProcessing("Failed to create image buffer".into()))?;

        let size = self.input_size;
        let resized = imageops::resize(&img, size, size, FilterType::Triangle);
        let s = size as usize;

        // Face mesh expects RGB scaled to 0..1
        let value = |x: usize, y: usize, c: usize| resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
        let tensor: Tensor = match self.layout {
            TensorLayout::Nhwc => {
                tract_ndarray::Array4::from_shape_fn((1, s, s, 3), |(_, y, x, c)| value(x, y, c)).into()
            }
            TensorLayout::Nchw => {
                tract_ndarray::Array4::from_shape_fn((1, 3, s, s), |(_, c, y, x)| value(x, y, c)).into()
            }
        };
        Ok(tensor)
    }
}

impl LandmarkDetector for FaceMeshDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DmsError> {
        let input = self.preprocess(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| DmsError::Inference(e.to_string()))?;

        let coords = outputs
            .first()
            .ok_or_else(|| DmsError::Inference("model produced no outputs".into()))?
            .to_array_view::<f32>()
            .map_err(|e| DmsError::Inference(e.to_string()))?
            .iter()
            .copied()
            .collect::<Vec<f32>>();

        let presence = match outputs.get(1) {
            Some(score) => score
                .to_array_view::<f32>()
                .map_err(|e| DmsError::Inference(e.to_string()))?
                .iter()
                .next()
                .copied()
                .map(sigmoid),
            None => None,
        };

        decode_face_mesh(&coords, presence, self.input_size, self.presence_threshold)
    }
}

fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Turn raw face-mesh output into normalized landmark sets
fn decode_face_mesh(
    coords: &[f32],
    presence: Option<f32>,
    input_size: u32,
    presence_threshold: f32,
) -> Result<Vec<LandmarkSet>, DmsError> {
    if let Some(score) = presence {
        if score < presence_threshold {
            debug!("Face presence {:.3} below threshold", score);
            return Ok(Vec::new());
        }
    }

    if coords.len() < FACE_MESH_LANDMARKS * 3 {
        return Err(DmsError::Inference(format!(
            "expected {} landmark values, model produced {}",
            FACE_MESH_LANDMARKS * 3,
            coords.len()
        )));
    }

    let scale = input_size as f32;
    let face = coords
        .chunks_exact(3)
        .take(FACE_MESH_LANDMARKS)
        .map(|p| Landmark::new(p[0] / scale, p[1] / scale, p[2] / scale))
        .collect();

    Ok(vec![face])
}
