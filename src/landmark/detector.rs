//! ONNX Runtime hand landmark provider.
//!
//! Runs a MediaPipe-compatible hand landmark model (PINTO Model Zoo export)
//! synchronously on each captured frame. The session is created once at
//! startup; when no usable model is found the provider stays disabled and
//! reports no hands instead of failing the process.

use std::path::{Path, PathBuf};

use ndarray::Array4;
use parking_lot::Mutex;

use super::{HandLandmarkProvider, HandObservation, Handedness, Keypoint, KEYPOINT_COUNT};
use crate::capture::CameraFrame;

/// Expected model file inside the model directory.
const LANDMARK_MODEL_FILE: &str = "hand_landmark.onnx";

/// Model input resolution (square, NHWC).
const INPUT_SIZE: u32 = 224;

/// Detection confidence floor, matching the original pipeline.
const MIN_HAND_SCORE: f32 = 0.7;

/// ONNX-backed [`HandLandmarkProvider`].
///
/// The underlying `ort` session needs `&mut` to run, so it sits behind a
/// mutex; sessions share the provider through an `Arc` and detections are
/// serialized across sessions.
pub struct OnnxLandmarkDetector {
    session: Option<Mutex<ort::session::Session>>,
}

impl OnnxLandmarkDetector {
    /// Create the provider, loading the model from `model_dir` or from the
    /// default search path (next to the executable, then the working
    /// directory).
    pub fn new(model_dir: Option<&Path>) -> Self {
        match Self::init_ort(model_dir) {
            Ok(session) => {
                log::info!("ONNX Runtime initialized successfully");
                Self {
                    session: Some(Mutex::new(session)),
                }
            }
            Err(e) => {
                log::warn!(
                    "Failed to initialize ONNX Runtime: {}. Hand detection disabled.",
                    e
                );
                Self { session: None }
            }
        }
    }

    /// Initialize ONNX Runtime and load the landmark model
    fn init_ort(model_dir: Option<&Path>) -> Result<ort::session::Session, String> {
        let model_dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::find_model_dir()?,
        };
        log::info!("Model directory: {:?}", model_dir);

        let model_path = model_dir.join(LANDMARK_MODEL_FILE);
        if !model_path.exists() {
            return Err(format!("Landmark model not found: {:?}", model_path));
        }

        ort::init()
            .with_name("GestureServer")
            .commit()
            .map_err(|e| format!("Failed to initialize ORT: {}", e))?;

        let session = ort::session::Session::builder()
            .map_err(|e| format!("Failed to create session builder: {}", e))?
            .with_intra_threads(2)
            .map_err(|e| format!("Failed to set threads: {}", e))?
            .commit_from_file(&model_path)
            .map_err(|e| format!("Failed to load landmark model: {}", e))?;

        log::info!("Loaded landmark model from {:?}", model_path);

        Ok(session)
    }

    /// Find the models directory
    fn find_model_dir() -> Result<PathBuf, String> {
        // Try relative to the executable first
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(parent) = exe_path.parent() {
                let model_dir = parent.join("models");
                if model_dir.exists() {
                    return Ok(model_dir);
                }
                // Try ../../models (for cargo run from target/release or target/debug)
                if let Some(grandparent) = parent.parent() {
                    let model_dir = grandparent.join("models");
                    if model_dir.exists() {
                        return Ok(model_dir);
                    }
                    if let Some(greatgrandparent) = grandparent.parent() {
                        let model_dir = greatgrandparent.join("models");
                        if model_dir.exists() {
                            return Ok(model_dir);
                        }
                    }
                }
            }
        }

        // Try current directory
        let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
        let model_dir = cwd.join("models");
        if model_dir.exists() {
            return Ok(model_dir);
        }

        Err("Models directory not found. Create a 'models' directory with ONNX models.".to_string())
    }

    /// Preprocess frame to NHWC float RGB [0, 1] at the model resolution
    fn preprocess_frame_nhwc(frame: &CameraFrame, target_width: u32, target_height: u32) -> Vec<f32> {
        let mut output = vec![0.0f32; (target_width * target_height * 3) as usize];

        let x_ratio = frame.width as f32 / target_width as f32;
        let y_ratio = frame.height as f32 / target_height as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                let src_x = (x as f32 * x_ratio) as u32;
                let src_y = (y as f32 * y_ratio) as u32;
                let src_idx = ((src_y * frame.width + src_x) * 4) as usize;

                if src_idx + 2 < frame.data.len() {
                    let out_idx = ((y * target_width + x) * 3) as usize;
                    output[out_idx] = frame.data[src_idx] as f32 / 255.0;
                    output[out_idx + 1] = frame.data[src_idx + 1] as f32 / 255.0;
                    output[out_idx + 2] = frame.data[src_idx + 2] as f32 / 255.0;
                }
            }
        }

        output
    }

    /// Run the landmark model on one preprocessed frame.
    fn run_inference(
        session: &mut ort::session::Session,
        frame: &CameraFrame,
    ) -> Result<Vec<HandObservation>, String> {
        let input = Self::preprocess_frame_nhwc(frame, INPUT_SIZE, INPUT_SIZE);

        let input_array = Array4::from_shape_vec(
            (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
            input,
        )
        .map_err(|e| format!("Failed to create input array: {}", e))?;

        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| format!("Failed to create tensor: {}", e))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| format!("Inference failed: {}", e))?;

        // The landmark head is the 63-value tensor (21 x/y/z triples); the
        // remaining scalar heads are score then handedness, in model order.
        let mut landmarks: Option<Vec<f32>> = None;
        let mut scalars: Vec<f32> = Vec::new();

        for output in outputs.iter() {
            let (_shape, data) = output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| format!("Failed to extract output: {}", e))?;

            if data.len() >= KEYPOINT_COUNT * 3 && landmarks.is_none() {
                landmarks = Some(data.to_vec());
            } else if data.len() == 1 {
                scalars.push(data[0]);
            }
        }

        let landmarks = landmarks.ok_or("No landmark output from model")?;
        let score = scalars.first().copied().unwrap_or(0.0);
        let handedness_score = scalars.get(1).copied().unwrap_or(1.0);

        if score < MIN_HAND_SCORE {
            return Ok(Vec::new());
        }

        Ok(vec![observation_from_raw(&landmarks, handedness_score)])
    }
}

impl HandLandmarkProvider for OnnxLandmarkDetector {
    fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    fn detect(&self, frame: &CameraFrame) -> Vec<HandObservation> {
        let Some(session) = &self.session else {
            return Vec::new();
        };

        match Self::run_inference(&mut session.lock(), frame) {
            Ok(observations) => observations,
            Err(e) => {
                log::warn!("Inference error: {}", e);
                Vec::new()
            }
        }
    }
}

/// Build an observation from the model's raw landmark buffer.
///
/// Landmark coordinates are in model-input pixel space and get normalized
/// to `[0, 1]`; z keeps the same scale. The handedness head reports the
/// probability of a right hand in the (mirrored) selfie view.
fn observation_from_raw(landmarks: &[f32], handedness_score: f32) -> HandObservation {
    let mut keypoints = [Keypoint::default(); KEYPOINT_COUNT];
    let scale = INPUT_SIZE as f32;

    for (i, point) in keypoints.iter_mut().enumerate() {
        point.x = landmarks[i * 3] / scale;
        point.y = landmarks[i * 3 + 1] / scale;
        point.z = landmarks[i * 3 + 2] / scale;
    }

    let handedness = if handedness_score >= 0.5 {
        Handedness::Right
    } else {
        Handedness::Left
    };

    HandObservation::new(keypoints, handedness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_observation_from_raw_normalizes_coordinates() {
        let mut raw = vec![0.0f32; KEYPOINT_COUNT * 3];
        raw[0] = 112.0; // wrist x at image center
        raw[1] = 224.0; // wrist y at bottom edge
        raw[24] = 56.0; // index tip x (landmark 8)

        let obs = observation_from_raw(&raw, 0.9);
        assert!((obs.keypoints[0].x - 0.5).abs() < 1e-6);
        assert!((obs.keypoints[0].y - 1.0).abs() < 1e-6);
        assert!((obs.keypoints[8].x - 0.25).abs() < 1e-6);
        assert_eq!(obs.handedness, Handedness::Right);
    }

    #[test]
    fn test_observation_handedness_threshold() {
        let raw = vec![0.0f32; KEYPOINT_COUNT * 3];
        assert_eq!(observation_from_raw(&raw, 0.2).handedness, Handedness::Left);
        assert_eq!(observation_from_raw(&raw, 0.5).handedness, Handedness::Right);
    }

    #[test]
    fn test_preprocess_output_shape() {
        let frame = CameraFrame {
            data: vec![255u8; 8 * 8 * 4],
            width: 8,
            height: 8,
            frame_number: 0,
            timestamp: Instant::now(),
        };
        let out = OnnxLandmarkDetector::preprocess_frame_nhwc(&frame, 4, 4);
        assert_eq!(out.len(), 4 * 4 * 3);
        assert!(out.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_missing_model_disables_detection() {
        let detector = OnnxLandmarkDetector::new(Some(Path::new("/nonexistent/models")));
        assert!(!detector.is_ready());

        let frame = CameraFrame {
            data: vec![0u8; 4 * 4 * 4],
            width: 4,
            height: 4,
            frame_number: 0,
            timestamp: Instant::now(),
        };
        assert!(detector.detect(&frame).is_empty());
    }
}
