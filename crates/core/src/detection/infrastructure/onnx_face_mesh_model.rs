//! Two-stage face-mesh model on ONNX Runtime via `ort`.
//!
//! Stage 1 (BlazeFace, short range) finds the most confident face box on the
//! whole frame. Stage 2 (face-landmark network) regresses the mesh inside a
//! square crop around that box. Points are mapped back to frame-normalized
//! coordinates. Only one face is ever returned.
use std::path::Path;
use std::str::FromStr;

use ndarray::Array4;
use serde::{Deserialize, Serialize};

use super::execution_provider::preferred_execution_providers;
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::detection::domain::landmarks::{LandmarkPoint, LandmarkSet};
use crate::shared::constants::{FACE_MESH_LANDMARKS, FACE_MESH_LANDMARKS_WITH_IRIS};
use crate::shared::frame::Frame;

/// BlazeFace input resolution.
const DETECTOR_INPUT: usize = 128;

/// Face-landmark input resolution.
const MESH_INPUT: usize = 192;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the BlazeFace regressor output (box + 6 keypoints).
const REGRESSOR_STRIDE: usize = 16;

/// Crop side relative to the larger side of the detected box.
const ROI_SCALE: f32 = 1.5;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Memory order of the face-landmark input tensor. Converted models differ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    #[default]
    Nchw,
    Nhwc,
}

impl FromStr for TensorLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nchw" => Ok(TensorLayout::Nchw),
            "nhwc" => Ok(TensorLayout::Nhwc),
            other => Err(format!("unknown tensor layout '{other}' (expected nchw or nhwc)")),
        }
    }
}

pub struct OnnxFaceMeshModel {
    detector: ort::session::Session,
    mesh: ort::session::Session,
    anchors: Vec<[f32; 2]>,
    confidence: f32,
    mesh_layout: TensorLayout,
}

impl OnnxFaceMeshModel {
    pub fn new(
        detector_path: &Path,
        mesh_path: &Path,
        confidence: f32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(detector_path)?;
        let mesh = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(mesh_path)?;
        log::info!(
            "Loaded face models: {} + {}",
            detector_path.display(),
            mesh_path.display()
        );
        Ok(Self {
            detector,
            mesh,
            anchors: generate_anchors(),
            confidence,
            mesh_layout: TensorLayout::Nchw,
        })
    }

    pub fn with_mesh_layout(mut self, layout: TensorLayout) -> Self {
        self.mesh_layout = layout;
        self
    }

    fn locate_face(&mut self, frame: &Frame) -> Result<Option<FaceBox>, Box<dyn std::error::Error>> {
        let whole = Roi {
            x: 0.0,
            y: 0.0,
            w: frame.width() as f32,
            h: frame.height() as f32,
        };
        let input = sample_roi(frame, whole, DETECTOR_INPUT, TensorLayout::Nchw);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.detector.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into());
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        Ok(best_face_box(
            score_data,
            reg_data,
            &self.anchors,
            self.confidence,
        ))
    }

    fn regress_mesh(
        &mut self,
        frame: &Frame,
        roi: Roi,
    ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
        let input = sample_roi(frame, roi, MESH_INPUT, self.mesh_layout);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.mesh.run(ort::inputs![input_value])?;

        let coords = outputs[0].try_extract_array::<f32>()?;
        let coords = coords.as_slice().ok_or("Cannot get landmark slice")?;

        // Optional second output: face presence logit.
        if outputs.len() > 1 {
            let flag = outputs[1].try_extract_array::<f32>()?;
            if let Some(&logit) = flag.iter().next() {
                if sigmoid(logit) < self.confidence {
                    return Ok(None);
                }
            }
        }

        Ok(map_mesh_points(coords, roi, frame.width(), frame.height()))
    }
}

impl LandmarkModel for OnnxFaceMeshModel {
    fn predict(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }
        let Some(face) = self.locate_face(frame)? else {
            return Ok(Vec::new());
        };
        let roi = face.square_roi(frame.width(), frame.height());
        Ok(self.regress_mesh(frame, roi)?.into_iter().collect())
    }
}

/// Pixel-space crop rectangle. May extend past the frame edges.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Roi {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

/// Face box in frame-normalized coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FaceBox {
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    score: f32,
}

impl FaceBox {
    fn square_roi(&self, frame_w: u32, frame_h: u32) -> Roi {
        let side = (self.w * frame_w as f32).max(self.h * frame_h as f32) * ROI_SCALE;
        Roi {
            x: self.cx * frame_w as f32 - side / 2.0,
            y: self.cy * frame_h as f32 - side / 2.0,
            w: side,
            h: side,
        }
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Nearest-neighbour resample of `roi` to `size x size`, normalized to [0,1].
/// Pixels outside the frame read as black.
fn sample_roi(frame: &Frame, roi: Roi, size: usize, layout: TensorLayout) -> Array4<f32> {
    let src = frame.as_ndarray();
    let fw = frame.width() as i64;
    let fh = frame.height() as i64;

    let mut tensor = match layout {
        TensorLayout::Nchw => Array4::<f32>::zeros((1, 3, size, size)),
        TensorLayout::Nhwc => Array4::<f32>::zeros((1, size, size, 3)),
    };

    for y in 0..size {
        let src_y = (roi.y + (y as f32 + 0.5) * roi.h / size as f32).floor() as i64;
        if src_y < 0 || src_y >= fh {
            continue;
        }
        for x in 0..size {
            let src_x = (roi.x + (x as f32 + 0.5) * roi.w / size as f32).floor() as i64;
            if src_x < 0 || src_x >= fw {
                continue;
            }
            for c in 0..3 {
                let v = src[[src_y as usize, src_x as usize, c]] as f32 / 255.0;
                match layout {
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = v,
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = v,
                }
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Generate BlazeFace anchors for the short-range model: a 16x16 grid with
/// 2 anchors per cell followed by an 8x8 grid with 6 anchors per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let layers = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, per_cell) in &layers {
        let grid = DETECTOR_INPUT / stride;
        for y in 0..grid {
            for x in 0..grid {
                let center = [
                    (x as f32 + 0.5) / grid as f32,
                    (y as f32 + 0.5) / grid as f32,
                ];
                anchors.extend(std::iter::repeat(center).take(per_cell));
            }
        }
    }

    anchors
}

/// The single most confident anchor above `confidence`, decoded to a box.
fn best_face_box(
    scores: &[f32],
    regressors: &[f32],
    anchors: &[[f32; 2]],
    confidence: f32,
) -> Option<FaceBox> {
    let (best, raw) = scores
        .iter()
        .take(anchors.len())
        .enumerate()
        .filter(|(i, _)| (i + 1) * REGRESSOR_STRIDE <= regressors.len())
        .max_by(|a, b| a.1.total_cmp(b.1))?;

    let score = sigmoid(*raw);
    if score < confidence {
        return None;
    }

    let reg = &regressors[best * REGRESSOR_STRIDE..];
    let anchor = anchors[best];
    let scale = DETECTOR_INPUT as f32;
    Some(FaceBox {
        cx: anchor[0] + reg[0] / scale,
        cy: anchor[1] + reg[1] / scale,
        w: reg[2] / scale,
        h: reg[3] / scale,
        score,
    })
}

/// Converts `[x, y, z]` triples in crop-input pixels to frame-normalized points.
///
/// Returns `None` unless the output holds exactly 468 or 478 points.
fn map_mesh_points(coords: &[f32], roi: Roi, frame_w: u32, frame_h: u32) -> Option<LandmarkSet> {
    let count = coords.len() / 3;
    if coords.len() % 3 != 0
        || (count != FACE_MESH_LANDMARKS && count != FACE_MESH_LANDMARKS_WITH_IRIS)
    {
        log::warn!(
            "Face-landmark model returned {} values, expected {} or {} points; dropping face",
            coords.len(),
            FACE_MESH_LANDMARKS,
            FACE_MESH_LANDMARKS_WITH_IRIS
        );
        return None;
    }
    let to_roi = roi.w / MESH_INPUT as f32;
    let points = coords
        .chunks_exact(3)
        .map(|p| {
            LandmarkPoint::new(
                (roi.x + p[0] * to_roi) / frame_w as f32,
                (roi.y + p[1] * roi.h / MESH_INPUT as f32) / frame_h as f32,
                p[2] * to_roi / frame_w as f32,
            )
        })
        .collect();
    Some(LandmarkSet::new(points))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelLayout;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_sample_roi_shapes() {
        let frame = Frame::black(200, 100, PixelLayout::Rgb, 0);
        let whole = Roi {
            x: 0.0,
            y: 0.0,
            w: 200.0,
            h: 100.0,
        };
        assert_eq!(
            sample_roi(&frame, whole, 128, TensorLayout::Nchw).shape(),
            &[1, 3, 128, 128]
        );
        assert_eq!(
            sample_roi(&frame, whole, 192, TensorLayout::Nhwc).shape(),
            &[1, 192, 192, 3]
        );
    }

    #[test]
    fn test_sample_roi_normalizes_and_pads() {
        let frame = Frame::new(vec![255u8; 10 * 10 * 3], 10, 10, PixelLayout::Rgb, 0);
        // Left half of the crop lies outside the frame.
        let roi = Roi {
            x: -10.0,
            y: 0.0,
            w: 20.0,
            h: 10.0,
        };
        let tensor = sample_roi(&frame, roi, 4, TensorLayout::Nchw);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert_relative_eq!(tensor[[0, 0, 0, 3]], 1.0);
    }

    #[test]
    fn test_generate_anchors_count_and_range() {
        let anchors = generate_anchors();
        assert_eq!(anchors.len(), NUM_ANCHORS);
        for a in &anchors {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_best_face_box_picks_highest_score() {
        let anchors = vec![[0.25, 0.25], [0.75, 0.5]];
        let scores = vec![1.0, 3.0];
        let mut regressors = vec![0.0; 2 * REGRESSOR_STRIDE];
        regressors[REGRESSOR_STRIDE] = 12.8; // +0.1 in x
        regressors[REGRESSOR_STRIDE + 2] = 64.0; // w = 0.5
        regressors[REGRESSOR_STRIDE + 3] = 32.0; // h = 0.25

        let face = best_face_box(&scores, &regressors, &anchors, 0.5).unwrap();
        assert_relative_eq!(face.cx, 0.85, epsilon = 1e-5);
        assert_relative_eq!(face.cy, 0.5, epsilon = 1e-5);
        assert_relative_eq!(face.w, 0.5, epsilon = 1e-5);
        assert_relative_eq!(face.h, 0.25, epsilon = 1e-5);
        assert_relative_eq!(face.score, sigmoid(3.0));
    }

    #[test]
    fn test_best_face_box_below_confidence_is_none() {
        let anchors = vec![[0.5, 0.5]];
        let regressors = vec![0.0; REGRESSOR_STRIDE];
        assert!(best_face_box(&[-4.0], &regressors, &anchors, 0.5).is_none());
    }

    #[test]
    fn test_best_face_box_empty_scores_is_none() {
        assert!(best_face_box(&[], &[], &[], 0.5).is_none());
    }

    #[test]
    fn test_square_roi_scales_larger_side() {
        let face = FaceBox {
            cx: 0.5,
            cy: 0.5,
            w: 0.25,
            h: 0.5,
            score: 1.0,
        };
        let roi = face.square_roi(400, 200);
        // larger side: max(100, 100) * 1.5
        assert_relative_eq!(roi.w, 150.0);
        assert_relative_eq!(roi.h, 150.0);
        assert_relative_eq!(roi.x, 125.0);
        assert_relative_eq!(roi.y, 25.0);
    }

    fn mesh_coords(count: usize) -> Vec<f32> {
        let mut coords = vec![0.0; count * 3];
        coords[3..6].copy_from_slice(&[96.0, 192.0, 19.2]);
        coords
    }

    #[test]
    fn test_map_mesh_points_to_frame() {
        let roi = Roi {
            x: 100.0,
            y: 50.0,
            w: 192.0,
            h: 192.0,
        };
        let set = map_mesh_points(&mesh_coords(FACE_MESH_LANDMARKS), roi, 400, 400).unwrap();
        assert_eq!(set.len(), FACE_MESH_LANDMARKS);
        let a = set.get(0).unwrap();
        assert_relative_eq!(a.x, 0.25);
        assert_relative_eq!(a.y, 0.125);
        let b = set.get(1).unwrap();
        assert_relative_eq!(b.x, 0.49);
        assert_relative_eq!(b.y, 0.605);
        assert_relative_eq!(b.z, 0.048, epsilon = 1e-6);
    }

    #[rstest]
    #[case::plain(FACE_MESH_LANDMARKS, true)]
    #[case::with_iris(FACE_MESH_LANDMARKS_WITH_IRIS, true)]
    #[case::truncated(FACE_MESH_LANDMARKS - 1, false)]
    #[case::two_points(2, false)]
    #[case::empty(0, false)]
    fn test_map_mesh_points_requires_full_mesh(#[case] count: usize, #[case] accepted: bool) {
        let roi = Roi {
            x: 0.0,
            y: 0.0,
            w: 192.0,
            h: 192.0,
        };
        let set = map_mesh_points(&vec![0.5; count * 3], roi, 192, 192);
        assert_eq!(set.is_some(), accepted);
        if let Some(set) = set {
            assert_eq!(set.len(), count);
        }
    }

    #[test]
    fn test_map_mesh_points_rejects_ragged_output() {
        let roi = Roi {
            x: 0.0,
            y: 0.0,
            w: 192.0,
            h: 192.0,
        };
        let mut coords = mesh_coords(FACE_MESH_LANDMARKS);
        coords.push(1.0);
        assert!(map_mesh_points(&coords, roi, 192, 192).is_none());
    }

    #[rstest]
    #[case::nchw("nchw", TensorLayout::Nchw)]
    #[case::nhwc("NHWC", TensorLayout::Nhwc)]
    fn test_tensor_layout_parse(#[case] text: &str, #[case] expected: TensorLayout) {
        assert_eq!(text.parse::<TensorLayout>().unwrap(), expected);
    }

    #[test]
    fn test_tensor_layout_rejects_unknown() {
        assert!("chw".parse::<TensorLayout>().is_err());
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(-10.0) < 0.001);
    }
}
