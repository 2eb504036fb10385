//! Normalized facial landmarks as delivered by the detector.
//!
//! Coordinates are relative to the frame the detector saw: `x` and `y` lie in
//! [0, 1] for points inside the image (slightly outside is possible near the
//! border), `z` is depth relative to the frame width.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Pixel position in a `width` x `height` image, rounded to nearest.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.x as f64 * width as f64).round() as i32,
            (self.y as f64 * height as f64).round() as i32,
        )
    }
}

/// Landmarks for exactly one face, indexed in the detector's numbering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    /// Every landmark projected to pixel space, in index order.
    pub fn project(&self, width: u32, height: u32) -> Vec<(i32, i32)> {
        self.points
            .iter()
            .map(|p| p.to_pixel(width, height))
            .collect()
    }
}

/// One detector answer for one submitted frame.
///
/// Only the first reported face is kept; extra faces are dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    face: Option<LandmarkSet>,
    timestamp_ms: u64,
}

impl DetectionResult {
    pub fn from_faces(faces: Vec<LandmarkSet>, timestamp_ms: u64) -> Self {
        if faces.len() > 1 {
            log::debug!(
                "Detector reported {} faces at {timestamp_ms} ms, keeping the first",
                faces.len()
            );
        }
        Self {
            face: faces.into_iter().next().filter(|f| !f.is_empty()),
            timestamp_ms,
        }
    }

    pub fn no_face(timestamp_ms: u64) -> Self {
        Self {
            face: None,
            timestamp_ms,
        }
    }

    pub fn face(&self) -> Option<&LandmarkSet> {
        self.face.as_ref()
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(x: f32) -> LandmarkSet {
        LandmarkSet::new(vec![LandmarkPoint::new(x, 0.5, 0.0)])
    }

    #[rstest]
    #[case::origin(0.0, 0.0, 640, 480, (0, 0))]
    #[case::far_corner(1.0, 1.0, 640, 480, (640, 480))]
    #[case::half_rounds_up(0.625, 0.375, 4, 4, (3, 2))]
    #[case::rounds_down(0.1001, 0.1001, 640, 480, (64, 48))]
    fn test_to_pixel_rounds(
        #[case] x: f32,
        #[case] y: f32,
        #[case] width: u32,
        #[case] height: u32,
        #[case] expected: (i32, i32),
    ) {
        assert_eq!(LandmarkPoint::new(x, y, 0.0).to_pixel(width, height), expected);
    }

    #[test]
    fn test_to_pixel_outside_frame_is_not_clamped() {
        assert_eq!(LandmarkPoint::new(-0.1, 1.1, 0.0).to_pixel(100, 100), (-10, 110));
    }

    #[test]
    fn test_project_keeps_order() {
        let lm = LandmarkSet::new(vec![
            LandmarkPoint::new(0.25, 0.5, 0.0),
            LandmarkPoint::new(0.75, 0.0, 0.0),
        ]);
        assert_eq!(lm.project(8, 4), vec![(2, 2), (6, 0)]);
    }

    #[test]
    fn test_from_faces_keeps_first_face_only() {
        let result = DetectionResult::from_faces(vec![set(0.1), set(0.9)], 42);
        assert_eq!(result.face(), Some(&set(0.1)));
        assert_eq!(result.timestamp_ms(), 42);
    }

    #[test]
    fn test_from_faces_empty_is_no_face() {
        let result = DetectionResult::from_faces(Vec::new(), 7);
        assert!(result.face().is_none());
        assert_eq!(result, DetectionResult::no_face(7));
    }

    #[test]
    fn test_from_faces_empty_set_is_no_face() {
        let result = DetectionResult::from_faces(vec![LandmarkSet::default()], 1);
        assert!(result.face().is_none());
    }

    #[test]
    fn test_from_faces_empty_first_face_does_not_promote_second() {
        let result = DetectionResult::from_faces(vec![LandmarkSet::default(), set(0.9)], 3);
        assert!(result.face().is_none());
    }
}
