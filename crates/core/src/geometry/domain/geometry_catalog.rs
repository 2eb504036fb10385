//! Static geometry over the face-mesh landmark numbering.
//!
//! The numbering belongs to the landmark model; if the model changes its
//! index layout, these tables must change with it.

use super::mesh_topology::{MeshEdge, MeshTopology};

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];

/// Ordered face outline, forehead center first, running clockwise on screen.
pub const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

pub const LEFT_EYE: [MeshEdge; 9] = [
    MeshEdge(33, 7),
    MeshEdge(7, 163),
    MeshEdge(163, 144),
    MeshEdge(144, 145),
    MeshEdge(145, 153),
    MeshEdge(153, 154),
    MeshEdge(154, 155),
    MeshEdge(155, 133),
    MeshEdge(33, 133),
];

pub const RIGHT_EYE: [MeshEdge; 9] = [
    MeshEdge(362, 382),
    MeshEdge(382, 381),
    MeshEdge(381, 380),
    MeshEdge(380, 374),
    MeshEdge(374, 373),
    MeshEdge(373, 390),
    MeshEdge(390, 249),
    MeshEdge(249, 263),
    MeshEdge(263, 362),
];

pub const LEFT_EYEBROW: [MeshEdge; 9] = [
    MeshEdge(70, 63),
    MeshEdge(63, 105),
    MeshEdge(105, 66),
    MeshEdge(66, 107),
    MeshEdge(107, 55),
    MeshEdge(55, 65),
    MeshEdge(65, 52),
    MeshEdge(52, 53),
    MeshEdge(53, 46),
];

pub const RIGHT_EYEBROW: [MeshEdge; 9] = [
    MeshEdge(336, 296),
    MeshEdge(296, 334),
    MeshEdge(334, 293),
    MeshEdge(293, 300),
    MeshEdge(300, 276),
    MeshEdge(276, 283),
    MeshEdge(283, 282),
    MeshEdge(282, 295),
    MeshEdge(295, 285),
];

const LIPS: [MeshEdge; 40] = [
    MeshEdge(61, 146),
    MeshEdge(146, 91),
    MeshEdge(91, 181),
    MeshEdge(181, 84),
    MeshEdge(84, 17),
    MeshEdge(17, 314),
    MeshEdge(314, 405),
    MeshEdge(405, 321),
    MeshEdge(321, 375),
    MeshEdge(375, 291),
    MeshEdge(61, 185),
    MeshEdge(185, 40),
    MeshEdge(40, 39),
    MeshEdge(39, 37),
    MeshEdge(37, 0),
    MeshEdge(0, 267),
    MeshEdge(267, 269),
    MeshEdge(269, 270),
    MeshEdge(270, 409),
    MeshEdge(409, 291),
    MeshEdge(78, 95),
    MeshEdge(95, 88),
    MeshEdge(88, 178),
    MeshEdge(178, 87),
    MeshEdge(87, 14),
    MeshEdge(14, 317),
    MeshEdge(317, 402),
    MeshEdge(402, 318),
    MeshEdge(318, 324),
    MeshEdge(324, 308),
    MeshEdge(78, 191),
    MeshEdge(191, 80),
    MeshEdge(80, 81),
    MeshEdge(81, 82),
    MeshEdge(82, 13),
    MeshEdge(13, 312),
    MeshEdge(312, 311),
    MeshEdge(311, 310),
    MeshEdge(310, 415),
    MeshEdge(415, 308),
];

/// Full eye outlines (upper and lower lid) for the contour mesh.
const EYE_OUTLINES: [MeshEdge; 32] = [
    MeshEdge(263, 249),
    MeshEdge(249, 390),
    MeshEdge(390, 373),
    MeshEdge(373, 374),
    MeshEdge(374, 380),
    MeshEdge(380, 381),
    MeshEdge(381, 382),
    MeshEdge(382, 362),
    MeshEdge(263, 466),
    MeshEdge(466, 388),
    MeshEdge(388, 387),
    MeshEdge(387, 386),
    MeshEdge(386, 385),
    MeshEdge(385, 384),
    MeshEdge(384, 398),
    MeshEdge(398, 362),
    MeshEdge(33, 7),
    MeshEdge(7, 163),
    MeshEdge(163, 144),
    MeshEdge(144, 145),
    MeshEdge(145, 153),
    MeshEdge(153, 154),
    MeshEdge(154, 155),
    MeshEdge(155, 133),
    MeshEdge(33, 246),
    MeshEdge(246, 161),
    MeshEdge(161, 160),
    MeshEdge(160, 159),
    MeshEdge(159, 158),
    MeshEdge(158, 157),
    MeshEdge(157, 173),
    MeshEdge(173, 133),
];

/// Named edge list highlighted on top of the tessellation.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureGroup {
    pub name: &'static str,
    pub edges: Vec<MeshEdge>,
    /// RGB draw color.
    pub color: [u8; 3],
}

/// Read-only lookup of everything the renderer and the extractor need.
#[derive(Clone, Debug)]
pub struct GeometryCatalog {
    topology: MeshTopology,
    features: Vec<FeatureGroup>,
    contour: Vec<usize>,
}

impl GeometryCatalog {
    pub fn new(topology: MeshTopology, features: Vec<FeatureGroup>, contour: Vec<usize>) -> Self {
        Self {
            topology,
            features,
            contour,
        }
    }

    /// Face-mesh catalog: contour mesh (oval, lips, eyes, brows), eye and
    /// eyebrow highlights, and the face oval as segmentation contour.
    ///
    /// The contour mesh is the base for the `contours` style. Triangulated
    /// sessions replace it through [`with_topology`](Self::with_topology)
    /// once the first face is seen.
    pub fn face_mesh() -> Self {
        let oval_edges = FACE_OVAL
            .iter()
            .zip(FACE_OVAL.iter().cycle().skip(1))
            .map(|(&a, &b)| MeshEdge(a, b));
        let topology = MeshTopology::from_edges(
            oval_edges
                .chain(LIPS)
                .chain(EYE_OUTLINES)
                .chain(LEFT_EYEBROW)
                .chain(RIGHT_EYEBROW),
        );

        let features = vec![
            FeatureGroup {
                name: "left_eye",
                edges: LEFT_EYE.to_vec(),
                color: RED,
            },
            FeatureGroup {
                name: "right_eye",
                edges: RIGHT_EYE.to_vec(),
                color: GREEN,
            },
            FeatureGroup {
                name: "left_eyebrow",
                edges: LEFT_EYEBROW.to_vec(),
                color: RED,
            },
            FeatureGroup {
                name: "right_eyebrow",
                edges: RIGHT_EYEBROW.to_vec(),
                color: GREEN,
            },
        ];

        Self::new(topology, features, FACE_OVAL.to_vec())
    }

    /// Same features and contour over a different base mesh.
    pub fn with_topology(mut self, topology: MeshTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn mesh_topology(&self) -> &MeshTopology {
        &self.topology
    }

    pub fn feature_groups(&self) -> &[FeatureGroup] {
        &self.features
    }

    pub fn feature_group(&self, name: &str) -> Option<&FeatureGroup> {
        self.features.iter().find(|g| g.name == name)
    }

    pub fn contour_indices(&self) -> &[usize] {
        &self.contour
    }
}

impl Default for GeometryCatalog {
    fn default() -> Self {
        Self::face_mesh()
    }
}
