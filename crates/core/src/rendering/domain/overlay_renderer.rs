use crate::detection::domain::landmarks::LandmarkSet;
use crate::geometry::domain::geometry_catalog::{FeatureGroup, GeometryCatalog};
use crate::geometry::domain::mesh_topology::{MeshEdge, MeshTopology};
use crate::shared::constants::DEFAULT_BLEND_ALPHA;
use crate::shared::frame::Frame;

use super::raster;

/// How the mesh overlay is drawn and composited.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    /// Weight of the source frame in the blend; the overlay gets `1 - alpha`.
    pub alpha: f64,
    /// RGB color of the base tessellation.
    pub mesh_color: [u8; 3],
    pub mesh_thickness: u32,
    pub feature_thickness: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_BLEND_ALPHA,
            mesh_color: [255, 255, 255],
            mesh_thickness: 1,
            feature_thickness: 2,
        }
    }
}

/// Draws the landmark mesh and highlighted features over a frame.
#[derive(Clone, Debug, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    /// Returns a new frame with the catalog's mesh and feature groups blended
    /// over `frame`. The input frame is left untouched.
    pub fn render_mesh(
        &self,
        frame: &Frame,
        landmarks: &LandmarkSet,
        catalog: &GeometryCatalog,
    ) -> Frame {
        let overlay = self.draw_overlay(
            frame,
            landmarks,
            catalog.mesh_topology(),
            catalog.feature_groups(),
        );
        let data = raster::blend(frame.data(), overlay.data(), self.style.alpha);
        frame.with_data(data)
    }

    /// Unblended overlay on black, same size and layout as `frame`.
    pub fn draw_overlay(
        &self,
        frame: &Frame,
        landmarks: &LandmarkSet,
        topology: &MeshTopology,
        features: &[FeatureGroup],
    ) -> Frame {
        let layout = frame.layout();
        let mut overlay = Frame::black(frame.width(), frame.height(), layout, frame.index());
        let points = landmarks.project(frame.width(), frame.height());

        let mesh_color = layout.from_rgb(self.style.mesh_color);
        let skipped = draw_edges(
            &mut overlay,
            &points,
            topology.edges(),
            mesh_color,
            self.style.mesh_thickness,
        );

        let mut skipped_features = 0;
        for group in features {
            skipped_features += draw_edges(
                &mut overlay,
                &points,
                &group.edges,
                layout.from_rgb(group.color),
                self.style.feature_thickness,
            );
        }

        if skipped + skipped_features > 0 {
            log::debug!(
                "Skipped {skipped} mesh and {skipped_features} feature edges outside {} landmarks",
                points.len()
            );
        }
        overlay
    }
}

/// Draws every edge whose endpoints both exist; returns how many were skipped.
fn draw_edges(
    canvas: &mut Frame,
    points: &[(i32, i32)],
    edges: &[MeshEdge],
    color: [u8; 3],
    thickness: u32,
) -> usize {
    let mut skipped = 0;
    for edge in edges {
        if !edge.fits(points.len()) {
            skipped += 1;
            continue;
        }
        raster::draw_line(canvas, points[edge.0], points[edge.1], color, thickness);
    }
    skipped
}
