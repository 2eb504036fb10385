pub mod overlay_renderer;
pub mod raster;
