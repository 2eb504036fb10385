pub mod geometry_catalog;
pub mod mesh_topology;
pub mod triangulation;
