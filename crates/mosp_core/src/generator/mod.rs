pub mod degree;
pub mod grid;

pub use degree::{degree_layer, write_degree_layer};
pub use grid::{GraphInstance, GridParams, ObstacleMap, edge_upper_bound};
