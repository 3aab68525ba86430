mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use geometry::{point_in_polygon, point_in_ring};
pub use projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
pub use renderer::{DisplaySettings, MapLayers, MapRenderer};
pub use spatial::{BoundaryIndex, Region};
