// Domain layer - Typed snapshot model
pub mod analysis;
pub mod number;
pub mod raster;
pub mod snapshot;
pub mod widget;
