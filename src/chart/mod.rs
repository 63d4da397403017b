//! Frame drawing: geometry, SVG composition, icon loading and rasterization.

pub mod icons;
pub mod layout;
pub mod raster;
pub mod svg;

pub use icons::IconStore;
pub use layout::ChartLayout;
pub use raster::{FrameRenderer, save_png};
