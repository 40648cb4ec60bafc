//! Services
//!
//! Photo acquisition and composite rendering feeding the vision stage.

pub mod composite;
pub mod images;

pub use composite::{compose_grid, grid_dimensions, CompositeOptions, ImageCompositor};
pub use images::{HttpImageFetcher, ImageFetcher, DEFAULT_FETCH_TIMEOUT};
