//! Data Model
//!
//! Listings, the artifacts the pipeline attaches to them, and the taste model
//! they are judged against.

pub mod listing;
pub mod scores;
pub mod taste;

pub use listing::{Listing, ListingFeatures, Verdict};
pub use scores::{
    CostClass, DimensionScore, Level, PotentialScore, PresentFitScore, RenovationIdea,
    RoomAnalysis, VisionAnalysis, NEUTRAL_QUALITY, NEUTRAL_SCORE,
};
pub use taste::{Exemplar, RenovationTolerance, TasteModel, WeightedDimension};
