pub mod combine;
pub mod geometry;
pub mod select;

pub use combine::{combine, combine_refs, CombinedResult};
pub use geometry::GeometryMode;
pub use select::select_extremes;
