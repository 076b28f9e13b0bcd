pub mod correlate;
pub mod refiner;
pub mod subpixel;

pub use correlate::CorrelationSample;
pub use refiner::refine_offset;
