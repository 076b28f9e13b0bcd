pub mod error;
pub mod consts;
pub mod frame;
pub mod kernel;
pub mod align;
pub mod stack;
pub mod pipeline;
