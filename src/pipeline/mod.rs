pub mod config;
pub mod register;

pub use config::RegistrationConfig;
pub use register::{refine_frame_offset, register_and_combine};
