use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoaddError {
    #[error("missing required input: {0}")]
    NullInput(&'static str),

    #[error("illegal input: {0}")]
    IllegalInput(String),

    #[error("incompatible input: {0}")]
    IncompatibleInput(String),

    #[error("no usable data: {0}")]
    DataNotFound(String),

    #[error("illegal output geometry: computed canvas is {width}x{height}")]
    IllegalOutput { width: i64, height: i64 },
}

pub type Result<T> = std::result::Result<T, CoaddError>;
