use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("surface is {width}x{height}; both dimensions must be nonzero")]
    InvalidSurface { width: u32, height: u32 },
    #[error("body {name:?} is invalid: {reason}")]
    InvalidDescriptor { name: String, reason: String },
    #[error("body {0:?} appears more than once")]
    DuplicateBody(String),
    #[error("invalid scene config: {0}")]
    InvalidConfig(String),
}
