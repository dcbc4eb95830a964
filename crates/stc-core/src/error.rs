//! Engine error taxonomy and status-code mapping.

use std::path::PathBuf;

use crate::lut_file::LutParseError;
use crate::property::{ScOp, ScProperty};

/// `EPERM`: caller identity not authorized.
pub const STATUS_PERMISSION_DENIED: i32 = -1;
/// `ENOENT`: LUT file could not be opened.
pub const STATUS_NOT_FOUND: i32 = -2;
/// `EINVAL`: every validation failure.
pub const STATUS_INVALID: i32 = -22;
/// `ENOTCONN`: external channel unavailable.
pub const STATUS_NOT_CONNECTED: i32 = -107;

/// Errors returned by the engine facade and its setters.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is not initialized")]
    NotReady,

    #[error("no setter or getter registered for property {0:?}")]
    UnknownProperty(ScProperty),

    #[error("no processor registered for operation {0:?}")]
    UnknownOperation(ScOp),

    #[error("unrecognized command {0}")]
    UnknownCommand(u32),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("LUT file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to parse LUT file: {0}")]
    Parse(#[from] LutParseError),

    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("external channel unavailable: {0}")]
    Connection(String),

    #[error("permission denied for caller {0}")]
    PermissionDenied(u32),
}

impl EngineError {
    /// Integer status reported to the external caller.
    pub const fn code(&self) -> i32 {
        match self {
            Self::FileNotFound(_) => STATUS_NOT_FOUND,
            Self::Connection(_) => STATUS_NOT_CONNECTED,
            Self::PermissionDenied(_) => STATUS_PERMISSION_DENIED,
            Self::NotReady
            | Self::UnknownProperty(_)
            | Self::UnknownOperation(_)
            | Self::UnknownCommand(_)
            | Self::InvalidArgument(_)
            | Self::Parse(_)
            | Self::SizeMismatch { .. } => STATUS_INVALID,
        }
    }
}
