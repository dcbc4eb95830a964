//! Seams to the collaborators outside the engine.
//!
//! The engine never reaches for process-wide singletons: the composition
//! root hands it a [`CommandChannel`] to register with and a
//! [`RefreshTrigger`] to poke after every accepted setter.

use std::path::PathBuf;
use std::sync::Weak;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityEntry;
use crate::error::EngineError;
use crate::feature::FeatureId;

/// Errors from the command channel registration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("command channel unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the refresh trigger.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh channel closed")]
    Closed,

    #[error("refresh dispatch failed: {0}")]
    Dispatch(String),
}

/// Decoded command-channel request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Report supported LUT configurations for a feature.
    GetCapability(FeatureId),
    /// Enable (with a flat `[red.., green.., blue..]` buffer) or disable
    /// polynomial color correction.
    SetColorCorrection { enable: bool, coefficients: Vec<f64> },
    /// Enable (from a channel LUT file) or disable the gamma override.
    SetGamma { enable: bool, path: Option<PathBuf> },
    /// Enable (from a channel LUT file) or disable the inverse gamma override.
    SetInverseGamma { enable: bool, path: Option<PathBuf> },
    /// Enable (from a gamut LUT file) or disable the gamut override.
    SetGamut { enable: bool, path: Option<PathBuf> },
    /// A code inside the command range that this engine does not handle.
    Unknown(u32),
}

/// Successful command result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandReply {
    Done,
    Capabilities(Vec<CapabilityEntry>),
}

/// Receiver of decoded command-channel requests.
pub trait CommandClient: Send + Sync {
    fn notify(&self, command: Command) -> Result<CommandReply, EngineError>;
}

/// Inbound command channel the engine registers itself with.
pub trait CommandChannel: Send + Sync {
    /// Route subsequent requests to `client`. The channel must not keep the
    /// client alive.
    fn connect(&self, client: Weak<dyn CommandClient>) -> Result<(), ConnectError>;
}

/// Outbound "toggle screen updates" call.
///
/// Invoked while the engine lock is held; implementations must not call
/// back into the engine.
pub trait RefreshTrigger: Send + Sync {
    fn toggle_screen_updates(&self, enable: bool) -> Result<(), RefreshError>;
}
