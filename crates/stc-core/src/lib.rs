//! STC Core: color-calibration override engine for the display post-blend
//! pipeline.
//!
//! Caches calibration overrides (color correction, gamma, inverse gamma,
//! gamut) received over the command channel, tracks which of them changed,
//! and merges them into the hardware-config list the render pipeline
//! consumes. No transport or process framework dependencies.

pub mod capability;
pub mod dirty;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod external;
pub mod feature;
pub mod hw_config;
pub mod lut_file;
pub mod merge;
pub mod overrides;
pub mod property;

// Re-exports for convenience.
pub use capability::{CapabilityDescriptor, CapabilityEntry, HwCapability};
pub use engine::{StcEngine, create_interface};
pub use error::EngineError;
pub use external::{
    Command, CommandChannel, CommandClient, CommandReply, ConnectError, RefreshError,
    RefreshTrigger,
};
pub use feature::FeatureId;
pub use hw_config::{HardwareConfigEntry, HwConfigList, HwPayload};
pub use property::{Payload, PropertyOutput, PropertyValue, ScOp, ScProperty};
