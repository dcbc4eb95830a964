//! Property and operation vocabulary of the post-blend interface.

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityDescriptor, GamutHwConfig};

/// Payload schema version accepted by this engine.
pub const PAYLOAD_VERSION: u32 = 2;

/// Properties addressable through `set_property` / `get_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScProperty {
    /// Inverse gamma block capability (set).
    InverseGammaHwConfig,
    /// Gamma block capability (set).
    GammaHwConfig,
    /// Gamut block configuration (set).
    GamutHwConfig,
    /// Color transform matrix (set, ignored).
    ColorTransform,
    /// Supported color modes (get).
    ModeList,
    /// Whether a merge is pending (get).
    NeedsUpdate,
    /// Whether tone mapping is supported (get).
    SupportToneMap,
}

/// Operations addressable through `process_ops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScOp {
    /// Produce the hardware-config list for the active render intent.
    ModeRenderIntent,
    /// Produce software assets. Nothing to do for a hardware-modulated mode.
    ModeSwAssets,
    /// Mode selection. Not handled by this engine.
    ModeSelect,
}

/// Render intent of a color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderIntent {
    /// Colorimetric output.
    Colorimetric,
    /// Output modulated in hardware by vendor calibration.
    OemModulateHw,
}

/// One supported color mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMode {
    pub intent: RenderIntent,
}

/// Versioned, property-addressed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload<T> {
    pub version: u32,
    pub property: ScProperty,
    pub value: T,
}

impl<T> Payload<T> {
    /// Payload stamped with the current schema version.
    pub fn new(property: ScProperty, value: T) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            property,
            value,
        }
    }
}

/// Value carried by a `set_property` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    InverseGammaHwConfig(CapabilityDescriptor),
    GammaHwConfig(CapabilityDescriptor),
    GamutHwConfig(GamutHwConfig),
    ColorTransform(Vec<f64>),
}

/// Output slot filled by a `get_property` call.
///
/// The caller picks the slot shape; a slot that does not match the
/// property's output shape is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyOutput {
    Flag(bool),
    Modes(Vec<ColorMode>),
}
