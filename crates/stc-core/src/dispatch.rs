//! Typed dispatch registry: property → setter, property → getter,
//! operation → processor.
//!
//! Built once when the engine is constructed and looked up on every call.
//! Handlers are stateless; they receive the locked engine state explicitly,
//! so nothing is bound to a host object at registration time.

use std::collections::BTreeMap;

use crate::capability::CapabilityDescriptor;
use crate::engine::EngineState;
use crate::error::EngineError;
use crate::feature::FeatureId;
use crate::hw_config::HwConfigList;
use crate::merge::merge_overrides;
use crate::property::{PropertyOutput, PropertyValue, ScOp, ScProperty};

/// Handler for one settable property.
pub(crate) trait PropertySetter: Send + Sync {
    /// Reject a value whose shape does not belong to this property.
    fn validate(&self, value: &PropertyValue) -> Result<(), EngineError>;
    fn apply(&self, state: &mut EngineState, value: PropertyValue) -> Result<(), EngineError>;
}

/// Handler for one readable property.
pub(crate) trait PropertyGetter: Send + Sync {
    /// Reject an output slot whose shape does not match this property.
    fn validate(&self, out: &PropertyOutput) -> Result<(), EngineError>;
    fn apply(&self, state: &EngineState, out: &mut PropertyOutput);
}

/// Handler for one operation.
pub(crate) trait OpProcessor: Send + Sync {
    fn apply(&self, state: &mut EngineState, output: &mut HwConfigList);
}

fn shape_mismatch(what: &str, property: impl std::fmt::Debug) -> EngineError {
    EngineError::InvalidArgument(format!("{what} does not match property {property:?}"))
}

// ── Setters ──────────────────────────────────────────────────────

/// Stores a per-channel LUT capability descriptor.
struct LutCapabilitySetter {
    feature: FeatureId,
}

impl LutCapabilitySetter {
    fn descriptor(&self, value: PropertyValue) -> Option<CapabilityDescriptor> {
        match (self.feature, value) {
            (FeatureId::Gamma, PropertyValue::GammaHwConfig(d))
            | (FeatureId::InverseGamma, PropertyValue::InverseGammaHwConfig(d)) => Some(d),
            _ => None,
        }
    }
}

impl PropertySetter for LutCapabilitySetter {
    fn validate(&self, value: &PropertyValue) -> Result<(), EngineError> {
        match (self.feature, value) {
            (FeatureId::Gamma, PropertyValue::GammaHwConfig(_))
            | (FeatureId::InverseGamma, PropertyValue::InverseGammaHwConfig(_)) => Ok(()),
            _ => Err(shape_mismatch("value", self.feature)),
        }
    }

    fn apply(&self, state: &mut EngineState, value: PropertyValue) -> Result<(), EngineError> {
        let descriptor = self
            .descriptor(value)
            .ok_or_else(|| shape_mismatch("value", self.feature))?;
        state.capabilities.set(self.feature, descriptor);
        Ok(())
    }
}

/// Records the gamut block configuration.
struct GamutHwConfigSetter;

impl PropertySetter for GamutHwConfigSetter {
    fn validate(&self, value: &PropertyValue) -> Result<(), EngineError> {
        match value {
            PropertyValue::GamutHwConfig(_) => Ok(()),
            _ => Err(shape_mismatch("value", ScProperty::GamutHwConfig)),
        }
    }

    fn apply(&self, state: &mut EngineState, value: PropertyValue) -> Result<(), EngineError> {
        let PropertyValue::GamutHwConfig(config) = value else {
            return Err(shape_mismatch("value", ScProperty::GamutHwConfig));
        };
        tracing::info!(
            "PostBlend gamut HW config: num_of_grid_entries {}, grid_entries_width {}",
            config.num_grid_entries,
            config.grid_entries_width
        );
        state.capabilities.gamut = config;
        Ok(())
    }
}

/// Accepts and ignores color transforms; calibration is driven by the
/// command channel instead.
struct ColorTransformSetter;

impl PropertySetter for ColorTransformSetter {
    fn validate(&self, value: &PropertyValue) -> Result<(), EngineError> {
        match value {
            PropertyValue::ColorTransform(_) => Ok(()),
            _ => Err(shape_mismatch("value", ScProperty::ColorTransform)),
        }
    }

    fn apply(&self, _state: &mut EngineState, _value: PropertyValue) -> Result<(), EngineError> {
        Ok(())
    }
}

// ── Getters ──────────────────────────────────────────────────────

struct ModeListGetter;

impl PropertyGetter for ModeListGetter {
    fn validate(&self, out: &PropertyOutput) -> Result<(), EngineError> {
        match out {
            PropertyOutput::Modes(_) => Ok(()),
            PropertyOutput::Flag(_) => Err(shape_mismatch("output slot", ScProperty::ModeList)),
        }
    }

    fn apply(&self, state: &EngineState, out: &mut PropertyOutput) {
        *out = PropertyOutput::Modes(state.modes.clone());
    }
}

struct NeedsUpdateGetter;

impl PropertyGetter for NeedsUpdateGetter {
    fn validate(&self, out: &PropertyOutput) -> Result<(), EngineError> {
        flag_slot(out, ScProperty::NeedsUpdate)
    }

    fn apply(&self, state: &EngineState, out: &mut PropertyOutput) {
        *out = PropertyOutput::Flag(!state.dirty.is_empty());
    }
}

struct SupportToneMapGetter;

impl PropertyGetter for SupportToneMapGetter {
    fn validate(&self, out: &PropertyOutput) -> Result<(), EngineError> {
        flag_slot(out, ScProperty::SupportToneMap)
    }

    fn apply(&self, _state: &EngineState, out: &mut PropertyOutput) {
        *out = PropertyOutput::Flag(false);
    }
}

fn flag_slot(out: &PropertyOutput, property: ScProperty) -> Result<(), EngineError> {
    match out {
        PropertyOutput::Flag(_) => Ok(()),
        PropertyOutput::Modes(_) => Err(shape_mismatch("output slot", property)),
    }
}

// ── Processors ───────────────────────────────────────────────────

struct RenderIntentProcessor;

impl OpProcessor for RenderIntentProcessor {
    fn apply(&self, state: &mut EngineState, output: &mut HwConfigList) {
        if state.dirty.is_empty() {
            return;
        }
        let report = merge_overrides(&mut state.dirty, &state.cache, output);
        tracing::debug!(
            "Render intent merge: {} overwritten, {} inserted",
            report.overwritten,
            report.inserted
        );
    }
}

struct SwAssetsProcessor;

impl OpProcessor for SwAssetsProcessor {
    fn apply(&self, _state: &mut EngineState, _output: &mut HwConfigList) {}
}

// ── Registry ─────────────────────────────────────────────────────

/// The three lookup tables of the engine.
pub(crate) struct DispatchTables {
    setters: BTreeMap<ScProperty, Box<dyn PropertySetter>>,
    getters: BTreeMap<ScProperty, Box<dyn PropertyGetter>>,
    processors: BTreeMap<ScOp, Box<dyn OpProcessor>>,
}

impl DispatchTables {
    pub(crate) fn new() -> Self {
        let mut setters: BTreeMap<ScProperty, Box<dyn PropertySetter>> = BTreeMap::new();
        setters.insert(
            ScProperty::InverseGammaHwConfig,
            Box::new(LutCapabilitySetter {
                feature: FeatureId::InverseGamma,
            }),
        );
        setters.insert(
            ScProperty::GammaHwConfig,
            Box::new(LutCapabilitySetter {
                feature: FeatureId::Gamma,
            }),
        );
        setters.insert(ScProperty::GamutHwConfig, Box::new(GamutHwConfigSetter));
        setters.insert(ScProperty::ColorTransform, Box::new(ColorTransformSetter));

        let mut getters: BTreeMap<ScProperty, Box<dyn PropertyGetter>> = BTreeMap::new();
        getters.insert(ScProperty::ModeList, Box::new(ModeListGetter));
        getters.insert(ScProperty::NeedsUpdate, Box::new(NeedsUpdateGetter));
        getters.insert(ScProperty::SupportToneMap, Box::new(SupportToneMapGetter));

        let mut processors: BTreeMap<ScOp, Box<dyn OpProcessor>> = BTreeMap::new();
        processors.insert(ScOp::ModeRenderIntent, Box::new(RenderIntentProcessor));
        processors.insert(ScOp::ModeSwAssets, Box::new(SwAssetsProcessor));

        Self {
            setters,
            getters,
            processors,
        }
    }

    pub(crate) fn setter(&self, property: ScProperty) -> Result<&dyn PropertySetter, EngineError> {
        self.setters
            .get(&property)
            .map(|h| h.as_ref())
            .ok_or(EngineError::UnknownProperty(property))
    }

    pub(crate) fn getter(&self, property: ScProperty) -> Result<&dyn PropertyGetter, EngineError> {
        self.getters
            .get(&property)
            .map(|h| h.as_ref())
            .ok_or(EngineError::UnknownProperty(property))
    }

    pub(crate) fn processor(&self, op: ScOp) -> Result<&dyn OpProcessor, EngineError> {
        self.processors
            .get(&op)
            .map(|h| h.as_ref())
            .ok_or(EngineError::UnknownOperation(op))
    }
}
