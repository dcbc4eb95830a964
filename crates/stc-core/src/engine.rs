//! Engine facade: the single authoritative state behind one lock.
//!
//! Every public entry point takes the lock for its whole duration, including
//! file parsing and the outbound refresh call issued by the setters. Calls
//! are therefore fully serialized.
//!
//! ```text
//! Uninitialized ──init──▶ Ready ──deinit──▶ Uninitialized
//! ```
//!
//! Anything but `init`/`deinit` fails with [`EngineError::NotReady`] while
//! uninitialized and leaves the state untouched.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::capability::{CapabilityEntry, CapabilityStore};
use crate::dirty::DirtySet;
use crate::dispatch::DispatchTables;
use crate::error::EngineError;
use crate::external::{Command, CommandChannel, CommandClient, CommandReply, RefreshTrigger};
use crate::feature::FeatureId;
use crate::hw_config::HwConfigList;
use crate::lut_file::{GAMUT_LUT_ENTRIES, read_channel_lut, read_gamut_lut};
use crate::overrides::OverrideCache;
use crate::property::{
    ColorMode, PAYLOAD_VERSION, Payload, PropertyOutput, PropertyValue, RenderIntent, ScOp,
};

/// Interface version served by [`StcEngine`].
pub const INTERFACE_VERSION: (u32, u32) = (2, 0);

/// Mutable engine state guarded by the engine lock.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) ready: bool,
    pub(crate) panel_name: String,
    pub(crate) modes: Vec<ColorMode>,
    pub(crate) dirty: DirtySet,
    pub(crate) cache: OverrideCache,
    pub(crate) capabilities: CapabilityStore,
}

/// Color-calibration override engine.
pub struct StcEngine {
    state: Mutex<EngineState>,
    tables: DispatchTables,
    channel: Option<Arc<dyn CommandChannel>>,
    refresh: Option<Arc<dyn RefreshTrigger>>,
}

/// Create the engine for the requested interface version.
///
/// Only version 2.0 is served; any other version yields `None`.
pub fn create_interface(
    major: u32,
    minor: u32,
    channel: Option<Arc<dyn CommandChannel>>,
    refresh: Option<Arc<dyn RefreshTrigger>>,
) -> Option<Arc<StcEngine>> {
    if (major, minor) != INTERFACE_VERSION {
        tracing::error!("Invalid interface version {major}.{minor}");
        return None;
    }
    tracing::info!("StcEngine created");
    Some(Arc::new(StcEngine::new(channel, refresh)))
}

impl StcEngine {
    pub fn new(
        channel: Option<Arc<dyn CommandChannel>>,
        refresh: Option<Arc<dyn RefreshTrigger>>,
    ) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            tables: DispatchTables::new(),
            channel,
            refresh,
        }
    }

    /// Mark the engine ready, rebuild the mode list, and register with the
    /// command channel.
    ///
    /// Returns [`EngineError::Connection`] when no command channel is
    /// reachable; the engine is still ready for local calls in that case.
    pub fn init(self: &Arc<Self>, panel_name: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ready = true;
        state.panel_name = panel_name.to_string();
        state.modes = vec![ColorMode {
            intent: RenderIntent::OemModulateHw,
        }];
        tracing::info!("Initializing engine for panel {panel_name}");

        if self.refresh.is_none() {
            tracing::warn!("No refresh trigger, screen updates will not be requested");
        }

        let Some(channel) = &self.channel else {
            tracing::error!("Failed to acquire command channel: none configured");
            return Err(EngineError::Connection("no command channel configured".into()));
        };
        let client: Arc<dyn CommandClient> = self.clone();
        channel.connect(Arc::downgrade(&client)).map_err(|e| {
            tracing::error!("Failed to acquire command channel: {e}");
            EngineError::Connection(e.to_string())
        })?;
        tracing::info!("Acquired command channel");
        Ok(())
    }

    /// Drop pending merges, reset every override to empty and disabled, and
    /// return to the uninitialized state.
    pub fn deinit(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.dirty.clear();
        state.cache = OverrideCache::default();
        state.ready = false;
        tracing::info!("Engine deinitialized");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Panel this engine was initialized for.
    pub fn panel_name(&self) -> String {
        self.state.lock().panel_name.clone()
    }

    /// Copy of the override cache.
    pub fn overrides(&self) -> OverrideCache {
        self.state.lock().cache.clone()
    }

    pub fn set_property(&self, payload: Payload<PropertyValue>) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        ensure_ready(&state)?;
        check_version(payload.version)?;

        let setter = self.tables.setter(payload.property)?;
        setter.validate(&payload.value)?;
        setter.apply(&mut state, payload.value)
    }

    pub fn get_property(&self, payload: &mut Payload<PropertyOutput>) -> Result<(), EngineError> {
        let state = self.state.lock();
        ensure_ready(&state)?;
        check_version(payload.version)?;

        let getter = self.tables.getter(payload.property)?;
        getter.validate(&payload.value)?;
        getter.apply(&state, &mut payload.value);
        Ok(())
    }

    /// Run an operation against the caller's hardware-config list.
    pub fn process_ops(&self, op: ScOp, output: &mut HwConfigList) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        tracing::debug!("Process ops called, op = {op:?}");
        if !state.ready {
            tracing::error!("Process ops {op:?} rejected: engine not initialized");
            return Err(EngineError::NotReady);
        }

        let processor = self.tables.processor(op).inspect_err(|_| {
            tracing::error!("Invalid ops {op:?}");
        })?;
        processor.apply(&mut state, output);
        Ok(())
    }

    /// Reported LUT configurations for a feature.
    pub fn capability(&self, feature: FeatureId) -> Result<Vec<CapabilityEntry>, EngineError> {
        let state = self.state.lock();
        ensure_ready(&state)?;
        let entries = state.capabilities.report(feature);
        for entry in &entries {
            tracing::debug!(
                "{feature} config {}: num_entries {}, entry_width {}",
                entry.name,
                entry.num_entries,
                entry.entries_width
            );
        }
        Ok(entries)
    }

    /// Enable polynomial color correction from a flat
    /// `[red.., green.., blue..]` buffer, or disable it.
    pub fn set_color_correction(
        &self,
        enable: bool,
        coefficients: &[f64],
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        ensure_ready(&state)?;
        tracing::info!("Set PCC config, enable {enable}");

        let pcc = &mut state.cache.color_correction;
        if enable {
            pcc.set_coefficients(coefficients);
            for (name, channel) in [("R", &pcc.red), ("G", &pcc.green), ("B", &pcc.blue)] {
                tracing::info!("Cache PCC {name}: {:?}", channel.to_array());
            }
        } else {
            pcc.enabled = false;
        }

        self.mark_dirty(&mut state, FeatureId::ColorCorrection);
        Ok(())
    }

    /// Enable the gamma override from a channel LUT file, or disable it.
    pub fn set_gamma(&self, enable: bool, path: Option<&Path>) -> Result<(), EngineError> {
        self.set_channel_lut(FeatureId::Gamma, enable, path)
    }

    /// Enable the inverse gamma override from a channel LUT file, or disable it.
    pub fn set_inverse_gamma(&self, enable: bool, path: Option<&Path>) -> Result<(), EngineError> {
        self.set_channel_lut(FeatureId::InverseGamma, enable, path)
    }

    /// Enable the gamut override from a gamut LUT file, or disable it.
    pub fn set_gamut(&self, enable: bool, path: Option<&Path>) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        ensure_ready(&state)?;
        tracing::info!("Set GAMUT config, enable {enable}");

        if enable {
            let path = required_path(path, FeatureId::Gamut)?;
            let entries = read_gamut_lut(path, GAMUT_LUT_ENTRIES)
                .inspect_err(|e| tracing::error!("Failed to set GAMUT config: {e}"))?;
            state.cache.gamut.set_entries(entries)?;
        } else {
            state.cache.gamut.enabled = false;
        }

        self.mark_dirty(&mut state, FeatureId::Gamut);
        Ok(())
    }

    fn set_channel_lut(
        &self,
        feature: FeatureId,
        enable: bool,
        path: Option<&Path>,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        ensure_ready(&state)?;
        tracing::info!("Set {feature} config, enable {enable}");

        let cache = match feature {
            FeatureId::Gamma => &mut state.cache.gamma,
            FeatureId::InverseGamma => &mut state.cache.inverse_gamma,
            FeatureId::ColorCorrection | FeatureId::Gamut => {
                return Err(EngineError::InvalidArgument(format!(
                    "{feature} is not a channel LUT feature"
                )));
            }
        };

        if enable {
            let path = required_path(path, feature)?;
            let lut = read_channel_lut(path)
                .inspect_err(|e| tracing::error!("Failed to set {feature} config: {e}"))?;
            tracing::info!("Number of entries is {}", lut.len());
            cache.set_lut(lut)?;
        } else {
            cache.enabled = false;
        }

        self.mark_dirty(&mut state, feature);
        Ok(())
    }

    /// Record a state change and ask the display to refresh.
    fn mark_dirty(&self, state: &mut EngineState, feature: FeatureId) {
        state.dirty.mark(feature);
        self.trigger_screen_update();
    }

    fn trigger_screen_update(&self) {
        let Some(refresh) = &self.refresh else {
            return;
        };
        tracing::debug!("Trigger screen refresh");
        if let Err(e) = refresh.toggle_screen_updates(true) {
            tracing::error!("Failed to dispatch screen refresh: {e}");
        }
    }
}

impl CommandClient for StcEngine {
    fn notify(&self, command: Command) -> Result<CommandReply, EngineError> {
        match command {
            Command::GetCapability(feature) => {
                self.capability(feature).map(CommandReply::Capabilities)
            }
            Command::SetColorCorrection {
                enable,
                coefficients,
            } => self
                .set_color_correction(enable, &coefficients)
                .map(|()| CommandReply::Done),
            Command::SetGamma { enable, path } => self
                .set_gamma(enable, path.as_deref())
                .map(|()| CommandReply::Done),
            Command::SetInverseGamma { enable, path } => self
                .set_inverse_gamma(enable, path.as_deref())
                .map(|()| CommandReply::Done),
            Command::SetGamut { enable, path } => self
                .set_gamut(enable, path.as_deref())
                .map(|()| CommandReply::Done),
            Command::Unknown(code) => {
                tracing::warn!("Unsupported command {code}");
                Err(EngineError::UnknownCommand(code))
            }
        }
    }
}

fn ensure_ready(state: &EngineState) -> Result<(), EngineError> {
    if state.ready {
        Ok(())
    } else {
        Err(EngineError::NotReady)
    }
}

fn check_version(version: u32) -> Result<(), EngineError> {
    if version == PAYLOAD_VERSION {
        Ok(())
    } else {
        Err(EngineError::InvalidArgument(format!(
            "payload version {version}, expected {PAYLOAD_VERSION}"
        )))
    }
}

fn required_path(path: Option<&Path>, feature: FeatureId) -> Result<&Path, EngineError> {
    path.ok_or_else(|| EngineError::InvalidArgument(format!("{feature} enable requires a file")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_interface_checks_version() {
        assert!(create_interface(2, 0, None, None).is_some());
        assert!(create_interface(1, 0, None, None).is_none());
        assert!(create_interface(2, 1, None, None).is_none());
    }

    #[test]
    fn test_init_without_channel_is_degraded_but_ready() {
        let engine = Arc::new(StcEngine::new(None, None));
        let err = engine.init("panel0").unwrap_err();
        assert!(matches!(err, EngineError::Connection(_)));
        assert!(engine.is_ready());
        assert_eq!(engine.panel_name(), "panel0");
    }

    #[test]
    fn test_init_rebuilds_single_mode() {
        let engine = Arc::new(StcEngine::new(None, None));
        let _ = engine.init("panel0");
        let _ = engine.init("panel0");

        let mut payload = Payload::new(
            crate::property::ScProperty::ModeList,
            PropertyOutput::Modes(Vec::new()),
        );
        engine.get_property(&mut payload).unwrap();
        assert_eq!(
            payload.value,
            PropertyOutput::Modes(vec![ColorMode {
                intent: RenderIntent::OemModulateHw
            }])
        );
    }

    #[test]
    fn test_enable_without_path_is_invalid() {
        let engine = Arc::new(StcEngine::new(None, None));
        let _ = engine.init("panel0");
        assert!(matches!(
            engine.set_gamma(true, None),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.set_gamut(true, None),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
