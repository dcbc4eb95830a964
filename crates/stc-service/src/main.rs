//! stc-oemservice: hosts the calibration engine behind the command channel.
//!
//! Wires the engine to the OEM service and the refresh trigger, serves the
//! WebSocket transport, and runs a frame loop that merges pending overrides
//! whenever a screen update is requested.

use std::sync::Arc;

use anyhow::{Context, Result};
use stc_core::capability::GamutHwConfig;
use stc_core::property::RenderIntent;
use stc_core::{
    CapabilityDescriptor, CommandChannel, HwConfigList, Payload, PropertyOutput, PropertyValue,
    RefreshTrigger, ScOp, ScProperty, StcEngine,
};
use stc_service::ws_bridge::{self, BridgeContext};
use stc_service::{OemService, ScreenRefresh, ServiceConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::default();
    let service = Arc::new(OemService::new());
    let refresh = ScreenRefresh::new();
    let mut frames = refresh.subscribe();

    let channel: Arc<dyn CommandChannel> = service.clone();
    let trigger: Arc<dyn RefreshTrigger> = Arc::new(refresh.clone());
    let engine = stc_core::create_interface(2, 0, Some(channel), Some(trigger))
        .context("engine rejected interface version")?;
    engine
        .init(&config.panel_name)
        .context("engine initialization failed")?;
    publish_hw_capabilities(&engine, &config)?;

    let _server = ws_bridge::spawn_ws_server(
        config.ws_port,
        BridgeContext {
            service,
            caller: config.bridge_caller_uid,
            refresh,
        },
    )
    .with_context(|| format!("failed to start WebSocket server on port {}", config.ws_port))?;

    let mut hw_list = HwConfigList::new();
    loop {
        match frames.blocking_recv() {
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => tracing::debug!("Coalesced {missed} refreshes"),
            Err(RecvError::Closed) => break,
        }
        if let Err(e) = compose_frame(&engine, &mut hw_list) {
            tracing::error!("Frame composition failed: {e}");
        }
    }

    engine.deinit()?;
    Ok(())
}

/// Push the panel's LUT block descriptors, as the display driver would.
fn publish_hw_capabilities(engine: &StcEngine, config: &ServiceConfig) -> Result<()> {
    let descriptor = |(num_entries, entries_width): (u32, u32)| CapabilityDescriptor {
        num_entries,
        entries_width,
        hw_caps: Vec::new(),
    };
    engine.set_property(Payload::new(
        ScProperty::InverseGammaHwConfig,
        PropertyValue::InverseGammaHwConfig(descriptor(config.igc_hw)),
    ))?;
    engine.set_property(Payload::new(
        ScProperty::GammaHwConfig,
        PropertyValue::GammaHwConfig(descriptor(config.gc_hw)),
    ))?;
    let (num_grid_entries, grid_entries_width) = config.gamut_hw;
    engine.set_property(Payload::new(
        ScProperty::GamutHwConfig,
        PropertyValue::GamutHwConfig(GamutHwConfig {
            num_grid_entries,
            grid_entries_width,
        }),
    ))?;
    Ok(())
}

/// One render pass: merge pending overrides into the hardware list.
fn compose_frame(engine: &StcEngine, hw_list: &mut HwConfigList) -> Result<()> {
    let mut modes = Payload::new(ScProperty::ModeList, PropertyOutput::Modes(Vec::new()));
    engine.get_property(&mut modes)?;
    let modulated = matches!(
        &modes.value,
        PropertyOutput::Modes(list) if list.iter().any(|m| m.intent == RenderIntent::OemModulateHw)
    );
    if !modulated {
        return Ok(());
    }

    let mut needs_update = Payload::new(ScProperty::NeedsUpdate, PropertyOutput::Flag(false));
    engine.get_property(&mut needs_update)?;
    if !matches!(needs_update.value, PropertyOutput::Flag(true)) {
        return Ok(());
    }

    engine.process_ops(ScOp::ModeRenderIntent, hw_list)?;
    for entry in hw_list.iter() {
        tracing::info!(
            "HW config {}: {} bytes",
            entry.payload().tag(),
            entry.payload_len()
        );
    }
    Ok(())
}
