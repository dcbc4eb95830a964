//! Runtime configuration for the calibration service.

use crate::permission::{CallerUid, UID_GRAPHICS};

/// Default WebSocket port for the command transport.
pub const DEFAULT_WS_PORT: u16 = 9410;
/// Default panel the engine is initialized for.
const DEFAULT_PANEL_NAME: &str = "default_panel";
/// Inverse gamma block: 1024 entries of 12 bits.
const DEFAULT_IGC_HW: (u32, u32) = (1024, 12);
/// Gamma block: 1024 entries of 10 bits.
const DEFAULT_GC_HW: (u32, u32) = (1024, 10);
/// Gamut block: 17^3 grid of 10-bit entries.
const DEFAULT_GAMUT_HW: (u32, u32) = (4913, 10);

/// Runtime configuration for the `stc-oemservice` process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// WebSocket port for the command transport.
    pub ws_port: u16,
    /// Panel handed to engine initialization.
    pub panel_name: String,
    /// Identity assigned to every transport peer.
    pub bridge_caller_uid: CallerUid,
    /// `(entries, width)` of the inverse gamma block.
    pub igc_hw: (u32, u32),
    /// `(entries, width)` of the gamma block.
    pub gc_hw: (u32, u32),
    /// `(grid entries, width)` of the gamut block.
    pub gamut_hw: (u32, u32),
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ws_port: std::env::var("STC_WS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_WS_PORT),
            panel_name: std::env::var("STC_PANEL_NAME")
                .unwrap_or_else(|_| DEFAULT_PANEL_NAME.to_string()),
            bridge_caller_uid: std::env::var("STC_BRIDGE_CALLER_UID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(UID_GRAPHICS),
            igc_hw: DEFAULT_IGC_HW,
            gc_hw: DEFAULT_GC_HW,
            gamut_hw: DEFAULT_GAMUT_HW,
        }
    }
}
