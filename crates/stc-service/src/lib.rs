//! STC Service: the OEM command channel in front of the calibration engine.
//!
//! Decodes parcel requests, checks caller identities, forwards commands to
//! the connected engine, and publishes screen-refresh requests to the peers
//! of the WebSocket transport.

pub mod command;
pub mod config;
pub mod ipc;
pub mod parcel;
pub mod permission;
pub mod refresh;
pub mod service;
pub mod ws_bridge;

pub use command::CommandId;
pub use config::ServiceConfig;
pub use parcel::{Parcel, ParcelError};
pub use refresh::{RefreshEvent, ScreenRefresh};
pub use service::{OemService, ServiceError};
