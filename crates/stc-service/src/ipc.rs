//! Message contracts between the service and its WebSocket peers.
//!
//! Parcels travel base64-encoded inside JSON envelopes using the
//! `#[serde(tag = "type", content = "data")]` layout.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::parcel::Parcel;

/// Messages from a peer to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PeerToService {
    /// Run one command.
    Transact {
        /// Numeric command code.
        code: u32,
        /// Base64 request parcel.
        parcel: String,
    },
}

/// Messages from the service to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServiceToPeer {
    /// Outcome of a `Transact`.
    Reply {
        /// Code of the command being answered.
        code: u32,
        /// Zero on success, a negative status otherwise.
        status: i32,
        /// Base64 reply parcel; empty on failure.
        parcel: String,
    },

    /// The engine asked for screen updates to be toggled.
    ToggleScreenUpdates {
        enable: bool,
    },

    /// The peer sent something the service could not read.
    Error {
        message: String,
    },
}

impl PeerToService {
    pub fn transact(code: u32, parcel: &Parcel) -> Self {
        Self::Transact {
            code,
            parcel: encode_parcel(parcel),
        }
    }
}

pub fn encode_parcel(parcel: &Parcel) -> String {
    STANDARD.encode(parcel.as_bytes())
}

pub fn decode_parcel(text: &str) -> Result<Parcel, base64::DecodeError> {
    STANDARD.decode(text).map(Parcel::from_bytes)
}
