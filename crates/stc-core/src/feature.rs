//! Calibration feature identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the independently toggleable calibration overrides.
///
/// Used as the identity key by the dirty set, the override cache, and the
/// merge engine when matching hardware-config entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureId {
    /// Polynomial color correction (PCC).
    ColorCorrection,
    /// Post-blend gamma LUT (GC).
    Gamma,
    /// Post-blend inverse gamma LUT (IGC).
    InverseGamma,
    /// 3D gamut LUT.
    Gamut,
}

impl FeatureId {
    /// Hardware asset tag used in the hardware-config list.
    pub const fn hw_tag(&self) -> &'static str {
        match self {
            Self::ColorCorrection => "PostBlendPcc",
            Self::Gamma => "PostBlendGc",
            Self::InverseGamma => "PostBlendIgc",
            Self::Gamut => "PostBlendGamut",
        }
    }

    /// Every feature, in a stable order.
    pub fn all() -> &'static [Self] {
        const ALL: [FeatureId; 4] = [
            FeatureId::ColorCorrection,
            FeatureId::Gamma,
            FeatureId::InverseGamma,
            FeatureId::Gamut,
        ];
        &ALL
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColorCorrection => write!(f, "PCC"),
            Self::Gamma => write!(f, "GC"),
            Self::InverseGamma => write!(f, "IGC"),
            Self::Gamut => write!(f, "GAMUT"),
        }
    }
}
