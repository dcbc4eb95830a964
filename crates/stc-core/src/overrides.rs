//! Cached calibration overrides, one record per feature.
//!
//! Each record holds the last accepted configuration and an `enabled` flag.
//! Disabling a feature keeps the validated content; only a successful enable
//! replaces it.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::lut_file::{ChannelLut, GAMUT_LUT_ENTRIES, GamutEntry};

/// Number of polynomial coefficients per color component.
pub const PCC_COEFFICIENTS: usize = 11;

/// Polynomial color correction coefficients for one output component.
///
/// `out = c + r·R + g·G + b·B + rr·R² + gg·G² + bb·B² + rg·RG + gb·GB + rb·RB + rgb·RGB`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PccCoefficients {
    pub c: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub rr: f64,
    pub gg: f64,
    pub bb: f64,
    pub rg: f64,
    pub gb: f64,
    pub rb: f64,
    pub rgb: f64,
}

impl PccCoefficients {
    /// Build from up to [`PCC_COEFFICIENTS`] values in term order.
    /// Missing trailing terms are zero; extra values are dropped.
    pub fn from_slice(values: &[f64]) -> Self {
        let mut terms = [0.0_f64; PCC_COEFFICIENTS];
        let n = values.len().min(PCC_COEFFICIENTS);
        terms[..n].copy_from_slice(&values[..n]);
        Self::from_array(terms)
    }

    pub const fn from_array(t: [f64; PCC_COEFFICIENTS]) -> Self {
        Self {
            c: t[0],
            r: t[1],
            g: t[2],
            b: t[3],
            rr: t[4],
            gg: t[5],
            bb: t[6],
            rg: t[7],
            gb: t[8],
            rb: t[9],
            rgb: t[10],
        }
    }

    pub const fn to_array(&self) -> [f64; PCC_COEFFICIENTS] {
        [
            self.c, self.r, self.g, self.b, self.rr, self.gg, self.bb, self.rg, self.gb, self.rb,
            self.rgb,
        ]
    }
}

/// Cached polynomial color correction override.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorCorrectionOverride {
    pub enabled: bool,
    pub red: PccCoefficients,
    pub green: PccCoefficients,
    pub blue: PccCoefficients,
}

impl ColorCorrectionOverride {
    /// Replace the coefficients from a flat `[red.., green.., blue..]` buffer.
    ///
    /// The buffer is split into three equal per-channel runs of
    /// `len / 3` values; each run is truncated to [`PCC_COEFFICIENTS`].
    pub fn set_coefficients(&mut self, flat: &[f64]) {
        let stride = flat.len() / 3;
        if stride > PCC_COEFFICIENTS {
            tracing::debug!(
                "PCC: {stride} coefficients per channel supplied, keeping {PCC_COEFFICIENTS}"
            );
        }
        self.red = PccCoefficients::from_slice(&flat[..stride]);
        self.green = PccCoefficients::from_slice(&flat[stride..stride * 2]);
        self.blue = PccCoefficients::from_slice(&flat[stride * 2..stride * 3]);
        self.enabled = true;
    }
}

/// Cached per-channel LUT override, shared by gamma and inverse gamma.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelLutOverride {
    pub enabled: bool,
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
}

impl ChannelLutOverride {
    /// Per-channel entry count.
    pub fn entries(&self) -> usize {
        self.red.len()
    }

    /// Accept a parsed LUT. All three channels must have the same length.
    pub fn set_lut(&mut self, lut: ChannelLut) -> Result<(), EngineError> {
        let expected = lut.red.len();
        for actual in [lut.green.len(), lut.blue.len()] {
            if actual != expected {
                return Err(EngineError::SizeMismatch { expected, actual });
            }
        }
        self.red = lut.red;
        self.green = lut.green;
        self.blue = lut.blue;
        self.enabled = true;
        Ok(())
    }
}

/// Cached 3D gamut LUT override.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GamutLutOverride {
    pub enabled: bool,
    /// Grid spacing is uniform.
    pub uniform: bool,
    /// Populated entry count; equals [`GAMUT_LUT_ENTRIES`] once accepted.
    pub num_entries: u32,
    pub entries: Vec<GamutEntry>,
}

impl GamutLutOverride {
    /// Accept a parsed gamut table. It must fill the whole grid.
    pub fn set_entries(&mut self, entries: Vec<GamutEntry>) -> Result<(), EngineError> {
        if entries.len() != GAMUT_LUT_ENTRIES {
            return Err(EngineError::SizeMismatch {
                expected: GAMUT_LUT_ENTRIES,
                actual: entries.len(),
            });
        }
        self.num_entries = GAMUT_LUT_ENTRIES as u32;
        self.entries = entries;
        self.uniform = true;
        self.enabled = true;
        Ok(())
    }
}

/// One override record per calibration feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideCache {
    pub color_correction: ColorCorrectionOverride,
    pub gamma: ChannelLutOverride,
    pub inverse_gamma: ChannelLutOverride,
    pub gamut: GamutLutOverride,
}
