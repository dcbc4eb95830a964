//! Hardware-config list consumed by the render pipeline.
//!
//! The list is owned by the caller of the render-intent operation. The merge
//! engine updates entries in place and appends new ones; it never removes or
//! reorders existing entries.

use crate::feature::FeatureId;
use crate::overrides::{ChannelLutOverride, ColorCorrectionOverride, GamutLutOverride};

/// Payload of one hardware block, tagged by the block it configures.
#[derive(Debug, Clone, PartialEq)]
pub enum HwPayload {
    ColorCorrection(ColorCorrectionOverride),
    Gamma(ChannelLutOverride),
    InverseGamma(ChannelLutOverride),
    Gamut(GamutLutOverride),
    /// A block this engine does not override (dither, tone map, ...).
    Other { tag: String, bytes: Vec<u8> },
}

impl HwPayload {
    /// Calibration feature this payload configures, if any.
    pub fn feature(&self) -> Option<FeatureId> {
        match self {
            Self::ColorCorrection(_) => Some(FeatureId::ColorCorrection),
            Self::Gamma(_) => Some(FeatureId::Gamma),
            Self::InverseGamma(_) => Some(FeatureId::InverseGamma),
            Self::Gamut(_) => Some(FeatureId::Gamut),
            Self::Other { .. } => None,
        }
    }

    /// Hardware asset tag.
    pub fn tag(&self) -> &str {
        match self {
            Self::Other { tag, .. } => tag,
            _ => self.feature().map_or("", |f| f.hw_tag()),
        }
    }

    /// Native-endian byte encoding handed to the driver.
    ///
    /// Layout: `enabled` byte, then the numeric content. Gamut adds the
    /// `uniform` byte and the `u32` entry count before the table.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::ColorCorrection(pcc) => {
                let mut bytes = vec![u8::from(pcc.enabled)];
                for channel in [&pcc.red, &pcc.green, &pcc.blue] {
                    bytes.extend_from_slice(bytemuck::cast_slice(&channel.to_array()[..]));
                }
                bytes
            }
            Self::Gamma(lut) | Self::InverseGamma(lut) => {
                let mut bytes = vec![u8::from(lut.enabled)];
                for channel in [&lut.red, &lut.green, &lut.blue] {
                    bytes.extend_from_slice(bytemuck::cast_slice(channel.as_slice()));
                }
                bytes
            }
            Self::Gamut(gamut) => {
                let mut bytes = vec![u8::from(gamut.enabled), u8::from(gamut.uniform)];
                bytes.extend_from_slice(&gamut.num_entries.to_ne_bytes());
                bytes.extend_from_slice(bytemuck::cast_slice(gamut.entries.as_slice()));
                bytes
            }
            Self::Other { bytes, .. } => bytes.clone(),
        }
    }
}

/// One element of the hardware-config list.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareConfigEntry {
    payload: HwPayload,
    /// Declared byte length of the encoded payload.
    payload_len: usize,
}

impl HardwareConfigEntry {
    pub fn new(payload: HwPayload) -> Self {
        let payload_len = payload.to_bytes().len();
        Self {
            payload,
            payload_len,
        }
    }

    pub fn payload(&self) -> &HwPayload {
        &self.payload
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    pub fn feature(&self) -> Option<FeatureId> {
        self.payload.feature()
    }

    /// Replace the payload, keeping the entry's position in the list.
    pub fn overwrite(&mut self, payload: HwPayload) {
        self.payload_len = payload.to_bytes().len();
        self.payload = payload;
    }
}

/// Ordered hardware-config list for one frame or mode change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HwConfigList {
    entries: Vec<HardwareConfigEntry>,
}

impl HwConfigList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: HardwareConfigEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &HardwareConfigEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HardwareConfigEntry> {
        self.entries.get(index)
    }

    /// First entry carrying `feature`'s hardware tag, whatever its payload shape.
    pub fn find(&self, feature: FeatureId) -> Option<&HardwareConfigEntry> {
        self.entries
            .iter()
            .find(|e| e.payload().tag() == feature.hw_tag())
    }

    pub(crate) fn find_mut(&mut self, feature: FeatureId) -> Option<&mut HardwareConfigEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.payload().tag() == feature.hw_tag())
    }
}

impl From<Vec<HardwareConfigEntry>> for HwConfigList {
    fn from(entries: Vec<HardwareConfigEntry>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut_file::GamutEntry;

    #[test]
    fn test_payload_len_tracks_encoding() {
        let lut = ChannelLutOverride {
            enabled: true,
            red: vec![1, 2],
            green: vec![3, 4],
            blue: vec![5, 6],
        };
        let entry = HardwareConfigEntry::new(HwPayload::Gamma(lut));
        assert_eq!(entry.payload_len(), 1 + 3 * 2 * 4);
        assert_eq!(entry.payload().tag(), "PostBlendGc");

        let mut entry = entry;
        entry.overwrite(HwPayload::Gamut(GamutLutOverride {
            enabled: true,
            uniform: true,
            num_entries: 2,
            entries: vec![GamutEntry::default(); 2],
        }));
        assert_eq!(entry.payload_len(), 2 + 4 + 2 * 12);
        assert_eq!(entry.feature(), Some(FeatureId::Gamut));
    }

    #[test]
    fn test_pcc_encoding_size() {
        let bytes = HwPayload::ColorCorrection(ColorCorrectionOverride::default()).to_bytes();
        assert_eq!(bytes.len(), 1 + 3 * 11 * 8);
    }

    #[test]
    fn test_other_blocks_have_no_feature() {
        let list = HwConfigList::from(vec![HardwareConfigEntry::new(HwPayload::Other {
            tag: "Dither".into(),
            bytes: vec![1, 2, 3],
        })]);
        assert_eq!(list.get(0).map(|e| e.payload_len()), Some(3));
        assert!(list.find(FeatureId::Gamma).is_none());
    }
}
