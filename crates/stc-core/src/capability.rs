//! Hardware capability descriptors reported by the display driver.
//!
//! The driver pushes one descriptor per LUT block through the capability
//! setters during initialization; the command channel reads them back as a
//! flat list of named `(entries, width)` configurations.

use serde::{Deserialize, Serialize};

use crate::feature::FeatureId;
use crate::overrides::PCC_COEFFICIENTS;

/// Name reported for the descriptor's default configuration.
pub const DEFAULT_CAPABILITY_NAME: &str = "default";

/// Bit width of one color correction coefficient (IEEE double).
pub const PCC_COEFFICIENT_WIDTH: u32 = 64;

/// An alternative LUT configuration supported by the hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwCapability {
    pub name: String,
    pub valid: bool,
    pub num_entries: u32,
    pub entries_width: u32,
}

/// Capability descriptor for a per-channel LUT block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Default entry count.
    pub num_entries: u32,
    /// Default entry bit width.
    pub entries_width: u32,
    /// Alternative configurations, in driver order.
    pub hw_caps: Vec<HwCapability>,
}

/// Gamut block configuration. Recorded for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GamutHwConfig {
    pub num_grid_entries: u32,
    pub grid_entries_width: u32,
}

/// One reported configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityEntry {
    pub name: String,
    pub num_entries: u32,
    pub entries_width: u32,
}

impl CapabilityEntry {
    fn default_entry(num_entries: u32, entries_width: u32) -> Self {
        Self {
            name: DEFAULT_CAPABILITY_NAME.to_string(),
            num_entries,
            entries_width,
        }
    }
}

impl CapabilityDescriptor {
    /// Flatten into the reported configuration list.
    ///
    /// Only valid alternatives are reported. The default configuration is
    /// prepended unless a valid alternative already has the same
    /// `(entries, width)` pair.
    pub fn report(&self) -> Vec<CapabilityEntry> {
        let valid: Vec<&HwCapability> = self.hw_caps.iter().filter(|cap| cap.valid).collect();
        let default_included = valid.iter().any(|cap| {
            cap.num_entries == self.num_entries && cap.entries_width == self.entries_width
        });

        let mut entries = Vec::with_capacity(valid.len() + 1);
        if !default_included {
            entries.push(CapabilityEntry::default_entry(
                self.num_entries,
                self.entries_width,
            ));
        }
        entries.extend(valid.into_iter().map(|cap| CapabilityEntry {
            name: cap.name.clone(),
            num_entries: cap.num_entries,
            entries_width: cap.entries_width,
        }));
        entries
    }
}

/// Descriptors for every LUT block, populated once at initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityStore {
    pub gamma: CapabilityDescriptor,
    pub inverse_gamma: CapabilityDescriptor,
    pub gamut: GamutHwConfig,
}

impl CapabilityStore {
    /// Overwrite the descriptor of a per-channel LUT feature.
    ///
    /// Only gamma and inverse gamma carry descriptors; other features are
    /// ignored and `false` is returned.
    pub fn set(&mut self, feature: FeatureId, descriptor: CapabilityDescriptor) -> bool {
        let slot = match feature {
            FeatureId::Gamma => &mut self.gamma,
            FeatureId::InverseGamma => &mut self.inverse_gamma,
            FeatureId::ColorCorrection | FeatureId::Gamut => return false,
        };
        tracing::info!(
            "{feature} HW config: num_of_entries {}, entries_width {}, hw_caps {}",
            descriptor.num_entries,
            descriptor.entries_width,
            descriptor.hw_caps.len()
        );
        *slot = descriptor;
        true
    }

    /// Reported configuration list for a feature.
    pub fn report(&self, feature: FeatureId) -> Vec<CapabilityEntry> {
        match feature {
            FeatureId::Gamma => self.gamma.report(),
            FeatureId::InverseGamma => self.inverse_gamma.report(),
            FeatureId::ColorCorrection => vec![CapabilityEntry::default_entry(
                PCC_COEFFICIENTS as u32,
                PCC_COEFFICIENT_WIDTH,
            )],
            FeatureId::Gamut => vec![CapabilityEntry::default_entry(
                self.gamut.num_grid_entries,
                self.gamut.grid_entries_width,
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(name: &str, valid: bool, num_entries: u32, entries_width: u32) -> HwCapability {
        HwCapability {
            name: name.to_string(),
            valid,
            num_entries,
            entries_width,
        }
    }

    #[test]
    fn test_no_alternatives_reports_default_only() {
        let descriptor = CapabilityDescriptor {
            num_entries: 33,
            entries_width: 10,
            hw_caps: Vec::new(),
        };
        assert_eq!(
            descriptor.report(),
            vec![CapabilityEntry {
                name: "default".to_string(),
                num_entries: 33,
                entries_width: 10,
            }]
        );
    }

    #[test]
    fn test_default_prepended_when_absent() {
        let descriptor = CapabilityDescriptor {
            num_entries: 1024,
            entries_width: 12,
            hw_caps: vec![cap("lut256", true, 256, 10), cap("broken", false, 1024, 12)],
        };
        let report = descriptor.report();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].name, "default");
        assert_eq!(report[0].num_entries, 1024);
        assert_eq!(report[1].name, "lut256");
    }

    #[test]
    fn test_default_not_duplicated_when_valid_alternative_matches() {
        let descriptor = CapabilityDescriptor {
            num_entries: 1024,
            entries_width: 12,
            hw_caps: vec![cap("lut1024", true, 1024, 12), cap("lut256", true, 256, 10)],
        };
        let names: Vec<String> = descriptor.report().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["lut1024", "lut256"]);
    }

    #[test]
    fn test_store_rejects_features_without_descriptor() {
        let mut store = CapabilityStore::default();
        assert!(!store.set(FeatureId::Gamut, CapabilityDescriptor::default()));
        assert!(store.set(
            FeatureId::InverseGamma,
            CapabilityDescriptor {
                num_entries: 64,
                entries_width: 12,
                hw_caps: Vec::new(),
            }
        ));
        assert_eq!(store.report(FeatureId::InverseGamma)[0].num_entries, 64);
        assert_eq!(store.report(FeatureId::Gamma)[0].num_entries, 0);
    }

    #[test]
    fn test_color_correction_reports_fixed_layout() {
        let store = CapabilityStore::default();
        let report = store.report(FeatureId::ColorCorrection);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].num_entries, 11);
        assert_eq!(report[0].entries_width, 64);
    }
}
