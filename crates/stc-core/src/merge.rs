//! Merge cached overrides into the caller's hardware-config list.
//!
//! For every dirty feature the first list entry configuring that feature is
//! overwritten in place with the cached override; if none exists a new entry
//! is appended. The dirty set is empty afterwards, so a second merge with no
//! intervening setter call leaves the list untouched.
//!
//! Color correction and gamut entries are always written with
//! `enabled = true`; gamma and inverse gamma entries carry the cached flag.

use crate::dirty::DirtySet;
use crate::feature::FeatureId;
use crate::hw_config::{HardwareConfigEntry, HwConfigList, HwPayload};
use crate::overrides::OverrideCache;

/// Outcome of one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Entries overwritten in place.
    pub overwritten: usize,
    /// Entries appended to the list.
    pub inserted: usize,
}

/// Hardware payload for a feature's current cached override.
pub fn cached_payload(feature: FeatureId, cache: &OverrideCache) -> HwPayload {
    match feature {
        FeatureId::ColorCorrection => {
            let mut pcc = cache.color_correction;
            pcc.enabled = true;
            HwPayload::ColorCorrection(pcc)
        }
        FeatureId::Gamma => HwPayload::Gamma(cache.gamma.clone()),
        FeatureId::InverseGamma => HwPayload::InverseGamma(cache.inverse_gamma.clone()),
        FeatureId::Gamut => {
            let mut gamut = cache.gamut.clone();
            gamut.enabled = true;
            HwPayload::Gamut(gamut)
        }
    }
}

/// Upsert every dirty feature into `list` and drain `dirty`.
pub fn merge_overrides(
    dirty: &mut DirtySet,
    cache: &OverrideCache,
    list: &mut HwConfigList,
) -> MergeReport {
    let mut report = MergeReport::default();

    for feature in dirty.drain() {
        let payload = cached_payload(feature, cache);
        match list.find_mut(feature) {
            Some(entry) => {
                entry.overwrite(payload);
                report.overwritten += 1;
                tracing::info!("Overwrite {feature} config in output payload");
            }
            None => {
                list.push(HardwareConfigEntry::new(payload));
                report.inserted += 1;
                tracing::info!("Push new {feature} config into output payload");
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::ChannelLutOverride;

    fn gamma_cache(enabled: bool, values: [u32; 2]) -> OverrideCache {
        OverrideCache {
            gamma: ChannelLutOverride {
                enabled,
                red: values.to_vec(),
                green: values.to_vec(),
                blue: values.to_vec(),
            },
            ..Default::default()
        }
    }

    fn other(tag: &str) -> HardwareConfigEntry {
        HardwareConfigEntry::new(HwPayload::Other {
            tag: tag.to_string(),
            bytes: vec![0xAB],
        })
    }

    #[test]
    fn test_missing_entry_is_appended() {
        let cache = gamma_cache(true, [1, 2]);
        let mut dirty = DirtySet::default();
        dirty.mark(FeatureId::Gamma);
        let mut list = HwConfigList::from(vec![other("Dither")]);

        let report = merge_overrides(&mut dirty, &cache, &mut list);

        assert_eq!(report, MergeReport { overwritten: 0, inserted: 1 });
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.get(1).map(|e| e.payload()),
            Some(&HwPayload::Gamma(cache.gamma.clone()))
        );
        assert!(dirty.is_empty());
    }

    #[test]
    fn test_existing_entry_is_overwritten_in_place() {
        let cache = gamma_cache(true, [7, 8]);
        let mut dirty = DirtySet::default();
        dirty.mark(FeatureId::Gamma);
        let mut list = HwConfigList::from(vec![
            other("Dither"),
            HardwareConfigEntry::new(HwPayload::Gamma(ChannelLutOverride::default())),
            other("ToneMap"),
        ]);
        let before = list.clone();

        let report = merge_overrides(&mut dirty, &cache, &mut list);

        assert_eq!(report, MergeReport { overwritten: 1, inserted: 0 });
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0), before.get(0));
        assert_eq!(list.get(2), before.get(2));
        assert_eq!(
            list.get(1).map(|e| e.payload()),
            Some(&HwPayload::Gamma(cache.gamma.clone()))
        );
    }

    #[test]
    fn test_raw_entry_with_feature_tag_is_overwritten() {
        let cache = gamma_cache(true, [5, 6]);
        let mut dirty = DirtySet::default();
        dirty.mark(FeatureId::Gamma);
        let mut list = HwConfigList::from(vec![other("PostBlendGc"), other("Dither")]);

        let report = merge_overrides(&mut dirty, &cache, &mut list);

        assert_eq!(report, MergeReport { overwritten: 1, inserted: 0 });
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.get(0).map(|e| e.payload()),
            Some(&HwPayload::Gamma(cache.gamma.clone()))
        );
        assert_eq!(list.get(1).map(|e| e.payload().tag()), Some("Dither"));
    }

    #[test]
    fn test_second_merge_is_noop() {
        let cache = gamma_cache(true, [1, 2]);
        let mut dirty = DirtySet::default();
        dirty.mark(FeatureId::Gamma);
        let mut list = HwConfigList::new();

        merge_overrides(&mut dirty, &cache, &mut list);
        let after_first = list.clone();
        let report = merge_overrides(&mut dirty, &cache, &mut list);

        assert_eq!(report, MergeReport::default());
        assert_eq!(list, after_first);
    }

    #[test]
    fn test_duplicate_marks_upsert_once() {
        let cache = gamma_cache(false, [3, 4]);
        let mut dirty = DirtySet::default();
        dirty.mark(FeatureId::Gamma);
        dirty.mark(FeatureId::Gamma);
        let mut list = HwConfigList::new();

        let report = merge_overrides(&mut dirty, &cache, &mut list);

        assert_eq!(report, MergeReport { overwritten: 1, inserted: 1 });
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_enabled_flag_asymmetry() {
        let cache = OverrideCache::default();
        let mut dirty = DirtySet::default();
        for &feature in FeatureId::all() {
            dirty.mark(feature);
        }
        let mut list = HwConfigList::new();

        merge_overrides(&mut dirty, &cache, &mut list);

        for entry in list.iter() {
            match entry.payload() {
                HwPayload::ColorCorrection(pcc) => assert!(pcc.enabled),
                HwPayload::Gamut(gamut) => assert!(gamut.enabled),
                HwPayload::Gamma(lut) | HwPayload::InverseGamma(lut) => assert!(!lut.enabled),
                HwPayload::Other { .. } => unreachable!(),
            }
        }
        assert_eq!(list.len(), 4);
    }
}
