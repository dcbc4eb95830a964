//! Features whose cached override changed since the last merge.

use crate::feature::FeatureId;

/// Pending features awaiting a merge into the hardware-config list.
///
/// Duplicate markings are kept; merging the same feature twice rewrites the
/// same entry with the same content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    pending: Vec<FeatureId>,
}

impl DirtySet {
    /// Mark a feature as changed.
    pub fn mark(&mut self, feature: FeatureId) {
        tracing::debug!("Marking {feature} dirty");
        self.pending.push(feature);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, feature: FeatureId) -> bool {
        self.pending.contains(&feature)
    }

    /// Remove and return every pending feature.
    pub fn drain(&mut self) -> Vec<FeatureId> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_set() {
        let mut dirty = DirtySet::default();
        dirty.mark(FeatureId::Gamma);
        dirty.mark(FeatureId::Gamma);
        dirty.mark(FeatureId::Gamut);

        assert_eq!(dirty.len(), 3);
        assert!(dirty.contains(FeatureId::Gamut));
        assert!(!dirty.contains(FeatureId::ColorCorrection));

        let drained = dirty.drain();
        assert_eq!(drained, vec![FeatureId::Gamma, FeatureId::Gamma, FeatureId::Gamut]);
        assert!(dirty.is_empty());
    }
}
