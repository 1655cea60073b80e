use std::collections::BTreeMap;

use foundation::{FeatureId, SourceId};
use runtime::CancelToken;

/// Pending image-backed creations, one token per feature and source.
///
/// Beginning a new creation for a feature cancels the one still pending,
/// so at most one deferred object per feature can ever materialise.
#[derive(Debug, Default)]
pub struct ImageGate {
    tokens: BTreeMap<SourceId, BTreeMap<FeatureId, CancelToken>>,
}

impl ImageGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a deferred creation for `feature` and returns its token.
    pub fn begin(&mut self, source: SourceId, feature: FeatureId) -> CancelToken {
        let token = CancelToken::new();
        if let Some(previous) = self
            .tokens
            .entry(source)
            .or_default()
            .insert(feature, token.clone())
        {
            previous.cancel();
        }
        token
    }

    /// Cancels the pending creation of `feature`, if any.
    pub fn cancel(&mut self, source: SourceId, feature: FeatureId) -> bool {
        let Some(per_source) = self.tokens.get_mut(&source) else {
            return false;
        };
        let Some(token) = per_source.remove(&feature) else {
            return false;
        };
        token.cancel();
        if per_source.is_empty() {
            self.tokens.remove(&source);
        }
        true
    }

    /// Forgets the wait of `feature` once its image arrived. Only `token`
    /// itself is released; a newer wait of the same feature is kept.
    pub fn finish(&mut self, feature: FeatureId, token: &CancelToken) -> bool {
        let Some((&source, per_source)) = self
            .tokens
            .iter_mut()
            .find(|(_, m)| m.get(&feature).is_some_and(|t| t.same_as(token)))
        else {
            return false;
        };
        per_source.remove(&feature);
        if per_source.is_empty() {
            self.tokens.remove(&source);
        }
        true
    }

    /// Cancels everything pending for `source`. Returns how many tokens fired.
    pub fn clear(&mut self, source: SourceId) -> usize {
        let Some(per_source) = self.tokens.remove(&source) else {
            return 0;
        };
        for token in per_source.values() {
            token.cancel();
        }
        per_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn pending(&self, source: SourceId) -> usize {
        self.tokens.get(&source).map_or(0, |m| {
            m.values().filter(|t| !t.is_cancelled()).count()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ImageGate;
    use foundation::{FeatureId, SourceId};
    use runtime::CancelToken;

    #[test]
    fn restarting_cancels_the_previous_token() {
        let mut gate = ImageGate::new();
        let first = gate.begin(SourceId(1), FeatureId(7));
        let second = gate.begin(SourceId(1), FeatureId(7));
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(gate.pending(SourceId(1)), 1);
    }

    #[test]
    fn cancel_and_clear_fire_tokens() {
        let mut gate = ImageGate::new();
        let a = gate.begin(SourceId(1), FeatureId(1));
        let b = gate.begin(SourceId(1), FeatureId(2));
        let other = gate.begin(SourceId(2), FeatureId(1));

        assert!(gate.cancel(SourceId(1), FeatureId(1)));
        assert!(!gate.cancel(SourceId(1), FeatureId(1)));
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());

        assert_eq!(gate.clear(SourceId(1)), 1);
        assert!(b.is_cancelled());
        assert!(!other.is_cancelled());
        assert_eq!(gate.pending(SourceId(1)), 0);
        assert_eq!(gate.pending(SourceId(2)), 1);

        assert!(gate.cancel(SourceId(2), FeatureId(1)));
        assert!(gate.is_empty());
    }

    #[test]
    fn finished_waits_are_forgotten() {
        let mut gate = ImageGate::new();
        let first = gate.begin(SourceId(3), FeatureId(1));
        let second = gate.begin(SourceId(3), FeatureId(1));

        assert!(!gate.finish(FeatureId(1), &first));
        assert!(!gate.finish(FeatureId(1), &CancelToken::new()));
        assert_eq!(gate.pending(SourceId(3)), 1);

        assert!(gate.finish(FeatureId(1), &second));
        assert!(!second.is_cancelled());
        assert_eq!(gate.pending(SourceId(3)), 0);
        assert!(gate.is_empty());
    }
}
