//! Filter whitelist engine.
//!
//! Owns the current [`AllowedFilterSet`] and applies filters through a
//! [`TransformRegistry`]. The set is published as an `Arc` behind a
//! read/write lock: a rebuild computes the new set first and swaps the
//! pointer, so readers see either the old set or the new one in full.

use std::sync::Arc;

use filterbot_core::{AllowedFilterSet, FilterResult};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::Result;
use crate::transform::TransformRegistry;

/// Decides which filters may run and runs them.
pub struct FilterWhitelist {
    registry: Arc<dyn TransformRegistry>,
    allowed: RwLock<Arc<AllowedFilterSet>>,
    /// Serializes rebuilds; readers never take it.
    writer: Mutex<()>,
}

impl FilterWhitelist {
    /// Create an engine that allows nothing until [`rebuild`](Self::rebuild)
    /// is called.
    #[must_use]
    pub fn new(registry: Arc<dyn TransformRegistry>) -> Self {
        Self {
            registry,
            allowed: RwLock::new(Arc::new(AllowedFilterSet::default())),
            writer: Mutex::new(()),
        }
    }

    /// Create an engine and build its set from `whitelist`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Registry` if the registry cannot list its filters.
    pub fn with_whitelist(registry: Arc<dyn TransformRegistry>, whitelist: &str) -> Result<Self> {
        let engine = Self::new(registry);
        engine.rebuild(whitelist)?;
        Ok(engine)
    }

    /// Rebuild the allowed set from a comma-separated whitelist and the
    /// registry's current filter names, then publish it.
    ///
    /// On error the previously published set stays in force. Concurrent
    /// rebuilds run one at a time.
    ///
    /// # Errors
    ///
    /// Returns `Error::Registry` if the registry cannot list its filters.
    pub fn rebuild(&self, whitelist: &str) -> Result<Arc<AllowedFilterSet>> {
        let _writer = self.writer.lock();
        let known = self.registry.known_transforms().inspect_err(|e| {
            warn!(error = %e, "Filter whitelist: registry unavailable, keeping current set");
        })?;

        let set = Arc::new(AllowedFilterSet::from_whitelist(whitelist, &known));
        *self.allowed.write() = Arc::clone(&set);

        info!(
            whitelist = %whitelist,
            known = known.len(),
            allowed = set.len(),
            "Filter whitelist rebuilt"
        );
        Ok(set)
    }

    /// Snapshot of the currently published set.
    #[must_use]
    pub fn allowed(&self) -> Arc<AllowedFilterSet> {
        Arc::clone(&self.allowed.read())
    }

    /// Whether `filter` may run under the current set.
    #[must_use]
    pub fn is_allowed(&self, filter: &str) -> bool {
        self.allowed().permits(filter)
    }

    /// Allowed filter names, sorted.
    #[must_use]
    pub fn list_allowed(&self) -> Vec<String> {
        self.allowed().names().map(str::to_string).collect()
    }

    /// Run `filter` over `payload` if the whitelist permits it.
    ///
    /// Never fails: denial and registry errors are reported as
    /// [`FilterResult::Denied`] and [`FilterResult::ApplyFailed`].
    pub fn apply(&self, filter: &str, payload: &[u8]) -> FilterResult {
        if !self.is_allowed(filter) {
            debug!(filter = %filter, "Filter request denied by whitelist");
            return FilterResult::Denied {
                filter: filter.to_string(),
            };
        }

        match self.registry.execute(filter, payload) {
            Ok(output) => {
                debug!(
                    filter = %filter,
                    input = payload.len(),
                    output = output.len(),
                    "Filter applied"
                );
                FilterResult::Applied {
                    filter: filter.to_string(),
                    output,
                }
            }
            Err(e) => {
                warn!(filter = %filter, error = %e, "Filter failed");
                FilterResult::ApplyFailed {
                    filter: filter.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for FilterWhitelist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterWhitelist")
            .field("allowed", &self.allowed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use filterbot_core::DEFAULT_WHITELIST;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Error;
    use crate::transform::{StandardRegistry, TransformError};

    /// Wraps the standard registry, counting executions and optionally
    /// failing to list names.
    #[derive(Default)]
    struct ProbeRegistry {
        inner: StandardRegistry,
        executions: AtomicUsize,
        offline: AtomicBool,
    }

    impl TransformRegistry for ProbeRegistry {
        fn known_transforms(&self) -> std::result::Result<BTreeSet<String>, TransformError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(TransformError::Unavailable("registry offline".into()));
            }
            self.inner.known_transforms()
        }

        fn execute(
            &self,
            name: &str,
            input: &[u8],
        ) -> std::result::Result<Vec<u8>, TransformError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(name, input)
        }
    }

    fn default_engine() -> FilterWhitelist {
        FilterWhitelist::with_whitelist(Arc::new(StandardRegistry::new()), DEFAULT_WHITELIST)
            .unwrap()
    }

    fn applied(filter: &str, output: &str) -> FilterResult {
        FilterResult::Applied {
            filter: filter.to_string(),
            output: output.as_bytes().to_vec(),
        }
    }

    #[test]
    fn default_whitelist_lists_single_segment_filters() {
        let engine = default_engine();
        assert_eq!(
            engine.list_allowed(),
            vec![
                "convert.*",
                "string.rot13",
                "string.strip_tags",
                "string.tolower",
                "string.toupper",
            ]
        );
    }

    #[test]
    fn base64_round_trip() {
        let engine = default_engine();
        assert_eq!(
            engine.apply("convert.base64-encode", b"PHP"),
            applied("convert.base64-encode", "UEhQ")
        );
        assert_eq!(
            engine.apply("convert.base64-decode", b"UEhQ"),
            applied("convert.base64-decode", "PHP")
        );
    }

    #[test]
    fn rot13_twice_is_identity() {
        let engine = default_engine();
        assert_eq!(engine.apply("string.rot13", b"PHP"), applied("string.rot13", "CUC"));
        assert_eq!(engine.apply("string.rot13", b"CUC"), applied("string.rot13", "PHP"));
    }

    #[test]
    fn denied_filters_never_reach_the_registry() {
        // GIVEN: an engine over a counting registry
        let registry = Arc::new(ProbeRegistry::default());
        let engine = FilterWhitelist::with_whitelist(registry.clone(), DEFAULT_WHITELIST).unwrap();
        // WHEN: a filter outside the whitelist is requested
        let result = engine.apply("surely.this.does.not.exist", b"!!");
        // THEN: it is denied and nothing ran
        assert_eq!(
            result,
            FilterResult::Denied {
                filter: "surely.this.does.not.exist".into()
            }
        );
        assert_eq!(registry.executions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn known_but_unlisted_filters_are_denied() {
        let engine = default_engine();
        assert!(!engine.is_allowed("dechunk"));
        assert!(!engine.is_allowed("convert.iconv.utf-8/ascii"));
        assert!(matches!(
            engine.apply("convert.iconv.utf-8/ascii", b"x"),
            FilterResult::Denied { .. }
        ));
    }

    #[test]
    fn compression_families_are_outside_the_default_whitelist() {
        // GIVEN: the standard registry, which reports zlib.*, bzip2.* and consumed
        let engine = default_engine();
        // WHEN / THEN: none of them is admitted by "string.*,convert.*"
        for name in ["zlib.*", "zlib.deflate", "bzip2.compress", "consumed"] {
            assert!(!engine.is_allowed(name), "{name} should be denied");
        }
        assert!(!engine.list_allowed().iter().any(|n| n.starts_with("zlib")));
    }

    #[test]
    fn whitelisted_compression_round_trips() {
        let engine =
            FilterWhitelist::with_whitelist(Arc::new(StandardRegistry::new()), "zlib.*, consumed")
                .unwrap();
        assert_eq!(engine.list_allowed(), vec!["consumed", "zlib.*"]);

        let packed = engine
            .apply("zlib.deflate", b"hello hello hello")
            .output()
            .map(<[u8]>::to_vec)
            .unwrap();
        assert_eq!(
            engine.apply("zlib.inflate", &packed),
            applied("zlib.inflate", "hello hello hello")
        );
        assert_eq!(engine.apply("consumed", b"same"), applied("consumed", "same"));
    }

    #[test]
    fn permitted_but_unrunnable_filters_fail_softly() {
        let engine = default_engine();
        match engine.apply("convert.base64-decode", b"!!") {
            FilterResult::ApplyFailed { filter, reason } => {
                assert_eq!(filter, "convert.base64-decode");
                assert!(reason.starts_with("invalid base64 input"), "{reason}");
            }
            other => panic!("expected ApplyFailed, got {other:?}"),
        }
        assert_eq!(
            engine.apply("convert.nonexistent", b"x"),
            FilterResult::ApplyFailed {
                filter: "convert.nonexistent".into(),
                reason: "unknown filter: convert.nonexistent".into(),
            }
        );
    }

    #[test]
    fn empty_whitelist_denies_everything() {
        let engine =
            FilterWhitelist::with_whitelist(Arc::new(StandardRegistry::new()), " , ").unwrap();
        assert!(engine.list_allowed().is_empty());
        assert!(!engine.is_allowed("string.rot13"));
    }

    #[test]
    fn new_engine_allows_nothing_before_first_rebuild() {
        let engine = FilterWhitelist::new(Arc::new(StandardRegistry::new()));
        assert!(!engine.is_allowed("string.rot13"));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let engine = default_engine();
        let first = engine.rebuild(DEFAULT_WHITELIST).unwrap();
        let second = engine.rebuild(DEFAULT_WHITELIST).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            second.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn rebuild_replaces_the_whole_set() {
        let engine = default_engine();
        engine.rebuild("dechunk").unwrap();
        assert_eq!(engine.list_allowed(), vec!["dechunk"]);
        assert!(!engine.is_allowed("string.rot13"));
    }

    #[test]
    fn registry_failure_keeps_previous_set() {
        // GIVEN: an engine built while the registry was reachable
        let registry = Arc::new(ProbeRegistry::default());
        let engine = FilterWhitelist::with_whitelist(registry.clone(), DEFAULT_WHITELIST).unwrap();
        // WHEN: the registry goes offline and a rebuild is attempted
        registry.offline.store(true, Ordering::SeqCst);
        let err = engine.rebuild("dechunk").unwrap_err();
        // THEN: the error surfaces and the old set is still published
        assert!(matches!(err, Error::Registry(TransformError::Unavailable(_))));
        assert!(engine.is_allowed("string.rot13"));
        assert!(!engine.is_allowed("dechunk"));
    }

    #[test]
    fn snapshots_survive_rebuilds() {
        let engine = default_engine();
        let before = engine.allowed();
        engine.rebuild("dechunk").unwrap();
        assert!(before.contains("string.rot13"));
        assert!(!engine.allowed().contains("string.rot13"));
    }

    #[test]
    fn concurrent_rebuilds_publish_one_complete_set() {
        let engine = Arc::new(default_engine());
        std::thread::scope(|scope| {
            for whitelist in ["dechunk", DEFAULT_WHITELIST, "zlib.*"] {
                let engine = Arc::clone(&engine);
                scope.spawn(move || {
                    for _ in 0..100 {
                        engine.rebuild(whitelist).unwrap();
                    }
                });
            }
        });
        let last = engine.list_allowed();
        assert!(
            last == vec!["dechunk"]
                || last == vec!["zlib.*"]
                || (last.len() == 5
                    && last
                        .iter()
                        .all(|n| n.starts_with("convert.") || n.starts_with("string."))),
            "unexpected final set: {last:?}"
        );
    }

    #[test]
    fn concurrent_readers_see_complete_sets() {
        let engine = Arc::new(default_engine());
        let old: Vec<String> = engine.list_allowed();
        let new = vec!["dechunk".to_string()];

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let engine = Arc::clone(&engine);
                let (old, new) = (&old, &new);
                scope.spawn(move || {
                    for _ in 0..500 {
                        let seen = engine.list_allowed();
                        assert!(&seen == old || &seen == new, "partial set observed: {seen:?}");
                    }
                });
            }
            for i in 0..200 {
                let whitelist = if i % 2 == 0 { "dechunk" } else { DEFAULT_WHITELIST };
                engine.rebuild(whitelist).unwrap();
            }
        });
    }
}
