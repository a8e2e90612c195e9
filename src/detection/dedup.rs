//! Time-windowed suppression of repeated detections
//!
//! A decoder looking at a barcode that does not move reports it on every
//! frame. The deduplicator only lets a result through when its
//! `(text, symbology)` identity has not been emitted since the last full
//! refresh. Once `refresh_interval` has elapsed, the whole current batch is
//! announced again and becomes the new tracked set.
//!
//! Tracked identities are kept in emission order with a counted hash index
//! next to them, so membership checks are O(1) instead of the linear scan of
//! a plain list. Observable behaviour is the same either way.

use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use crate::detection::types::{BarcodeResult, Symbology};
use crate::DedupConfig;

/// Wall-clock instant with whole-second granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(secs)
    }

    pub const fn secs(self) -> u64 {
        self.0
    }

    /// Seconds since `earlier`, zero if the clock went backwards
    pub fn since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Identity of an emitted result. Location is deliberately left out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupEntry {
    pub text: String,
    pub symbology: Symbology,
}

impl From<&BarcodeResult> for DedupEntry {
    fn from(result: &BarcodeResult) -> Self {
        Self {
            text: result.text.clone(),
            symbology: result.symbology,
        }
    }
}

/// Which branch a reconcile call took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    FullRefresh,
    Incremental,
}

#[derive(Debug)]
pub struct Deduplicator {
    refresh_interval: u64,
    max_tracked: usize,
    last_emitted: VecDeque<DedupEntry>,
    index: HashMap<DedupEntry, usize>,
    last_emission: Option<Timestamp>,
}

impl Deduplicator {
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval_secs,
            max_tracked: config.max_tracked.max(1),
            last_emitted: VecDeque::new(),
            index: HashMap::new(),
            last_emission: None,
        }
    }

    /// Mode the next non-empty batch at `now` would be reconciled in
    pub fn mode_at(&self, now: Timestamp) -> ReconcileMode {
        match self.last_emission {
            Some(last) if now.since(last) < self.refresh_interval => ReconcileMode::Incremental,
            _ => ReconcileMode::FullRefresh,
        }
    }

    /// Return the part of `batch` that should be reported and record it.
    ///
    /// An empty batch changes nothing. Identities are compared against the
    /// tracked set as it was before this call, so a batch carrying the same
    /// barcode twice reports both copies.
    pub fn reconcile(&mut self, batch: &[BarcodeResult], now: Timestamp) -> Vec<BarcodeResult> {
        if batch.is_empty() {
            return Vec::new();
        }

        match self.mode_at(now) {
            ReconcileMode::FullRefresh => {
                debug!(
                    count = batch.len(),
                    previous = self.last_emitted.len(),
                    "Full refresh of tracked barcodes"
                );
                self.clear_tracked();
                for result in batch {
                    self.track(DedupEntry::from(result));
                }
                self.last_emission = Some(now);
                self.enforce_cap();
                batch.to_vec()
            }
            ReconcileMode::Incremental => {
                let fresh: Vec<BarcodeResult> = batch
                    .iter()
                    .filter(|result| !self.index.contains_key(&DedupEntry::from(*result)))
                    .cloned()
                    .collect();

                trace!(
                    seen = batch.len(),
                    fresh = fresh.len(),
                    "Incremental reconcile"
                );

                for result in &fresh {
                    self.track(DedupEntry::from(result));
                }
                self.enforce_cap();
                fresh
            }
        }
    }

    pub fn is_tracked(&self, text: &str, symbology: Symbology) -> bool {
        self.index.contains_key(&DedupEntry {
            text: text.to_string(),
            symbology,
        })
    }

    /// Tracked identities in emission order
    pub fn tracked(&self) -> impl Iterator<Item = &DedupEntry> {
        self.last_emitted.iter()
    }

    pub fn tracked_len(&self) -> usize {
        self.last_emitted.len()
    }

    pub fn last_emission(&self) -> Option<Timestamp> {
        self.last_emission
    }

    /// Forget everything; the next batch is a full refresh
    pub fn reset(&mut self) {
        self.clear_tracked();
        self.last_emission = None;
    }

    fn clear_tracked(&mut self) {
        self.last_emitted.clear();
        self.index.clear();
    }

    fn track(&mut self, entry: DedupEntry) {
        *self.index.entry(entry.clone()).or_insert(0) += 1;
        self.last_emitted.push_back(entry);
    }

    fn enforce_cap(&mut self) {
        let excess = self.last_emitted.len().saturating_sub(self.max_tracked);
        if excess == 0 {
            return;
        }

        warn!(
            evicted = excess,
            limit = self.max_tracked,
            "Tracked barcode list over limit, evicting oldest"
        );
        for entry in self.last_emitted.drain(..excess) {
            if let Some(count) = self.index.get_mut(&entry) {
                *count -= 1;
                if *count == 0 {
                    self.index.remove(&entry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::Quad;

    fn result(text: &str, symbology: Symbology) -> BarcodeResult {
        BarcodeResult::new(text, symbology, Quad::rect(0, 0, 10, 10))
    }

    fn dedup() -> Deduplicator {
        Deduplicator::new(&DedupConfig::default())
    }

    fn texts(results: &[BarcodeResult]) -> Vec<&str> {
        results.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn first_batch_is_full_refresh() {
        let mut dedup = dedup();
        let batch = vec![result("ABC123", Symbology::QrCode)];

        assert_eq!(dedup.mode_at(Timestamp::from_secs(0)), ReconcileMode::FullRefresh);
        let emitted = dedup.reconcile(&batch, Timestamp::from_secs(0));

        assert_eq!(emitted, batch);
        assert_eq!(dedup.last_emission(), Some(Timestamp::from_secs(0)));
        assert_eq!(dedup.tracked_len(), 1);
        assert!(dedup.is_tracked("ABC123", Symbology::QrCode));
    }

    #[test]
    fn repeat_inside_window_is_suppressed() {
        let mut dedup = dedup();
        let batch = vec![result("ABC123", Symbology::QrCode)];
        dedup.reconcile(&batch, Timestamp::from_secs(0));

        assert!(dedup.reconcile(&batch, Timestamp::from_secs(1)).is_empty());
        assert_eq!(dedup.last_emission(), Some(Timestamp::from_secs(0)));
    }

    #[test]
    fn only_new_identities_pass_inside_window() {
        let mut dedup = dedup();
        dedup.reconcile(&[result("ABC123", Symbology::QrCode)], Timestamp::from_secs(0));

        let batch = vec![
            result("ABC123", Symbology::QrCode),
            result("XYZ", Symbology::Ean13),
        ];
        let emitted = dedup.reconcile(&batch, Timestamp::from_secs(1));

        assert_eq!(texts(&emitted), vec!["XYZ"]);
        assert_eq!(emitted[0].symbology, Symbology::Ean13);
        assert_eq!(dedup.tracked_len(), 2);
        assert_eq!(dedup.last_emission(), Some(Timestamp::from_secs(0)));
    }

    #[test]
    fn refresh_interval_reannounces() {
        let mut dedup = dedup();
        let batch = vec![result("ABC123", Symbology::QrCode)];
        dedup.reconcile(&batch, Timestamp::from_secs(0));
        dedup.reconcile(&batch, Timestamp::from_secs(1));

        let emitted = dedup.reconcile(&batch, Timestamp::from_secs(3));
        assert_eq!(emitted, batch);
        assert_eq!(dedup.last_emission(), Some(Timestamp::from_secs(3)));
    }

    #[test]
    fn refresh_boundary_is_inclusive() {
        let mut dedup = dedup();
        let batch = vec![result("A", Symbology::Code128)];
        dedup.reconcile(&batch, Timestamp::from_secs(10));
        assert_eq!(dedup.mode_at(Timestamp::from_secs(11)), ReconcileMode::Incremental);
        assert_eq!(dedup.mode_at(Timestamp::from_secs(12)), ReconcileMode::FullRefresh);
    }

    #[test]
    fn full_refresh_replaces_tracked_set() {
        let mut dedup = dedup();
        dedup.reconcile(&[result("OLD", Symbology::QrCode)], Timestamp::from_secs(0));
        dedup.reconcile(&[result("NEWER", Symbology::QrCode)], Timestamp::from_secs(1));

        dedup.reconcile(&[result("LATEST", Symbology::Ean8)], Timestamp::from_secs(5));

        let tracked: Vec<_> = dedup.tracked().map(|e| e.text.as_str()).collect();
        assert_eq!(tracked, vec!["LATEST"]);
        assert!(!dedup.is_tracked("OLD", Symbology::QrCode));
    }

    #[test]
    fn empty_batch_changes_nothing() {
        let mut dedup = dedup();
        assert!(dedup.reconcile(&[], Timestamp::from_secs(0)).is_empty());
        assert_eq!(dedup.last_emission(), None);

        dedup.reconcile(&[result("A", Symbology::QrCode)], Timestamp::from_secs(0));
        assert!(dedup.reconcile(&[], Timestamp::from_secs(9)).is_empty());
        assert_eq!(dedup.last_emission(), Some(Timestamp::from_secs(0)));
        assert_eq!(dedup.tracked_len(), 1);
    }

    #[test]
    fn symbology_is_part_of_identity() {
        let mut dedup = dedup();
        dedup.reconcile(&[result("123", Symbology::Ean13)], Timestamp::from_secs(0));
        let emitted = dedup.reconcile(&[result("123", Symbology::UpcA)], Timestamp::from_secs(1));
        assert_eq!(emitted.len(), 1);
    }

    #[test]
    fn location_is_not_part_of_identity() {
        let mut dedup = dedup();
        dedup.reconcile(&[result("A", Symbology::QrCode)], Timestamp::from_secs(0));
        let moved = BarcodeResult::new("A", Symbology::QrCode, Quad::rect(3, 3, 12, 12));
        assert!(dedup.reconcile(&[moved], Timestamp::from_secs(1)).is_empty());
    }

    #[test]
    fn duplicates_inside_one_batch_are_kept() {
        let mut dedup = dedup();
        dedup.reconcile(&[result("SEED", Symbology::QrCode)], Timestamp::from_secs(0));

        let batch = vec![result("B", Symbology::QrCode), result("B", Symbology::QrCode)];
        let emitted = dedup.reconcile(&batch, Timestamp::from_secs(1));
        assert_eq!(emitted.len(), 2);
        assert_eq!(dedup.tracked_len(), 3);
    }

    #[test]
    fn incremental_mode_accumulates_union() {
        let mut dedup = dedup();
        dedup.reconcile(&[result("A", Symbology::QrCode)], Timestamp::from_secs(100));
        dedup.reconcile(
            &[result("B", Symbology::QrCode), result("A", Symbology::QrCode)],
            Timestamp::from_secs(100),
        );
        dedup.reconcile(
            &[result("C", Symbology::DataMatrix), result("B", Symbology::QrCode)],
            Timestamp::from_secs(101),
        );

        let tracked: Vec<_> = dedup.tracked().map(|e| e.text.as_str()).collect();
        assert_eq!(tracked, vec!["A", "B", "C"]);
    }

    #[test]
    fn clock_going_backwards_stays_incremental() {
        let mut dedup = dedup();
        dedup.reconcile(&[result("A", Symbology::QrCode)], Timestamp::from_secs(50));
        assert!(dedup
            .reconcile(&[result("A", Symbology::QrCode)], Timestamp::from_secs(40))
            .is_empty());
    }

    #[test]
    fn cap_evicts_oldest() {
        let mut dedup = Deduplicator::new(&DedupConfig {
            refresh_interval_secs: 2,
            max_tracked: 2,
        });
        dedup.reconcile(&[result("A", Symbology::QrCode)], Timestamp::from_secs(0));
        dedup.reconcile(&[result("B", Symbology::QrCode)], Timestamp::from_secs(0));
        dedup.reconcile(&[result("C", Symbology::QrCode)], Timestamp::from_secs(1));

        assert_eq!(dedup.tracked_len(), 2);
        assert!(!dedup.is_tracked("A", Symbology::QrCode));
        assert!(dedup.is_tracked("C", Symbology::QrCode));
    }

    #[test]
    fn reset_forces_full_refresh() {
        let mut dedup = dedup();
        let batch = vec![result("A", Symbology::QrCode)];
        dedup.reconcile(&batch, Timestamp::from_secs(0));
        dedup.reset();
        assert_eq!(dedup.reconcile(&batch, Timestamp::from_secs(0)), batch);
    }
}
