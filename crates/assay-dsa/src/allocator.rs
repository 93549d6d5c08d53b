use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use rand::Rng;

/// Per-group allocation counters: group -> resource label -> assignments made.
pub type GroupCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Balanced resource selection within a group.
///
/// ## Balance Bound
/// `select` always picks from the resources tied at the group's minimum count
/// and increments the winner in the same call. As long as calls are
/// serialized, every group keeps `max(count) - min(count) <= 1` over the
/// resource set it is asked about.
///
/// Counters only grow between resets. A group that was never allocated has no
/// entry at all (absent, not zero-filled).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupAllocator {
    counts: GroupCounts,
}

impl GroupAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the allocator from persisted counters.
    pub fn from_counts(counts: GroupCounts) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> &GroupCounts {
        &self.counts
    }

    /// Current count for `label` in `group`; absent entries read as zero.
    pub fn count(&self, group: &str, label: &str) -> u64 {
        self.counts
            .get(group)
            .and_then(|per| per.get(label))
            .copied()
            .unwrap_or(0)
    }

    /// Number of allocations made for `group` since the last clear.
    pub fn total(&self, group: &str) -> u64 {
        self.counts
            .get(group)
            .map(|per| per.values().sum())
            .unwrap_or(0)
    }

    /// Picks the least-assigned label for `group` and records the allocation.
    ///
    /// Ties at the minimum are broken uniformly with `rng`. Returns `None` only
    /// when `labels` is empty.
    pub fn select<R: Rng + ?Sized>(
        &mut self,
        group: &str,
        labels: &[String],
        rng: &mut R,
    ) -> Option<String> {
        if labels.is_empty() {
            return None;
        }

        let per = self.counts.entry(group.to_string()).or_default();
        for label in labels {
            per.entry(label.clone()).or_insert(0);
        }

        let min = labels.iter().map(|label| per[label]).min()?;
        let ties: Vec<&String> = labels.iter().filter(|label| per[*label] == min).collect();
        let choice = ties[rng.gen_range(0..ties.len())].clone();

        if let Some(count) = per.get_mut(&choice) {
            *count += 1;
        }
        Some(choice)
    }

    /// Spread between the most and least assigned label of `group`.
    pub fn spread(&self, group: &str, labels: &[String]) -> u64 {
        let counts = labels.iter().map(|label| self.count(group, label));
        let max = counts.clone().max().unwrap_or(0);
        let min = counts.min().unwrap_or(0);
        max - min
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
