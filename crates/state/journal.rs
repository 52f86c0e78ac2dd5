//! Append-only change log with O(1) snapshots and O(k) rollback.
//!
//! The journal records every state mutation during execution. A snapshot is
//! just the position of the current tail; rolling back truncates everything
//! past it. Entries tagged [`ChangeTag::JustCache`] record read-only cache
//! population rather than mutations, so they survive rollback: the mutation
//! never happened logically, but the observation of the underlying value is
//! still correct afterwards.

/// Position of an entry inside a journal.
pub type JournalPosition = usize;

/// Snapshot of a journal that has no entries yet.
pub const EMPTY_POSITION: JournalPosition = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTag {
    /// A read populated a cache; not a mutation.
    JustCache,
    Update,
    Create,
    Delete,
    /// The account was touched without a value change (EIP-161 bookkeeping).
    Touch,
}

/// One recorded change. `value` holds the post-state of the key and is `None`
/// only for [`ChangeTag::Delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry<K, V> {
    pub key: K,
    pub value: Option<V>,
    pub tag: ChangeTag,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JournalError {
    #[error("Snapshot position {snapshot} is past the journal tail (length {len})")]
    InvalidSnapshot { snapshot: JournalPosition, len: usize },
}

#[derive(Debug, Clone)]
pub struct Journal<K, V> {
    entries: Vec<JournalEntry<K, V>>,
}

impl<K, V> Default for Journal<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Journal<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry<K, V>> {
        self.entries.iter()
    }

    /// Appends an entry and returns its position.
    pub fn append(&mut self, entry: JournalEntry<K, V>) -> JournalPosition {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn record(&mut self, key: K, value: Option<V>, tag: ChangeTag) -> JournalPosition {
        self.append(JournalEntry { key, value, tag })
    }

    /// Position of the last entry, or [`EMPTY_POSITION`] for an empty journal.
    pub fn take_snapshot(&self) -> JournalPosition {
        match self.entries.len() {
            0 => EMPTY_POSITION,
            len => len - 1,
        }
    }

    /// Rolls the journal back so only positions `[0..=snapshot]` remain.
    ///
    /// `JustCache` entries found past the snapshot are re-appended in their
    /// original relative order instead of being dropped. The discarded
    /// non-`JustCache` entries are returned in their original order so the
    /// caller can invalidate derived caches.
    pub fn restore(
        &mut self,
        snapshot: JournalPosition,
    ) -> Result<Vec<JournalEntry<K, V>>, JournalError> {
        let keep = self.cut_point(snapshot).ok_or_else(|| {
            debug_assert!(false, "restore past journal tail: {snapshot}");
            JournalError::InvalidSnapshot {
                snapshot,
                len: self.entries.len(),
            }
        })?;

        let tail = self.entries.split_off(keep);
        let mut discarded = Vec::new();
        for entry in tail {
            if entry.tag == ChangeTag::JustCache {
                self.entries.push(entry);
            } else {
                discarded.push(entry);
            }
        }
        Ok(discarded)
    }

    /// Delivers every entry past `snapshot` to the sink in ascending order,
    /// then truncates the journal to `snapshot + 1` entries.
    ///
    /// [`EMPTY_POSITION`] commits the whole journal; a snapshot at or past the
    /// tail is a no-op.
    pub fn commit<F>(&mut self, snapshot: JournalPosition, mut on_commit: F)
    where
        F: FnMut(&JournalEntry<K, V>),
    {
        let Some(keep) = self.cut_point(snapshot) else {
            return;
        };
        for entry in &self.entries[keep..] {
            on_commit(entry);
        }
        self.entries.truncate(keep);
    }

    /// Truncates to empty; capacity is retained.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries to keep for `snapshot`, or `None` when the snapshot
    /// is non-sentinel and past the tail.
    fn cut_point(&self, snapshot: JournalPosition) -> Option<usize> {
        match snapshot {
            EMPTY_POSITION => Some(0),
            pos if pos < self.entries.len() => Some(pos + 1),
            _ => None,
        }
    }
}

impl<K: PartialEq, V> Journal<K, V> {
    /// Most recent entry recorded for `key`, if any.
    pub fn latest_for(&self, key: &K) -> Option<&JournalEntry<K, V>> {
        self.entries.iter().rev().find(|entry| &entry.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: u32, value: u32, tag: ChangeTag) -> JournalEntry<u32, u32> {
        JournalEntry {
            key,
            value: Some(value),
            tag,
        }
    }

    #[test]
    fn append_returns_monotonic_positions() {
        let mut journal = Journal::new();
        assert_eq!(journal.take_snapshot(), EMPTY_POSITION);
        assert_eq!(journal.append(entry(1, 10, ChangeTag::Update)), 0);
        assert_eq!(journal.append(entry(2, 20, ChangeTag::Create)), 1);
        assert_eq!(journal.take_snapshot(), 1);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn restore_truncates_and_preserves_cache_reads() {
        let mut journal = Journal::new();
        journal.append(entry(1, 10, ChangeTag::Update));
        let snapshot = journal.take_snapshot();
        journal.append(entry(2, 20, ChangeTag::JustCache));
        journal.append(entry(1, 11, ChangeTag::Update));
        journal.append(entry(3, 30, ChangeTag::JustCache));
        journal.append(entry(2, 21, ChangeTag::Delete));

        let discarded = journal.restore(snapshot).unwrap();

        // Mutations come back in original order, cache reads stay.
        assert_eq!(
            discarded,
            vec![entry(1, 11, ChangeTag::Update), entry(2, 21, ChangeTag::Delete)]
        );
        let kept: Vec<_> = journal.iter().cloned().collect();
        assert_eq!(
            kept,
            vec![
                entry(1, 10, ChangeTag::Update),
                entry(2, 20, ChangeTag::JustCache),
                entry(3, 30, ChangeTag::JustCache),
            ]
        );
    }

    #[test]
    fn restore_to_empty_position_keeps_every_cache_read() {
        let mut journal = Journal::new();
        journal.append(entry(1, 10, ChangeTag::JustCache));
        journal.append(entry(1, 11, ChangeTag::Update));
        journal.append(entry(2, 20, ChangeTag::JustCache));

        let discarded = journal.restore(EMPTY_POSITION).unwrap();

        assert_eq!(discarded, vec![entry(1, 11, ChangeTag::Update)]);
        let kept: Vec<_> = journal.iter().cloned().collect();
        assert_eq!(
            kept,
            vec![
                entry(1, 10, ChangeTag::JustCache),
                entry(2, 20, ChangeTag::JustCache),
            ]
        );
    }

    #[test]
    fn restore_to_tail_is_a_no_op() {
        let mut journal = Journal::new();
        journal.append(entry(1, 10, ChangeTag::Update));
        let snapshot = journal.take_snapshot();
        assert_eq!(journal.restore(snapshot).unwrap(), vec![]);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn restore_past_tail_fails() {
        let mut journal: Journal<u32, u32> = Journal::new();
        journal.append(entry(1, 10, ChangeTag::Update));
        let result = std::panic::catch_unwind(move || journal.restore(5));
        // Loud in debug builds, a recoverable error in release.
        if let Ok(inner) = result {
            assert_eq!(inner, Err(JournalError::InvalidSnapshot { snapshot: 5, len: 1 }));
        }
    }

    #[test]
    fn commit_delivers_entries_in_order_then_truncates() {
        let mut journal = Journal::new();
        journal.append(entry(1, 10, ChangeTag::Update));
        let snapshot = journal.take_snapshot();
        journal.append(entry(2, 20, ChangeTag::JustCache));
        journal.append(entry(1, 11, ChangeTag::Update));

        let mut committed = Vec::new();
        journal.commit(snapshot, |e| committed.push(e.clone()));

        assert_eq!(
            committed,
            vec![entry(2, 20, ChangeTag::JustCache), entry(1, 11, ChangeTag::Update)]
        );
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn commit_of_whole_journal_and_commit_past_tail() {
        let mut journal = Journal::new();
        let mut committed = 0;
        journal.commit(EMPTY_POSITION, |_: &JournalEntry<u32, u32>| committed += 1);
        assert_eq!(committed, 0);

        journal.append(entry(1, 10, ChangeTag::Update));
        journal.append(entry(2, 20, ChangeTag::Update));

        // Past the tail: no-op.
        journal.commit(7, |_| committed += 1);
        assert_eq!(committed, 0);
        assert_eq!(journal.len(), 2);

        journal.commit(EMPTY_POSITION, |_| committed += 1);
        assert_eq!(committed, 2);
        assert!(journal.is_empty());
        assert_eq!(journal.take_snapshot(), EMPTY_POSITION);
    }

    #[test]
    fn latest_for_finds_most_recent_entry() {
        let mut journal = Journal::new();
        journal.append(entry(1, 10, ChangeTag::Update));
        journal.append(entry(2, 20, ChangeTag::Update));
        journal.append(entry(1, 11, ChangeTag::JustCache));

        assert_eq!(journal.latest_for(&1), Some(&entry(1, 11, ChangeTag::JustCache)));
        assert_eq!(journal.latest_for(&2), Some(&entry(2, 20, ChangeTag::Update)));
        assert_eq!(journal.latest_for(&3), None);
    }

    #[test]
    fn clear_empties_the_journal() {
        let mut journal = Journal::new();
        journal.append(entry(1, 10, ChangeTag::Update));
        journal.clear();
        assert!(journal.is_empty());
        assert_eq!(journal.take_snapshot(), EMPTY_POSITION);
    }
}
