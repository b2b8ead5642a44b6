use std::rc::Rc;
use tracing::debug;

use crate::storage::Storage;

pub const BOOKMARKS_KEY: &str = "bookmarkedJobIds";
pub const APPLIED_KEY: &str = "appliedJobIds";

/// A persisted set of job ids stored under one key.
///
/// Both candidate sets are global today. Keying them by user only needs a
/// different `key` here; callers go through the stores below.
pub struct JobIdSet {
    storage: Rc<Storage>,
    key: String,
    ids: Vec<i64>,
}

impl JobIdSet {
    pub fn load(storage: Rc<Storage>, key: &str) -> Self {
        let stored: Vec<i64> = storage.load(key, Vec::new());
        let mut ids = Vec::with_capacity(stored.len());
        for id in stored {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        debug!(key, count = ids.len(), "job id set loaded");
        Self { storage, key: key.to_string(), ids }
    }

    pub fn contains(&self, job_id: i64) -> bool {
        self.ids.contains(&job_id)
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Returns false if the id was already present.
    fn insert(&mut self, job_id: i64) -> bool {
        if self.contains(job_id) {
            return false;
        }
        self.ids.push(job_id);
        true
    }

    fn remove(&mut self, job_id: i64) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| *id != job_id);
        self.ids.len() != before
    }

    fn persist(&self) {
        self.storage.save(&self.key, &self.ids);
    }
}

pub struct BookmarkStore {
    set: JobIdSet,
}

impl BookmarkStore {
    pub fn load(storage: Rc<Storage>) -> Self {
        Self { set: JobIdSet::load(storage, BOOKMARKS_KEY) }
    }

    /// Flip membership and persist. Returns whether the job is now bookmarked.
    pub fn toggle_bookmark(&mut self, job_id: i64) -> bool {
        let bookmarked = if self.set.remove(job_id) {
            false
        } else {
            self.set.insert(job_id)
        };
        self.set.persist();
        debug!(job_id, bookmarked, "bookmark toggled");
        bookmarked
    }

    pub fn is_bookmarked(&self, job_id: i64) -> bool {
        self.set.contains(job_id)
    }

    pub fn ids(&self) -> &[i64] {
        self.set.ids()
    }
}

pub struct AppliedStore {
    set: JobIdSet,
}

impl AppliedStore {
    pub fn load(storage: Rc<Storage>) -> Self {
        Self { set: JobIdSet::load(storage, APPLIED_KEY) }
    }

    /// Record an application. Applying twice is a no-op; returns whether
    /// the id was newly added.
    pub fn apply_job(&mut self, job_id: i64) -> bool {
        if !self.set.insert(job_id) {
            debug!(job_id, "already applied");
            return false;
        }
        self.set.persist();
        debug!(job_id, total = self.set.ids().len(), "applied");
        true
    }

    pub fn has_applied(&self, job_id: i64) -> bool {
        self.set.contains(job_id)
    }

    pub fn ids(&self) -> &[i64] {
        self.set.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> Rc<Storage> {
        Rc::new(Storage::open_in_memory().unwrap())
    }

    #[test]
    fn test_toggle_on_then_off() {
        let storage = storage();
        let mut bookmarks = BookmarkStore::load(Rc::clone(&storage));

        assert!(bookmarks.toggle_bookmark(7));
        assert_eq!(bookmarks.ids(), &[7]);
        assert!(bookmarks.is_bookmarked(7));

        assert!(!bookmarks.toggle_bookmark(7));
        assert!(bookmarks.ids().is_empty());
        assert_eq!(storage.raw(BOOKMARKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut bookmarks = BookmarkStore::load(storage());
        for id in [3, 11, 42] {
            bookmarks.toggle_bookmark(id);
        }
        let before = bookmarks.ids().to_vec();

        for id in [11, 99, -5] {
            let was = bookmarks.is_bookmarked(id);
            bookmarks.toggle_bookmark(id);
            bookmarks.toggle_bookmark(id);
            assert_eq!(bookmarks.is_bookmarked(id), was);
        }

        let mut after = bookmarks.ids().to_vec();
        let mut expected = before;
        after.sort();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let storage = storage();
        let mut applied = AppliedStore::load(Rc::clone(&storage));

        assert!(applied.apply_job(5));
        let after_first = applied.ids().to_vec();
        let raw_first = storage.raw(APPLIED_KEY).unwrap();

        assert!(!applied.apply_job(5));
        assert_eq!(applied.ids(), after_first.as_slice());
        assert_eq!(storage.raw(APPLIED_KEY).unwrap(), raw_first);
        assert!(applied.has_applied(5));
        assert!(!applied.has_applied(6));
    }

    #[test]
    fn test_sets_survive_reload() {
        let storage = storage();
        {
            let mut bookmarks = BookmarkStore::load(Rc::clone(&storage));
            let mut applied = AppliedStore::load(Rc::clone(&storage));
            bookmarks.toggle_bookmark(1);
            bookmarks.toggle_bookmark(2);
            applied.apply_job(2);
        }

        let bookmarks = BookmarkStore::load(Rc::clone(&storage));
        let applied = AppliedStore::load(storage);
        assert_eq!(bookmarks.ids(), &[1, 2]);
        assert_eq!(applied.ids(), &[2]);
    }

    #[test]
    fn test_failed_write_keeps_in_memory_sets() {
        let storage = storage();
        let mut bookmarks = BookmarkStore::load(Rc::clone(&storage));
        let mut applied = AppliedStore::load(Rc::clone(&storage));
        bookmarks.toggle_bookmark(1);
        storage.reject_writes();

        assert!(bookmarks.toggle_bookmark(2));
        assert!(applied.apply_job(3));
        assert_eq!(bookmarks.ids(), &[1, 2]);
        assert!(applied.has_applied(3));

        // The durable copies are stale, not lost
        assert_eq!(storage.raw(BOOKMARKS_KEY).unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.raw(APPLIED_KEY).unwrap(), None);
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let storage = storage();
        storage.put_raw(BOOKMARKS_KEY, "[4,4,9,4]").unwrap();
        let bookmarks = BookmarkStore::load(storage);
        assert_eq!(bookmarks.ids(), &[4, 9]);
    }

    #[test]
    fn test_corrupt_set_loads_empty() {
        let storage = storage();
        storage.put_raw(APPLIED_KEY, "\"oops\"").unwrap();
        let applied = AppliedStore::load(storage);
        assert!(applied.ids().is_empty());
    }
}
