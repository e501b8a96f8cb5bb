//! Reusable result-file paths, one per worker.
//!
//! A slot is held for the whole solver call, so no two in-flight tests can ever
//! share a result file regardless of how tests are numbered or shuffled.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Condvar, Mutex, MutexGuard},
};

use crate::{Error, Result};

#[derive(Debug)]
pub struct ResultSlots {
    paths: Vec<PathBuf>,
    free: Mutex<Vec<usize>>,
    released: Condvar,
}

/// Exclusive use of one slot path; returned to the pool on drop.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slots: &'a ResultSlots,
    index: usize,
}

impl ResultSlots {
    /// Creates `dir` and `count` slot paths `slot_{i}.txt` inside it.
    pub fn new(dir: &Path, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(Error::invalid_input("result slot count must be > 0"));
        }
        fs::create_dir_all(dir)?;

        let paths = (0..count)
            .map(|idx| dir.join(format!("slot_{idx}.txt")))
            .collect();
        Ok(Self {
            paths,
            free: Mutex::new((0..count).rev().collect()),
            released: Condvar::new(),
        })
    }

    /// Blocks until a slot is free.
    pub fn acquire(&self) -> SlotGuard<'_> {
        let mut free = self.lock_free();
        loop {
            if let Some(index) = free.pop() {
                return SlotGuard { slots: self, index };
            }
            free = match self.released.wait(free) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    fn lock_free(&self) -> MutexGuard<'_, Vec<usize>> {
        match self.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SlotGuard<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.slots.paths[self.index]
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slots.lock_free().push(self.index);
        self.slots.released.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        fs,
        path::PathBuf,
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        thread,
        time::{Duration, SystemTime, UNIX_EPOCH},
    };

    use super::ResultSlots;

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("mosp-core-tests-{name}-{nanos}"))
    }

    #[test]
    fn new_rejects_zero_slots() {
        let dir = unique_temp_dir("slots-zero");
        assert!(ResultSlots::new(&dir, 0).is_err());
    }

    #[test]
    fn held_slots_have_distinct_paths_and_are_reused_after_drop() {
        let dir = unique_temp_dir("slots-reuse");
        let slots = ResultSlots::new(&dir, 3).expect("create slots");
        assert!(dir.is_dir());

        let a = slots.acquire();
        let b = slots.acquire();
        let c = slots.acquire();
        let held: HashSet<PathBuf> = [&a, &b, &c]
            .iter()
            .map(|slot| slot.path().to_path_buf())
            .collect();
        assert_eq!(held.len(), 3);
        assert_eq!(a.index(), 0);
        assert_eq!(a.path(), dir.join("slot_0.txt"));

        let freed = b.index();
        drop(b);
        assert_eq!(slots.acquire().index(), freed);

        drop((a, c));
        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }

    #[test]
    fn concurrent_holders_never_share_a_slot() {
        let dir = unique_temp_dir("slots-threads");
        let slots = ResultSlots::new(&dir, 2).expect("create slots");
        let in_use = [AtomicBool::new(false), AtomicBool::new(false)];
        let acquired = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..6 {
                scope.spawn(|| {
                    for _ in 0..5 {
                        let slot = slots.acquire();
                        let was_busy = in_use[slot.index()].swap(true, Ordering::SeqCst);
                        assert!(!was_busy, "slot {} handed out twice", slot.index());
                        thread::sleep(Duration::from_millis(1));
                        in_use[slot.index()].store(false, Ordering::SeqCst);
                        acquired.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(acquired.load(Ordering::SeqCst), 30);
        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }
}
