use crate::types::HashMap;
use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, Ordering},
    thread::{self, ThreadId},
};

/// Who resolves which method, and which method each blocked thread waits for.
#[derive(Debug, Default)]
struct LockTable {
    owners: HashMap<String, ThreadId>,
    waiting: HashMap<ThreadId, String>,
}

impl LockTable {
    /// Whether the chain of waits starting at `owner` ends at `thread`.
    ///
    /// Blocking `thread` behind `owner` would then close a cycle that no
    /// thread can leave.
    fn leads_to(&self, owner: ThreadId, thread: ThreadId) -> bool {
        let mut current = owner;
        // Each step follows one waiting thread, so a chain is never longer
        // than the waiting set.
        for _ in 0..=self.waiting.len() {
            if current == thread {
                return true;
            }
            let Some(owner) = self
                .waiting
                .get(&current)
                .and_then(|method| self.owners.get(method))
            else {
                return false;
            };
            current = *owner;
        }
        false
    }
}

/// Per-method mutual exclusion of one resolver.
///
/// At most one thread resolves a given method at a time; other threads block
/// until it is released. A thread is refused instead of blocked when waiting
/// could never end: it already resolves the method itself, or the owner is
/// (transitively) waiting for a method the thread holds.
#[derive(Debug, Default)]
pub(crate) struct MethodLocks {
    table: Mutex<LockTable>,
    released: Condvar,
}

impl MethodLocks {
    /// Block until no other thread resolves `name`, then take it.
    ///
    /// Returns `None` if taking it would deadlock.
    pub(crate) fn enter(&self, name: &str) -> Option<InFlight<'_>> {
        let me = thread::current().id();
        let mut table = self.table.lock();
        loop {
            let owner = table.owners.get(name).copied();
            match owner {
                None => {
                    table.waiting.remove(&me);
                    table.owners.insert(name.to_owned(), me);
                    return Some(InFlight {
                        locks: self,
                        name: name.to_owned(),
                    });
                }
                Some(owner) if table.leads_to(owner, me) => {
                    table.waiting.remove(&me);
                    tracing::debug!(method = name, "lock would deadlock");
                    return None;
                }
                Some(_) => {
                    table.waiting.insert(me, name.to_owned());
                    self.released.wait(&mut table);
                }
            }
        }
    }
}

/// Proof that the current thread resolves a method. Released on drop.
#[must_use]
pub(crate) struct InFlight<'a> {
    locks: &'a MethodLocks,
    name: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.locks.table.lock().owners.remove(&self.name);
        self.locks.released.notify_all();
    }
}

/// Flag that can be claimed once, unless the claim is abandoned.
#[derive(Debug, Default)]
pub(crate) struct OnceFlag(AtomicBool);

impl OnceFlag {
    /// Claim the flag. `None` if it is already claimed.
    pub(crate) fn claim(&self) -> Option<Claim<'_>> {
        (!self.0.swap(true, Ordering::AcqRel)).then_some(Claim {
            flag: &self.0,
            kept: false,
        })
    }
}

/// A pending claim of a [`OnceFlag`]. Dropping it without
/// [`Claim::keep`] clears the flag again.
#[must_use]
pub(crate) struct Claim<'a> {
    flag: &'a AtomicBool,
    kept: bool,
}

impl Claim<'_> {
    pub(crate) fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.flag.store(false, Ordering::Release);
        }
    }
}

/// Queue of method names shared by preload workers.
#[derive(Debug, Default)]
pub(crate) struct WorkQueue(Mutex<VecDeque<String>>);

impl WorkQueue {
    pub(crate) fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self(Mutex::new(names.into_iter().collect()))
    }

    /// Next name, or `None` once the queue is drained.
    pub(crate) fn pop(&self) -> Option<String> {
        self.0.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lock().len()
    }
}
