//! Minimal unit-of-work seam between the catalog and the transaction
//! subsystem.
//!
//! The catalog never decides *when* a change becomes durable; it hands the
//! transaction subsystem [`Change`] objects and performs its registry
//! mutations from their `commit`/`rollback` callbacks. This module is the
//! in-process stand-in for that subsystem: changes run in registration order
//! on commit and in reverse order on rollback, and a unit of work dropped
//! without an explicit outcome rolls back.

use quilldb_commons::Timestamp;

/// A pending, reversible action registered with a [`UnitOfWork`].
pub trait Change: Send {
    /// Runs when the enclosing unit of work commits. `commit_time` is the
    /// optional durable timestamp supplied by the committer.
    fn commit(self: Box<Self>, commit_time: Option<Timestamp>);

    /// Runs when the enclosing unit of work aborts.
    fn rollback(self: Box<Self>);
}

struct FnChange<C, R>
where
    C: FnOnce(Option<Timestamp>) + Send,
    R: FnOnce() + Send,
{
    on_commit: Option<C>,
    on_rollback: Option<R>,
}

impl<C, R> Change for FnChange<C, R>
where
    C: FnOnce(Option<Timestamp>) + Send,
    R: FnOnce() + Send,
{
    fn commit(mut self: Box<Self>, commit_time: Option<Timestamp>) {
        if let Some(f) = self.on_commit.take() {
            f(commit_time);
        }
    }

    fn rollback(mut self: Box<Self>) {
        if let Some(f) = self.on_rollback.take() {
            f();
        }
    }
}

/// Multi-step transactional scope.
///
/// Collects [`Change`] objects while active. Exactly one of [`commit`]
/// (registration order) or [`abort`] (reverse order) consumes the unit of
/// work; dropping it while still active aborts, so an early `?` return in a
/// caller cannot leave half-applied catalog state behind.
///
/// [`commit`]: UnitOfWork::commit
/// [`abort`]: UnitOfWork::abort
#[derive(Default)]
pub struct UnitOfWork {
    changes: Vec<Box<dyn Change>>,
}

impl UnitOfWork {
    /// Starts an empty unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a change to run at commit or rollback.
    pub fn register_change(&mut self, change: Box<dyn Change>) {
        self.changes.push(change);
    }

    /// Registers a commit-only callback.
    pub fn on_commit(&mut self, f: impl FnOnce(Option<Timestamp>) + Send + 'static) {
        self.register_change(Box::new(FnChange {
            on_commit: Some(f),
            on_rollback: None::<fn()>,
        }));
    }

    /// Registers a rollback-only callback (a compensating action).
    pub fn on_rollback(&mut self, f: impl FnOnce() + Send + 'static) {
        self.register_change(Box::new(FnChange {
            on_commit: None::<fn(Option<Timestamp>)>,
            on_rollback: Some(f),
        }));
    }

    /// Number of changes currently registered.
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    /// Commits: runs every change in registration order.
    pub fn commit(mut self, commit_time: Option<Timestamp>) {
        for change in std::mem::take(&mut self.changes) {
            change.commit(commit_time);
        }
    }

    /// Aborts: rolls back every change in reverse registration order.
    pub fn abort(mut self) {
        self.rollback_all();
    }

    fn rollback_all(&mut self) {
        for change in std::mem::take(&mut self.changes).into_iter().rev() {
            change.rollback();
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // commit/abort drained the list; anything left means the scope was
        // abandoned and must be rolled back.
        if !self.changes.is_empty() {
            log::debug!(
                "Unit of work dropped with {} pending change(s), rolling back",
                self.changes.len()
            );
            self.rollback_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex;

    #[test]
    fn test_commit_runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut uow = UnitOfWork::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            uow.on_commit(move |_| order.lock().unwrap().push(i));
        }
        uow.commit(None);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_abort_runs_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut uow = UnitOfWork::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            uow.on_rollback(move || order.lock().unwrap().push(i));
        }
        uow.abort();
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let rolled_back = Arc::new(AtomicUsize::new(0));
        {
            let mut uow = UnitOfWork::new();
            let rolled_back = Arc::clone(&rolled_back);
            uow.on_rollback(move || {
                rolled_back.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(rolled_back.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_commit_passes_timestamp() {
        let seen = Arc::new(Mutex::new(None));
        let mut uow = UnitOfWork::new();
        {
            let seen = Arc::clone(&seen);
            uow.on_commit(move |ts| *seen.lock().unwrap() = ts);
        }
        let ts = Timestamp::from_millis(42);
        uow.commit(Some(ts));
        assert_eq!(*seen.lock().unwrap(), Some(ts));
    }
}
