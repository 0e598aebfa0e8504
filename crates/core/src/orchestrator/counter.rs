//! In-flight task counting.

use std::sync::{Arc, Mutex, PoisonError};

use super::presenter::Presenter;

struct CounterInner {
    active: Mutex<usize>,
    presenter: Option<Arc<dyn Presenter>>,
}

impl CounterInner {
    // The busy signal is emitted while the lock is held so that two tasks
    // crossing zero concurrently cannot reorder their signals.
    fn adjust(&self, increment: bool) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if increment {
            *active += 1;
            if *active == 1 {
                self.signal(true);
            }
        } else {
            debug_assert!(*active > 0, "in-flight counter underflow");
            *active = active.saturating_sub(1);
            if *active == 0 {
                self.signal(false);
            }
        }
    }

    fn signal(&self, busy: bool) {
        if let Some(presenter) = &self.presenter {
            presenter.on_busy_changed(busy);
        }
    }
}

/// Number of tasks that have not yet reached a terminal state.
///
/// Tasks enter via [`InFlightCounter::enter`] and leave when the returned
/// guard is dropped, which also covers tasks that panic. A counter built
/// with [`InFlightCounter::new`] turns the presenter's busy signal on when
/// the count leaves zero and off when it returns to zero.
#[derive(Clone)]
pub struct InFlightCounter {
    inner: Arc<CounterInner>,
}

impl InFlightCounter {
    /// Counter at zero reporting busy changes to `presenter`.
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            inner: Arc::new(CounterInner {
                active: Mutex::new(0),
                presenter: Some(presenter),
            }),
        }
    }

    /// Counter that only counts.
    pub fn silent() -> Self {
        Self {
            inner: Arc::new(CounterInner {
                active: Mutex::new(0),
                presenter: None,
            }),
        }
    }

    /// Count one more active task.
    pub fn enter(&self) -> InFlightGuard {
        self.inner.adjust(true);
        InFlightGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn active(&self) -> usize {
        *self.inner.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.active() > 0
    }
}

impl std::fmt::Debug for InFlightCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightCounter")
            .field("active", &self.active())
            .finish()
    }
}

/// Membership of one task in an [`InFlightCounter`].
pub struct InFlightGuard {
    inner: Arc<CounterInner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.adjust(false);
    }
}
