//! Fixed-ladder retry scheduling.
//!
//! A retry ladder is an ordered list of attempt times, in milliseconds
//! relative to the moment scheduling starts. [`schedule`] fires a fallible
//! task at each rung until it first succeeds; attempts are serialized on the
//! dispatcher, so a later rung never starts while an earlier one is in
//! flight. When the last rung fails the caller's exhaustion hook runs once
//! and the task is never attempted again.
//!
//! The shell uses one ladder, [`CONFIGURE_LADDER`], for surface
//! configuration during the create phase, when the surface handle may not be
//! attached yet.

use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::dispatch::Dispatcher;

/// Attempt times in milliseconds, relative to when scheduling starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLadder {
    attempt_offsets_ms: &'static [u64],
}

/// Ladder for surface configuration: immediately, then 100 ms, then 500 ms.
pub const CONFIGURE_LADDER: RetryLadder = RetryLadder::new(&[0, 100, 500]);

impl RetryLadder {
    pub const fn new(attempt_offsets_ms: &'static [u64]) -> Self {
        Self { attempt_offsets_ms }
    }

    /// Maximum number of attempts.
    pub fn len(&self) -> usize {
        self.attempt_offsets_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempt_offsets_ms.is_empty()
    }

    fn offset_ms(&self, rung: usize) -> Option<u64> {
        self.attempt_offsets_ms.get(rung).copied()
    }
}

/// Schedules `attempt` on the ladder. The attempt returns `true` on success,
/// which stops the ladder; after the final rung fails, `on_exhausted` runs
/// once. An empty ladder exhausts immediately.
pub fn schedule<F, E>(dispatcher: Rc<dyn Dispatcher>, ladder: RetryLadder, attempt: F, on_exhausted: E)
where
    F: FnMut() -> bool + 'static,
    E: FnOnce() + 'static,
{
    run_rung(dispatcher, ladder, 0, attempt, on_exhausted);
}

fn run_rung<F, E>(
    dispatcher: Rc<dyn Dispatcher>,
    ladder: RetryLadder,
    rung: usize,
    mut attempt: F,
    on_exhausted: E,
) where
    F: FnMut() -> bool + 'static,
    E: FnOnce() + 'static,
{
    let Some(offset) = ladder.offset_ms(rung) else {
        on_exhausted();
        return;
    };

    // The previous rung already consumed its own offset of queue time.
    let prev = if rung == 0 {
        0
    } else {
        ladder.offset_ms(rung - 1).unwrap_or(0)
    };
    let delay = Duration::from_millis(offset.saturating_sub(prev));

    let next_dispatcher = Rc::clone(&dispatcher);
    dispatcher.post_delayed(
        delay,
        Box::new(move || {
            if attempt() {
                return;
            }
            debug!(rung, attempts = ladder.len(), "retry attempt failed");
            if rung + 1 < ladder.len() {
                run_rung(next_dispatcher, ladder, rung + 1, attempt, on_exhausted);
            } else {
                on_exhausted();
            }
        }),
    );
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::dispatch::MainQueue;

    /// Runs `attempt` on the configure ladder against a fresh queue and
    /// returns the queue times at which attempts fired.
    fn attempt_times(
        succeed_on: Option<usize>,
    ) -> (Vec<Duration>, Rc<Cell<bool>>) {
        let queue: Rc<MainQueue> = Rc::new(MainQueue::new());
        let times = Rc::new(RefCell::new(Vec::new()));
        let exhausted = Rc::new(Cell::new(false));

        let q = Rc::clone(&queue);
        let t = Rc::clone(&times);
        let count = Cell::new(0usize);
        let e = Rc::clone(&exhausted);
        schedule(
            queue.clone(),
            CONFIGURE_LADDER,
            move || {
                t.borrow_mut().push(q.now());
                let n = count.get();
                count.set(n + 1);
                succeed_on == Some(n)
            },
            move || e.set(true),
        );
        queue.run_until_idle();

        let times = times.borrow().clone();
        (times, exhausted)
    }

    #[test]
    fn test_attempts_fire_at_ladder_offsets() {
        let (times, exhausted) = attempt_times(None);
        assert_eq!(
            times,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(500),
            ]
        );
        assert!(exhausted.get());
    }

    #[test]
    fn test_never_more_than_three_attempts() {
        let (times, _) = attempt_times(None);
        assert_eq!(times.len(), CONFIGURE_LADDER.len());
    }

    #[test]
    fn test_stops_on_first_success() {
        let (times, exhausted) = attempt_times(Some(0));
        assert_eq!(times, vec![Duration::ZERO]);
        assert!(!exhausted.get());
    }

    #[test]
    fn test_success_on_second_attempt_skips_third() {
        let (times, exhausted) = attempt_times(Some(1));
        assert_eq!(times, vec![Duration::ZERO, Duration::from_millis(100)]);
        assert!(!exhausted.get());
    }

    #[test]
    fn test_success_on_final_attempt_is_not_exhaustion() {
        let (times, exhausted) = attempt_times(Some(2));
        assert_eq!(times.len(), 3);
        assert!(!exhausted.get());
    }

    #[test]
    fn test_empty_ladder_exhausts_without_attempting() {
        let queue: Rc<MainQueue> = Rc::new(MainQueue::new());
        let attempts = Rc::new(Cell::new(0));
        let exhausted = Rc::new(Cell::new(false));

        let a = Rc::clone(&attempts);
        let e = Rc::clone(&exhausted);
        schedule(
            queue.clone(),
            RetryLadder::new(&[]),
            move || {
                a.set(a.get() + 1);
                true
            },
            move || e.set(true),
        );
        queue.run_until_idle();

        assert_eq!(attempts.get(), 0);
        assert!(exhausted.get());
    }
}
