//! Main dispatch queue.
//!
//! All controller logic runs cooperatively on the host's main queue; the only
//! suspension points in the shell are the retry-ladder delays and the reload
//! delay after a transient load failure. [`Dispatcher`] is the seam the rest
//! of the crate schedules through, and [`MainQueue`] is the in-process
//! implementation: tasks ordered by due time (FIFO among equals) against a
//! virtual monotonic clock, so tests advance time explicitly instead of
//! sleeping.
//!
//! A platform embedding pumps the queue from its own looper; the headless
//! harness just calls [`MainQueue::run_until_idle`].

use std::cell::{Cell, RefCell};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// A unit of work posted to the queue.
pub type Task = Box<dyn FnOnce()>;

/// Scheduling seam for delayed work on the main queue.
pub trait Dispatcher {
    /// Runs `task` after `delay` of queue time has elapsed.
    fn post_delayed(&self, delay: Duration, task: Task);

    /// Runs `task` at the next queue drain.
    fn post(&self, task: Task) {
        self.post_delayed(Duration::ZERO, task);
    }
}

struct Entry {
    due: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Due time first, then insertion order among tasks due together.
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

/// Single-threaded cooperative task queue with a virtual clock.
pub struct MainQueue {
    now: Cell<Duration>,
    next_seq: Cell<u64>,
    pending: RefCell<BinaryHeap<Reverse<Entry>>>,
}

impl MainQueue {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            next_seq: Cell::new(0),
            pending: RefCell::new(BinaryHeap::new()),
        }
    }

    /// Queue time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Whether nothing is scheduled.
    pub fn is_idle(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Executes every scheduled task in due order, fast-forwarding the clock
    /// to each task's due time. Tasks posted while draining run too.
    pub fn run_until_idle(&self) {
        loop {
            let entry = self.pending.borrow_mut().pop();
            let Some(Reverse(entry)) = entry else { break };
            if entry.due > self.now.get() {
                self.now.set(entry.due);
            }
            (entry.task)();
        }
    }

    /// Advances the clock by `delta`, executing every task that comes due on
    /// the way (including tasks those tasks schedule inside the window).
    pub fn advance(&self, delta: Duration) {
        let target = self.now.get() + delta;
        loop {
            let next_due = self
                .pending
                .borrow()
                .peek()
                .map(|Reverse(entry)| entry.due);
            match next_due {
                Some(due) if due <= target => {
                    let Some(Reverse(entry)) = self.pending.borrow_mut().pop() else {
                        break;
                    };
                    if entry.due > self.now.get() {
                        self.now.set(entry.due);
                    }
                    (entry.task)();
                }
                _ => break,
            }
        }
        self.now.set(target);
    }
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for MainQueue {
    fn post_delayed(&self, delay: Duration, task: Task) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.pending.borrow_mut().push(Reverse(Entry {
            due: self.now.get() + delay,
            seq,
            task,
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn record(log: &Rc<RefCell<Vec<&'static str>>>, label: &'static str) -> Task {
        let log = Rc::clone(log);
        Box::new(move || log.borrow_mut().push(label))
    }

    #[test]
    fn test_run_until_idle_orders_by_due_time() {
        let queue = MainQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        queue.post_delayed(Duration::from_millis(500), record(&log, "late"));
        queue.post_delayed(Duration::from_millis(100), record(&log, "early"));
        queue.post(record(&log, "now"));
        queue.run_until_idle();

        assert_eq!(*log.borrow(), vec!["now", "early", "late"]);
        assert_eq!(queue.now(), Duration::from_millis(500));
    }

    #[test]
    fn test_tasks_due_together_run_in_post_order() {
        let queue = MainQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        queue.post(record(&log, "first"));
        queue.post(record(&log, "second"));
        queue.post(record(&log, "third"));
        queue.run_until_idle();

        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_advance_runs_only_due_tasks() {
        let queue = MainQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        queue.post_delayed(Duration::from_millis(100), record(&log, "in-window"));
        queue.post_delayed(Duration::from_millis(500), record(&log, "beyond"));

        queue.advance(Duration::from_millis(100));
        assert_eq!(*log.borrow(), vec!["in-window"]);
        assert_eq!(queue.now(), Duration::from_millis(100));

        queue.advance(Duration::from_millis(400));
        assert_eq!(*log.borrow(), vec!["in-window", "beyond"]);
    }

    #[test]
    fn test_task_may_schedule_followup_inside_window() {
        let queue = Rc::new(MainQueue::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_log = Rc::clone(&log);
        let inner_queue = Rc::clone(&queue);
        queue.post_delayed(
            Duration::from_millis(100),
            Box::new(move || {
                inner_log.borrow_mut().push("outer");
                let log = Rc::clone(&inner_log);
                inner_queue.post_delayed(
                    Duration::from_millis(100),
                    Box::new(move || log.borrow_mut().push("inner")),
                );
            }),
        );

        queue.advance(Duration::from_millis(250));
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_is_idle() {
        let queue = MainQueue::new();
        assert!(queue.is_idle());
        queue.post(Box::new(|| {}));
        assert!(!queue.is_idle());
        queue.run_until_idle();
        assert!(queue.is_idle());
    }
}
