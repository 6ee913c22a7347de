//! The event loop: timer (macrotask) heap, microtask queue, and a small
//! run-to-completion executor for futures.
//!
//! The loop reproduces the host model the demos teach:
//! - every job runs to completion before the loop looks at a queue again;
//! - the microtask queue drains fully before the next timer fires, even when
//!   both are due "now";
//! - timers fire ordered by due time, with registration order breaking ties,
//!   so a 1000 ms timer registered after a 2000 ms one still fires first;
//! - waking a suspended future enqueues it as a microtask, which is what makes
//!   resumption after an `.await` land ahead of any pending timer.
//!
//! Time is virtual: [`EventLoop::run`] jumps the clock straight to the next
//! due timer, and [`EventLoop::run_paced`] sleeps the wall-clock difference
//! first so demo binaries play out in real time on the same schedule.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use futures::task::{self, ArcWake};

use crate::clock::{VirtualClock, VirtualInstant};

type BoxedJob = Box<dyn FnOnce() + Send>;
type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// One unit of work owned by a queue.
///
/// Closures come from `set_timeout`/`queue_microtask`; poll jobs re-enter a
/// spawned future that a waker marked runnable.
enum Job {
    Run(BoxedJob),
    Poll(Arc<TaskCell>),
}

// A spawned future plus the loop it reports back to. Waking pushes the cell
// onto the microtask queue; the slot is empty once the future completes, so
// late wakes are no-ops.
struct TaskCell {
    future: Mutex<Option<TaskFuture>>,
    shared: Arc<Shared>,
}

impl ArcWake for TaskCell {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self
            .shared
            .push_microtask(Job::Poll(Arc::clone(arc_self)));
    }
}

fn poll_task(cell: &Arc<TaskCell>) {
    let mut slot = cell.future.lock().unwrap();
    if let Some(mut future) = slot.take() {
        let waker = task::waker(Arc::clone(cell));
        let mut cx = std::task::Context::from_waker(&waker);
        if future.as_mut().poll(&mut cx).is_pending() {
            *slot = Some(future);
        }
    }
}

// A scheduled timer. Ordering is by due time, then by registration sequence,
// so equal delays fire in the order they were set.
struct TimerEntry {
    due: VirtualInstant,
    seq: u64,
    job: Job,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.due.cmp(&other.due) {
            std::cmp::Ordering::Equal => self.seq.cmp(&other.seq),
            ord => ord,
        }
    }
}

struct Shared {
    clock: VirtualClock,
    timers: Mutex<BinaryHeap<Reverse<TimerEntry>>>,
    microtasks: Mutex<VecDeque<Job>>,
    timer_seq: AtomicU64,
    macrotasks_fired: AtomicU64,
    microtasks_drained: AtomicU64,
}

impl Shared {
    fn push_microtask(&self, job: Job) {
        self.microtasks.lock().unwrap().push_back(job);
    }

    fn push_timer(&self, delay: Duration, job: Job) {
        let due = self.clock.now() + delay;
        let seq = self.timer_seq.fetch_add(1, Ordering::Relaxed);
        self.timers
            .lock()
            .unwrap()
            .push(Reverse(TimerEntry { due, seq, job }));
    }
}

/// A single-threaded event loop with browser-style task and microtask queues.
///
/// Work is registered through a [`LoopHandle`] and executed by one of the
/// `run*` methods, which must be called from a single driving thread. Handles
/// are cheap to clone and may be captured by the jobs themselves to schedule
/// follow-up work.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use microloop::EventLoop;
///
/// let mut ev = EventLoop::new();
/// let handle = ev.handle();
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let (slow, fast) = (Arc::clone(&log), Arc::clone(&log));
///
/// // Registered first, fires last: due time wins over registration order.
/// handle.set_timeout(std::time::Duration::from_secs(2), move || {
///     slow.lock().unwrap().push("slow");
/// });
/// handle.set_timeout(std::time::Duration::from_secs(1), move || {
///     fast.lock().unwrap().push("fast");
/// });
///
/// ev.run();
/// assert_eq!(*log.lock().unwrap(), ["fast", "slow"]);
/// ```
pub struct EventLoop {
    shared: Arc<Shared>,
}

impl EventLoop {
    /// Creates an empty loop with its clock at [`VirtualInstant::ZERO`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                clock: VirtualClock::new(),
                timers: Mutex::new(BinaryHeap::new()),
                microtasks: Mutex::new(VecDeque::new()),
                timer_seq: AtomicU64::new(0),
                macrotasks_fired: AtomicU64::new(0),
                microtasks_drained: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a handle for registering work on this loop.
    #[must_use]
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> VirtualInstant {
        self.shared.clock.now()
    }

    /// Number of timer callbacks fired so far.
    #[must_use]
    pub fn macrotasks_fired(&self) -> u64 {
        self.shared.macrotasks_fired.load(Ordering::Relaxed)
    }

    /// Number of microtasks drained so far.
    #[must_use]
    pub fn microtasks_drained(&self) -> u64 {
        self.shared.microtasks_drained.load(Ordering::Relaxed)
    }

    /// `true` when both queues are empty.
    ///
    /// Futures parked on a settlement that never comes do not count as
    /// pending work; they simply stay parked.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.shared.timers.lock().unwrap().is_empty()
            && self.shared.microtasks.lock().unwrap().is_empty()
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.shared.timers.lock().unwrap().len()
    }

    /// Runs until both queues are empty, jumping the clock between timers.
    ///
    /// Synchronously registered work runs in the documented order: the
    /// microtask queue is drained fully, then the clock advances to the
    /// earliest timer, exactly one timer callback fires, and the microtask
    /// queue is drained again before the next one.
    pub fn run(&mut self) {
        loop {
            self.drain_microtasks();
            if !self.fire_next_timer(None) {
                break;
            }
        }
    }

    /// Runs like [`run`](Self::run) but fires no timer due after `deadline`,
    /// then leaves the clock exactly at `deadline`.
    ///
    /// Useful for asserting that a delayed line has *not* appeared yet.
    pub fn run_until(&mut self, deadline: VirtualInstant) {
        loop {
            self.drain_microtasks();
            if !self.fire_next_timer(Some(deadline)) {
                break;
            }
        }
        self.shared.clock.advance_to(deadline);
    }

    /// Executes one turn: a full microtask drain plus at most one timer.
    ///
    /// Returns `false` once there was nothing left to do.
    pub fn turn(&mut self) -> bool {
        let drained = self.drain_microtasks();
        let fired = self.fire_next_timer(None);
        drained > 0 || fired
    }

    /// Runs with wall-clock pacing: before each timer fires, the driving
    /// thread sleeps the gap between the current virtual time and the timer's
    /// due time. The schedule (and therefore the output order) is identical
    /// to [`run`](Self::run).
    pub fn run_paced(&mut self) {
        loop {
            self.drain_microtasks();
            let next_due = {
                let timers = self.shared.timers.lock().unwrap();
                timers.peek().map(|Reverse(entry)| entry.due)
            };
            let Some(due) = next_due else {
                break;
            };
            let gap = due - self.shared.clock.now();
            if !gap.is_zero() {
                thread::sleep(gap);
            }
            self.fire_next_timer(None);
        }
    }

    fn drain_microtasks(&self) -> u64 {
        let mut drained = 0;
        // One job at a time so a running microtask can enqueue more without
        // contending for the queue lock.
        loop {
            let job = self.shared.microtasks.lock().unwrap().pop_front();
            match job {
                Some(job) => {
                    drained += 1;
                    self.shared
                        .microtasks_drained
                        .fetch_add(1, Ordering::Relaxed);
                    execute(job);
                }
                None => return drained,
            }
        }
    }

    fn fire_next_timer(&self, deadline: Option<VirtualInstant>) -> bool {
        let entry = {
            let mut timers = self.shared.timers.lock().unwrap();
            let due_next = timers.peek().map(|Reverse(entry)| entry.due);
            match due_next {
                Some(due) if deadline.is_none_or(|limit| due <= limit) => {
                    timers.pop().map(|Reverse(entry)| entry)
                }
                _ => None,
            }
        };
        let Some(entry) = entry else {
            return false;
        };
        self.shared.clock.advance_to(entry.due);
        self.shared.macrotasks_fired.fetch_add(1, Ordering::Relaxed);
        execute(entry.job);
        true
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

fn execute(job: Job) {
    match job {
        Job::Run(f) => f(),
        Job::Poll(cell) => poll_task(&cell),
    }
}

/// Registers work on an [`EventLoop`].
///
/// Handles are `Send` and cheap to clone; jobs capture them to schedule
/// follow-up work from inside the loop.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Arc<Shared>,
}

impl LoopHandle {
    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> VirtualInstant {
        self.shared.clock.now()
    }

    /// Schedules `f` as a timer callback `delay` from now.
    ///
    /// A zero delay still goes through the timer queue; the callback never
    /// runs before the remaining synchronous code, and never before pending
    /// microtasks. There is no way to cancel a timer: once scheduled, it
    /// fires.
    pub fn set_timeout(&self, delay: Duration, f: impl FnOnce() + Send + 'static) {
        self.shared.push_timer(delay, Job::Run(Box::new(f)));
    }

    /// Schedules `f` on the microtask queue.
    ///
    /// Microtasks run after the current job finishes and before the next
    /// timer callback, in FIFO order.
    pub fn queue_microtask(&self, f: impl FnOnce() + Send + 'static) {
        self.shared.push_microtask(Job::Run(Box::new(f)));
    }

    /// Runs a future on the loop.
    ///
    /// The future is polled once immediately: an async handler's body runs
    /// synchronously up to its first suspension point, exactly like calling
    /// an async function. Every later wake re-enters it via the microtask
    /// queue.
    pub fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        let cell = Arc::new(TaskCell {
            future: Mutex::new(Some(Box::pin(future))),
            shared: Arc::clone(&self.shared),
        });
        poll_task(&cell);
    }

    /// A future that completes once a timer `delay` from now has fired.
    #[must_use]
    pub fn sleep(&self, delay: Duration) -> crate::timing::Sleep {
        crate::timing::Sleep::new(self.clone(), delay)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Timers fire sorted by due time, with registration order breaking
        /// ties, no matter the order they were registered in.
        #[test]
        fn prop_timers_fire_in_due_then_registration_order(
            delays in prop::collection::vec(0u64..5_000, 1..40),
        ) {
            let mut ev = EventLoop::new();
            let handle = ev.handle();
            let fired = Arc::new(Mutex::new(Vec::new()));

            for (index, &ms) in delays.iter().enumerate() {
                let fired = Arc::clone(&fired);
                handle.set_timeout(Duration::from_millis(ms), move || {
                    fired.lock().unwrap().push((ms, index));
                });
            }

            ev.run();

            let fired = fired.lock().unwrap();
            prop_assert_eq!(fired.len(), delays.len());
            for pair in fired.windows(2) {
                let (d1, i1) = pair[0];
                let (d2, i2) = pair[1];
                prop_assert!(
                    d1 < d2 || (d1 == d2 && i1 < i2),
                    "({}, {}) fired before ({}, {})", d1, i1, d2, i2
                );
            }
        }

        /// Every microtask queued during a timer callback runs before the
        /// next timer callback.
        #[test]
        fn prop_microtasks_beat_the_next_timer(extra_micro in 1usize..20) {
            let mut ev = EventLoop::new();
            let handle = ev.handle();
            let log = Arc::new(Mutex::new(Vec::new()));

            let first_log = Arc::clone(&log);
            let micro_handle = handle.clone();
            handle.set_timeout(Duration::from_millis(1), move || {
                first_log.lock().unwrap().push("timer-1".to_string());
                for n in 0..extra_micro {
                    let log = Arc::clone(&first_log);
                    micro_handle.queue_microtask(move || {
                        log.lock().unwrap().push(format!("micro-{n}"));
                    });
                }
            });
            let second_log = Arc::clone(&log);
            handle.set_timeout(Duration::from_millis(2), move || {
                second_log.lock().unwrap().push("timer-2".to_string());
            });

            ev.run();

            let log = log.lock().unwrap();
            prop_assert_eq!(log.first().map(String::as_str), Some("timer-1"));
            prop_assert_eq!(log.last().map(String::as_str), Some("timer-2"));
            prop_assert_eq!(log.len(), extra_micro + 2);
        }
    }
}
