//! Timing utilities for futures running on an event loop.
//!
//! Provides futures that wait on the loop's timer queue instead of the wall
//! clock, so they follow virtual time and stay deterministic under test.

use std::{
    ops::{Deref, DerefMut},
    pin::Pin,
    sync::{Arc, Mutex},
    task::Waker,
    time::Duration,
};

use pin_project_lite::pin_project;

use crate::event_loop::LoopHandle;

/// A future that completes once a timer on the owning loop has fired.
///
/// The timer is armed on first poll, so the countdown starts when the future
/// is awaited, not when it is created. Even with a zero delay the future is
/// never ready on its first poll; resumption always goes through the timer
/// queue and then the microtask queue, like any other timer callback.
///
/// Once elapsed, the future stays ready.
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct Sleep {
    handle: LoopHandle,
    delay: Duration,
    state: Arc<Mutex<SleepState>>,
    armed: bool,
}

struct SleepState {
    elapsed: bool,
    waker: Option<Waker>,
}

impl Sleep {
    pub(crate) fn new(handle: LoopHandle, delay: Duration) -> Self {
        Sleep {
            handle,
            delay,
            state: Arc::new(Mutex::new(SleepState {
                elapsed: false,
                waker: None,
            })),
            armed: false,
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let this = self.get_mut();
        {
            let mut state = this.state.lock().unwrap();
            if state.elapsed {
                return std::task::Poll::Ready(());
            }
            state.waker = Some(cx.waker().clone());
        }
        if !this.armed {
            this.armed = true;
            let state = Arc::clone(&this.state);
            this.handle.set_timeout(this.delay, move || {
                let mut state = state.lock().unwrap();
                state.elapsed = true;
                if let Some(waker) = state.waker.take() {
                    waker.wake();
                }
            });
        }
        std::task::Poll::Pending
    }
}

pin_project! {
    /// A future that begins polling its inner future only after a timer on
    /// the owning loop has fired.
    ///
    /// When first polled, `Delay` arms a timer for the given duration and
    /// waits for it. After the timer has fired, it delegates all subsequent
    /// polls to the inner future until completion. The delay counts from the
    /// moment the `Delay` is first awaited.
    ///
    /// This is useful for deferring the start of an asynchronous operation or
    /// spacing out steps of a demo in loop time.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Delay<F> {
        #[pin]
        future: F,
        sleep: Sleep,
        elapsed: bool,
    }
}

impl<F> Delay<F> {
    /// Creates a new `Delay` that defers the execution of the given future.
    ///
    /// The future will not be polled until a timer of `delay` on the loop
    /// behind `handle` has fired, counted from the first poll of the `Delay`
    /// itself.
    ///
    /// A more convenient way to construct this is via the
    /// [`delay()`](crate::task_ext::TaskExt::delay) operator.
    pub fn new(future: F, handle: &LoopHandle, delay: Duration) -> Self {
        Delay {
            future,
            sleep: handle.sleep(delay),
            elapsed: false,
        }
    }

    /// Consumes the `Delay` and returns the inner future.
    ///
    /// This allows access to the original future after the delay wrapper is
    /// no longer needed.
    pub fn inner(self) -> F {
        self.future
    }
}

impl<F> Deref for Delay<F> {
    type Target = F;

    fn deref(&self) -> &Self::Target {
        &self.future
    }
}

impl<F> DerefMut for Delay<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.future
    }
}

impl<F> Future for Delay<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let this = self.project();
        if !*this.elapsed {
            match Pin::new(this.sleep).poll(cx) {
                std::task::Poll::Pending => return std::task::Poll::Pending,
                std::task::Poll::Ready(()) => *this.elapsed = true,
            }
        }
        this.future.poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualInstant;
    use crate::event_loop::EventLoop;
    use crate::task_ext::TaskExt;

    #[test]
    fn sleep_suspends_until_its_timer_fires() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let task_log = Arc::clone(&log);
        let task_handle = handle.clone();
        handle.spawn(async move {
            task_log.lock().unwrap().push("before sleep");
            task_handle.sleep(Duration::from_secs(1)).await;
            task_log.lock().unwrap().push("after sleep");
        });

        // Eager poll ran the body up to the first await.
        assert_eq!(*log.lock().unwrap(), ["before sleep"]);

        ev.run_until(VirtualInstant::ZERO + Duration::from_millis(500));
        assert_eq!(*log.lock().unwrap(), ["before sleep"]);

        ev.run();
        assert_eq!(*log.lock().unwrap(), ["before sleep", "after sleep"]);
        assert_eq!(ev.now(), VirtualInstant::ZERO + Duration::from_secs(1));
    }

    #[test]
    fn delay_defers_even_an_already_ready_future() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let task_log = Arc::clone(&log);
        let inner_handle = handle.clone();
        handle.spawn(async move {
            let value = Delay::new(async { 7 }, &inner_handle, Duration::from_secs(2)).await;
            task_log.lock().unwrap().push(value);
        });

        assert!(log.lock().unwrap().is_empty());
        ev.run();
        assert_eq!(*log.lock().unwrap(), [7]);
        assert_eq!(ev.now(), VirtualInstant::ZERO + Duration::from_secs(2));
    }

    #[test]
    fn delay_operator_defers_a_future_on_loop_time() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let task_log = Arc::clone(&log);
        let inner_handle = handle.clone();
        handle.spawn(async move {
            let value = async { 7 }.delay(&inner_handle, Duration::from_secs(2)).await;
            task_log.lock().unwrap().push(value);
        });

        ev.run_until(VirtualInstant::ZERO + Duration::from_secs(1));
        assert!(
            log.lock().unwrap().is_empty(),
            "the inner future must wait out the full delay"
        );

        ev.run();
        assert_eq!(*log.lock().unwrap(), [7]);
        assert_eq!(ev.now(), VirtualInstant::ZERO + Duration::from_secs(2));
    }

    #[test]
    fn zero_delay_sleep_still_yields_once() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let task_log = Arc::clone(&log);
        let task_handle = handle.clone();
        handle.spawn(async move {
            task_handle.sleep(Duration::ZERO).await;
            task_log.lock().unwrap().push("resumed");
        });

        // Still suspended: a zero-delay timer must wait for its turn.
        assert!(log.lock().unwrap().is_empty());
        ev.run();
        assert_eq!(*log.lock().unwrap(), ["resumed"]);
    }
}
