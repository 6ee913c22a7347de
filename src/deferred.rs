//! One-shot settleable values with promise semantics.
//!
//! A [`Deferred`] is the consuming half of a pair created by
//! [`Deferred::new`]; the matching [`Resolver`] settles it exactly once, with
//! a value or a [`Rejection`]. Continuations never run inline: a `.then`
//! callback is queued as a microtask even when the value is already there,
//! and awaiting a settled `Deferred` still suspends once before resuming.
//! Both rules come from the host promise model the demos teach, and both are
//! what keeps "promise beats timer, sync beats promise" observable.
//!
//! The await path only uses the waker it is given, so a `Deferred` can be
//! awaited on any executor. The `.then` path queues onto the owning loop and
//! needs that loop to be driven.

use std::{
    pin::Pin,
    sync::{Arc, Mutex},
    task::Waker,
};

use crate::event_loop::LoopHandle;

/// Why a [`Deferred`] failed to produce a value.
///
/// Carries the reason as a message, the way host rejections carry an error
/// whose `message` gets shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    message: String,
}

impl Rejection {
    /// A rejection with the given reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The rejection produced when a [`Resolver`] is dropped unsettled.
    #[must_use]
    pub fn abandoned() -> Self {
        Self::new("resolver dropped without settling")
    }

    /// The reason given when the deferred was rejected.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Rejection {}

impl From<&str> for Rejection {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Rejection {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

enum State<T> {
    Pending,
    Fulfilled(T),
    Rejected(Rejection),
}

type Callback<T> = Box<dyn FnOnce(Result<T, Rejection>) + Send>;

struct Inner<T> {
    state: State<T>,
    callbacks: Vec<Callback<T>>,
    waker: Option<Waker>,
}

struct SharedState<T> {
    inner: Mutex<Inner<T>>,
    handle: LoopHandle,
}

fn fulfill<T>(shared: &SharedState<T>, value: T)
where
    T: Clone + Send + 'static,
{
    let (callbacks, waker) = {
        let mut guard = shared.inner.lock().unwrap();
        let inner = &mut *guard;
        if !matches!(inner.state, State::Pending) {
            return;
        }
        inner.state = State::Fulfilled(value.clone());
        (std::mem::take(&mut inner.callbacks), inner.waker.take())
    };
    for callback in callbacks {
        let outcome = Ok(value.clone());
        shared.handle.queue_microtask(move || callback(outcome));
    }
    if let Some(waker) = waker {
        waker.wake();
    }
}

fn reject_with<T: Send + 'static>(shared: &SharedState<T>, rejection: Rejection) {
    let (callbacks, waker) = {
        let mut guard = shared.inner.lock().unwrap();
        let inner = &mut *guard;
        if !matches!(inner.state, State::Pending) {
            return;
        }
        inner.state = State::Rejected(rejection.clone());
        (std::mem::take(&mut inner.callbacks), inner.waker.take())
    };
    for callback in callbacks {
        let outcome = Err(rejection.clone());
        shared.handle.queue_microtask(move || callback(outcome));
    }
    if let Some(waker) = waker {
        waker.wake();
    }
}

/// The consuming half of a settleable pair: a value that will arrive later.
///
/// Await it for the `Result`, or attach continuations with
/// [`then`](Self::then). Either way the continuation runs as a microtask,
/// never inline with the code that settled it.
///
/// # Example
/// ```
/// use microloop::{Deferred, EventLoop};
///
/// let mut ev = EventLoop::new();
/// let handle = ev.handle();
///
/// let (deferred, resolver) = Deferred::new(&handle);
/// deferred.then(
///     |user: &'static str| println!("User found: {user}"),
///     |err| println!("Error: {err}"),
/// );
/// resolver.resolve("John Doe");
///
/// // Nothing has printed yet; the callback waits in the microtask queue.
/// ev.run();
/// ```
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct Deferred<T> {
    shared: Arc<SharedState<T>>,
    polled: bool,
}

impl<T: Send + 'static> Deferred<T> {
    /// Creates a pending deferred and the resolver that settles it.
    pub fn new(handle: &LoopHandle) -> (Deferred<T>, Resolver<T>) {
        let shared = Arc::new(SharedState {
            inner: Mutex::new(Inner {
                state: State::Pending,
                callbacks: Vec::new(),
                waker: None,
            }),
            handle: handle.clone(),
        });
        (
            Deferred {
                shared: Arc::clone(&shared),
                polled: false,
            },
            Resolver {
                shared: Some(shared),
            },
        )
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// A deferred that is already fulfilled with `value`.
    ///
    /// Continuations still run asynchronously: attaching one queues a
    /// microtask rather than running it inline.
    pub fn resolved(handle: &LoopHandle, value: T) -> Self {
        let (deferred, resolver) = Deferred::new(handle);
        resolver.resolve(value);
        deferred
    }

    /// Attaches a continuation pair.
    ///
    /// Exactly one of the two callbacks will run, as a microtask, once the
    /// deferred settles. If it is already settled the callback is queued
    /// immediately, but still runs only when the loop next drains
    /// microtasks. Multiple continuations run in registration order.
    pub fn then(
        &self,
        on_ok: impl FnOnce(T) + Send + 'static,
        on_err: impl FnOnce(Rejection) + Send + 'static,
    ) {
        let callback: Callback<T> = Box::new(move |outcome| match outcome {
            Ok(value) => on_ok(value),
            Err(rejection) => on_err(rejection),
        });
        let settled = {
            let mut guard = self.shared.inner.lock().unwrap();
            let inner = &mut *guard;
            match &inner.state {
                State::Pending => {
                    inner.callbacks.push(callback);
                    None
                }
                State::Fulfilled(value) => Some((callback, Ok(value.clone()))),
                State::Rejected(rejection) => Some((callback, Err(rejection.clone()))),
            }
        };
        if let Some((callback, outcome)) = settled {
            self.shared
                .handle
                .queue_microtask(move || callback(outcome));
        }
    }
}

impl<T: Clone + Send + 'static> Future for Deferred<T> {
    type Output = Result<T, Rejection>;

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let this = self.get_mut();
        let mut guard = this.shared.inner.lock().unwrap();
        let inner = &mut *guard;
        if !this.polled {
            // First poll always suspends, even when already settled, so the
            // code after an await never runs in the same synchronous segment.
            this.polled = true;
            match inner.state {
                State::Pending => inner.waker = Some(cx.waker().clone()),
                _ => cx.waker().wake_by_ref(),
            }
            return std::task::Poll::Pending;
        }
        match &inner.state {
            State::Pending => {
                inner.waker = Some(cx.waker().clone());
                std::task::Poll::Pending
            }
            State::Fulfilled(value) => std::task::Poll::Ready(Ok(value.clone())),
            State::Rejected(rejection) => std::task::Poll::Ready(Err(rejection.clone())),
        }
    }
}

/// The settling half of a [`Deferred`] pair.
///
/// Settling consumes the resolver, so a deferred can only ever settle once.
/// Dropping an unsettled resolver rejects the deferred with
/// [`Rejection::abandoned`], so a waiter is never stranded by a lost
/// producer.
pub struct Resolver<T: Send + 'static> {
    // None only between an explicit settle and the drop that follows it.
    shared: Option<Arc<SharedState<T>>>,
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Fulfills the deferred with `value`.
    pub fn resolve(mut self, value: T) {
        if let Some(shared) = self.shared.take() {
            fulfill(&shared, value);
        }
    }

    /// Rejects the deferred with the given reason.
    pub fn reject(mut self, rejection: impl Into<Rejection>) {
        if let Some(shared) = self.shared.take() {
            reject_with(&shared, rejection.into());
        }
    }
}

impl<T: Send + 'static> Drop for Resolver<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            reject_with(&shared, Rejection::abandoned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_loop::EventLoop;

    #[test]
    fn then_on_a_settled_deferred_waits_for_the_microtask_queue() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let deferred = Deferred::resolved(&handle, 41);
        let ok_log = Arc::clone(&log);
        deferred.then(
            move |value| ok_log.lock().unwrap().push(value + 1),
            |_| panic!("fulfilled deferred must not reject"),
        );

        assert!(log.lock().unwrap().is_empty(), "callback ran inline");
        ev.run();
        assert_eq!(*log.lock().unwrap(), [42]);
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let (deferred, resolver) = Deferred::new(&handle);
        for n in 0..3 {
            let log = Arc::clone(&log);
            deferred.then(move |value: i32| log.lock().unwrap().push((n, value)), |_| {});
        }
        resolver.resolve(5);

        ev.run();
        assert_eq!(*log.lock().unwrap(), [(0, 5), (1, 5), (2, 5)]);
    }

    #[test]
    fn dropping_the_resolver_rejects_as_abandoned() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let (deferred, resolver) = Deferred::<i32>::new(&handle);
        let err_log = Arc::clone(&log);
        deferred.then(
            |_| panic!("no value was ever provided"),
            move |rejection| err_log.lock().unwrap().push(rejection),
        );
        drop(resolver);

        ev.run();
        assert_eq!(*log.lock().unwrap(), [Rejection::abandoned()]);
    }

    #[test]
    fn explicit_rejection_reaches_the_error_continuation() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let (deferred, resolver) = Deferred::<i32>::new(&handle);
        let err_log = Arc::clone(&log);
        deferred.then(
            |_| panic!("a rejected deferred must not fulfill"),
            move |rejection| err_log.lock().unwrap().push(format!("Error: {rejection}")),
        );
        resolver.reject("service unavailable");

        assert!(log.lock().unwrap().is_empty(), "rejection callbacks are microtasks too");
        ev.run();
        assert_eq!(*log.lock().unwrap(), ["Error: service unavailable"]);
    }

    #[test]
    fn then_attached_after_rejection_still_fires() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let (deferred, resolver) = Deferred::<i32>::new(&handle);
        resolver.reject(Rejection::new("service unavailable"));
        ev.run();

        let err_log = Arc::clone(&log);
        deferred.then(
            |_| panic!("a rejected deferred must not fulfill"),
            move |rejection| err_log.lock().unwrap().push(rejection.message().to_string()),
        );
        assert!(log.lock().unwrap().is_empty(), "the continuation still waits for a drain");

        ev.run();
        assert_eq!(*log.lock().unwrap(), ["service unavailable"]);
    }

    #[test]
    fn resolving_prevents_the_drop_rejection() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let (deferred, resolver) = Deferred::new(&handle);
        let log_keep = Arc::clone(&log);
        deferred.then(
            move |value: &str| log_keep.lock().unwrap().push(format!("ok: {value}")),
            |rejection| panic!("unexpected rejection: {rejection}"),
        );
        resolver.resolve("done");

        ev.run();
        assert_eq!(*log.lock().unwrap(), ["ok: done"]);
    }

    #[test]
    fn awaiting_a_settled_deferred_still_suspends_once() {
        let mut ev = EventLoop::new();
        let handle = ev.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let deferred = Deferred::resolved(&handle, "ready");
        let task_log = Arc::clone(&log);
        handle.spawn(async move {
            let value = deferred.await;
            task_log.lock().unwrap().push(value);
        });

        // The eager first poll must stop at the await.
        assert!(log.lock().unwrap().is_empty());
        ev.run();
        assert_eq!(*log.lock().unwrap(), [Ok("ready")]);
        // Only microtasks were involved, so virtual time never moved.
        assert_eq!(ev.now(), crate::clock::VirtualInstant::ZERO);
    }
}
