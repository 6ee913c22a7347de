use std::time::Duration;

use crate::event_loop::LoopHandle;
use crate::timing::Delay;

/// Extend `Future` with loop-time operations.
pub trait TaskExt: Future {
    /// Defers this future until a timer of `delay` on the loop behind
    /// `handle` has fired, counted from the first poll.
    fn delay(self, handle: &LoopHandle, delay: Duration) -> Delay<Self>
    where
        Self: Sized,
    {
        Delay::new(self, handle, delay)
    }
}

impl<T> TaskExt for T where T: Future {}
