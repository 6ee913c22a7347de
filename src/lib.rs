//! A deterministic, browser-style event loop for teaching asynchronous
//! control flow.
//!
//! `microloop` reproduces the scheduling model behind the classic async
//! lessons (timers, callbacks, promises, async/await, and the event-loop
//! visualization) as an explicit, testable machine. Demos narrate what they
//! do into transcript sinks, and the loop runs on virtual time so every
//! ordering claim can be asserted rather than watched.
//!
//! Features include:
//! - An `EventLoop` with a timer (macrotask) heap and a FIFO microtask queue,
//!   drained with browser ordering: synchronous code first, then all pending
//!   microtasks, then exactly one timer callback at a time
//! - Virtual time: `run()` jumps between due timers, `run_until()` stops the
//!   clock mid-demo for assertions, `run_paced()` replays the same schedule in
//!   wall-clock time
//! - `Deferred`/`Resolver`, a one-shot settleable pair with promise
//!   semantics: settle-once, continuations as microtasks, awaiting never
//!   synchronous, usable from any executor
//! - Time-based wrappers like `Sleep` and `Delay` that wait on the loop's
//!   timers instead of the wall clock
//! - The demo routines themselves, plus the scripted walkthrough that plays
//!   the event-loop story onto stack and queue panels
//!
//! The loop drives its own futures; settling, awaiting, and the executor
//! bridges in the demo programs show it cooperating with external runtimes.
//!
//! # Example
//! ```
//! use microloop::{EventLoop, Transcript, demo};
//!
//! let mut ev = EventLoop::new();
//! let out = Transcript::new();
//!
//! demo::microtask_race(&ev.handle(), &out);
//! ev.run();
//!
//! assert_eq!(
//!     out.lines(),
//!     [
//!         "1. Script start",
//!         "2. Script end",
//!         "3. Promise microtask",
//!         "4. Timer callback",
//!     ],
//! );
//! ```

pub mod clock;
pub mod deferred;
pub mod demo;
pub mod event_loop;
pub mod task_ext;
pub mod timing;
pub mod transcript;
pub mod walkthrough;

pub use clock::VirtualInstant;
pub use deferred::{Deferred, Rejection, Resolver};
pub use demo::{Pacing, PageView};
pub use event_loop::{EventLoop, LoopHandle};
pub use task_ext::TaskExt;
pub use timing::{Delay, Sleep};
pub use transcript::{ListPanel, Transcript};
pub use walkthrough::Stage;
