//! The scripted event-loop walkthrough.
//!
//! The original's visualization is narration, not measurement: a fixed table
//! of time points, each carrying the panel contents to display and sometimes
//! a narration line. The driver schedules one timer per step and copies the
//! scripted state into the stage; it never inspects the real loop's queues.

use std::time::Duration;

use crate::demo::Pacing;
use crate::event_loop::LoopHandle;
use crate::transcript::{ListPanel, Transcript};

/// One frame of the scripted call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrame {
    pub name: &'static str,
    /// Whether the frame is drawn as the one currently running.
    pub executing: bool,
}

/// What the three panels show at one scripted time point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopSnapshot {
    pub call_stack: Vec<StackFrame>,
    pub task_queue: Vec<&'static str>,
    pub microtask_queue: Vec<&'static str>,
}

impl LoopSnapshot {
    /// `true` when all three panels are empty.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.call_stack.is_empty() && self.task_queue.is_empty() && self.microtask_queue.is_empty()
    }
}

/// One row of the narration script: when, what to say, what to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrationStep {
    pub offset: Duration,
    pub line: Option<&'static str>,
    pub snapshot: LoopSnapshot,
}

/// The sinks the walkthrough plays into: one transcript and the three
/// loop panels.
#[derive(Clone, Default)]
pub struct Stage {
    pub transcript: Transcript,
    pub call_stack: ListPanel<StackFrame>,
    pub task_queue: ListPanel<&'static str>,
    pub microtask_queue: ListPanel<&'static str>,
}

impl Stage {
    /// A stage with empty sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// The narration table: seven steps, one per multiple of `step`.
///
/// The story told is the microtask race. Main runs and says so; a timer
/// callback and then a promise continuation get enqueued; Main finishes; the
/// microtask queue is drained before the timer fires; the stage empties.
/// With `step` zero all rows become due immediately and still play in table
/// order.
#[must_use]
pub fn script(step: Duration) -> Vec<NarrationStep> {
    let frame = |name, executing| StackFrame { name, executing };
    vec![
        NarrationStep {
            offset: Duration::ZERO,
            line: Some("1. Synchronous task"),
            snapshot: LoopSnapshot {
                call_stack: vec![frame("Main", true)],
                task_queue: vec![],
                microtask_queue: vec![],
            },
        },
        NarrationStep {
            offset: step,
            line: None,
            snapshot: LoopSnapshot {
                call_stack: vec![frame("Main", true)],
                task_queue: vec!["setTimeout"],
                microtask_queue: vec![],
            },
        },
        NarrationStep {
            offset: step * 2,
            line: None,
            snapshot: LoopSnapshot {
                call_stack: vec![frame("Main", true)],
                task_queue: vec!["setTimeout"],
                microtask_queue: vec!["Promise"],
            },
        },
        NarrationStep {
            offset: step * 3,
            line: Some("2. Synchronous task"),
            snapshot: LoopSnapshot {
                call_stack: vec![frame("Main", true)],
                task_queue: vec!["setTimeout"],
                microtask_queue: vec!["Promise"],
            },
        },
        NarrationStep {
            offset: step * 4,
            line: Some("3. Microtask"),
            snapshot: LoopSnapshot {
                call_stack: vec![frame("Main", false), frame("Promise callback", true)],
                task_queue: vec!["setTimeout"],
                microtask_queue: vec![],
            },
        },
        NarrationStep {
            offset: step * 5,
            line: Some("4. Timer callback"),
            snapshot: LoopSnapshot {
                call_stack: vec![frame("Main", false), frame("setTimeout callback", true)],
                task_queue: vec![],
                microtask_queue: vec![],
            },
        },
        NarrationStep {
            offset: step * 6,
            line: None,
            snapshot: LoopSnapshot {
                call_stack: vec![],
                task_queue: vec![],
                microtask_queue: vec![],
            },
        },
    ]
}

/// Plays the narration on the given loop.
///
/// Clears all four sinks synchronously, then schedules one timer per step at
/// its offset (`pacing.narration_step` apart). Each step appends its line, if
/// it has one, and replaces the three panels wholesale with its snapshot.
/// Replaying after completion reproduces the same sequence from a clean
/// stage.
pub fn play(handle: &LoopHandle, stage: &Stage, pacing: Pacing) {
    stage.transcript.clear();
    stage.call_stack.clear();
    stage.task_queue.clear();
    stage.microtask_queue.clear();

    for step in script(pacing.narration_step) {
        let stage = stage.clone();
        handle.set_timeout(step.offset, move || {
            if let Some(line) = step.line {
                stage.transcript.push(line);
            }
            stage.call_stack.set(step.snapshot.call_stack);
            stage.task_queue.set(step.snapshot.task_queue);
            stage.microtask_queue.set(step.snapshot.microtask_queue);
        });
    }
}
