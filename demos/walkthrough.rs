use std::thread;

use microloop::{
    EventLoop, Pacing, Transcript,
    walkthrough::{self, Stage},
};

fn main() {
    let mut ev = EventLoop::new();
    let stage = Stage {
        transcript: Transcript::echoing(),
        ..Stage::new()
    };

    walkthrough::play(&ev.handle(), &stage, Pacing::CLASSIC);

    // Step manually so the panels can be drawn after each scripted state.
    while ev.turn() {
        let frames: Vec<String> = stage
            .call_stack
            .items()
            .iter()
            .map(|frame| {
                if frame.executing {
                    format!("{}*", frame.name)
                } else {
                    frame.name.to_string()
                }
            })
            .collect();
        println!(
            "  stack {frames:?}  tasks {:?}  microtasks {:?}",
            stage.task_queue.items(),
            stage.microtask_queue.items()
        );
        thread::sleep(Pacing::CLASSIC.narration_step);
    }
}
