use microloop::{EventLoop, Transcript, demo};

fn main() {
    let mut ev = EventLoop::new();
    let out = Transcript::echoing();

    demo::microtask_race(&ev.handle(), &out);

    // Everything is due immediately; the printed order is the whole lesson:
    // sync, sync, microtask, timer.
    ev.run();
}
