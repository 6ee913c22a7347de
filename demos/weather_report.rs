use microloop::{EventLoop, Pacing, Transcript, demo};

fn main() {
    let mut ev = EventLoop::new();
    let out = Transcript::echoing();

    demo::weather_report(&ev.handle(), &out, Pacing::CLASSIC);

    // The deferred fulfills after two seconds; its continuation runs as a
    // microtask right after that timer.
    ev.run_paced();
}
