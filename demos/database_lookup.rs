use microloop::{EventLoop, Pacing, Transcript, demo};

fn main() {
    let mut ev = EventLoop::new();
    let out = Transcript::echoing();

    demo::database_lookup(&ev.handle(), &out, Pacing::CLASSIC);

    // The continuation fires two seconds later.
    ev.run_paced();
}
