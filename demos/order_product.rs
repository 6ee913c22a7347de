use microloop::{EventLoop, Pacing, Transcript, demo};

fn main() {
    let mut ev = EventLoop::new();
    let out = Transcript::echoing();

    demo::order_product(&ev.handle(), &out, Pacing::CLASSIC);

    // Three sequential steps, one second each: fetch, create, ship.
    ev.run_paced();
}
