use std::{thread, time::Duration};

use futures_lite::future;
use microloop::{Deferred, EventLoop};

fn main() {
    let ev = EventLoop::new();
    let (deferred, resolver) = Deferred::new(&ev.handle());

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        resolver.resolve(42);
    });

    // No runtime at all: block_on is enough to await a deferred.
    let value = future::block_on(deferred);
    println!("got {value:?}");
}
