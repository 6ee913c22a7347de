use std::time::Duration;

use macro_rules_attribute::apply;
use microloop::{Deferred, EventLoop};
use smol::Timer;
use smol_macros::{Executor, main};

#[apply(main!)]
async fn main(ex: &Executor<'_>) {
    let ev = EventLoop::new();
    let handle = ev.handle();

    let (deferred, resolver) = Deferred::new(&handle);

    // Settle from a smol task, await on smol too: the deferred only relies
    // on the waker it is polled with.
    ex.spawn(async move {
        Timer::after(Duration::from_millis(250)).await;
        resolver.resolve("settled from a smol task");
    })
    .detach();

    println!("waiting...");
    match deferred.await {
        Ok(value) => println!("{value}"),
        Err(rejection) => println!("rejected: {rejection}"),
    }
}
