use std::{thread, time::Duration};

use microloop::{
    Deferred, EventLoop, Pacing, Rejection, Transcript,
    demo::{self, Weather},
};

#[tokio::test(flavor = "multi_thread")]
async fn deferred_settles_across_thread_and_executor_boundaries() {
    let ev = EventLoop::new();
    let handle = ev.handle();

    let (deferred, resolver) = Deferred::new(&handle);
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        resolver.resolve(27);
    });

    assert_eq!(
        deferred.await,
        Ok(27),
        "the value should reach the awaiting executor"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn timer_settled_deferred_can_be_awaited_on_tokio() {
    let mut ev = EventLoop::new();
    let handle = ev.handle();

    // The timer lives on the virtual-time loop; a plain thread drives it
    // while tokio awaits the result.
    let deferred = demo::fetch_weather(&handle, Pacing::CLASSIC);
    let driver = thread::spawn(move || ev.run());

    let weather = deferred.await.expect("fixed data always fulfills");
    assert_eq!(
        weather,
        Weather {
            temp_f: 72,
            condition: "Sunny".into(),
        }
    );
    driver.join().expect("driver thread should finish cleanly");
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_the_resolver_rejects_the_awaiter() {
    let ev = EventLoop::new();
    let (deferred, resolver) = Deferred::<u8>::new(&ev.handle());

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        drop(resolver);
    });

    assert_eq!(
        deferred.await,
        Err(Rejection::abandoned()),
        "losing the producer must reject, not hang"
    );
}

#[test]
fn then_registered_after_the_loop_went_idle_still_runs() {
    let mut ev = EventLoop::new();
    let handle = ev.handle();
    let out = Transcript::new();

    let deferred = Deferred::resolved(&handle, "late");
    ev.run();
    assert!(ev.is_idle());

    let cb_out = out.clone();
    deferred.then(move |value| cb_out.push(format!("then saw {value}")), |_| {});
    assert!(out.is_empty(), "the continuation still waits for a drain");

    ev.run();
    assert_eq!(out.lines(), ["then saw late"]);
}
