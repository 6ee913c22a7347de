use microloop::{EventLoop, Pacing, PageView, Transcript, demo};

fn main() {
    let mut ev = EventLoop::new();
    let out = Transcript::echoing();
    let page = PageView::new();

    demo::page_load(&ev.handle(), &out, &page, Pacing::CLASSIC);

    // Plays out in real time: content after one second, images after two,
    // even though the images timer was registered first.
    ev.run_paced();

    println!(
        "visible sections: structure={} content={} images={}",
        page.structure_visible(),
        page.content_visible(),
        page.images_visible()
    );
}
