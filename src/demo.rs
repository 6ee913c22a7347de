//! The demo routines: five small async lessons that narrate into a
//! [`Transcript`].
//!
//! Each routine is the body of one button handler from the original pages,
//! rewritten against an injected [`LoopHandle`] and explicit sinks. They are
//! stateless between invocations; invoking one again while a previous run is
//! still pending is allowed and simply interleaves output.
//!
//! All delay constants live in [`Pacing`], with one preset per page variant.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::deferred::{Deferred, Rejection};
use crate::event_loop::LoopHandle;
use crate::transcript::Transcript;

/// Every delay constant the demos use.
///
/// The two page variants of the original differ only in these values, so
/// they ship as presets: [`Pacing::CLASSIC`] for the detailed page and
/// [`Pacing::BRISK`] for the snappier one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Delay before the page-load demo reveals its images.
    pub images_delay: Duration,
    /// Delay before the page-load demo reveals its text content.
    pub content_delay: Duration,
    /// Simulated database query time.
    pub query_delay: Duration,
    /// Simulated weather service time.
    pub weather_delay: Duration,
    /// Duration of each of the three order-processing steps.
    pub order_step: Duration,
    /// Gap between scripted walkthrough steps.
    pub narration_step: Duration,
}

impl Pacing {
    /// The detailed page's constants: one- and two-second delays, narration
    /// advancing once per second.
    pub const CLASSIC: Self = Self {
        images_delay: Duration::from_millis(2000),
        content_delay: Duration::from_millis(1000),
        query_delay: Duration::from_millis(2000),
        weather_delay: Duration::from_millis(2000),
        order_step: Duration::from_millis(1000),
        narration_step: Duration::from_millis(1000),
    };

    /// The second variant's constants: every delay halved, narration
    /// immediate.
    pub const BRISK: Self = Self {
        images_delay: Duration::from_millis(1000),
        content_delay: Duration::from_millis(500),
        query_delay: Duration::from_millis(1000),
        weather_delay: Duration::from_millis(1000),
        order_step: Duration::from_millis(500),
        narration_step: Duration::ZERO,
    };
}

#[derive(Default)]
struct PageViewInner {
    structure: AtomicBool,
    content: AtomicBool,
    images: AtomicBool,
}

/// The three revealable sections of the simulated page.
///
/// Sections start hidden and are revealed as the page-load demo progresses;
/// nothing ever hides them again. Clones share the same flags.
#[derive(Clone, Default)]
pub struct PageView {
    inner: Arc<PageViewInner>,
}

impl PageView {
    /// A page with all sections hidden.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_structure(&self) {
        self.inner.structure.store(true, Ordering::Relaxed);
    }

    pub fn show_content(&self) {
        self.inner.content.store(true, Ordering::Relaxed);
    }

    pub fn show_images(&self) {
        self.inner.images.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn structure_visible(&self) -> bool {
        self.inner.structure.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn content_visible(&self) -> bool {
        self.inner.content.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn images_visible(&self) -> bool {
        self.inner.images.load(Ordering::Relaxed)
    }
}

/// A user record, as returned by the callback demo's fake query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: u32,
    pub name: String,
}

/// A weather report, as delivered by the promise demo's fake service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Weather {
    pub temp_f: i32,
    pub condition: String,
}

/// A product looked up by the order demo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: u32,
    pub name: String,
}

/// An order for one product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: u32,
    pub product: Product,
}

/// A shipment confirmation for one order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shipment {
    pub order_id: u32,
    pub address: String,
}

/// Simulates a database query: after `query_delay`, invokes `callback` with
/// the found user.
///
/// Continuation-passing style, single nesting level; the query string is
/// never inspected.
pub fn query_database(
    handle: &LoopHandle,
    pacing: Pacing,
    _query: &str,
    callback: impl FnOnce(User) + Send + 'static,
) {
    handle.set_timeout(pacing.query_delay, move || {
        callback(User {
            id: 1,
            name: "John Doe".into(),
        });
    });
}

/// Simulates a weather service: a deferred report, fulfilled after
/// `weather_delay`.
///
/// With these fixed inputs the deferred always fulfills; the rejection path
/// exists for the consumer to wire up.
pub fn fetch_weather(handle: &LoopHandle, pacing: Pacing) -> Deferred<Weather> {
    let (deferred, resolver) = Deferred::new(handle);
    handle.set_timeout(pacing.weather_delay, move || {
        resolver.resolve(Weather {
            temp_f: 72,
            condition: "Sunny".into(),
        });
    });
    deferred
}

/// Looks a product up, taking one `order_step`.
pub async fn fetch_product(
    handle: &LoopHandle,
    pacing: Pacing,
    id: u32,
) -> Result<Product, Rejection> {
    handle.sleep(pacing.order_step).await;
    Ok(Product {
        id,
        name: "Awesome Gadget".into(),
    })
}

/// Creates an order for a product, taking one `order_step`.
pub async fn create_order(
    handle: &LoopHandle,
    pacing: Pacing,
    product: Product,
) -> Result<Order, Rejection> {
    handle.sleep(pacing.order_step).await;
    Ok(Order { id: 1001, product })
}

/// Ships an order, taking one `order_step`.
pub async fn ship_order(
    handle: &LoopHandle,
    pacing: Pacing,
    order: &Order,
) -> Result<Shipment, Rejection> {
    handle.sleep(pacing.order_step).await;
    Ok(Shipment {
        order_id: order.id,
        address: "123 Main St".into(),
    })
}

/// The three-step order chain: fetch, create, ship, narrating each step.
///
/// Returns the summary line for the caller to append, or the first rejection
/// encountered. Step N + 1 does not start before step N has settled.
pub async fn place_order(
    handle: &LoopHandle,
    out: &Transcript,
    pacing: Pacing,
    product_id: u32,
) -> Result<String, Rejection> {
    let product = fetch_product(handle, pacing, product_id).await?;
    out.push(format!("Product fetched: {}", product.name));

    let order = create_order(handle, pacing, product).await?;
    out.push(format!("Order created: #{}", order.id));

    let shipment = ship_order(handle, pacing, &order).await?;
    out.push(format!("Order shipped to: {}", shipment.address));

    Ok(format!(
        "Order {} shipped to {}",
        shipment.order_id, shipment.address
    ))
}

/// The basic timer demo: two delayed reveals registered in the "wrong"
/// order.
///
/// Appends "Start loading page", schedules the images reveal
/// (`images_delay`) before the content reveal (`content_delay`), then
/// appends "End of script". Because the images delay is the longer one,
/// "Content loaded" still arrives first: timers fire in delay order, not
/// registration order, and both synchronous lines land before either.
///
/// # Example
/// ```
/// use microloop::{EventLoop, Pacing, PageView, Transcript, demo};
///
/// let mut ev = EventLoop::new();
/// let out = Transcript::new();
/// let page = PageView::new();
///
/// demo::page_load(&ev.handle(), &out, &page, Pacing::CLASSIC);
/// assert_eq!(out.lines(), ["Start loading page", "End of script"]);
///
/// ev.run();
/// assert_eq!(
///     out.lines(),
///     [
///         "Start loading page",
///         "End of script",
///         "Content loaded",
///         "Images loaded",
///     ],
/// );
/// assert!(page.images_visible());
/// ```
pub fn page_load(handle: &LoopHandle, out: &Transcript, page: &PageView, pacing: Pacing) {
    page.show_structure();
    out.push("Start loading page");

    let images_out = out.clone();
    let images_page = page.clone();
    handle.set_timeout(pacing.images_delay, move || {
        images_page.show_images();
        images_out.push("Images loaded");
    });

    let content_out = out.clone();
    let content_page = page.clone();
    handle.set_timeout(pacing.content_delay, move || {
        content_page.show_content();
        content_out.push("Content loaded");
    });

    out.push("End of script");
}

/// The callback demo: query, then hear back.
///
/// Appends "Querying database...", then after `query_delay` the continuation
/// appends "User found: John Doe (ID: 1)".
pub fn database_lookup(handle: &LoopHandle, out: &Transcript, pacing: Pacing) {
    out.push("Querying database...");

    let found = out.clone();
    query_database(handle, pacing, "SELECT * FROM users", move |user| {
        found.push(format!("User found: {} (ID: {})", user.name, user.id));
    });
}

/// The promise demo: a deferred report with a success and an error
/// continuation.
///
/// Appends "Fetching weather data...", then once the deferred settles either
/// "Temperature: 72°F, Condition: Sunny" or "Error: {message}". With the
/// fixed service data only the success line is reachable.
pub fn weather_report(handle: &LoopHandle, out: &Transcript, pacing: Pacing) {
    out.push("Fetching weather data...");

    let ok_out = out.clone();
    let err_out = out.clone();
    fetch_weather(handle, pacing).then(
        move |weather| {
            ok_out.push(format!(
                "Temperature: {}°F, Condition: {}",
                weather.temp_f, weather.condition
            ));
        },
        move |error| err_out.push(format!("Error: {error}")),
    );
}

/// The async/await demo: a sequential three-step chain.
///
/// Appends "Ordering product...", spawns the [`place_order`] chain, and
/// appends its summary line ("Order 1001 shipped to 123 Main St") when the
/// chain completes. Any rejection is converted to "Error: {message}" and
/// appended instead.
pub fn order_product(handle: &LoopHandle, out: &Transcript, pacing: Pacing) {
    out.push("Ordering product...");

    let task_handle = handle.clone();
    let task_out = out.clone();
    handle.spawn(async move {
        let line = match place_order(&task_handle, &task_out, pacing, 123).await {
            Ok(summary) => summary,
            Err(error) => format!("Error: {error}"),
        };
        task_out.push(line);
    });
}

/// The live event-loop demonstration: sync beats microtask beats timer.
///
/// Registers, in this order: a synchronous line, a zero-delay timer line, an
/// already-fulfilled deferred whose continuation appends a line, and a second
/// synchronous line. The transcript reads 1-2-3-4: both synchronous lines
/// first, then the promise continuation, then the timer callback, which is
/// the ordering guarantee the whole crate is built around.
pub fn microtask_race(handle: &LoopHandle, out: &Transcript) {
    out.push("1. Script start");

    let timer_out = out.clone();
    handle.set_timeout(Duration::ZERO, move || {
        timer_out.push("4. Timer callback");
    });

    let micro_out = out.clone();
    Deferred::resolved(handle, ()).then(move |()| micro_out.push("3. Promise microtask"), |_| {});

    out.push("2. Script end");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_presets_keep_the_published_delays() {
        assert_eq!(Pacing::CLASSIC.images_delay, Duration::from_secs(2));
        assert_eq!(Pacing::CLASSIC.content_delay, Duration::from_secs(1));
        assert!(Pacing::BRISK.content_delay < Pacing::CLASSIC.content_delay);
        assert_eq!(Pacing::BRISK.narration_step, Duration::ZERO);
    }

    #[test]
    fn page_view_sections_start_hidden_and_stay_revealed() {
        let page = PageView::new();
        assert!(!page.structure_visible());
        assert!(!page.content_visible());
        assert!(!page.images_visible());

        page.show_content();
        assert!(page.content_visible());
        assert!(!page.images_visible());
    }
}
