//! Card Checkout Browser Binding
//!
//! WASM entry point wiring the checkout flow to the live page:
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────────────┐
//! │   DomPage    │   │ StripeGateway │   │   HttpMetadataCache  │
//! │  (web-sys)   │   │  (Stripe.js)  │   │      (reqwest)       │
//! └──────┬───────┘   └───────┬───────┘   └──────────┬───────────┘
//!        └───────────────────┼──────────────────────┘
//!                            ▼
//!               checkout_core::SubmissionController
//! ```

mod dom;
mod logging;
mod stripe;

use std::rc::Rc;

use checkout_core::{AnchorSource, CheckoutSettings, SubmissionController, SubmitResult};
use checkout_payments::HttpMetadataCache;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event};

pub use dom::DomPage;
pub use logging::init_logging;
pub use stripe::{StripeCard, StripeGateway};

type Controller = SubmissionController<StripeGateway, HttpMetadataCache, DomPage>;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    let Some(controller) = start(document) else {
        tracing::warn!("Checkout not initialized; form left untouched");
        return;
    };

    if let Err(err) = attach(controller) {
        tracing::error!(error = %stripe::describe(&err), "Submit listener could not be attached");
    }
}

/// Run startup. `None` means nothing was wired and the error, if any, is
/// already on the page.
fn start(document: Document) -> Option<(Rc<DomPage>, Controller)> {
    let defaults = DomPage::new(document.clone(), &CheckoutSettings::default());
    let settings = match CheckoutSettings::load(&defaults) {
        Ok(settings) => settings,
        Err(err) => {
            init_logging("info");
            tracing::warn!(error = %err, "Checkout settings unreadable");
            defaults.report_startup_error(err.user_message());
            return None;
        }
    };
    init_logging(&settings.log_level);

    let page = Rc::new(DomPage::new(document, &settings));
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();

    let cache = match HttpMetadataCache::from_settings(&origin, &settings, &page.cookies()) {
        Ok(cache) => cache,
        Err(err) => {
            tracing::warn!(error = %err, "Metadata cache endpoint invalid");
            page.report_startup_error(err.user_message());
            return None;
        }
    };

    let controller = checkout_core::initialize(
        page.clone(),
        &settings,
        |config| StripeGateway::connect(config.public_key()),
        cache,
    )
    .ok()?;

    Some((page, controller))
}

/// Route form submission through the controller.
///
/// The native submission is always cancelled. The success hand-off uses
/// `form.submit()`, which does not fire `submit` again.
fn attach((page, controller): (Rc<DomPage>, Controller)) -> Result<(), JsValue> {
    let Some(form) = page.form() else {
        return Ok(());
    };

    let controller = Rc::new(controller);
    let on_submit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();

        let controller = Rc::clone(&controller);
        spawn_local(async move {
            match controller.submit().await {
                SubmitResult::Ignored => tracing::debug!("Submission already in flight"),
                SubmitResult::Invalid => tracing::debug!("Form failed native validation"),
                SubmitResult::Completed(outcome) => {
                    tracing::info!(success = outcome.is_success(), "Payment attempt settled");
                }
                SubmitResult::Aborted(err) => {
                    tracing::warn!(error = %err, "Payment attempt aborted");
                }
            }
        });
    });

    form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;

    // Bound to the page lifetime.
    on_submit.forget();
    Ok(())
}
