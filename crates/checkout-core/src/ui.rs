//! UI Lock and Feedback
//!
//! Control-disable toggling, the blocking overlay and the single error
//! message. Driven only by the submission controller.

use std::cell::Cell;
use std::rc::Rc;

use crate::address::FormField;
use crate::card::CardInput;
use crate::error::Result;
use crate::provider::CardElement;

/// The host checkout page.
///
/// Implementations treat absent optional anchors (submit control, error
/// display, overlay, save-info checkbox) as no-ops.
pub trait CheckoutPage {
    /// Raw value of a form field, `None` when the field is not on the page
    fn field_value(&self, field: FormField) -> Option<String>;

    /// Whether the save-info checkbox is ticked
    fn save_info(&self) -> bool;

    /// Run native form validation, showing browser feedback on failure
    fn report_validity(&self) -> bool;

    /// Replace the error display text. An empty string clears it.
    fn set_error_message(&self, message: &str);

    fn set_submit_enabled(&self, enabled: bool);

    /// Flag the form itself as processing for page styles and scripts
    fn set_processing(&self, processing: bool);

    fn set_overlay_visible(&self, visible: bool);

    /// Create the hidden payment-id field if needed and set its value
    fn set_payment_id(&self, payment_id: &str) -> Result<()>;

    /// Submit the authoritative form via standard navigation
    fn submit_form(&self) -> Result<()>;
}

/// Lock over the submit control, card input and overlay
pub struct UiLock<P> {
    page: Rc<P>,
    locked: Cell<bool>,
    overlay: Cell<bool>,
}

impl<P: CheckoutPage> UiLock<P> {
    pub fn new(page: Rc<P>) -> Self {
        Self {
            page,
            locked: Cell::new(false),
            overlay: Cell::new(false),
        }
    }

    /// Disable the controls and show the overlay
    pub fn lock<E: CardElement>(&self, card: &CardInput<E>) {
        self.set_controls_enabled(false, card);
        self.set_overlay(true);
    }

    /// Enable the controls and hide the overlay
    pub fn unlock<E: CardElement>(&self, card: &CardInput<E>) {
        self.set_controls_enabled(true, card);
        self.set_overlay(false);
    }

    fn set_controls_enabled<E: CardElement>(&self, enabled: bool, card: &CardInput<E>) {
        self.page.set_submit_enabled(enabled);
        self.page.set_processing(!enabled);
        if enabled {
            card.enable();
        } else {
            card.disable();
        }
        self.locked.set(!enabled);
    }

    fn set_overlay(&self, visible: bool) {
        self.page.set_overlay_visible(visible);
        self.overlay.set(visible);
    }

    pub fn show_error(&self, message: &str) {
        self.page.set_error_message(message);
    }

    pub fn clear_error(&self) {
        self.page.set_error_message("");
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay.get()
    }
}
