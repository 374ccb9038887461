//! Payment Input Adapter
//!
//! Wraps the provider's card input widget: mounting, mirroring validation
//! errors into the page, and best-effort enable/disable.

use std::rc::Rc;

use crate::error::Result;
use crate::provider::{CardElement, CardStyle, PaymentGateway};
use crate::ui::CheckoutPage;

/// Mounted card input
#[derive(Debug)]
pub struct CardInput<E> {
    element: E,
}

impl<E: CardElement> CardInput<E> {
    /// Wrap an element without mounting it
    pub const fn new(element: E) -> Self {
        Self { element }
    }

    /// Create the widget, mount it at `#mount_id` and mirror its validation
    /// messages into the page's error display.
    pub fn mount<G, P>(gateway: &G, mount_id: &str, page: Rc<P>) -> Result<Self>
    where
        G: PaymentGateway<Card = E>,
        P: CheckoutPage + 'static,
    {
        let element = gateway.create_card_element(&CardStyle::default())?;
        element.mount(&format!("#{mount_id}"))?;

        element.on_change(Box::new(move |change| {
            page.set_error_message(change.error_message().unwrap_or_default());
        }))?;

        tracing::debug!(mount_id, "Card input mounted");
        Ok(Self::new(element))
    }

    pub fn disable(&self) {
        self.set_disabled(true);
    }

    pub fn enable(&self) {
        self.set_disabled(false);
    }

    // Not every widget supports disabling, so failures are swallowed.
    fn set_disabled(&self, disabled: bool) {
        if let Err(err) = self.element.set_disabled(disabled) {
            tracing::debug!(error = %err, disabled, "Card input ignored disable toggle");
        }
    }

    /// The value attached to a confirmation request
    pub const fn as_payment_method(&self) -> &E {
        &self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGateway, MockPage};
    use crate::provider::{CardChange, ProviderFailure};

    #[test]
    fn test_mount_mirrors_validation_errors() {
        let gateway = MockGateway::default();
        let page = Rc::new(MockPage::checkout());

        let card = CardInput::mount(&gateway, "card-element", page.clone()).unwrap();
        assert_eq!(card.as_payment_method().mounted_at().as_deref(), Some("#card-element"));

        card.as_payment_method().emit(CardChange {
            error: Some(ProviderFailure {
                message: Some("Your card's expiration date is in the past.".into()),
                ..ProviderFailure::default()
            }),
            ..CardChange::default()
        });
        assert_eq!(page.error_message(), "Your card's expiration date is in the past.");

        card.as_payment_method().emit(CardChange {
            complete: true,
            ..CardChange::default()
        });
        assert_eq!(page.error_message(), "");
    }

    #[test]
    fn test_mount_failure_is_reported() {
        let gateway = MockGateway::default();
        gateway.fail_mount();
        let page = Rc::new(MockPage::checkout());

        assert!(CardInput::mount(&gateway, "card-element", page).is_err());
    }
}
