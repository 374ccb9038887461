//! Startup
//!
//! Runs the configuration check, then constructs the provider client, mounts
//! the card input and builds the controller. Nothing past the check runs when
//! it fails.

use std::rc::Rc;

use crate::card::CardInput;
use crate::config::{self, AnchorSource, CheckoutSettings, PaymentConfig};
use crate::controller::SubmissionController;
use crate::error::Result;
use crate::provider::{MetadataCache, PaymentGateway};
use crate::ui::CheckoutPage;

/// Initialize the checkout flow on `page`.
///
/// `connect` builds the provider client from the validated public key. It is
/// only called after the configuration check passed.
pub fn initialize<G, M, P, F>(
    page: Rc<P>,
    settings: &CheckoutSettings,
    connect: F,
    cache: M,
) -> Result<SubmissionController<G, M, P>>
where
    G: PaymentGateway,
    M: MetadataCache,
    P: CheckoutPage + AnchorSource + 'static,
    F: FnOnce(&PaymentConfig) -> Result<G>,
{
    let config = config::load(&*page, settings)?;

    let gateway = connect(&config).inspect_err(|err| {
        tracing::warn!(error = %err, "Payment provider client could not be created");
        page.report_startup_error(&err.user_message());
    })?;

    let card = CardInput::mount(&gateway, &settings.card_mount_id, page.clone()).inspect_err(
        |err| {
            tracing::warn!(error = %err, "Card input could not be mounted");
            page.report_startup_error(&err.user_message());
        },
    )?;

    tracing::info!("Checkout ready");
    Ok(SubmissionController::new(
        config, settings, gateway, cache, card, page,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SubmissionState;
    use crate::error::{CheckoutError, ConfigError};
    use crate::mock::{MockCache, MockGateway, MockPage};

    #[test]
    fn test_missing_public_key_aborts_before_provider() {
        let page = Rc::new(MockPage::checkout());
        page.remove_element("id_stripe_public_key");
        let cache = MockCache::default();
        let mut connected = false;

        let result = initialize(
            page.clone(),
            &CheckoutSettings::default(),
            |_| {
                connected = true;
                Ok(MockGateway::default())
            },
            cache.clone(),
        );

        assert!(matches!(
            result,
            Err(CheckoutError::Config(ConfigError::MissingConfig(_)))
        ));
        assert!(!connected);
        assert_eq!(cache.call_count(), 0);
        assert!(!page.error_message().is_empty());
    }

    #[test]
    fn test_initialize_mounts_card() {
        let page = Rc::new(MockPage::checkout());
        let gateway = MockGateway::default();
        let handle = gateway.clone();

        let controller = initialize(
            page,
            &CheckoutSettings::default(),
            |config| {
                assert_eq!(config.public_key(), "pk_test_123");
                Ok(gateway)
            },
            MockCache::default(),
        )
        .unwrap();

        assert_eq!(controller.state(), SubmissionState::Idle);
        assert_eq!(
            handle.card().and_then(|c| c.mounted_at()).as_deref(),
            Some("#card-element")
        );
    }

    #[test]
    fn test_connect_failure_is_reported() {
        let page = Rc::new(MockPage::checkout());

        let result = initialize(
            page.clone(),
            &CheckoutSettings::default(),
            |_| Err::<MockGateway, _>(CheckoutError::Provider("Stripe.js not loaded".into())),
            MockCache::default(),
        );

        assert!(result.is_err());
        assert!(!page.error_message().is_empty());
    }
}
