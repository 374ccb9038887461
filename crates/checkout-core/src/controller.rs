//! Submission Controller
//!
//! Single-flight state machine driving one submission attempt:
//!
//! ```text
//!            submit (valid, idle)
//!   ┌──────┐ ─────────────────────▶ ┌────────────┐
//!   │ Idle │                        │ Processing │──── succeeded ───▶ form hand-off
//!   └──────┘ ◀───────────────────── └────────────┘
//!            error / incomplete / thrown
//! ```
//!
//! Inside `Processing` the metadata cache call strictly precedes the
//! confirmation call. The `Processing` flag is the only mutual exclusion
//! across the two suspension points.

use std::cell::Cell;
use std::rc::Rc;

use crate::address::CheckoutDetails;
use crate::card::CardInput;
use crate::config::{CheckoutSettings, PaymentConfig};
use crate::error::{CheckoutError, Result};
use crate::outcome::PaymentOutcome;
use crate::provider::{ConfirmCardPayment, MetadataCache, PaymentGateway};
use crate::ui::{CheckoutPage, UiLock};

/// Submission state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Processing,
}

/// What a call to [`SubmissionController::submit`] did
#[derive(Debug)]
pub enum SubmitResult {
    /// A submission was already in flight, nothing happened
    Ignored,

    /// Native form validation failed, nothing else happened
    Invalid,

    /// The confirmation call settled. On success the form was handed off.
    Completed(PaymentOutcome),

    /// The attempt failed before producing an outcome
    Aborted(CheckoutError),
}

/// Drives the checkout submission flow
pub struct SubmissionController<G: PaymentGateway, M, P> {
    config: PaymentConfig,
    include_shipping: bool,
    gateway: G,
    cache: M,
    card: CardInput<G::Card>,
    page: Rc<P>,
    ui: UiLock<P>,
    state: Cell<SubmissionState>,
}

impl<G, M, P> SubmissionController<G, M, P>
where
    G: PaymentGateway,
    M: MetadataCache,
    P: CheckoutPage,
{
    pub fn new(
        config: PaymentConfig,
        settings: &CheckoutSettings,
        gateway: G,
        cache: M,
        card: CardInput<G::Card>,
        page: Rc<P>,
    ) -> Self {
        Self {
            config,
            include_shipping: settings.include_shipping,
            gateway,
            cache,
            card,
            ui: UiLock::new(page.clone()),
            page,
            state: Cell::new(SubmissionState::Idle),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.get()
    }

    pub const fn ui(&self) -> &UiLock<P> {
        &self.ui
    }

    pub const fn card(&self) -> &CardInput<G::Card> {
        &self.card
    }

    /// Handle one submission intent.
    ///
    /// A call made while another is in flight returns [`SubmitResult::Ignored`]
    /// before touching anything.
    pub async fn submit(&self) -> SubmitResult {
        if self.state.get() == SubmissionState::Processing {
            tracing::debug!("Submission already in flight, ignoring");
            return SubmitResult::Ignored;
        }

        if !self.page.report_validity() {
            tracing::debug!("Native form validation failed");
            return SubmitResult::Invalid;
        }

        self.begin();

        let outcome = match self.attempt().await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "Checkout submission failed");
                self.settle(&err.user_message());
                return SubmitResult::Aborted(err);
            }
        };

        match &outcome {
            PaymentOutcome::Succeeded { payment_id } => {
                if let Err(err) = self.hand_off(payment_id) {
                    tracing::warn!(error = %err, "Form hand-off failed");
                    self.settle(&err.user_message());
                    return SubmitResult::Aborted(err);
                }
            }
            PaymentOutcome::Error { .. } | PaymentOutcome::Incomplete { .. } => {
                tracing::info!(outcome = ?outcome, "Payment not completed");
                let message = outcome.user_message().unwrap_or_default();
                self.settle(&message);
            }
        }

        SubmitResult::Completed(outcome)
    }

    /// `Idle -> Processing`: clear the error and lock the UI
    fn begin(&self) {
        self.state.set(SubmissionState::Processing);
        self.ui.clear_error();
        self.ui.lock(&self.card);
    }

    /// `Processing -> Idle`: show the message and unlock the UI
    fn settle(&self, message: &str) {
        self.ui.show_error(message);
        self.ui.unlock(&self.card);
        self.state.set(SubmissionState::Idle);
    }

    /// Pass the payment id to the authoritative form and submit it.
    ///
    /// The UI stays locked and the state stays `Processing`: the page is
    /// expected to navigate away.
    fn hand_off(&self, payment_id: &str) -> Result<()> {
        self.page.set_payment_id(payment_id)?;
        self.page.submit_form()?;
        tracing::info!(payment_id, "Payment succeeded, submitting order form");
        Ok(())
    }

    async fn attempt(&self) -> Result<PaymentOutcome> {
        let details = CheckoutDetails::collect(&*self.page);
        let secret = self.config.client_secret();

        let save_info = self.page.save_info();
        self.cache.cache_checkout_data(secret, save_info).await?;
        tracing::debug!(save_info, "Checkout metadata cached");

        let billing_details = details.billing_details();
        let shipping = if self.include_shipping {
            details.shipping_details()
        } else {
            None
        };

        let response = self
            .gateway
            .confirm_card_payment(
                secret,
                ConfirmCardPayment {
                    card: self.card.as_payment_method(),
                    billing_details: &billing_details,
                    shipping: shipping.as_ref(),
                },
            )
            .await?;

        PaymentOutcome::classify(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::FormField;
    use crate::error::{CACHE_FAILED_MESSAGE, CacheError, PAYMENT_FAILED_MESSAGE};
    use crate::mock::{MockCache, MockConfirm, MockGateway, MockPage};
    use crate::provider::ConfirmResponse;

    type Controller = SubmissionController<MockGateway, MockCache, MockPage>;

    fn controller(gateway: &MockGateway, cache: &MockCache, page: &Rc<MockPage>) -> Controller {
        controller_with(gateway, cache, page, &CheckoutSettings::default())
    }

    fn controller_with(
        gateway: &MockGateway,
        cache: &MockCache,
        page: &Rc<MockPage>,
        settings: &CheckoutSettings,
    ) -> Controller {
        let config = PaymentConfig::parse(r#""pk_test_1""#, r#""pi_1_secret_1""#).unwrap();
        let card = CardInput::mount(gateway, "card-element", page.clone()).unwrap();
        SubmissionController::new(
            config,
            settings,
            gateway.clone(),
            cache.clone(),
            card,
            page.clone(),
        )
    }

    fn assert_settled(controller: &Controller, page: &MockPage) {
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert!(!controller.ui().is_locked());
        assert!(!controller.ui().overlay_visible());
        assert!(!page.overlay_visible());
        assert!(!page.processing());
        assert!(page.submit_enabled());
        assert!(!controller.card().as_payment_method().is_disabled());
        assert_eq!(page.submit_count(), 0);
    }

    #[tokio::test]
    async fn test_success_hands_off_form() {
        let gateway = MockGateway::responding(ConfirmResponse::with_status("pi_42", "succeeded"));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(result, SubmitResult::Completed(ref o) if o.is_success()));
        assert_eq!(page.submit_count(), 1);
        assert_eq!(page.payment_id().as_deref(), Some("pi_42"));
        assert_eq!(page.payment_id_at_submit().as_deref(), Some("pi_42"));
        assert!(page.overlay_visible());
        assert!(controller.ui().overlay_visible());
        assert!(page.processing());
        assert!(!page.submit_enabled());
        assert!(controller.ui().is_locked());
        assert_eq!(controller.state(), SubmissionState::Processing);
    }

    #[tokio::test]
    async fn test_declined_card_shows_provider_message() {
        let gateway = MockGateway::responding(ConfirmResponse::failed("Your card was declined."));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(result, SubmitResult::Completed(PaymentOutcome::Error { .. })));
        assert_eq!(page.error_message(), "Your card was declined.");
        assert_settled(&controller, &page);
    }

    #[tokio::test]
    async fn test_incomplete_status_is_visible() {
        let gateway =
            MockGateway::responding(ConfirmResponse::with_status("pi_1", "requires_action"));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(
            result,
            SubmitResult::Completed(PaymentOutcome::Incomplete { ref status }) if status == "requires_action"
        ));
        assert!(page.error_message().contains("not completed"));
        assert_settled(&controller, &page);
    }

    #[tokio::test]
    async fn test_cache_failure_skips_confirmation() {
        let gateway = MockGateway::responding(ConfirmResponse::with_status("pi_1", "succeeded"));
        let cache = MockCache::failing(CacheError::Rejected {
            status: 500,
            detail: None,
        });
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(result, SubmitResult::Aborted(CheckoutError::Cache(_))));
        assert_eq!(cache.call_count(), 1);
        assert_eq!(gateway.confirm_count(), 0);
        assert_eq!(page.error_message(), CACHE_FAILED_MESSAGE);
        assert_settled(&controller, &page);
    }

    #[tokio::test]
    async fn test_thrown_confirmation_returns_to_idle() {
        let gateway = MockGateway::scripted(MockConfirm::Throw("network down".into()));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(result, SubmitResult::Aborted(CheckoutError::Provider(_))));
        assert_eq!(page.error_message(), PAYMENT_FAILED_MESSAGE);
        assert_settled(&controller, &page);
    }

    #[tokio::test]
    async fn test_malformed_response_returns_to_idle() {
        let gateway = MockGateway::responding(ConfirmResponse::default());
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(
            result,
            SubmitResult::Aborted(CheckoutError::MalformedResponse(_))
        ));
        assert_settled(&controller, &page);
    }

    #[tokio::test]
    async fn test_failed_form_submit_returns_to_idle() {
        let gateway = MockGateway::responding(ConfirmResponse::with_status("pi_7", "succeeded"));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        page.fail_submit();
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(result, SubmitResult::Aborted(CheckoutError::Page(_))));
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert!(!page.overlay_visible());
    }

    #[tokio::test]
    async fn test_invalid_form_blocks_before_side_effects() {
        let gateway = MockGateway::responding(ConfirmResponse::with_status("pi_1", "succeeded"));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        page.set_valid(false);
        let controller = controller(&gateway, &cache, &page);
        let before = page.ui_toggle_count();

        let result = controller.submit().await;

        assert!(matches!(result, SubmitResult::Invalid));
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert_eq!(page.ui_toggle_count(), before);
        assert_eq!(cache.call_count(), 0);
        assert_eq!(gateway.confirm_count(), 0);
    }

    #[tokio::test]
    async fn test_second_submit_while_processing_is_noop() {
        let gateway = MockGateway::responding(ConfirmResponse::failed("Your card was declined."));
        let (cache, release) = MockCache::gated();
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        let first = controller.submit();
        futures::pin_mut!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert_eq!(controller.state(), SubmissionState::Processing);

        let toggles = page.ui_toggle_count();
        let errors = page.error_write_count();

        let second = controller.submit().await;
        assert!(matches!(second, SubmitResult::Ignored));
        assert_eq!(page.ui_toggle_count(), toggles);
        assert_eq!(page.error_write_count(), errors);
        assert_eq!(page.validity_checks(), 1);
        assert_eq!(cache.call_count(), 1);
        assert_eq!(gateway.confirm_count(), 0);

        release.send(()).unwrap();
        let result = first.await;
        assert!(matches!(result, SubmitResult::Completed(PaymentOutcome::Error { .. })));
        assert_eq!(gateway.confirm_count(), 1);
        assert_settled(&controller, &page);
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let gateway = MockGateway::default();
        gateway.push(MockConfirm::Respond(ConfirmResponse::failed("Your card was declined.")));
        gateway.push(MockConfirm::Respond(ConfirmResponse::with_status("pi_9", "succeeded")));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let controller = controller(&gateway, &cache, &page);

        controller.submit().await;
        assert_eq!(controller.state(), SubmissionState::Idle);

        controller.submit().await;
        assert_eq!(page.submit_count(), 1);
        assert_eq!(page.error_message(), "");
        assert_eq!(cache.call_count(), 2);
    }

    #[tokio::test]
    async fn test_request_carries_normalized_details() {
        let gateway = MockGateway::responding(ConfirmResponse::with_status("pi_1", "succeeded"));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        page.set_field(FormField::Country, "gb");
        page.set_field(FormField::Email, " ada@example.com ");
        page.set_save_info(true);
        let controller = controller(&gateway, &cache, &page);

        controller.submit().await;

        assert_eq!(cache.calls(), vec![("pi_1_secret_1".to_string(), true)]);
        let call = gateway.last_call().unwrap();
        assert_eq!(call.client_secret, "pi_1_secret_1");
        assert_eq!(call.billing_details.email, "ada@example.com");
        assert_eq!(call.billing_details.address.country, "GB");
        assert_eq!(call.shipping.unwrap().address.country, "GB");
    }

    #[tokio::test]
    async fn test_optional_anchors_absent_still_settle() {
        let gateway = MockGateway::responding(ConfirmResponse::failed("Your card was declined."));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let settings = CheckoutSettings::default();
        page.set_save_info(true);
        for id in [
            &settings.submit_button_id,
            &settings.error_display_id,
            &settings.overlay_id,
            &settings.save_info_id,
        ] {
            page.remove_element(id);
        }
        let controller = controller(&gateway, &cache, &page);

        let result = controller.submit().await;

        assert!(matches!(result, SubmitResult::Completed(PaymentOutcome::Error { .. })));
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert!(!controller.ui().is_locked());
        assert!(!controller.ui().overlay_visible());
        assert!(!controller.card().as_payment_method().is_disabled());
        assert_eq!(cache.calls(), vec![("pi_1_secret_1".to_string(), false)]);
        assert_eq!(page.error_write_count(), 0);
        assert_eq!(gateway.confirm_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_recipient_omits_shipping() {
        let gateway = MockGateway::responding(ConfirmResponse::with_status("pi_1", "succeeded"));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        page.set_field(FormField::FullName, "");
        let controller = controller(&gateway, &cache, &page);

        controller.submit().await;

        let call = gateway.last_call().unwrap();
        assert!(call.shipping.is_none());
        assert_eq!(call.billing_details.address.line1, "12 St James's Square");
        assert_eq!(page.submit_count(), 1);
    }

    #[tokio::test]
    async fn test_shipping_can_be_disabled() {
        let gateway = MockGateway::responding(ConfirmResponse::with_status("pi_1", "succeeded"));
        let cache = MockCache::default();
        let page = Rc::new(MockPage::checkout());
        let settings = CheckoutSettings {
            include_shipping: false,
            ..CheckoutSettings::default()
        };
        let controller = controller_with(&gateway, &cache, &page, &settings);

        controller.submit().await;

        assert!(gateway.last_call().unwrap().shipping.is_none());
    }
}
