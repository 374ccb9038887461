//! Mock Collaborators
//!
//! In-memory page, provider and cache for tests and demos. Handles are cheap
//! to clone and share state, so a test can keep one while the controller
//! owns another.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::address::{BillingDetails, FormField, ShippingDetails};
use crate::config::{AnchorSource, CheckoutSettings};
use crate::error::{CacheError, CheckoutError, Result};
use crate::provider::{
    CardChange, CardElement, CardStyle, ConfirmCardPayment, ConfirmResponse, MetadataCache,
    PaymentGateway,
};
use crate::ui::CheckoutPage;

/// In-memory checkout page
pub struct MockPage {
    settings: CheckoutSettings,
    elements: RefCell<HashSet<String>>,
    embedded: RefCell<HashMap<String, String>>,
    fields: RefCell<HashMap<FormField, String>>,
    valid: Cell<bool>,
    save_info: Cell<bool>,
    fail_submit: Cell<bool>,
    error_message: RefCell<String>,
    submit_enabled: Cell<bool>,
    overlay_visible: Cell<bool>,
    processing: Cell<bool>,
    payment_id: RefCell<Option<String>>,
    payment_id_at_submit: RefCell<Option<String>>,
    submit_count: Cell<u32>,
    ui_toggles: Cell<u32>,
    error_writes: Cell<u32>,
    validity_checks: Cell<u32>,
}

impl MockPage {
    /// A complete checkout page with every anchor and a filled-in form
    pub fn checkout() -> Self {
        let settings = CheckoutSettings::default();

        let elements = [
            &settings.public_key_id,
            &settings.client_secret_id,
            &settings.form_id,
            &settings.card_mount_id,
            &settings.error_display_id,
            &settings.submit_button_id,
            &settings.overlay_id,
            &settings.save_info_id,
        ]
        .into_iter()
        .cloned()
        .collect();

        let embedded = HashMap::from([
            (settings.public_key_id.clone(), r#""pk_test_123""#.to_string()),
            (settings.client_secret_id.clone(), r#""pi_1_secret_1""#.to_string()),
        ]);

        let fields = HashMap::from([
            (FormField::FullName, "Ada Lovelace".to_string()),
            (FormField::Email, "ada@example.com".to_string()),
            (FormField::PhoneNumber, "+44 20 7946 0000".to_string()),
            (FormField::StreetAddress1, "12 St James's Square".to_string()),
            (FormField::TownOrCity, "London".to_string()),
            (FormField::Postcode, "SW1Y 4JH".to_string()),
            (FormField::Country, "GB".to_string()),
        ]);

        Self {
            settings,
            elements: RefCell::new(elements),
            embedded: RefCell::new(embedded),
            fields: RefCell::new(fields),
            valid: Cell::new(true),
            save_info: Cell::new(false),
            fail_submit: Cell::new(false),
            error_message: RefCell::new(String::new()),
            submit_enabled: Cell::new(true),
            overlay_visible: Cell::new(false),
            processing: Cell::new(false),
            payment_id: RefCell::new(None),
            payment_id_at_submit: RefCell::new(None),
            submit_count: Cell::new(0),
            ui_toggles: Cell::new(0),
            error_writes: Cell::new(0),
            validity_checks: Cell::new(0),
        }
    }

    pub fn remove_element(&self, id: &str) {
        self.elements.borrow_mut().remove(id);
        self.embedded.borrow_mut().remove(id);
    }

    pub fn set_embedded(&self, id: &str, text: &str) {
        self.elements.borrow_mut().insert(id.to_string());
        self.embedded
            .borrow_mut()
            .insert(id.to_string(), text.to_string());
    }

    pub fn set_field(&self, field: FormField, value: &str) {
        self.fields.borrow_mut().insert(field, value.to_string());
    }

    pub fn clear_fields(&self) {
        self.fields.borrow_mut().clear();
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.set(valid);
    }

    pub fn set_save_info(&self, checked: bool) {
        self.save_info.set(checked);
    }

    /// Make the next form submission fail
    pub fn fail_submit(&self) {
        self.fail_submit.set(true);
    }

    pub fn error_message(&self) -> String {
        self.error_message.borrow().clone()
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible.get()
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled.get()
    }

    /// Whether the form carries the processing flag
    pub fn processing(&self) -> bool {
        self.processing.get()
    }

    pub fn payment_id(&self) -> Option<String> {
        self.payment_id.borrow().clone()
    }

    /// Value of the payment-id field when the form was last submitted
    pub fn payment_id_at_submit(&self) -> Option<String> {
        self.payment_id_at_submit.borrow().clone()
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.get()
    }

    /// Number of applied submit-control, form-flag and overlay toggles
    pub fn ui_toggle_count(&self) -> u32 {
        self.ui_toggles.get()
    }

    pub fn error_write_count(&self) -> u32 {
        self.error_writes.get()
    }

    pub fn validity_checks(&self) -> u32 {
        self.validity_checks.get()
    }

    fn has(&self, id: &str) -> bool {
        self.elements.borrow().contains(id)
    }

    fn bump(counter: &Cell<u32>) {
        counter.set(counter.get() + 1);
    }
}

impl AnchorSource for MockPage {
    fn embedded_text(&self, element_id: &str) -> Option<String> {
        self.embedded.borrow().get(element_id).cloned()
    }

    fn has_element(&self, element_id: &str) -> bool {
        self.has(element_id)
    }

    fn report_startup_error(&self, message: &str) {
        self.set_error_message(message);
    }
}

impl CheckoutPage for MockPage {
    fn field_value(&self, field: FormField) -> Option<String> {
        self.fields.borrow().get(&field).cloned()
    }

    fn save_info(&self) -> bool {
        self.has(&self.settings.save_info_id) && self.save_info.get()
    }

    fn report_validity(&self) -> bool {
        Self::bump(&self.validity_checks);
        self.valid.get()
    }

    fn set_error_message(&self, message: &str) {
        if self.has(&self.settings.error_display_id) {
            Self::bump(&self.error_writes);
            *self.error_message.borrow_mut() = message.to_string();
        }
    }

    fn set_submit_enabled(&self, enabled: bool) {
        if self.has(&self.settings.submit_button_id) {
            Self::bump(&self.ui_toggles);
            self.submit_enabled.set(enabled);
        }
    }

    fn set_processing(&self, processing: bool) {
        if self.has(&self.settings.form_id) {
            Self::bump(&self.ui_toggles);
            self.processing.set(processing);
        }
    }

    fn set_overlay_visible(&self, visible: bool) {
        if self.has(&self.settings.overlay_id) {
            Self::bump(&self.ui_toggles);
            self.overlay_visible.set(visible);
        }
    }

    fn set_payment_id(&self, payment_id: &str) -> Result<()> {
        self.elements
            .borrow_mut()
            .insert(self.settings.payment_id_field_id.clone());
        *self.payment_id.borrow_mut() = Some(payment_id.to_string());
        Ok(())
    }

    fn submit_form(&self) -> Result<()> {
        if self.fail_submit.get() {
            return Err(CheckoutError::Page("form.submit() threw".into()));
        }
        *self.payment_id_at_submit.borrow_mut() = self.payment_id();
        Self::bump(&self.submit_count);
        Ok(())
    }
}

struct CardState {
    disabled: Cell<bool>,
    supports_disable: bool,
    fail_mount: bool,
    mounted_at: RefCell<Option<String>>,
    handler: RefCell<Option<Box<dyn Fn(CardChange)>>>,
}

/// In-memory card input widget
#[derive(Clone)]
pub struct MockCard {
    state: Rc<CardState>,
}

impl Default for MockCard {
    fn default() -> Self {
        Self::build(true, false)
    }
}

impl MockCard {
    /// A widget that rejects enable/disable
    pub fn without_disable() -> Self {
        Self::build(false, false)
    }

    fn build(supports_disable: bool, fail_mount: bool) -> Self {
        Self {
            state: Rc::new(CardState {
                disabled: Cell::new(false),
                supports_disable,
                fail_mount,
                mounted_at: RefCell::new(None),
                handler: RefCell::new(None),
            }),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.state.disabled.get()
    }

    pub fn mounted_at(&self) -> Option<String> {
        self.state.mounted_at.borrow().clone()
    }

    /// Fire a change event at the subscribed handler
    pub fn emit(&self, change: CardChange) {
        if let Some(handler) = self.state.handler.borrow().as_ref() {
            handler(change);
        }
    }
}

impl CardElement for MockCard {
    fn mount(&self, selector: &str) -> Result<()> {
        if self.state.fail_mount {
            return Err(CheckoutError::Provider(format!("{selector} is not mountable")));
        }
        *self.state.mounted_at.borrow_mut() = Some(selector.to_string());
        Ok(())
    }

    fn on_change(&self, handler: Box<dyn Fn(CardChange)>) -> Result<()> {
        *self.state.handler.borrow_mut() = Some(handler);
        Ok(())
    }

    fn set_disabled(&self, disabled: bool) -> Result<()> {
        if !self.state.supports_disable {
            return Err(CheckoutError::Provider("update is not supported".into()));
        }
        self.state.disabled.set(disabled);
        Ok(())
    }
}

/// Scripted answer to a confirmation call
#[derive(Clone, Debug)]
pub enum MockConfirm {
    Respond(ConfirmResponse),
    Throw(String),
}

/// A recorded confirmation call
#[derive(Clone, Debug)]
pub struct ConfirmCall {
    pub client_secret: String,
    pub billing_details: BillingDetails,
    pub shipping: Option<ShippingDetails>,
}

#[derive(Default)]
struct GatewayState {
    script: RefCell<VecDeque<MockConfirm>>,
    fallback: RefCell<Option<MockConfirm>>,
    calls: RefCell<Vec<ConfirmCall>>,
    card: RefCell<Option<MockCard>>,
    fail_mount: Cell<bool>,
}

/// In-memory payment provider
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Rc<GatewayState>,
}

impl MockGateway {
    /// Answer every confirmation with `response`
    pub fn responding(response: ConfirmResponse) -> Self {
        Self::scripted(MockConfirm::Respond(response))
    }

    /// Answer every confirmation with `answer`
    pub fn scripted(answer: MockConfirm) -> Self {
        let gateway = Self::default();
        *gateway.state.fallback.borrow_mut() = Some(answer);
        gateway
    }

    /// Queue a one-off answer ahead of the fallback
    pub fn push(&self, answer: MockConfirm) {
        self.state.script.borrow_mut().push_back(answer);
    }

    /// Make cards created from now on fail to mount
    pub fn fail_mount(&self) {
        self.state.fail_mount.set(true);
    }

    pub fn confirm_count(&self) -> usize {
        self.state.calls.borrow().len()
    }

    pub fn last_call(&self) -> Option<ConfirmCall> {
        self.state.calls.borrow().last().cloned()
    }

    /// The most recently created card
    pub fn card(&self) -> Option<MockCard> {
        self.state.card.borrow().clone()
    }

    fn next_answer(&self) -> MockConfirm {
        self.state
            .script
            .borrow_mut()
            .pop_front()
            .or_else(|| self.state.fallback.borrow().clone())
            .unwrap_or_else(|| {
                MockConfirm::Respond(ConfirmResponse::with_status("pi_mock", "succeeded"))
            })
    }
}

#[async_trait(?Send)]
impl PaymentGateway for MockGateway {
    type Card = MockCard;

    fn create_card_element(&self, _style: &CardStyle) -> Result<MockCard> {
        let card = MockCard::build(true, self.state.fail_mount.get());
        *self.state.card.borrow_mut() = Some(card.clone());
        Ok(card)
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        request: ConfirmCardPayment<'_, MockCard>,
    ) -> Result<ConfirmResponse> {
        self.state.calls.borrow_mut().push(ConfirmCall {
            client_secret: client_secret.to_string(),
            billing_details: request.billing_details.clone(),
            shipping: request.shipping.cloned(),
        });

        match self.next_answer() {
            MockConfirm::Respond(response) => Ok(response),
            MockConfirm::Throw(message) => Err(CheckoutError::Provider(message)),
        }
    }
}

struct CacheState {
    result: RefCell<std::result::Result<(), CacheError>>,
    calls: RefCell<Vec<(String, bool)>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

/// In-memory metadata cache endpoint
#[derive(Clone)]
pub struct MockCache {
    state: Rc<CacheState>,
}

impl Default for MockCache {
    fn default() -> Self {
        Self::with_result(Ok(()))
    }
}

impl MockCache {
    pub fn failing(error: CacheError) -> Self {
        Self::with_result(Err(error))
    }

    /// A cache whose first call stays pending until the returned sender fires
    pub fn gated() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let cache = Self::default();
        *cache.state.gate.borrow_mut() = Some(rx);
        (cache, tx)
    }

    fn with_result(result: std::result::Result<(), CacheError>) -> Self {
        Self {
            state: Rc::new(CacheState {
                result: RefCell::new(result),
                calls: RefCell::new(Vec::new()),
                gate: RefCell::new(None),
            }),
        }
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.borrow().len()
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.state.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl MetadataCache for MockCache {
    async fn cache_checkout_data(
        &self,
        client_secret: &str,
        save_info: bool,
    ) -> std::result::Result<(), CacheError> {
        self.state
            .calls
            .borrow_mut()
            .push((client_secret.to_string(), save_info));

        let gate = self.state.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.state.result.borrow().clone()
    }
}
