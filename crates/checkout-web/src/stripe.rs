//! Stripe.js Card Element Binding
//!
//! Low-level `wasm-bindgen` imports for Stripe.js v3 and the
//! [`PaymentGateway`] implementation built on them.

use async_trait::async_trait;
use checkout_core::provider::{
    CardChange, CardElement, CardStyle, ConfirmCardPayment, ConfirmResponse, PaymentGateway,
};
use checkout_core::{CheckoutError, Result};
use js_sys::{Object, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// Stripe.js client handle
    #[derive(Debug, Clone)]
    pub type JsStripe;

    /// Elements factory handle
    #[derive(Debug, Clone)]
    pub type JsElements;

    /// Card element handle
    #[derive(Debug, Clone)]
    pub type JsCardElement;

    /// `Stripe(publishableKey)`
    #[wasm_bindgen(catch, js_name = Stripe)]
    fn new_stripe(publishable_key: &str) -> std::result::Result<JsStripe, JsValue>;

    /// `stripe.elements()`
    #[wasm_bindgen(method, catch)]
    fn elements(this: &JsStripe) -> std::result::Result<JsElements, JsValue>;

    /// `stripe.confirmCardPayment(clientSecret, data)`
    #[wasm_bindgen(method, catch, js_name = confirmCardPayment)]
    fn confirm_card_payment(
        this: &JsStripe,
        client_secret: &str,
        data: &JsValue,
    ) -> std::result::Result<Promise, JsValue>;

    /// `elements.create("card", options)`
    #[wasm_bindgen(method, catch, js_name = create)]
    fn create_element(
        this: &JsElements,
        element_type: &str,
        options: &JsValue,
    ) -> std::result::Result<JsCardElement, JsValue>;

    /// `card.mount(selector)`
    #[wasm_bindgen(method, catch)]
    fn mount(this: &JsCardElement, selector: &str) -> std::result::Result<(), JsValue>;

    /// `card.on(event, handler)`
    #[wasm_bindgen(method, catch)]
    fn on(
        this: &JsCardElement,
        event: &str,
        handler: &js_sys::Function,
    ) -> std::result::Result<(), JsValue>;

    /// `card.update(options)`
    #[wasm_bindgen(method, catch)]
    fn update(this: &JsCardElement, options: &JsValue) -> std::result::Result<(), JsValue>;
}

#[derive(Serialize)]
struct CardOptions<'a> {
    style: &'a CardStyle,
}

#[derive(Serialize)]
struct CardUpdate {
    disabled: bool,
}

/// Render a thrown JS value for logs and errors
pub(crate) fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

fn provider_error(value: &JsValue) -> CheckoutError {
    CheckoutError::Provider(describe(value))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| CheckoutError::Provider(e.to_string()))
}

/// Stripe.js card element
#[derive(Debug, Clone)]
pub struct StripeCard {
    element: JsCardElement,
}

impl CardElement for StripeCard {
    fn mount(&self, selector: &str) -> Result<()> {
        self.element.mount(selector).map_err(|e| provider_error(&e))
    }

    fn on_change(&self, handler: Box<dyn Fn(CardChange)>) -> Result<()> {
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            match serde_wasm_bindgen::from_value::<CardChange>(event) {
                Ok(change) => handler(change),
                Err(err) => tracing::debug!(error = %err, "Unreadable card change event"),
            }
        });

        self.element
            .on("change", callback.as_ref().unchecked_ref())
            .map_err(|e| provider_error(&e))?;

        // Lives as long as the page.
        callback.forget();
        Ok(())
    }

    fn set_disabled(&self, disabled: bool) -> Result<()> {
        let options = to_js(&CardUpdate { disabled })?;
        self.element.update(&options).map_err(|e| provider_error(&e))
    }
}

/// [`PaymentGateway`] backed by the global `Stripe` constructor
#[derive(Debug, Clone)]
pub struct StripeGateway {
    stripe: JsStripe,
    elements: JsElements,
}

impl StripeGateway {
    /// Construct the Stripe.js client. Fails when Stripe.js is not loaded.
    pub fn connect(publishable_key: &str) -> Result<Self> {
        let stripe = new_stripe(publishable_key).map_err(|e| provider_error(&e))?;
        let elements = stripe.elements().map_err(|e| provider_error(&e))?;
        Ok(Self { stripe, elements })
    }
}

#[async_trait(?Send)]
impl PaymentGateway for StripeGateway {
    type Card = StripeCard;

    fn create_card_element(&self, style: &CardStyle) -> Result<StripeCard> {
        let options = to_js(&CardOptions { style })?;
        let element = self
            .elements
            .create_element("card", &options)
            .map_err(|e| provider_error(&e))?;
        Ok(StripeCard { element })
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        request: ConfirmCardPayment<'_, StripeCard>,
    ) -> Result<ConfirmResponse> {
        let payment_method = Object::new();
        set(&payment_method, "card", &request.card.element)?;
        set(
            &payment_method,
            "billing_details",
            &to_js(request.billing_details)?,
        )?;

        let data = Object::new();
        set(&data, "payment_method", &payment_method)?;
        if let Some(shipping) = request.shipping {
            set(&data, "shipping", &to_js(shipping)?)?;
        }

        let promise = self
            .stripe
            .confirm_card_payment(client_secret, &data)
            .map_err(|e| provider_error(&e))?;
        let result = JsFuture::from(promise)
            .await
            .map_err(|e| provider_error(&e))?;

        serde_wasm_bindgen::from_value(result)
            .map_err(|e| CheckoutError::MalformedResponse(e.to_string()))
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| provider_error(&e))
}
