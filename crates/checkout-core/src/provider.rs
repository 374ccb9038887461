//! Payment Provider Strategy
//!
//! Collaborator seams for the provider SDK and the metadata cache endpoint.
//! The flow works exclusively through these traits, so the browser binding
//! and the in-memory mocks are interchangeable.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_core::provider::{PaymentGateway, ConfirmCardPayment};
//!
//! let card = gateway.create_card_element(&CardStyle::default())?;
//! let response = gateway
//!     .confirm_card_payment(secret, ConfirmCardPayment { card: &card, billing_details: &billing, shipping: None })
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::{BillingDetails, ShippingDetails};
use crate::error::{CacheError, Result};

/// Styling passed to the card input widget so it blends with the page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStyle {
    pub base: CardStyleRules,
    pub invalid: CardStyleRules,
}

/// One state's style rules
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStyleRules {
    pub color: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,

    #[serde(
        default,
        rename = "::placeholder",
        skip_serializing_if = "Option::is_none"
    )]
    pub placeholder: Option<PlaceholderStyle>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderStyle {
    pub color: String,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            base: CardStyleRules {
                color: "#000".into(),
                font_family: Some("inherit".into()),
                font_size: Some("16px".into()),
                placeholder: Some(PlaceholderStyle {
                    color: "#aab7c4".into(),
                }),
            },
            invalid: CardStyleRules {
                color: "#dc3545".into(),
                ..CardStyleRules::default()
            },
        }
    }
}

/// Change event emitted by the card input widget
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CardChange {
    #[serde(default)]
    pub error: Option<ProviderFailure>,

    #[serde(default)]
    pub complete: bool,

    #[serde(default)]
    pub empty: bool,
}

impl CardChange {
    /// Validation message to show, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }
}

/// Error object returned by the provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderFailure {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// The part of a payment intent the flow looks at
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PaymentIntentSummary {
    #[serde(default)]
    pub id: Option<String>,

    pub status: String,
}

/// Raw result of a confirmation call
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    #[serde(default)]
    pub error: Option<ProviderFailure>,

    #[serde(default)]
    pub payment_intent: Option<PaymentIntentSummary>,
}

impl ConfirmResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(ProviderFailure {
                message: Some(message.into()),
                ..ProviderFailure::default()
            }),
            payment_intent: None,
        }
    }

    pub fn with_status(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            error: None,
            payment_intent: Some(PaymentIntentSummary {
                id: Some(id.into()),
                status: status.into(),
            }),
        }
    }
}

/// Arguments of a confirmation call
#[derive(Debug)]
pub struct ConfirmCardPayment<'a, C> {
    /// The mounted card input, used as the payment method
    pub card: &'a C,

    pub billing_details: &'a BillingDetails,

    pub shipping: Option<&'a ShippingDetails>,
}

/// The provider's embeddable card input widget
pub trait CardElement {
    /// Mount into the element matching `selector`
    fn mount(&self, selector: &str) -> Result<()>;

    /// Subscribe to change/validation events
    fn on_change(&self, handler: Box<dyn Fn(CardChange)>) -> Result<()>;

    /// Disable or enable input. Widgets may not support this.
    fn set_disabled(&self, disabled: bool) -> Result<()>;
}

/// Strategy trait for the payment provider client
///
/// Implement this for each provider SDK binding.
#[async_trait(?Send)]
pub trait PaymentGateway {
    type Card: CardElement;

    /// Create the card input widget
    fn create_card_element(&self, style: &CardStyle) -> Result<Self::Card>;

    /// Confirm the payment identified by `client_secret`.
    ///
    /// `Err` means the call itself threw. Functional failures come back as
    /// `Ok` with `error` set.
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        request: ConfirmCardPayment<'_, Self::Card>,
    ) -> Result<ConfirmResponse>;
}

/// Server endpoint persisting checkout metadata against a payment
#[async_trait(?Send)]
pub trait MetadataCache {
    async fn cache_checkout_data(
        &self,
        client_secret: &str,
        save_info: bool,
    ) -> std::result::Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_style_wire_shape() {
        let json = serde_json::to_value(CardStyle::default()).unwrap();
        assert_eq!(json["base"]["fontSize"], "16px");
        assert_eq!(json["base"]["::placeholder"]["color"], "#aab7c4");
        assert_eq!(json["invalid"], serde_json::json!({ "color": "#dc3545" }));
    }

    #[test]
    fn test_confirm_response_ignores_unknown_fields() {
        let response: ConfirmResponse = serde_json::from_str(
            r#"{"paymentIntent": {"id": "pi_1", "status": "succeeded", "amount": 1999}}"#,
        )
        .unwrap();
        assert_eq!(response, ConfirmResponse::with_status("pi_1", "succeeded"));
    }

    #[test]
    fn test_card_change_message() {
        let change: CardChange = serde_json::from_str(
            r#"{"error": {"message": "Your card number is incomplete."}, "complete": false}"#,
        )
        .unwrap();
        assert_eq!(change.error_message(), Some("Your card number is incomplete."));
        assert_eq!(CardChange::default().error_message(), None);
    }
}
