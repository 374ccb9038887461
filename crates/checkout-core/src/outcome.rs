//! Payment Outcome Classification

use crate::error::{CheckoutError, PAYMENT_FAILED_MESSAGE, Result};
use crate::provider::ConfirmResponse;

/// The only status treated as final success
pub const SUCCEEDED_STATUS: &str = "succeeded";

const INCOMPLETE_MESSAGE: &str = "Payment not completed. Please try again.";
const AUTHENTICATION_MESSAGE: &str = "Additional authentication is required and is not supported on this page. Payment not completed. Please try again.";
const PROCESSING_MESSAGE: &str =
    "Your payment is still processing. Please wait a moment before trying again.";

/// Interpreted result of a confirmation call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The provider reported a functional error
    Error { message: String },

    /// The payment intent reached its final success status
    Succeeded { payment_id: String },

    /// Any other intent status, including ones requiring further action
    Incomplete { status: String },
}

impl PaymentOutcome {
    /// Classify a raw response into exactly one outcome
    pub fn classify(response: ConfirmResponse) -> Result<Self> {
        if let Some(error) = response.error {
            let message = error
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| PAYMENT_FAILED_MESSAGE.into());
            return Ok(Self::Error { message });
        }

        let intent = response.payment_intent.ok_or_else(|| {
            CheckoutError::MalformedResponse("neither error nor payment intent".into())
        })?;

        if intent.status != SUCCEEDED_STATUS {
            return Ok(Self::Incomplete {
                status: intent.status,
            });
        }

        match intent.id.filter(|id| !id.is_empty()) {
            Some(payment_id) => Ok(Self::Succeeded { payment_id }),
            None => Err(CheckoutError::MalformedResponse(
                "succeeded payment intent without an id".into(),
            )),
        }
    }

    /// Message for the error display. `None` for success.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Error { message } => Some(message.clone()),
            Self::Succeeded { .. } => None,
            Self::Incomplete { status } => Some(
                match status.as_str() {
                    "requires_action" | "requires_source_action" => AUTHENTICATION_MESSAGE,
                    "processing" => PROCESSING_MESSAGE,
                    _ => INCOMPLETE_MESSAGE,
                }
                .into(),
            ),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}
