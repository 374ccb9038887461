//! Error Types

use thiserror::Error;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Shown when the page is structurally broken or the embedded JSON is unreadable.
pub const FORM_ERROR_MESSAGE: &str = "Payment form error. Please refresh and try again.";

/// Shown when the embedded keys are present but empty.
pub const CONFIG_MISSING_MESSAGE: &str = "Payment configuration missing. Check Stripe keys.";

/// Generic failure text for thrown errors and provider errors without a message.
pub const PAYMENT_FAILED_MESSAGE: &str = "Payment failed. Please try again.";

/// Shown when the metadata cache call fails without a usable response body.
pub const CACHE_FAILED_MESSAGE: &str =
    "Sorry, your payment cannot be processed right now. Please try again later.";

/// Startup configuration errors. All of them are fatal for the page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required DOM anchor is not on the page
    #[error("Required element #{0} not found")]
    MissingAnchor(String),

    /// An embedded JSON block is not on the page
    #[error("Embedded configuration #{0} not found")]
    MissingConfig(String),

    /// An embedded JSON block could not be parsed
    #[error("Embedded configuration #{id} is malformed: {reason}")]
    Malformed { id: String, reason: String },

    /// A required configuration value is empty
    #[error("Configuration value {0} is empty")]
    Empty(&'static str),
}

impl ConfigError {
    /// Text written into the error display when startup aborts
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Empty(_) => CONFIG_MISSING_MESSAGE,
            _ => FORM_ERROR_MESSAGE,
        }
    }
}

/// Failures of the metadata cache call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The endpoint answered with a non-success status
    #[error("Metadata cache rejected the request with status {status}")]
    Rejected { status: u16, detail: Option<String> },

    /// The request never completed
    #[error("Metadata cache request failed: {0}")]
    Transport(String),
}

impl CacheError {
    /// Response body when the endpoint sent one, otherwise the generic text
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.trim().to_string(),
            _ => CACHE_FAILED_MESSAGE.into(),
        }
    }
}

/// Checkout error types
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Startup configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Metadata cache call failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The payment provider SDK threw
    #[error("Provider error: {0}")]
    Provider(String),

    /// The payment provider answered with something we cannot classify
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// A page operation failed
    #[error("Page error: {0}")]
    Page(String),
}

impl CheckoutError {
    /// Convert to the message rendered in the error display
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message().into(),
            Self::Cache(err) => err.user_message(),
            Self::Provider(_) | Self::MalformedResponse(_) | Self::Page(_) => {
                PAYMENT_FAILED_MESSAGE.into()
            }
        }
    }
}
