//! # checkout-core
//!
//! Card-payment confirmation flow for a server-rendered checkout form.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      SubmissionController                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │   UiLock     │  │  CardInput   │  │  PaymentGateway         │  │
//! │  │  (feedback)  │──│  (adapter)   │──│  MetadataCache (traits) │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!            ▲
//!            │ bootstrap::initialize (fail-closed config check)
//! ```
//!
//! The provider SDK, the metadata cache endpoint and the page itself are
//! reached through traits, so the browser binding and [`mock`] collaborators
//! are interchangeable.

pub mod address;
pub mod bootstrap;
pub mod card;
pub mod config;
pub mod controller;
pub mod error;
pub mod mock;
pub mod outcome;
pub mod provider;
pub mod ui;

pub use address::{Address, BillingDetails, CheckoutDetails, ContactInfo, FormField, ShippingDetails};
pub use bootstrap::initialize;
pub use card::CardInput;
pub use config::{AnchorSource, CheckoutSettings, PaymentConfig};
pub use controller::{SubmissionController, SubmissionState, SubmitResult};
pub use error::{CacheError, CheckoutError, ConfigError, Result};
pub use outcome::PaymentOutcome;
pub use provider::{CardElement, ConfirmResponse, MetadataCache, PaymentGateway};
pub use ui::{CheckoutPage, UiLock};
