//! # checkout-payments
//!
//! HTTP collaborators for the card checkout flow.
//!
//! ## Metadata caching
//!
//! Before a payment is confirmed the page posts the client secret and the
//! save-info flag to the shop's cache endpoint, which stores them on the
//! payment intent's metadata. The provider's webhook handler later reads
//! them back, so the call must finish before confirmation starts.
//!
//! ```text
//! ┌─────────────┐  POST client_secret, save_info  ┌──────────────────┐
//! │  Checkout   │───────────────────────────────▶│  Cache endpoint  │
//! │    page     │   X-CSRFToken: <csrftoken>      │  (server side)   │
//! └─────────────┘                                 └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_payments::HttpMetadataCache;
//!
//! let cache = HttpMetadataCache::from_settings(&origin, &settings, &document_cookie)?;
//! let controller = checkout_core::initialize(page, &settings, connect, cache)?;
//! ```

mod cache;
mod csrf;

pub use cache::HttpMetadataCache;
pub use csrf::cookie_value;
