//! Configuration Loader
//!
//! Reads the embedded JSON blocks and probes the DOM anchors once at page
//! load. Any failure aborts startup before a provider client exists or a
//! listener is attached.
//!
//! ```text
//! ┌──────────────┐   probe    ┌──────────────┐   parse   ┌───────────────┐
//! │ AnchorSource │──────────▶│ AnchorReport │─────────▶│ PaymentConfig │
//! └──────────────┘            └──────────────┘           └───────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Id of the optional embedded JSON block overriding [`CheckoutSettings`]
pub const SETTINGS_ELEMENT_ID: &str = "id_checkout_settings";

/// Read-only view of the page used during startup
pub trait AnchorSource {
    /// Text content of the element with this id, if present
    fn embedded_text(&self, element_id: &str) -> Option<String>;

    /// Whether an element with this id exists
    fn has_element(&self, element_id: &str) -> bool;

    /// Best-effort write into the error display. No-op when it is absent.
    fn report_startup_error(&self, message: &str);
}

/// Page wiring and endpoint settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutSettings {
    /// Embedded JSON block holding the provider public key
    pub public_key_id: String,

    /// Embedded JSON block holding the client secret
    pub client_secret_id: String,

    /// The authoritative checkout form
    pub form_id: String,

    /// Mount point for the card input widget
    pub card_mount_id: String,

    /// Error display (optional on the page)
    pub error_display_id: String,

    /// Submit control (optional on the page)
    pub submit_button_id: String,

    /// Blocking overlay (optional on the page)
    pub overlay_id: String,

    /// Save-info checkbox (optional on the page)
    pub save_info_id: String,

    /// Id of the hidden payment-id field
    pub payment_id_field_id: String,

    /// Name of the hidden payment-id field
    pub payment_id_field_name: String,

    /// Metadata cache endpoint, absolute or relative to the page origin
    pub cache_url: String,

    /// Cookie carrying the CSRF token
    pub csrf_cookie: String,

    /// Header the CSRF token is sent in
    pub csrf_header: String,

    /// Send shipping details along with billing details
    pub include_shipping: bool,

    /// Log filter directive
    pub log_level: String,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            public_key_id: "id_stripe_public_key".into(),
            client_secret_id: "id_client_secret".into(),
            form_id: "payment-form".into(),
            card_mount_id: "card-element".into(),
            error_display_id: "card-errors".into(),
            submit_button_id: "submit-button".into(),
            overlay_id: "loading-overlay".into(),
            save_info_id: "id-save-info".into(),
            payment_id_field_id: "id_stripe_pid".into(),
            payment_id_field_name: "stripe_pid".into(),
            cache_url: "/checkout/cache_checkout_data/".into(),
            csrf_cookie: "csrftoken".into(),
            csrf_header: "X-CSRFToken".into(),
            include_shipping: true,
            log_level: "info".into(),
        }
    }
}

impl CheckoutSettings {
    /// Load settings from the optional embedded block, falling back to defaults.
    ///
    /// A block that is present but unreadable is fatal.
    pub fn load(source: &impl AnchorSource) -> Result<Self, ConfigError> {
        let Some(text) = source.embedded_text(SETTINGS_ELEMENT_ID) else {
            return Ok(Self::default());
        };

        serde_json::from_str(&text).map_err(|e| ConfigError::Malformed {
            id: SETTINGS_ELEMENT_ID.into(),
            reason: e.to_string(),
        })
    }
}

/// Presence of a DOM anchor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    fn of(present: bool) -> Self {
        if present { Self::Present } else { Self::Absent }
    }

    pub fn is_present(self) -> bool {
        self == Self::Present
    }
}

/// Result of probing every anchor the flow touches
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorReport {
    pub form: Presence,
    pub card_mount: Presence,
    pub submit_button: Presence,
    pub error_display: Presence,
    pub overlay: Presence,
    form_id: String,
    card_mount_id: String,
}

impl AnchorReport {
    /// Probe the page for every anchor named in the settings
    pub fn probe(source: &impl AnchorSource, settings: &CheckoutSettings) -> Self {
        let has = |id: &str| Presence::of(source.has_element(id));
        Self {
            form: has(&settings.form_id),
            card_mount: has(&settings.card_mount_id),
            submit_button: has(&settings.submit_button_id),
            error_display: has(&settings.error_display_id),
            overlay: has(&settings.overlay_id),
            form_id: settings.form_id.clone(),
            card_mount_id: settings.card_mount_id.clone(),
        }
    }

    /// Fail on missing required anchors, warn on missing optional ones
    pub fn ensure_required(&self) -> Result<(), ConfigError> {
        if !self.form.is_present() {
            return Err(ConfigError::MissingAnchor(self.form_id.clone()));
        }
        if !self.card_mount.is_present() {
            return Err(ConfigError::MissingAnchor(self.card_mount_id.clone()));
        }

        for (name, presence) in [
            ("submit button", self.submit_button),
            ("error display", self.error_display),
            ("overlay", self.overlay),
        ] {
            if !presence.is_present() {
                tracing::warn!(anchor = name, "Optional checkout anchor missing");
            }
        }

        Ok(())
    }
}

/// Provider keys, immutable once parsed
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentConfig {
    public_key: String,
    client_secret: String,
}

impl PaymentConfig {
    /// Parse the two embedded JSON scalars
    pub fn parse(public_key_json: &str, client_secret_json: &str) -> Result<Self, ConfigError> {
        Self::parse_blocks(
            ("publicKey", public_key_json),
            ("clientSecret", client_secret_json),
        )
    }

    /// Read both blocks from the page and parse them
    pub fn load(
        source: &impl AnchorSource,
        settings: &CheckoutSettings,
    ) -> Result<Self, ConfigError> {
        let read = |id: &str| {
            source
                .embedded_text(id)
                .ok_or_else(|| ConfigError::MissingConfig(id.to_string()))
        };
        let public_key = read(&settings.public_key_id)?;
        let client_secret = read(&settings.client_secret_id)?;

        Self::parse_blocks(
            (&settings.public_key_id, &public_key),
            (&settings.client_secret_id, &client_secret),
        )
    }

    fn parse_blocks(
        (public_key_id, public_key_json): (&str, &str),
        (client_secret_id, client_secret_json): (&str, &str),
    ) -> Result<Self, ConfigError> {
        let public_key = parse_scalar(public_key_id, public_key_json)?;
        let client_secret = parse_scalar(client_secret_id, client_secret_json)?;

        if public_key.is_empty() {
            return Err(ConfigError::Empty("publicKey"));
        }
        if client_secret.is_empty() {
            return Err(ConfigError::Empty("clientSecret"));
        }

        Ok(Self {
            public_key,
            client_secret,
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("public_key", &self.public_key)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

// JSON `null` is treated as an empty value, anything else non-string is malformed.
fn parse_scalar(id: &str, json: &str) -> Result<String, ConfigError> {
    let value: Option<String> =
        serde_json::from_str(json.trim()).map_err(|e| ConfigError::Malformed {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
    Ok(value.unwrap_or_default().trim().to_string())
}

/// Run the full fail-closed startup check.
///
/// On failure the user-facing message is written into the error display (if
/// present) and nothing else happens.
pub fn load(
    source: &impl AnchorSource,
    settings: &CheckoutSettings,
) -> Result<PaymentConfig, ConfigError> {
    let result = AnchorReport::probe(source, settings)
        .ensure_required()
        .and_then(|()| PaymentConfig::load(source, settings));

    if let Err(err) = &result {
        tracing::warn!(error = %err, "Checkout setup aborted");
        source.report_startup_error(err.user_message());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CONFIG_MISSING_MESSAGE, FORM_ERROR_MESSAGE};
    use crate::mock::MockPage;

    #[test]
    fn test_parse_valid_config() {
        let config = PaymentConfig::parse(r#""pk_test_123""#, r#""pi_1_secret_2""#).unwrap();
        assert_eq!(config.public_key(), "pk_test_123");
        assert_eq!(config.client_secret(), "pi_1_secret_2");
        assert!(!format!("{config:?}").contains("pi_1_secret_2"));
    }

    #[test]
    fn test_parse_rejects_empty_and_null() {
        assert_eq!(
            PaymentConfig::parse(r#""""#, r#""pi_secret""#),
            Err(ConfigError::Empty("publicKey"))
        );
        assert_eq!(
            PaymentConfig::parse(r#""pk_test""#, "null"),
            Err(ConfigError::Empty("clientSecret"))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = PaymentConfig::parse("pk_test", r#""pi_secret""#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));

        let err = PaymentConfig::parse("42", r#""pi_secret""#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_load_reports_missing_card_mount() {
        let page = MockPage::checkout();
        page.remove_element("card-element");

        let err = load(&page, &CheckoutSettings::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingAnchor("card-element".into()));
        assert_eq!(page.error_message(), FORM_ERROR_MESSAGE);
    }

    #[test]
    fn test_load_reports_missing_public_key() {
        let page = MockPage::checkout();
        page.remove_element("id_stripe_public_key");

        let err = load(&page, &CheckoutSettings::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingConfig("id_stripe_public_key".into()));
    }

    #[test]
    fn test_load_reports_empty_secret() {
        let page = MockPage::checkout();
        page.set_embedded("id_client_secret", r#""""#);

        let err = load(&page, &CheckoutSettings::default()).unwrap_err();
        assert_eq!(err, ConfigError::Empty("clientSecret"));
        assert_eq!(page.error_message(), CONFIG_MISSING_MESSAGE);
    }

    #[test]
    fn test_malformed_block_names_element() {
        let page = MockPage::checkout();
        page.set_embedded("id_client_secret", "{not json");

        let err = load(&page, &CheckoutSettings::default()).unwrap_err();
        assert!(
            matches!(err, ConfigError::Malformed { ref id, .. } if id == "id_client_secret")
        );
    }

    #[test]
    fn test_optional_anchors_do_not_block() {
        let page = MockPage::checkout();
        page.remove_element("submit-button");
        page.remove_element("card-errors");
        page.remove_element("loading-overlay");

        let report = AnchorReport::probe(&page, &CheckoutSettings::default());
        assert_eq!(report.overlay, Presence::Absent);
        assert!(report.ensure_required().is_ok());
    }

    #[test]
    fn test_settings_override_and_defaults() {
        let page = MockPage::checkout();
        assert_eq!(CheckoutSettings::load(&page).unwrap(), CheckoutSettings::default());

        page.set_embedded(
            SETTINGS_ELEMENT_ID,
            r#"{"cache_url": "/cache/", "include_shipping": false}"#,
        );
        let settings = CheckoutSettings::load(&page).unwrap();
        assert_eq!(settings.cache_url, "/cache/");
        assert!(!settings.include_shipping);
        assert_eq!(settings.form_id, "payment-form");

        page.set_embedded(SETTINGS_ELEMENT_ID, "[1, 2");
        assert!(CheckoutSettings::load(&page).is_err());
    }
}
