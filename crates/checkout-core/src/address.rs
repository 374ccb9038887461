//! Form Data Normalization
//!
//! Collects contact and address fields from the checkout form and builds the
//! billing/shipping detail objects sent with a confirmation request.

use serde::{Deserialize, Serialize};

use crate::ui::CheckoutPage;

/// Checkout form fields read during a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    FullName,
    Email,
    PhoneNumber,
    StreetAddress1,
    StreetAddress2,
    TownOrCity,
    County,
    Postcode,
    Country,
}

impl FormField {
    /// Element id rendered by the server-side form
    pub const fn element_id(self) -> &'static str {
        match self {
            Self::FullName => "id_full_name",
            Self::Email => "id_email",
            Self::PhoneNumber => "id_phone_number",
            Self::StreetAddress1 => "id_street_address1",
            Self::StreetAddress2 => "id_street_address2",
            Self::TownOrCity => "id_town_or_city",
            Self::County => "id_county",
            Self::Postcode => "id_postcode",
            Self::Country => "id_country",
        }
    }
}

/// Contact details, each empty-tolerant
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Postal address shared by billing and shipping
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub line1: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub line2: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
}

/// Billing details in the provider's wire shape
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    pub address: Address,
}

/// Shipping details in the provider's wire shape
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    pub address: Address,
}

/// Everything collected from the form for one submission
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub contact: ContactInfo,
    pub billing_address: Address,
    pub shipping_address: Address,
}

impl CheckoutDetails {
    /// Read and normalize the form fields.
    ///
    /// The country is normalized once and reused for both addresses.
    pub fn collect(page: &impl CheckoutPage) -> Self {
        let field = |f: FormField| page.field_value(f).unwrap_or_default().trim().to_string();

        let contact = ContactInfo {
            name: field(FormField::FullName),
            email: field(FormField::Email),
            phone: field(FormField::PhoneNumber),
        };

        let address = Address {
            line1: field(FormField::StreetAddress1),
            line2: field(FormField::StreetAddress2),
            city: field(FormField::TownOrCity),
            state: field(FormField::County),
            postal_code: field(FormField::Postcode),
            country: normalize_country(&field(FormField::Country)),
        };

        Self {
            contact,
            billing_address: address.clone(),
            shipping_address: address,
        }
    }

    pub fn billing_details(&self) -> BillingDetails {
        BillingDetails {
            name: self.contact.name.clone(),
            email: self.contact.email.clone(),
            phone: self.contact.phone.clone(),
            address: self.billing_address.clone(),
        }
    }

    /// Shipping details, `None` when the recipient name or first address
    /// line is blank since the provider rejects those.
    pub fn shipping_details(&self) -> Option<ShippingDetails> {
        if self.contact.name.is_empty() || self.shipping_address.line1.is_empty() {
            return None;
        }

        Some(ShippingDetails {
            name: self.contact.name.clone(),
            phone: self.contact.phone.clone(),
            address: self.shipping_address.clone(),
        })
    }
}

// Lowercase labels for common long-form country names
const COUNTRY_LABELS: &[(&str, &str)] = &[
    ("united kingdom", "GB"),
    ("united kingdom of great britain and northern ireland", "GB"),
    ("great britain", "GB"),
    ("britain", "GB"),
    ("england", "GB"),
    ("scotland", "GB"),
    ("wales", "GB"),
    ("northern ireland", "GB"),
    ("ireland", "IE"),
    ("republic of ireland", "IE"),
    ("united states", "US"),
    ("united states of america", "US"),
    ("usa", "US"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("new zealand", "NZ"),
    ("france", "FR"),
    ("germany", "DE"),
    ("spain", "ES"),
    ("portugal", "PT"),
    ("italy", "IT"),
    ("netherlands", "NL"),
    ("the netherlands", "NL"),
    ("belgium", "BE"),
    ("luxembourg", "LU"),
    ("switzerland", "CH"),
    ("austria", "AT"),
    ("denmark", "DK"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("finland", "FI"),
    ("iceland", "IS"),
    ("poland", "PL"),
    ("czech republic", "CZ"),
    ("czechia", "CZ"),
    ("greece", "GR"),
    ("japan", "JP"),
    ("china", "CN"),
    ("india", "IN"),
    ("singapore", "SG"),
    ("south africa", "ZA"),
    ("brazil", "BR"),
    ("mexico", "MX"),
];

/// Best-effort normalization to a 2-letter country code.
///
/// Known long-form names map to their code, 2-letter input is uppercased and
/// anything else passes through unchanged.
pub fn normalize_country(input: &str) -> String {
    let trimmed = input.trim();
    let lowered = trimmed.to_lowercase();

    if let Some((_, code)) = COUNTRY_LABELS.iter().find(|(label, _)| *label == lowered) {
        return (*code).to_string();
    }

    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return trimmed.to_ascii_uppercase();
    }

    trimmed.to_string()
}
