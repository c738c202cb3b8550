//! Runtime configuration.

use std::path::Path;

use serde::Deserialize;

use crate::exchange::visibility::MIN_CONTACT_MATCH_DIGITS;
use crate::exchange::{ExchangeError, Result};

/// Country calling codes offered at registration, with display labels.
pub const COUNTRY_CODES: &[(&str, &str)] = &[
    ("52", "MX (+52)"),
    ("1", "US (+1)"),
    ("34", "ES (+34)"),
    ("54", "AR (+54)"),
    ("57", "CO (+57)"),
    ("56", "CL (+56)"),
    ("51", "PE (+51)"),
];

/// Tunables for validation, matching and code generation.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeConfig {
    /// Minimum digits in a registered phone, country code excluded.
    pub min_phone_digits: usize,
    /// Minimum (and compared) trailing digits for contact-based result lookup.
    pub contact_match_digits: usize,
    /// Country code used when registration does not name one.
    pub default_country_code: String,
    /// Length of generated event codes.
    pub event_code_length: usize,
    /// How many fresh codes to try before giving up on a collision.
    pub code_attempts: usize,
    /// File name of the local session state inside the data directory.
    pub session_file: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            min_phone_digits: 10,
            contact_match_digits: MIN_CONTACT_MATCH_DIGITS,
            default_country_code: "52".to_string(),
            event_code_length: 6,
            code_attempts: 5,
            session_file: "session.json".to_string(),
        }
    }
}

impl ExchangeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON config file, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds out-of-range values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExchangeError::Validation(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ExchangeError::Validation(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.contact_match_digits < MIN_CONTACT_MATCH_DIGITS {
            return Err(ExchangeError::Validation(format!(
                "contact_match_digits must be at least {MIN_CONTACT_MATCH_DIGITS}, got {}",
                self.contact_match_digits
            )));
        }
        if self.event_code_length == 0 || self.code_attempts == 0 {
            return Err(ExchangeError::Validation(
                "event code length and attempts must be positive".to_string(),
            ));
        }
        let country_code = &self.default_country_code;
        if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ExchangeError::Validation(format!(
                "default_country_code must be digits, got `{}`",
                self.default_country_code
            )));
        }
        Ok(())
    }

    /// Sets the minimum phone length.
    #[must_use]
    pub const fn with_min_phone_digits(mut self, digits: usize) -> Self {
        self.min_phone_digits = digits;
        self
    }

    /// Sets the contact match length.
    #[must_use]
    pub const fn with_contact_match_digits(mut self, digits: usize) -> Self {
        self.contact_match_digits = digits;
        self
    }

    /// Sets the default country code.
    #[must_use]
    pub fn with_default_country_code(mut self, code: impl Into<String>) -> Self {
        self.default_country_code = code.into();
        self
    }

    /// Sets the generated event code length.
    #[must_use]
    pub const fn with_event_code_length(mut self, len: usize) -> Self {
        self.event_code_length = len;
        self
    }
}
