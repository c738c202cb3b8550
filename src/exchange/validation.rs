//! Input validation for commands.
//!
//! Validation runs before any store call, so a rejected command never
//! mutates state.

use super::error::{ExchangeError, Result};
use super::types::{digits_only, EventCode, Identity, ParticipantRecord};
use crate::config::ExchangeConfig;

/// Registration form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct ParticipantForm {
    /// Display name.
    pub name: String,
    /// Phone as typed; formatting characters are ignored.
    pub phone: String,
    /// Wishlist / sizes.
    pub wishlist: String,
    /// Country calling code; the configured default when `None`.
    pub country_code: Option<String>,
}

impl ParticipantForm {
    /// Creates a form with the default country code.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        wishlist: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            wishlist: wishlist.into(),
            country_code: None,
        }
    }

    /// Sets the country calling code.
    #[must_use]
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }
}

/// Validates an event name and budget, returning their trimmed forms.
///
/// # Errors
///
/// Returns a validation error for a blank name or a budget that is not a
/// positive number.
pub fn validate_event(name: &str, budget: &str) -> Result<(String, String)> {
    Ok((validate_name(name)?, validate_budget(budget)?))
}

/// Validates an event name, returning it trimmed.
///
/// # Errors
///
/// Returns a validation error for a blank name.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ExchangeError::Validation("event name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Validates a budget, returning it trimmed.
///
/// # Errors
///
/// Returns a validation error unless the budget parses to a finite positive
/// number.
pub fn validate_budget(budget: &str) -> Result<String> {
    let budget = budget.trim();
    match budget.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(budget.to_string()),
        _ => Err(ExchangeError::Validation(format!(
            "budget must be a positive number, got `{budget}`"
        ))),
    }
}

/// Normalizes a join code.
///
/// # Errors
///
/// Returns a validation error for a blank code.
pub fn validate_code(raw: &str) -> Result<EventCode> {
    EventCode::parse(raw)
        .ok_or_else(|| ExchangeError::Validation("event code is required".to_string()))
}

/// Turns a registration form into a record owned by `manager`.
///
/// The stored phone is the country code followed by the digits of the
/// typed phone.
///
/// # Errors
///
/// Returns a validation error for a blank name or wishlist, a phone with
/// fewer than `config.min_phone_digits` digits, or a non-numeric country
/// code.
pub fn validate_participant(
    form: &ParticipantForm,
    manager: Identity,
    created_at: i64,
    config: &ExchangeConfig,
) -> Result<ParticipantRecord> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(ExchangeError::Validation("name is required".to_string()));
    }
    let wishlist = form.wishlist.trim();
    if wishlist.is_empty() {
        return Err(ExchangeError::Validation("wishlist is required".to_string()));
    }

    let phone = digits_only(&form.phone);
    if phone.len() < config.min_phone_digits {
        return Err(ExchangeError::Validation(format!(
            "phone needs at least {} digits",
            config.min_phone_digits
        )));
    }

    let country_code = form
        .country_code
        .as_deref()
        .map_or(config.default_country_code.as_str(), str::trim);
    if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ExchangeError::Validation(format!(
            "invalid country code `{country_code}`"
        )));
    }

    Ok(ParticipantRecord {
        name: name.to_string(),
        phone: format!("{country_code}{phone}"),
        wishlist: wishlist.to_string(),
        manager,
        created_at,
    })
}
