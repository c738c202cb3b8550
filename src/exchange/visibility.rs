//! Per-viewer result visibility.
//!
//! A viewer sees an assignment when they registered its giver, or when
//! they type a phone whose trailing digits appear in the giver's phone.
//! The phone fallback exists for people who joined with the shared event
//! code and never registered themselves; it is not an authentication
//! mechanism.

use super::types::{digits_only, Assignment, Identity};

/// Fewest digits the phone fallback compares. Also the default.
pub const MIN_CONTACT_MATCH_DIGITS: usize = 10;

/// Who is looking at the results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer<'a> {
    /// Signed-in identity, if any.
    pub identity: Option<&'a Identity>,
    /// Phone typed into the result search box.
    pub contact: Option<&'a str>,
}

impl<'a> Viewer<'a> {
    /// Viewer identified by a signed-in identity.
    #[must_use]
    pub const fn identified(identity: &'a Identity) -> Self {
        Self {
            identity: Some(identity),
            contact: None,
        }
    }

    /// Adds a typed phone for the fallback lookup.
    #[must_use]
    pub const fn with_contact(mut self, contact: &'a str) -> Self {
        self.contact = Some(contact);
        self
    }
}

/// Resolves which assignments a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityResolver {
    match_digits: usize,
}

impl Default for VisibilityResolver {
    fn default() -> Self {
        Self::new(MIN_CONTACT_MATCH_DIGITS)
    }
}

impl VisibilityResolver {
    /// Creates a resolver comparing `match_digits` trailing digits.
    ///
    /// Values below [`MIN_CONTACT_MATCH_DIGITS`] are raised to it.
    #[must_use]
    pub const fn new(match_digits: usize) -> Self {
        let match_digits = if match_digits < MIN_CONTACT_MATCH_DIGITS {
            MIN_CONTACT_MATCH_DIGITS
        } else {
            match_digits
        };
        Self { match_digits }
    }

    /// Number of trailing digits compared.
    #[must_use]
    pub const fn match_digits(&self) -> usize {
        self.match_digits
    }

    /// Returns the assignments visible to `viewer`, in result-set order.
    #[must_use]
    pub fn visible<'r>(
        &self,
        assignments: &'r [Assignment],
        viewer: Viewer<'_>,
    ) -> Vec<&'r Assignment> {
        let needle = viewer.contact.and_then(|raw| self.search_suffix(raw));

        assignments
            .iter()
            .filter(|assignment| {
                let owns = viewer
                    .identity
                    .is_some_and(|identity| &assignment.giver_manager == identity);
                let phone_match = needle.as_deref().is_some_and(|suffix| {
                    digits_only(&assignment.giver_phone).contains(suffix)
                });
                owns || phone_match
            })
            .collect()
    }

    /// Trailing digits used for the phone fallback.
    ///
    /// Returns `None` when the typed value has fewer digits than the match
    /// length, so short fragments never match anything.
    #[must_use]
    pub fn search_suffix(&self, raw: &str) -> Option<String> {
        let digits = digits_only(raw);
        if digits.is_empty() || digits.len() < self.match_digits {
            return None;
        }
        Some(digits[digits.len() - self.match_digits..].to_string())
    }
}
