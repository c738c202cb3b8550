//! Household grouping.
//!
//! Participants registered with the same phone form a household. The
//! earliest registration is the head; later ones are its dependents.
//! Groups are derived from the live participant list on every read and
//! never stored.

use super::types::{digits_only, Identity, Participant};

/// Key used for participants without a contact number.
pub const NO_CONTACT_KEY: &str = "no-contact";

/// Participants sharing one normalized contact number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Household {
    key: String,
    members: Vec<Participant>,
}

impl Household {
    /// Normalized contact number shared by the members, or [`NO_CONTACT_KEY`].
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Members in registration order.
    #[must_use]
    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    /// Earliest registered member.
    ///
    /// Grouping never produces an empty household.
    #[must_use]
    pub fn head(&self) -> &Participant {
        &self.members[0]
    }

    /// Members registered after the head.
    #[must_use]
    pub fn dependents(&self) -> &[Participant] {
        &self.members[1..]
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the household has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns whether `viewer` registered any member of this household.
    ///
    /// Used to decide which households show management controls. This is a
    /// presentation hint, not an access check.
    #[must_use]
    pub fn is_managed_by(&self, viewer: &Identity) -> bool {
        self.members.iter().any(|p| &p.manager == viewer)
    }
}

/// Normalized grouping key for a phone.
#[must_use]
pub fn household_key(phone: &str) -> String {
    let digits = digits_only(phone);
    if digits.is_empty() {
        NO_CONTACT_KEY.to_string()
    } else {
        digits
    }
}

/// Groups participants into households.
///
/// Households appear in the order their key first shows up in
/// `participants`. Members are sorted by `created_at` with a stable sort,
/// so equal timestamps keep their input order.
#[must_use]
pub fn group_households(participants: &[Participant]) -> Vec<Household> {
    let mut households: Vec<Household> = Vec::new();

    for participant in participants {
        let key = household_key(&participant.phone);
        match households.iter_mut().find(|h| h.key == key) {
            Some(household) => household.members.push(participant.clone()),
            None => households.push(Household {
                key,
                members: vec![participant.clone()],
            }),
        }
    }

    for household in &mut households {
        household.members.sort_by_key(|p| p.created_at);
    }

    households
}

/// Finds the household for `phone` in a grouping.
#[must_use]
pub fn find_household<'a>(households: &'a [Household], phone: &str) -> Option<&'a Household> {
    let key = household_key(phone);
    households.iter().find(|h| h.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str, phone: &str, created_at: i64, manager: &str) -> Participant {
        Participant {
            id: id.to_string(),
            name: id.to_string(),
            phone: phone.to_string(),
            wishlist: "anything".to_string(),
            manager: Identity::new(manager),
            created_at,
        }
    }

    #[test]
    fn shared_phone_forms_one_household() {
        let list = vec![
            participant("kid", "5215512340009", 200, "u1"),
            participant("parent", "5215512340009", 100, "u1"),
        ];

        let households = group_households(&list);
        assert_eq!(households.len(), 1);
        let household = &households[0];
        assert_eq!(household.key(), "5215512340009");
        assert_eq!(household.len(), 2);
        assert_eq!(household.head().id, "parent");
        assert_eq!(household.dependents()[0].id, "kid");
    }

    #[test]
    fn distinct_phones_form_separate_households_in_first_seen_order() {
        let list = vec![
            participant("b", "5215500000002", 5, "u1"),
            participant("a", "5215500000001", 1, "u2"),
            participant("b2", "5215500000002", 9, "u3"),
        ];

        let households = group_households(&list);
        let keys: Vec<&str> = households.iter().map(Household::key).collect();
        assert_eq!(keys, ["5215500000002", "5215500000001"]);
        assert!(households[1].dependents().is_empty());
    }

    #[test]
    fn missing_phone_uses_sentinel_key() {
        let list = vec![participant("x", "", 1, "u1"), participant("y", "", 2, "u1")];
        let households = group_households(&list);
        assert_eq!(households.len(), 1);
        assert_eq!(households[0].key(), NO_CONTACT_KEY);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let list = vec![
            participant("first", "5215512340009", 0, "u1"),
            participant("second", "5215512340009", 0, "u1"),
            participant("third", "5215512340009", 0, "u1"),
        ];
        let households = group_households(&list);
        let ids: Vec<&str> = households[0]
            .members()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn is_managed_by_checks_any_member() {
        let list = vec![
            participant("a", "5215512340009", 1, "owner"),
            participant("b", "5215512340009", 2, "helper"),
        ];
        let households = group_households(&list);
        assert!(households[0].is_managed_by(&Identity::new("helper")));
        assert!(!households[0].is_managed_by(&Identity::new("stranger")));
    }

    #[test]
    fn find_household_normalizes_phone() {
        let list = vec![participant("a", "5215512340009", 1, "u1")];
        let households = group_households(&list);
        assert!(find_household(&households, "+52 1 55 1234 0009").is_some());
        assert!(find_household(&households, "5215512340000").is_none());
    }

    #[test]
    fn empty_list_has_no_households() {
        assert!(group_households(&[]).is_empty());
    }
}
