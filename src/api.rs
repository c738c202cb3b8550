//! Command surface for one session.
//!
//! [`ExchangeCore`] ties a signed-in identity, the shared [`StoreClient`],
//! the local session file and the active event together. Every command
//! validates its input and checks authorization before the first store
//! call, so a rejected command never writes anything.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use rand::Rng;

use crate::config::ExchangeConfig;
use crate::exchange::validation::{
    validate_budget, validate_code, validate_event, validate_name, validate_participant,
};
use crate::exchange::{
    digits_only, Assignment, AssignmentEngine, Event, EventCode, EventUpdate, ExchangeError,
    Household, Identity, Participant, ParticipantForm, Result, ResultSet, Viewer,
    VisibilityResolver,
};
use crate::identity::IdentityProvider;
use crate::live::{EventSnapshot, LiveEvent, ResultsState};
use crate::notify::{MessageChannel, ShareMessage};
use crate::session::SessionStore;
use crate::store::{StoreClient, StoreError};

/// Session-level entry point for gift exchange operations.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use gift_exchange_core::{
///     AnonymousIdentityProvider, ExchangeConfig, ExchangeCore, ParticipantForm, StoreClient,
/// };
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = Arc::new(StoreClient::in_memory());
/// let mut core = ExchangeCore::new(
///     store,
///     AnonymousIdentityProvider::new(),
///     dir.path(),
///     ExchangeConfig::new(),
/// )
/// .unwrap();
///
/// core.sign_in().unwrap();
/// let code = core.create_event("Office party", "300").unwrap();
/// core.register_participant(&ParticipantForm::new("Ana", "55 1234 0001", "books"))
///     .unwrap();
/// assert_eq!(core.current_event(), Some(&code));
/// ```
pub struct ExchangeCore<P> {
    store: Arc<StoreClient>,
    identity: P,
    session: SessionStore,
    config: ExchangeConfig,
    resolver: VisibilityResolver,
    current_event: Option<EventCode>,
    search_contact: String,
}

impl<P: IdentityProvider> ExchangeCore<P> {
    /// Creates a session over `store`, keeping local state in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the data directory cannot
    /// be created.
    pub fn new(
        store: Arc<StoreClient>,
        identity: P,
        data_dir: &Path,
        config: ExchangeConfig,
    ) -> Result<Self> {
        config.validate()?;
        let session = SessionStore::new(data_dir, &config.session_file)?;
        Ok(Self {
            store,
            identity,
            session,
            resolver: VisibilityResolver::new(config.contact_match_digits),
            config,
            current_event: None,
            search_contact: String::new(),
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Shared store handle.
    #[must_use]
    pub const fn store(&self) -> &Arc<StoreClient> {
        &self.store
    }

    /// Signed-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.current()
    }

    /// Event this session has joined.
    #[must_use]
    pub const fn current_event(&self) -> Option<&EventCode> {
        self.current_event.as_ref()
    }

    /// Phone typed into the result search box.
    #[must_use]
    pub fn search_contact(&self) -> &str {
        &self.search_contact
    }

    // ==================== Session ====================

    /// Signs in anonymously.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider fails.
    pub fn sign_in(&mut self) -> Result<Identity> {
        self.identity.sign_in_anonymously()
    }

    /// Signs out and forgets everything local to the session.
    ///
    /// The remembered event code, the active event and the search string
    /// are all cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or the session file cannot be
    /// removed.
    pub fn sign_out(&mut self) -> Result<()> {
        self.identity.sign_out()?;
        self.session.clear()?;
        self.current_event = None;
        self.search_contact.clear();
        info!("event=session_cleared module=api status=ok");
        Ok(())
    }

    // ==================== Events ====================

    /// Creates an event administered by the signed-in identity and joins it.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is signed in, the name or budget is
    /// invalid, no free code is found, or the store write fails.
    pub fn create_event(&mut self, name: &str, budget: &str) -> Result<EventCode> {
        self.create_event_with(name, budget, &mut rand::thread_rng())
    }

    /// [`create_event`](Self::create_event) with a caller-supplied RNG for
    /// code generation.
    ///
    /// # Errors
    ///
    /// See [`create_event`](Self::create_event).
    pub fn create_event_with<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        budget: &str,
        rng: &mut R,
    ) -> Result<EventCode> {
        let admin = self.identity.require()?.clone();
        let (name, budget) = validate_event(name, budget)?;
        let code = self.free_code(rng)?;

        self.store
            .create_event(&code, &Event::new(name, budget, admin))?;
        info!("event=event_created module=api status=ok code={code}");

        self.enter(code.clone())?;
        Ok(code)
    }

    fn free_code<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<EventCode> {
        for attempt in 1..=self.config.code_attempts {
            let code = EventCode::generate(rng, self.config.event_code_length);
            if self.store.get_event(&code)?.is_none() {
                return Ok(code);
            }
            debug!("event=code_collision module=api code={code} attempt={attempt}");
        }
        Err(ExchangeError::Store(StoreError::Unavailable(format!(
            "no free event code after {} attempts",
            self.config.code_attempts
        ))))
    }

    /// Joins the event behind a typed code.
    ///
    /// A code with no event behind it also clears the remembered code and
    /// the active event.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank code,
    /// [`ExchangeError::EventNotFound`] for an unknown one, or a store
    /// error.
    pub fn join_event(&mut self, raw_code: &str) -> Result<Event> {
        let code = validate_code(raw_code)?;
        let Some(event) = self.store.get_event(&code)? else {
            warn!("event=join_failed module=api code={code} reason=not_found");
            self.current_event = None;
            self.session.forget_event()?;
            return Err(ExchangeError::EventNotFound(code.to_string()));
        };

        self.enter(code.clone())?;
        info!("event=event_joined module=api status=ok code={code}");
        Ok(event)
    }

    /// Re-joins the remembered event, if any.
    ///
    /// # Errors
    ///
    /// Same as [`join_event`](Self::join_event); the session file being
    /// unreadable is a session error.
    pub fn resume(&mut self) -> Result<Option<Event>> {
        match self.session.load()?.last_event {
            Some(code) => self.join_event(code.as_str()).map(Some),
            None => Ok(None),
        }
    }

    fn enter(&mut self, code: EventCode) -> Result<()> {
        self.session.remember_event(&code)?;
        if self.current_event.as_ref() != Some(&code) {
            self.search_contact.clear();
        }
        self.current_event = Some(code);
        Ok(())
    }

    /// Edits the name and/or budget of the active event.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is given, a value is invalid, the caller
    /// is not the admin, the event is closed, or the store write fails.
    pub fn update_event(&self, name: Option<&str>, budget: Option<&str>) -> Result<Event> {
        let caller = self.identity.require()?;
        let (code, event) = self.active_event()?;
        if !event.is_admin(caller) {
            return Err(ExchangeError::Unauthorized(format!(
                "only the organizer can edit event {code}"
            )));
        }
        if !event.is_open() {
            return Err(ExchangeError::EventClosed(code.to_string()));
        }

        let name = name.map(validate_name).transpose()?;
        let budget = budget.map(validate_budget).transpose()?;
        if name.is_none() && budget.is_none() {
            return Err(ExchangeError::Validation("nothing to update".to_string()));
        }

        let update = EventUpdate {
            name,
            budget,
            status: None,
        };
        let event = self.store.update_event(code, &update)?;
        info!("event=event_updated module=api status=ok code={code}");
        Ok(event)
    }

    fn active_code(&self) -> Result<&EventCode> {
        self.current_event
            .as_ref()
            .ok_or(ExchangeError::NoActiveEvent)
    }

    fn active_event(&self) -> Result<(&EventCode, Event)> {
        let code = self.active_code()?;
        let event = self
            .store
            .get_event(code)?
            .ok_or_else(|| ExchangeError::EventNotFound(code.to_string()))?;
        Ok((code, event))
    }

    // ==================== Participants ====================

    /// Registers a participant managed by the signed-in identity.
    ///
    /// Afterwards the result search string holds the phone just typed, so
    /// its owner finds their result once the draw is done.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is signed in, no event is active, the
    /// event is closed, the form is invalid, or the store write fails.
    pub fn register_participant(&mut self, form: &ParticipantForm) -> Result<Participant> {
        let manager = self.identity.require()?.clone();
        let (code, event) = self.active_event()?;
        if !event.is_open() {
            return Err(ExchangeError::EventClosed(code.to_string()));
        }

        let created_at = chrono::Utc::now().timestamp_millis();
        let record = validate_participant(form, manager, created_at, &self.config)?;
        let participant = self.store.insert_participant(code, record)?;
        info!(
            "event=participant_registered module=api status=ok code={code} id={}",
            participant.id
        );

        self.search_contact = digits_only(&form.phone);
        Ok(participant)
    }

    /// Removes a participant registered by the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is signed in, no event is active, the
    /// event is closed, the participant does not exist or belongs to
    /// someone else, or the store write fails.
    pub fn delete_participant(&self, id: &str) -> Result<()> {
        let caller = self.identity.require()?;
        let (code, event) = self.active_event()?;
        if !event.is_open() {
            return Err(ExchangeError::EventClosed(code.to_string()));
        }

        let participant = self
            .store
            .list_participants(code)?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ExchangeError::ParticipantNotFound(id.to_string()))?;
        if &participant.manager != caller {
            return Err(ExchangeError::Unauthorized(format!("participant {id}")));
        }

        self.store.delete_participant(code, id)?;
        info!("event=participant_deleted module=api status=ok code={code} id={id}");
        Ok(())
    }

    // ==================== Draw ====================

    /// Runs the draw for the active event.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not the admin, there are fewer
    /// than two participants, or a store write fails.
    pub fn run_draw(&self) -> Result<ResultSet> {
        self.run_draw_with(&mut rand::thread_rng())
    }

    /// [`run_draw`](Self::run_draw) with a caller-supplied RNG.
    ///
    /// # Errors
    ///
    /// See [`run_draw`](Self::run_draw).
    pub fn run_draw_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ResultSet> {
        let caller = self.identity.require()?;
        let (code, event) = self.active_event()?;
        if !event.is_admin(caller) {
            return Err(ExchangeError::Unauthorized(format!(
                "only the organizer can draw event {code}"
            )));
        }
        AssignmentEngine::new(&self.store).run(code, rng)
    }

    // ==================== Results ====================

    /// Sets the phone typed into the result search box.
    pub fn set_search_contact(&mut self, raw: &str) {
        self.search_contact = raw.trim().to_string();
    }

    /// Viewer built from the identity and the search string.
    #[must_use]
    pub fn viewer(&self) -> Viewer<'_> {
        Viewer {
            identity: self.identity.current(),
            contact: Some(self.search_contact.as_str()).filter(|c| !c.is_empty()),
        }
    }

    /// Reads the three documents of the active event.
    ///
    /// # Errors
    ///
    /// Returns an error if no event is active or a read fails.
    pub fn snapshot(&self) -> Result<EventSnapshot> {
        let code = self.active_code()?;
        Ok(EventSnapshot {
            code: code.clone(),
            event: self.store.get_event(code)?,
            participants: self.store.list_participants(code)?,
            results: self.store.get_results(code)?,
        })
    }

    /// Households of the active event.
    ///
    /// # Errors
    ///
    /// Returns an error if no event is active or a read fails.
    pub fn households(&self) -> Result<Vec<Household>> {
        Ok(self.snapshot()?.households())
    }

    /// Results of the active event as seen by this session.
    ///
    /// # Errors
    ///
    /// Returns an error if no event is active or a read fails.
    pub fn my_results(&self) -> Result<ResultsState> {
        Ok(self.snapshot()?.results_state(self.viewer(), &self.resolver))
    }

    /// Resolver configured for this session.
    #[must_use]
    pub const fn resolver(&self) -> &VisibilityResolver {
        &self.resolver
    }

    /// Subscribes to the active event.
    ///
    /// # Errors
    ///
    /// Returns an error if no event is active or a first snapshot cannot
    /// be read.
    pub fn watch(&self) -> Result<LiveEvent> {
        LiveEvent::attach(&self.store, self.active_code()?)
    }

    // ==================== Sharing ====================

    /// Formats `assignment` and hands it to `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if no event is active or the channel refuses the
    /// message.
    pub fn share_assignment(
        &self,
        assignment: &Assignment,
        channel: &dyn MessageChannel,
    ) -> Result<ShareMessage> {
        let (_, event) = self.active_event()?;
        let message = ShareMessage::compose(&event, assignment);
        channel.hand_off(&message)?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use super::*;
    use crate::exchange::{ErrorKind, EventStatus};
    use crate::identity::AnonymousIdentityProvider;

    fn core_on(store: &Arc<StoreClient>, dir: &TempDir) -> ExchangeCore<AnonymousIdentityProvider> {
        let mut core = ExchangeCore::new(
            Arc::clone(store),
            AnonymousIdentityProvider::new(),
            dir.path(),
            ExchangeConfig::new(),
        )
        .unwrap();
        core.sign_in().unwrap();
        core
    }

    fn form(name: &str, phone: &str) -> ParticipantForm {
        ParticipantForm::new(name, phone, "books")
    }

    #[test]
    fn create_event_joins_and_remembers() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StoreClient::in_memory());
        let mut core = core_on(&store, &dir);

        let code = core.create_event(" Office ", "250").unwrap();

        assert_eq!(code.as_str().len(), 6);
        assert_eq!(core.current_event(), Some(&code));
        let event = store.get_event(&code).unwrap().unwrap();
        assert_eq!(event.name, "Office");
        assert_eq!(event.status, EventStatus::Open);
        assert_eq!(Some(&event.admin), core.identity());
    }

    #[test]
    fn create_event_requires_sign_in() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = ExchangeCore::new(
            Arc::new(StoreClient::in_memory()),
            AnonymousIdentityProvider::new(),
            dir.path(),
            ExchangeConfig::new(),
        )
        .unwrap();

        let err = core.create_event("Office", "100").unwrap_err();
        assert!(matches!(err, ExchangeError::NotSignedIn));
    }

    #[test]
    fn create_event_rejects_bad_budget() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);

        for budget in ["0", "-5", "abc", ""] {
            let err = core.create_event("Office", budget).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(core.current_event().is_none());
    }

    #[test]
    fn colliding_code_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StoreClient::in_memory());
        let mut core = core_on(&store, &dir);

        let taken = EventCode::generate(&mut StdRng::seed_from_u64(9), 6);
        store
            .create_event(&taken, &Event::new("Taken", "1", Identity::new("other")))
            .unwrap();

        let code = core
            .create_event_with("Mine", "100", &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_ne!(code, taken);
        assert_eq!(store.get_event(&taken).unwrap().unwrap().name, "Taken");
    }

    #[test]
    fn join_unknown_code_forgets_remembered_event() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StoreClient::in_memory());
        let mut core = core_on(&store, &dir);
        core.create_event("Office", "100").unwrap();

        let err = core.join_event("zzzzzz").unwrap_err();

        assert!(matches!(err, ExchangeError::EventNotFound(ref c) if c == "ZZZZZZ"));
        assert!(core.current_event().is_none());
        assert!(core.resume().unwrap().is_none());
    }

    #[test]
    fn blank_join_code_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);
        assert_eq!(
            core.join_event("  ").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn register_sets_search_contact_and_prefixes_phone() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);
        core.create_event("Office", "100").unwrap();

        let participant = core
            .register_participant(&form("Ana", "(55) 1234-0001"))
            .unwrap();

        assert_eq!(participant.phone, "525512340001");
        assert_eq!(core.search_contact(), "5512340001");
        assert!(participant.created_at > 0);
    }

    #[test]
    fn register_without_event_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);
        let err = core
            .register_participant(&form("Ana", "5512340001"))
            .unwrap_err();
        assert!(matches!(err, ExchangeError::NoActiveEvent));
    }

    #[test]
    fn delete_requires_ownership() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let store = Arc::new(StoreClient::in_memory());
        let mut admin = core_on(&store, &dir_a);
        let code = admin.create_event("Office", "100").unwrap();
        let ana = admin
            .register_participant(&form("Ana", "5512340001"))
            .unwrap();

        let mut guest = core_on(&store, &dir_b);
        guest.join_event(code.as_str()).unwrap();

        let err = guest.delete_participant(&ana.id).unwrap_err();
        assert!(matches!(err, ExchangeError::Unauthorized(_)));
        assert_eq!(store.list_participants(&code).unwrap().len(), 1);

        admin.delete_participant(&ana.id).unwrap();
        assert!(store.list_participants(&code).unwrap().is_empty());

        let err = admin.delete_participant(&ana.id).unwrap_err();
        assert!(matches!(err, ExchangeError::ParticipantNotFound(_)));
    }

    #[test]
    fn only_admin_draws_and_edits() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let store = Arc::new(StoreClient::in_memory());
        let mut admin = core_on(&store, &dir_a);
        let code = admin.create_event("Office", "100").unwrap();
        admin
            .register_participant(&form("Ana", "5512340001"))
            .unwrap();

        let mut guest = core_on(&store, &dir_b);
        guest.join_event(code.as_str()).unwrap();
        guest
            .register_participant(&form("Luis", "5512340002"))
            .unwrap();

        assert!(matches!(
            guest.run_draw().unwrap_err(),
            ExchangeError::Unauthorized(_)
        ));
        assert!(matches!(
            guest.update_event(Some("Mine"), None).unwrap_err(),
            ExchangeError::Unauthorized(_)
        ));

        let edited = admin.update_event(None, Some("400")).unwrap();
        assert_eq!(edited.budget, "400");
        assert_eq!(edited.name, "Office");

        admin.run_draw_with(&mut StdRng::seed_from_u64(1)).unwrap();
        assert!(matches!(
            admin.update_event(Some("Late"), None).unwrap_err(),
            ExchangeError::EventClosed(_)
        ));
        assert!(matches!(
            guest
                .register_participant(&form("Eva", "5512340003"))
                .unwrap_err(),
            ExchangeError::EventClosed(_)
        ));
    }

    #[test]
    fn empty_update_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);
        core.create_event("Office", "100").unwrap();
        assert_eq!(
            core.update_event(None, None).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            core.update_event(Some("  "), None).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn update_trims_name_like_create() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);
        core.create_event("Office", "100").unwrap();

        let edited = core.update_event(Some("  Family  "), None).unwrap();
        assert_eq!(edited.name, "Family");
        assert_eq!(edited.budget, "100");
    }

    #[test]
    fn new_rejects_short_contact_match() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExchangeCore::new(
            Arc::new(StoreClient::in_memory()),
            AnonymousIdentityProvider::new(),
            dir.path(),
            ExchangeConfig::new().with_contact_match_digits(3),
        );
        assert!(matches!(result, Err(ExchangeError::Validation(_))));
    }

    #[test]
    fn my_results_follow_draw() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);
        core.create_event("Office", "100").unwrap();
        core
            .register_participant(&form("Ana", "5512340001"))
            .unwrap();
        core
            .register_participant(&form("Luis", "5512340002"))
            .unwrap();

        assert_eq!(core.my_results().unwrap(), ResultsState::Open);

        core.run_draw_with(&mut StdRng::seed_from_u64(5)).unwrap();
        match core.my_results().unwrap() {
            ResultsState::Ready(visible) => assert_eq!(visible.len(), 2),
            other => panic!("expected ready results, got {other:?}"),
        }
    }

    #[test]
    fn sign_out_clears_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_on(&Arc::new(StoreClient::in_memory()), &dir);
        core.create_event("Office", "100").unwrap();
        core.set_search_contact("5512340001");

        core.sign_out().unwrap();

        assert!(core.identity().is_none());
        assert!(core.current_event().is_none());
        assert_eq!(core.search_contact(), "");
        assert!(core.resume().unwrap().is_none());
    }
}
