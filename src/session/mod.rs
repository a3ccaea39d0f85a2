//! View state machine for the onboarding flow.
//!
//! The caller owns a [`Session`] and feeds user intents through
//! [`OnboardingFlow::dispatch`]. A rejected intent returns a [`FlowError`] and
//! leaves the session untouched.
//!
//! ## Flow
//!
//! ```text
//! LOGIN ──► ROLE_SELECT ──citizen──────────────────► FIELD_SELECT ──► REGION_SELECT ──► DASHBOARD
//!                 │                                        ▲
//!                 └──reporter──► VERIFICATION ──(ack)──────┘
//! ```
//!
//! Every step except `LOGIN` has a `Back` edge to its predecessor.
//! `ChangeTopic` jumps from `DASHBOARD` back to `FIELD_SELECT`.
//! `Reload` resets to a fresh session from anywhere.
//!
//! Verification failures block with an error modal. News failures do not:
//! they degrade to an empty dashboard.

pub mod busy;

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::ai::{
    fetch_aggregated_news, DocumentSelection, DocumentVerifier, NewsQuery, NewsQueryService,
};
use crate::domain::{
    resolve_location, EmailAddress, NewsField, NewsItem, NewsRegion, Role, User, ViewStep,
    COUNTRIES, INDIAN_STATES,
};
use crate::error::{FlowError, FlowResult};

pub use busy::{BusyFlag, BusyGuard};

pub const DOCUMENT_REQUIRED_MESSAGE: &str =
    "ID Proof is required. Please upload an ID proof to continue.";
pub const SYSTEM_ERROR_MESSAGE: &str = "System error: Could not process the document.";

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// Raw login form input. Validated into an [`EmailAddress`] on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// A user action dispatched from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SubmitLogin(LoginForm),
    PickRole(Role),
    SelectDocument(DocumentSelection),
    SubmitVerification,
    /// Close the open modal. On the success modal this also proceeds.
    AcknowledgeModal,
    PickField(NewsField),
    PickRegion(NewsRegion),
    /// Choose a state or country in the subordinate picker.
    ChooseLocation(String),
    ConfirmLocation,
    OpenArticle(String),
    CloseArticle,
    /// Leave the dashboard straight for topic selection.
    ChangeTopic,
    Back,
    Reload,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SubmitLogin(_) => "submit login",
            Intent::PickRole(_) => "pick role",
            Intent::SelectDocument(_) => "select document",
            Intent::SubmitVerification => "submit verification",
            Intent::AcknowledgeModal => "acknowledge",
            Intent::PickField(_) => "pick field",
            Intent::PickRegion(_) => "pick region",
            Intent::ChooseLocation(_) => "choose location",
            Intent::ConfirmLocation => "confirm location",
            Intent::OpenArticle(_) => "open article",
            Intent::CloseArticle => "close article",
            Intent::ChangeTopic => "change topic",
            Intent::Back => "back",
            Intent::Reload => "reload",
        }
    }
}

/// Blocking dialog shown over the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Error(String),
    Success(String),
}

impl Modal {
    pub fn message(&self) -> &str {
        match self {
            Modal::Error(m) | Modal::Success(m) => m,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// All session-scoped state. Lives until the next `Reload`.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    step: ViewStep,
    user: Option<User>,
    selected_field: Option<NewsField>,
    selected_region: Option<NewsRegion>,
    selected_state: Option<String>,
    selected_country: Option<String>,
    active_region_name: String,
    news_feed: Vec<NewsItem>,
    selected_article: Option<String>,
    id_proof: Option<DocumentSelection>,
    modal: Option<Modal>,
    loading: BusyFlag,
    verifying: BusyFlag,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: ViewStep::Login,
            user: None,
            selected_field: None,
            selected_region: None,
            selected_state: None,
            selected_country: None,
            active_region_name: String::new(),
            news_feed: Vec::new(),
            selected_article: None,
            id_proof: None,
            modal: None,
            loading: BusyFlag::new(),
            verifying: BusyFlag::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> ViewStep {
        self.step
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn selected_field(&self) -> Option<NewsField> {
        self.selected_field
    }

    pub fn selected_region(&self) -> Option<NewsRegion> {
        self.selected_region
    }

    pub fn selected_state(&self) -> Option<&str> {
        self.selected_state.as_deref()
    }

    pub fn selected_country(&self) -> Option<&str> {
        self.selected_country.as_deref()
    }

    /// Location currently chosen in the picker of the selected region.
    pub fn pending_location(&self) -> Option<&str> {
        match self.selected_region? {
            NewsRegion::State => self.selected_state(),
            NewsRegion::National => self.selected_country(),
            NewsRegion::International => None,
        }
    }

    /// Name shown on the loading overlay for the last query.
    pub fn active_region_name(&self) -> &str {
        &self.active_region_name
    }

    /// Dashboard heading: the chosen state or country, or the region label.
    pub fn dashboard_heading(&self) -> Option<String> {
        let region = self.selected_region?;
        Some(
            self.pending_location()
                .map(str::to_string)
                .unwrap_or_else(|| region.label().to_string()),
        )
    }

    pub fn news_feed(&self) -> &[NewsItem] {
        &self.news_feed
    }

    /// Article open in the detail overlay.
    pub fn selected_article(&self) -> Option<&NewsItem> {
        let id = self.selected_article.as_deref()?;
        self.news_feed.iter().find(|item| item.id == id)
    }

    pub fn id_proof(&self) -> Option<&DocumentSelection> {
        self.id_proof.as_ref()
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Loading indicator for news queries. Clone it to watch a pending call.
    pub fn loading_flag(&self) -> BusyFlag {
        self.loading.clone()
    }

    /// Disabled-submit indicator for verification.
    pub fn verifying_flag(&self) -> BusyFlag {
        self.verifying.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying.is_set()
    }

    fn require_step(&self, expected: ViewStep, intent: &Intent) -> FlowResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(self.invalid(intent))
        }
    }

    fn invalid(&self, intent: &Intent) -> FlowError {
        FlowError::InvalidTransition {
            from: self.step,
            intent: intent.name(),
        }
    }

    fn user_mut(&mut self) -> FlowResult<&mut User> {
        self.user.as_mut().ok_or(FlowError::NoUser)
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.step == ViewStep::Dashboard || self.news_feed.is_empty(),
            "news feed must be empty outside the dashboard"
        );
        debug_assert!(
            self.step == ViewStep::Login || self.user.is_some(),
            "every step after login needs a user"
        );
        debug_assert!(
            !matches!(self.step, ViewStep::RegionSelect | ViewStep::Dashboard)
                || self.selected_field.is_some(),
            "region selection needs a field"
        );
    }

    // -----------------------------------------------------------------------
    // Synchronous transitions
    // -----------------------------------------------------------------------

    fn submit_login(&mut self, form: &LoginForm) -> FlowResult<()> {
        let email = EmailAddress::parse(&form.email)?;
        info!(session = %self.id, email = %email, "User logged in");
        self.user = Some(User::new(email));
        self.step = ViewStep::RoleSelect;
        Ok(())
    }

    fn pick_role(&mut self, role: Role) -> FlowResult<()> {
        let user = self.user_mut()?;
        user.role = role;
        user.is_verified = false;
        user.id_proof_ref = None;
        self.step = if role.requires_verification() {
            ViewStep::Verification
        } else {
            ViewStep::FieldSelect
        };
        Ok(())
    }

    fn acknowledge_modal(&mut self) -> FlowResult<()> {
        match self.modal.take() {
            Some(Modal::Success(_)) => {
                self.step = ViewStep::FieldSelect;
                Ok(())
            }
            Some(Modal::Error(_)) => Ok(()),
            None => Err(FlowError::NoModal),
        }
    }

    fn pick_field(&mut self, field: NewsField) {
        self.selected_field = Some(field);
        self.selected_region = None;
        self.step = ViewStep::RegionSelect;
    }

    fn choose_location(&mut self, input: &str) -> FlowResult<()> {
        let region = self.selected_region.ok_or(FlowError::RegionNotSelected)?;
        let (catalog, slot) = match region {
            NewsRegion::State => (INDIAN_STATES, &mut self.selected_state),
            NewsRegion::National => (COUNTRIES, &mut self.selected_country),
            NewsRegion::International => return Err(FlowError::LocationNotApplicable(region)),
        };
        let location =
            resolve_location(catalog, input).ok_or_else(|| FlowError::UnknownLocation {
                region,
                location: input.to_string(),
            })?;
        *slot = Some(location.to_string());
        Ok(())
    }

    fn open_article(&mut self, id: &str) -> FlowResult<()> {
        if !self.news_feed.iter().any(|item| item.id == id) {
            return Err(FlowError::UnknownArticle(id.to_string()));
        }
        self.selected_article = Some(id.to_string());
        Ok(())
    }

    fn change_topic(&mut self) {
        self.news_feed.clear();
        self.selected_article = None;
        self.selected_region = None;
        self.step = ViewStep::FieldSelect;
    }

    fn back(&mut self, intent: &Intent) -> FlowResult<()> {
        match self.step {
            ViewStep::Login => return Err(self.invalid(intent)),
            ViewStep::RoleSelect => self.step = ViewStep::Login,
            ViewStep::Verification => {
                if self.verifying.is_set() {
                    return Err(FlowError::Busy);
                }
                self.id_proof = None;
                self.step = ViewStep::RoleSelect;
            }
            ViewStep::FieldSelect => {
                self.selected_field = None;
                self.selected_region = None;
                self.step = ViewStep::RoleSelect;
            }
            ViewStep::RegionSelect => {
                self.selected_region = None;
                self.step = ViewStep::FieldSelect;
            }
            ViewStep::Dashboard => {
                if self.selected_article.take().is_some() {
                    return Ok(());
                }
                self.news_feed.clear();
                self.step = ViewStep::RegionSelect;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OnboardingFlow
// ---------------------------------------------------------------------------

/// Drives a [`Session`] through the flow, calling out to the collaborators.
#[derive(Clone)]
pub struct OnboardingFlow {
    news: Arc<dyn NewsQueryService>,
    verifier: Arc<dyn DocumentVerifier>,
}

impl OnboardingFlow {
    pub fn new(news: Arc<dyn NewsQueryService>, verifier: Arc<dyn DocumentVerifier>) -> Self {
        Self { news, verifier }
    }

    /// Apply one intent. Returns the step the session ends up on.
    pub async fn dispatch(&self, session: &mut Session, intent: Intent) -> FlowResult<ViewStep> {
        let from = session.step;
        let result = self.apply(session, &intent).await;

        match &result {
            Ok(()) => info!(
                session = %session.id,
                intent = intent.name(),
                from = %from,
                to = %session.step,
                "Transition"
            ),
            Err(e) => debug!(
                session = %session.id,
                intent = intent.name(),
                step = %from,
                "Intent rejected: {}",
                e
            ),
        }
        session.check_invariants();

        result.map(|()| session.step)
    }

    async fn apply(&self, session: &mut Session, intent: &Intent) -> FlowResult<()> {
        if session.modal.is_some() && !matches!(intent, Intent::Reload | Intent::AcknowledgeModal)
        {
            return Err(FlowError::ModalOpen);
        }

        match intent {
            Intent::Reload => {
                if session.is_loading() || session.is_verifying() {
                    return Err(FlowError::Busy);
                }
                info!(session = %session.id, "Session reset");
                *session = Session::new();
                Ok(())
            }
            Intent::AcknowledgeModal => session.acknowledge_modal(),
            Intent::Back => session.back(intent),
            Intent::SubmitLogin(form) => {
                session.require_step(ViewStep::Login, intent)?;
                session.submit_login(form)
            }
            Intent::PickRole(role) => {
                session.require_step(ViewStep::RoleSelect, intent)?;
                session.pick_role(*role)
            }
            Intent::SelectDocument(selection) => {
                session.require_step(ViewStep::Verification, intent)?;
                if session.is_verifying() {
                    return Err(FlowError::Busy);
                }
                session.id_proof = Some(selection.clone());
                Ok(())
            }
            Intent::SubmitVerification => {
                session.require_step(ViewStep::Verification, intent)?;
                self.verify_reporter(session).await
            }
            Intent::PickField(field) => {
                session.require_step(ViewStep::FieldSelect, intent)?;
                session.pick_field(*field);
                Ok(())
            }
            Intent::PickRegion(region) => {
                session.require_step(ViewStep::RegionSelect, intent)?;
                if session.selected_field.is_none() {
                    return Err(FlowError::FieldNotSelected);
                }
                if session.is_loading() {
                    return Err(FlowError::Busy);
                }
                session.selected_region = Some(*region);
                if region.requires_location() {
                    return Ok(());
                }
                self.fetch_news_for_area(session, *region, region.label().to_string())
                    .await
            }
            Intent::ChooseLocation(input) => {
                session.require_step(ViewStep::RegionSelect, intent)?;
                session.choose_location(input)
            }
            Intent::ConfirmLocation => {
                session.require_step(ViewStep::RegionSelect, intent)?;
                let region = session
                    .selected_region
                    .ok_or(FlowError::RegionNotSelected)?;
                if !region.requires_location() {
                    return Err(FlowError::LocationNotApplicable(region));
                }
                let location = session
                    .pending_location()
                    .filter(|loc| !loc.trim().is_empty())
                    .ok_or(FlowError::LocationRequired(region))?
                    .to_string();
                self.fetch_news_for_area(session, region, location).await
            }
            Intent::OpenArticle(id) => {
                session.require_step(ViewStep::Dashboard, intent)?;
                session.open_article(id)
            }
            Intent::CloseArticle => {
                session.require_step(ViewStep::Dashboard, intent)?;
                session.selected_article = None;
                Ok(())
            }
            Intent::ChangeTopic => {
                session.require_step(ViewStep::Dashboard, intent)?;
                session.change_topic();
                Ok(())
            }
        }
    }

    async fn verify_reporter(&self, session: &mut Session) -> FlowResult<()> {
        let Some(selection) = session.id_proof.clone() else {
            warn!(session = %session.id, "Verification submitted without a document");
            session.modal = Some(Modal::Error(DOCUMENT_REQUIRED_MESSAGE.to_string()));
            return Ok(());
        };

        let _verifying = session.verifying.hold()?;

        let verdict = match selection.encode().await {
            Ok(document) => self.verifier.verify_document(&document).await,
            Err(e) => Err(e),
        };

        match verdict {
            Ok(verdict) if verdict.is_valid => {
                info!(session = %session.id, "Reporter verified: {}", verdict.reason);
                let user = session.user_mut()?;
                user.is_verified = true;
                user.id_proof_ref = Some(selection.file_name());
                session.modal = Some(Modal::Success(format!(
                    "Access Granted: {}",
                    verdict.reason
                )));
            }
            Ok(verdict) => {
                warn!(session = %session.id, "Verification rejected: {}", verdict.reason);
                session.modal = Some(Modal::Error(format!(
                    "Verification Failed: {}",
                    verdict.reason
                )));
            }
            Err(e) => {
                error!(
                    session = %session.id,
                    provider = self.verifier.provider_name(),
                    "Verification error: {}",
                    e
                );
                session.modal = Some(Modal::Error(SYSTEM_ERROR_MESSAGE.to_string()));
            }
        }
        Ok(())
    }

    async fn fetch_news_for_area(
        &self,
        session: &mut Session,
        region: NewsRegion,
        name: String,
    ) -> FlowResult<()> {
        let field = session.selected_field.ok_or(FlowError::FieldNotSelected)?;
        let _loading = session.loading.hold()?;

        session.active_region_name = name.clone();
        let query = NewsQuery::new(field, region, Some(name));
        let items = fetch_aggregated_news(self.news.as_ref(), &query).await;

        if items.is_empty() {
            warn!(session = %session.id, "No news found for {}", query.target_context());
        }
        session.news_feed = items;
        session.selected_article = None;
        session.step = ViewStep::Dashboard;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, AiResult, EncodedDocument, NewsBatch, RawNewsRecord, Verdict};
    use crate::domain::NewsTag;
    use async_trait::async_trait;

    struct OneStory;

    #[async_trait]
    impl NewsQueryService for OneStory {
        async fn query_news(&self, _query: &NewsQuery) -> AiResult<NewsBatch> {
            Ok(NewsBatch {
                records: vec![RawNewsRecord {
                    title: "Headline".into(),
                    description: "Body".into(),
                    image_url: None,
                    tag: NewsTag::Trend,
                }],
                sources: vec![],
            })
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    struct Unreachable;

    #[async_trait]
    impl DocumentVerifier for Unreachable {
        async fn verify_document(&self, _document: &EncodedDocument) -> AiResult<Verdict> {
            Err(AiError::ApiError("offline".into()))
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn flow() -> OnboardingFlow {
        OnboardingFlow::new(Arc::new(OneStory), Arc::new(Unreachable))
    }

    async fn at_region_select(flow: &OnboardingFlow) -> Session {
        let mut s = Session::new();
        flow.dispatch(&mut s, Intent::SubmitLogin(LoginForm::new("a@b.io")))
            .await
            .unwrap();
        flow.dispatch(&mut s, Intent::PickRole(Role::Citizen))
            .await
            .unwrap();
        flow.dispatch(&mut s, Intent::PickField(NewsField::Jobs))
            .await
            .unwrap();
        s
    }

    #[tokio::test]
    async fn test_initial_state() {
        let s = Session::new();
        assert_eq!(s.step(), ViewStep::Login);
        assert!(s.user().is_none());
        assert!(s.news_feed().is_empty());
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_invalid_email_leaves_session_on_login() {
        let flow = flow();
        let mut s = Session::new();
        let err = flow
            .dispatch(&mut s, Intent::SubmitLogin(LoginForm::new("not-an-email")))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidEmail(_)));
        assert_eq!(s.step(), ViewStep::Login);
        assert!(s.user().is_none());
    }

    #[tokio::test]
    async fn test_intent_on_wrong_step_is_rejected() {
        let flow = flow();
        let mut s = Session::new();
        let err = flow
            .dispatch(&mut s, Intent::PickRole(Role::Citizen))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidTransition {
                from: ViewStep::Login,
                intent: "pick role"
            }
        );
        assert!(flow.dispatch(&mut s, Intent::Back).await.is_err());
    }

    #[tokio::test]
    async fn test_back_from_field_select_trims_field() {
        let flow = flow();
        let mut s = at_region_select(&flow).await;
        flow.dispatch(&mut s, Intent::Back).await.unwrap();
        assert_eq!(s.step(), ViewStep::FieldSelect);
        assert_eq!(s.selected_field(), Some(NewsField::Jobs));

        flow.dispatch(&mut s, Intent::Back).await.unwrap();
        assert_eq!(s.step(), ViewStep::RoleSelect);
        assert!(s.selected_field().is_none());

        flow.dispatch(&mut s, Intent::Back).await.unwrap();
        assert_eq!(s.step(), ViewStep::Login);
        assert_eq!(s.user().unwrap().email.as_str(), "a@b.io");
    }

    #[tokio::test]
    async fn test_choose_location_validates_catalog() {
        let flow = flow();
        let mut s = at_region_select(&flow).await;

        let err = flow
            .dispatch(&mut s, Intent::ChooseLocation("Kerala".into()))
            .await
            .unwrap_err();
        assert_eq!(err, FlowError::RegionNotSelected);

        flow.dispatch(&mut s, Intent::PickRegion(NewsRegion::State))
            .await
            .unwrap();
        let err = flow
            .dispatch(&mut s, Intent::ChooseLocation("Bavaria".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::UnknownLocation { .. }));

        let err = flow
            .dispatch(&mut s, Intent::ConfirmLocation)
            .await
            .unwrap_err();
        assert_eq!(err, FlowError::LocationRequired(NewsRegion::State));

        flow.dispatch(&mut s, Intent::ChooseLocation("kerala".into()))
            .await
            .unwrap();
        assert_eq!(s.pending_location(), Some("Kerala"));
        assert_eq!(s.step(), ViewStep::RegionSelect);
    }

    #[tokio::test]
    async fn test_dashboard_article_overlay_and_back() {
        let flow = flow();
        let mut s = at_region_select(&flow).await;
        flow.dispatch(&mut s, Intent::PickRegion(NewsRegion::International))
            .await
            .unwrap();
        assert_eq!(s.step(), ViewStep::Dashboard);
        assert_eq!(s.active_region_name(), "International-wise");
        assert_eq!(s.dashboard_heading().as_deref(), Some("International-wise"));

        let id = s.news_feed()[0].id.clone();
        flow.dispatch(&mut s, Intent::OpenArticle(id.clone()))
            .await
            .unwrap();
        assert_eq!(s.selected_article().unwrap().id, id);

        assert!(matches!(
            flow.dispatch(&mut s, Intent::OpenArticle("news-9-0".into()))
                .await,
            Err(FlowError::UnknownArticle(_))
        ));

        // First back closes the overlay, second leaves the dashboard.
        flow.dispatch(&mut s, Intent::Back).await.unwrap();
        assert_eq!(s.step(), ViewStep::Dashboard);
        assert!(s.selected_article().is_none());

        flow.dispatch(&mut s, Intent::Back).await.unwrap();
        assert_eq!(s.step(), ViewStep::RegionSelect);
        assert!(s.news_feed().is_empty());
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_change_topic_returns_to_field_select() {
        let flow = flow();
        let mut s = at_region_select(&flow).await;
        assert_eq!(
            flow.dispatch(&mut s, Intent::ChangeTopic).await.unwrap_err(),
            FlowError::InvalidTransition {
                from: ViewStep::RegionSelect,
                intent: "change topic"
            }
        );

        flow.dispatch(&mut s, Intent::PickRegion(NewsRegion::International))
            .await
            .unwrap();
        let id = s.news_feed()[0].id.clone();
        flow.dispatch(&mut s, Intent::OpenArticle(id)).await.unwrap();

        let step = flow.dispatch(&mut s, Intent::ChangeTopic).await.unwrap();
        assert_eq!(step, ViewStep::FieldSelect);
        assert!(s.news_feed().is_empty());
        assert!(s.selected_article().is_none());
        assert!(s.selected_region().is_none());
        assert_eq!(s.user().unwrap().email.as_str(), "a@b.io");

        flow.dispatch(&mut s, Intent::PickField(NewsField::TechAi))
            .await
            .unwrap();
        assert_eq!(s.step(), ViewStep::RegionSelect);
        assert_eq!(s.selected_field(), Some(NewsField::TechAi));
    }

    #[tokio::test]
    async fn test_modal_blocks_other_intents() {
        let flow = flow();
        let mut s = Session::new();
        flow.dispatch(&mut s, Intent::SubmitLogin(LoginForm::new("r@b.io")))
            .await
            .unwrap();
        flow.dispatch(&mut s, Intent::PickRole(Role::Reporter))
            .await
            .unwrap();
        flow.dispatch(&mut s, Intent::SubmitVerification)
            .await
            .unwrap();
        assert!(matches!(s.modal(), Some(Modal::Error(_))));

        assert_eq!(
            flow.dispatch(&mut s, Intent::Back).await.unwrap_err(),
            FlowError::ModalOpen
        );
        flow.dispatch(&mut s, Intent::AcknowledgeModal)
            .await
            .unwrap();
        assert!(s.modal().is_none());
        assert_eq!(s.step(), ViewStep::Verification);
        assert_eq!(
            flow.dispatch(&mut s, Intent::AcknowledgeModal)
                .await
                .unwrap_err(),
            FlowError::NoModal
        );
    }

    #[tokio::test]
    async fn test_reload_resets_everything() {
        let flow = flow();
        let mut s = at_region_select(&flow).await;
        let old_id = s.id();
        flow.dispatch(&mut s, Intent::Reload).await.unwrap();
        assert_eq!(s.step(), ViewStep::Login);
        assert!(s.user().is_none());
        assert!(s.selected_field().is_none());
        assert_ne!(s.id(), old_id);
    }

    #[tokio::test]
    async fn test_busy_loading_flag_rejects_region_pick() {
        let flow = flow();
        let mut s = at_region_select(&flow).await;
        let flag = s.loading_flag();
        let _held = flag.hold().unwrap();

        let err = flow
            .dispatch(&mut s, Intent::PickRegion(NewsRegion::International))
            .await
            .unwrap_err();
        assert_eq!(err, FlowError::Busy);
        assert_eq!(s.step(), ViewStep::RegionSelect);
        assert!(s.selected_region().is_none());
    }
}
