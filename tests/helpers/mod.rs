//! Scripted collaborator doubles for flow tests.
//!
//! Each double records the calls it receives so tests can assert on exactly
//! what the state machine asked for.

#![allow(dead_code)]

use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex};

use infosphere::ai::{
    AiError, AiResult, DocumentVerifier, EncodedDocument, NewsBatch, NewsQuery, NewsQueryService,
    RawNewsRecord, Verdict,
};
use infosphere::domain::NewsTag;
use infosphere::session::{BusyFlag, Intent, LoginForm, OnboardingFlow, Session};
use infosphere::Role;

/// Records the state of a session's busy flag at the moment a call arrives.
#[derive(Default)]
pub struct FlagWatch {
    flag: Mutex<Option<BusyFlag>>,
    seen: Mutex<Vec<bool>>,
}

impl FlagWatch {
    fn watch(&self, flag: BusyFlag) {
        *self.flag.lock().unwrap() = Some(flag);
    }

    fn record(&self) {
        if let Some(flag) = self.flag.lock().unwrap().as_ref() {
            self.seen.lock().unwrap().push(flag.is_set());
        }
    }

    fn seen(&self) -> Vec<bool> {
        self.seen.lock().unwrap().clone()
    }
}

/// News source that answers every query with the same headlines, or fails.
#[derive(Default)]
pub struct ScriptedNews {
    pub headlines: Vec<String>,
    pub fail: bool,
    pub calls: Mutex<Vec<NewsQuery>>,
    loading: FlagWatch,
}

impl ScriptedNews {
    pub fn with_headlines(headlines: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            headlines: headlines.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<NewsQuery> {
        self.calls.lock().unwrap().clone()
    }

    /// Observe the session's loading flag from inside `query_news`.
    pub fn watch_loading(&self, session: &Session) {
        self.loading.watch(session.loading_flag());
    }

    /// Loading flag state seen by each call.
    pub fn loading_seen(&self) -> Vec<bool> {
        self.loading.seen()
    }
}

#[async_trait]
impl NewsQueryService for ScriptedNews {
    async fn query_news(&self, query: &NewsQuery) -> AiResult<NewsBatch> {
        self.calls.lock().unwrap().push(query.clone());
        self.loading.record();
        if self.fail {
            return Err(AiError::ApiError("HTTP 500: simulated outage".to_string()));
        }
        Ok(NewsBatch {
            records: self
                .headlines
                .iter()
                .map(|title| RawNewsRecord {
                    title: title.clone(),
                    description: format!("{} in detail.", title),
                    image_url: Some("https://img.test/story.jpg".to_string()),
                    tag: NewsTag::Latest,
                })
                .collect(),
            sources: vec![],
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Verifier that returns a fixed verdict, or fails.
#[derive(Default)]
pub struct ScriptedVerifier {
    pub verdict: Option<Verdict>,
    pub calls: Mutex<Vec<EncodedDocument>>,
    verifying: FlagWatch,
}

impl ScriptedVerifier {
    pub fn returning(is_valid: bool, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            verdict: Some(Verdict {
                is_valid,
                reason: reason.to_string(),
            }),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Observe the session's verifying flag from inside `verify_document`.
    pub fn watch_verifying(&self, session: &Session) {
        self.verifying.watch(session.verifying_flag());
    }

    /// Verifying flag state seen by each call.
    pub fn verifying_seen(&self) -> Vec<bool> {
        self.verifying.seen()
    }
}

#[async_trait]
impl DocumentVerifier for ScriptedVerifier {
    async fn verify_document(&self, document: &EncodedDocument) -> AiResult<Verdict> {
        self.calls.lock().unwrap().push(document.clone());
        self.verifying.record();
        self.verdict
            .clone()
            .ok_or_else(|| AiError::InvalidResponse("simulated parse failure".to_string()))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

pub fn flow(news: Arc<ScriptedNews>, verifier: Arc<ScriptedVerifier>) -> OnboardingFlow {
    OnboardingFlow::new(news, verifier)
}

/// Log in and pick a role.
pub async fn logged_in_as(flow: &OnboardingFlow, email: &str, role: Role) -> Session {
    let mut session = Session::new();
    flow.dispatch(&mut session, Intent::SubmitLogin(LoginForm::new(email)))
        .await
        .expect("login");
    flow.dispatch(&mut session, Intent::PickRole(role))
        .await
        .expect("pick role");
    session
}

/// A small image file on disk for upload tests.
pub fn image_file(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".jpg")
        .tempfile()
        .expect("temp file");
    file.write_all(contents).expect("write image");
    file
}
