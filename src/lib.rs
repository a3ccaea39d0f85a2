//! InfoSphere - onboarding flow and news dashboard
//!
//! A user logs in, picks a role, (as a reporter) verifies an identity
//! document, then picks a topic and a region to get a news dashboard. News
//! discovery and document checks are delegated to an external model behind
//! the contracts in [`ai`]; this crate owns the view state machine in
//! [`session`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use infosphere::ai::{AiConfig, GeminiClient};
//! use infosphere::session::{Intent, LoginForm, OnboardingFlow, Session};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Arc::new(GeminiClient::new(AiConfig::from_env())?);
//! let flow = OnboardingFlow::new(client.clone(), client);
//!
//! let mut session = Session::new();
//! flow.dispatch(&mut session, Intent::SubmitLogin(LoginForm::new("jane@example.com")))
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Value types
pub mod domain;

// External collaborators (Gemini)
pub mod ai;

// View state machine
pub mod session;

// Terminal front end
#[cfg(feature = "cli")]
pub mod console;

pub use ai::{AiConfig, AiError, DocumentVerifier, GeminiClient, NewsQueryService};
pub use domain::{NewsField, NewsItem, NewsRegion, Role, User, ViewStep};
pub use error::{FlowError, FlowResult};
pub use session::{Intent, LoginForm, Modal, OnboardingFlow, Session};

// System info
pub use system_info as get_system_info;

/// System information module
pub mod system_info {
    /// Get system information
    pub fn get_system_info() -> String {
        format!("InfoSphere v{}", env!("CARGO_PKG_VERSION"))
    }
}
