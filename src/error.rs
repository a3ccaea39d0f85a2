//! Error types for the onboarding flow.
//!
//! Collaborator failures have their own type in [`crate::ai::AiError`]. The
//! errors here describe intents the state machine refused; a refused intent
//! never changes the session.

use thiserror::Error;

use crate::domain::{NewsRegion, ViewStep};

/// Why an intent was rejected by the state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("'{intent}' is not available on the {from} step")]
    InvalidTransition { from: ViewStep, intent: &'static str },

    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("No user is logged in")]
    NoUser,

    #[error("A news topic must be selected first")]
    FieldNotSelected,

    #[error("A region must be selected first")]
    RegionNotSelected,

    #[error("The {0} region does not take a location")]
    LocationNotApplicable(NewsRegion),

    #[error("A location must be chosen for {0} news")]
    LocationRequired(NewsRegion),

    #[error("Unknown location '{location}' for {region} news")]
    UnknownLocation { region: NewsRegion, location: String },

    #[error("Unsupported document '{0}': upload a PNG, JPEG, WEBP, HEIC or GIF image")]
    UnsupportedDocument(String),

    #[error("Unknown article '{0}'")]
    UnknownArticle(String),

    #[error("Another request is still in progress")]
    Busy,

    #[error("Dismiss the open dialog first")]
    ModalOpen,

    #[error("No dialog is open")]
    NoModal,
}

pub type FlowResult<T> = Result<T, FlowError>;
