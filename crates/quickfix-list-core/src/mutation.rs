//! Typed write intents and the outcomes they settle into.

use thiserror::Error;
use uuid::Uuid;

use quickfix_events::MutationKind;

use crate::error::ValidationErrors;
use crate::resource::{ListResource, Validate};

/// A write the operator asked for, described before anything happens.
///
/// The controller applies the intent optimistically, sends it to the backend,
/// and settles or rolls back depending on the answer.
#[derive(Debug, Clone)]
pub enum MutationIntent<R: ListResource> {
    /// Add a new row from a composed draft.
    Create {
        /// The payload the operator composed.
        draft: R::Draft,
    },
    /// Edit an existing row.
    Update {
        /// Row being edited.
        id: Uuid,
        /// The edit payload.
        patch: R::Patch,
    },
    /// Remove a row.
    Delete {
        /// Row being removed.
        id: Uuid,
    },
    /// Toggle or assign a single field on a row.
    SetField {
        /// Row being changed.
        id: Uuid,
        /// The field change.
        change: R::Field,
    },
}

impl<R: ListResource> MutationIntent<R> {
    /// Which of the four write operations this is.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
            Self::SetField { .. } => MutationKind::SetField,
        }
    }

    /// The row the intent targets, when it targets one at all.
    #[must_use]
    pub const fn target(&self) -> Option<Uuid> {
        match self {
            Self::Create { .. } => None,
            Self::Update { id, .. } | Self::Delete { id } | Self::SetField { id, .. } => Some(*id),
        }
    }

    /// Validate the composed payload before any optimistic change or network
    /// traffic.
    ///
    /// # Errors
    ///
    /// Returns the violations for create drafts and update patches; deletes
    /// and field changes carry nothing to validate.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Create { draft } => draft.validate(),
            Self::Update { patch, .. } => patch.validate(),
            Self::Delete { .. } | Self::SetField { .. } => Ok(()),
        }
    }
}

/// Why a mutation was refused before it reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationRejection {
    /// The composed payload failed validation.
    #[error("validation failed")]
    Invalid(ValidationErrors),
    /// The target row lacks something the change depends on.
    #[error("missing dependency: {message}")]
    MissingDependency {
        /// Operator-facing explanation supplied by the resource.
        message: &'static str,
    },
}

impl MutationRejection {
    /// The sentence the operator sees.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Invalid(errors) => errors.summary(),
            Self::MissingDependency { message } => (*message).to_string(),
        }
    }
}

/// How a requested mutation ended, reported as data rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend confirmed the change; the optimistic projection stands.
    Settled,
    /// The backend refused or never answered; the previous rows are back.
    RolledBack {
        /// The sentence shown to the operator.
        message: String,
    },
    /// The change never left the console.
    Rejected {
        /// The sentence shown to the operator.
        message: String,
    },
}

impl MutationOutcome {
    /// True when the change stuck.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled)
    }
}
