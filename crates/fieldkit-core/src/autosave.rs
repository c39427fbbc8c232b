//! # Autosave Trigger
//!
//! Owns one draft session and persists the draft as soon as it becomes
//! ready. Every edit goes through [`AutosaveTrigger::update`], which merges
//! the new fields, re-runs the validator and writes when the verdict is
//! positive.
//!
//! Autosave never surfaces errors to the technician: a taken amplifier
//! position skips the write, and storage failures are logged and reduced to
//! a generic message.

use crate::draft::AssetDraft;
use crate::validation::Evaluation;
use crate::workspace::Workspace;
use crate::{AssetId, FieldError, GeoPoint, PhotoCategory};
use serde::{Deserialize, Serialize};

/// Message shown when an autosave could not be written.
pub const AUTOSAVE_FAILED_MESSAGE: &str = "No se pudo guardar automáticamente";

/// What one recompute did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AutosaveOutcome {
    /// Draft still incomplete; nothing written.
    NotReady { evaluation: Evaluation },
    /// First save of the draft.
    Created {
        asset: AssetId,
        evaluation: Evaluation,
    },
    /// Later save of an already created asset.
    Updated {
        asset: AssetId,
        evaluation: Evaluation,
    },
    /// Ready, but another amplifier holds the position; nothing written.
    Skipped {
        conflict: AssetId,
        evaluation: Evaluation,
    },
    /// Storage error, already logged.
    Failed { message: String },
}

impl AutosaveOutcome {
    /// Whether this recompute wrote to storage.
    #[must_use]
    pub fn persisted(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Updated { .. })
    }
}

/// A draft session with autosave.
#[derive(Debug, Clone)]
pub struct AutosaveTrigger {
    session: u64,
    draft: AssetDraft,
}

impl AutosaveTrigger {
    /// Start a session over `draft`, either new or loaded for editing.
    #[must_use]
    pub fn new(session: u64, draft: AssetDraft) -> Self {
        Self { session, draft }
    }

    #[must_use]
    pub fn session(&self) -> u64 {
        self.session
    }

    #[must_use]
    pub fn draft(&self) -> &AssetDraft {
        &self.draft
    }

    /// Apply form edits and recompute.
    pub fn update(&mut self, ws: &mut Workspace, edits: AssetDraft) -> AutosaveOutcome {
        self.draft.merge_edits(edits);
        self.recompute(ws)
    }

    /// Evaluate the current draft and persist it when ready.
    ///
    /// Calling this again with an unchanged ready draft performs a plain
    /// update.
    pub fn recompute(&mut self, ws: &mut Workspace) -> AutosaveOutcome {
        let evaluation = match ws.evaluate_draft(&self.draft) {
            Ok(evaluation) => evaluation,
            Err(e) => return self.failed(&e),
        };
        if !evaluation.ready {
            return AutosaveOutcome::NotReady { evaluation };
        }

        match ws.port_conflict(&self.draft) {
            Ok(Some(existing)) => {
                tracing::debug!(
                    session = self.session,
                    conflict = %existing.id,
                    "Autosave skipped, position taken"
                );
                return AutosaveOutcome::Skipped {
                    conflict: existing.id,
                    evaluation,
                };
            }
            Ok(None) => {}
            Err(e) => return self.failed(&e),
        }

        match ws.persist_draft(&mut self.draft, evaluation) {
            Ok(saved) if saved.created => AutosaveOutcome::Created {
                asset: saved.asset.id,
                evaluation: saved.evaluation,
            },
            Ok(saved) => AutosaveOutcome::Updated {
                asset: saved.asset.id,
                evaluation: saved.evaluation,
            },
            Err(e) => self.failed(&e),
        }
    }

    /// Capture a photo for this session, then recompute.
    ///
    /// Saved drafts attach the photo to their asset directly; unsaved drafts
    /// stage it until the first save. A full category is an error, since the
    /// technician asked for this photo explicitly.
    pub fn add_photo(
        &mut self,
        ws: &mut Workspace,
        category: PhotoCategory,
        bytes: &[u8],
        location: Option<GeoPoint>,
    ) -> Result<AutosaveOutcome, FieldError> {
        match self.draft.id {
            Some(asset) => {
                ws.add_photo(asset, category, bytes, location)?;
            }
            None => {
                ws.stage_photo(self.session, &mut self.draft, category, bytes, location)?;
            }
        }
        Ok(self.recompute(ws))
    }

    /// End the session, removing photos that were never adopted.
    pub fn discard(self, ws: &Workspace) -> Result<(), FieldError> {
        ws.discard_staging(self.session)
    }

    fn failed(&self, error: &FieldError) -> AutosaveOutcome {
        tracing::warn!(session = self.session, "Autosave failed: {}", error);
        AutosaveOutcome::Failed {
            message: AUTOSAVE_FAILED_MESSAGE.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
