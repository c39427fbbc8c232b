//! # Completeness Validator
//!
//! Decides whether an asset draft may be saved and which single message to
//! show when it cannot. The same [`evaluate`] backs both the reactive
//! autosave path and the explicit save button.
//!
//! ## Rules
//!
//! - Frequency is always required.
//! - NODE: the effective technology (draft value, else plan row) must be set,
//!   and the node adjustment must match that technology.
//! - AMPLIFIER: mode, port and index are required; once frequency and mode
//!   are chosen the amplifier adjustment must be complete.
//! - Photo minimums per category (see [`crate::photos`]).
//! - A report holds at most one NODE.
//!
//! Evaluation never fails. Position uniqueness for amplifiers is checked
//! only by [`check_explicit_save`].

use crate::draft::AssetDraft;
use crate::photos::{PhotoCounts, photos_satisfied};
use crate::plan::PlanRow;
use crate::{Asset, AssetKind, FieldError, NodeAdjustment, Technology, ValidationMessage};
use serde::{Deserialize, Serialize};

/// What the validator needs besides the draft itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Saved assets of the draft's report, possibly including the draft's own.
    pub siblings: &'a [Asset],
    /// Plan row for the report's node, if the plan has one.
    pub plan_row: Option<&'a PlanRow>,
    /// Current photo counts for the draft.
    pub photos: PhotoCounts,
}

/// Individual rule outcomes, exposed for diagnostics and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checks {
    pub frequency_set: bool,
    /// Technology (NODE) or mode/port/index (AMPLIFIER) chosen.
    pub kind_fields_set: bool,
    pub photos_ok: bool,
    pub amplifier_adjustment_ok: bool,
    pub node_adjustment_ok: bool,
    pub node_allowed: bool,
}

impl Checks {
    fn all_pass(&self) -> bool {
        self.frequency_set
            && self.kind_fields_set
            && self.photos_ok
            && self.amplifier_adjustment_ok
            && self.node_adjustment_ok
            && self.node_allowed
    }
}

/// Verdict for a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub ready: bool,
    /// Set exactly when `ready` is false.
    pub message: Option<ValidationMessage>,
    /// Technology the rules were applied with.
    pub technology: Option<Technology>,
    pub checks: Checks,
}

/// Effective technology: the draft's choice, else the plan's suggestion.
#[must_use]
pub fn resolve_technology(draft: &AssetDraft, plan_row: Option<&PlanRow>) -> Option<Technology> {
    draft
        .technology
        .or_else(|| plan_row.and_then(|row| row.technology))
}

/// Whether the node adjustment holds every confirmation its technology needs.
#[must_use]
pub fn node_adjustment_ok(
    technology: Option<Technology>,
    adj: &NodeAdjustment,
    frequency_set: bool,
) -> bool {
    let power_pair =
        adj.sfp_distance_km.is_some() && adj.direct_power_confirmed && adj.return_power_confirmed;
    match technology {
        Some(Technology::Rphy) => power_pair,
        Some(Technology::Vccap) => {
            power_pair && adj.spectrum_confirmed && adj.docsis_confirmed && frequency_set
        }
        Some(Technology::Legacy) => {
            let rx_pad_chosen = adj
                .rx_pad
                .as_deref()
                .is_some_and(|pad| !pad.trim().is_empty());
            (adj.tx_1310_confirmed || adj.tx_1550_confirmed)
                && adj.power_confirmed
                && rx_pad_chosen
                && adj.measurement_confirmed
                && adj.spectrum_confirmed
                && frequency_set
        }
        None => adj.non_legacy_confirmed,
    }
}

/// Whether the amplifier adjustment is complete, when it is required at all.
///
/// It is required only for amplifiers with both frequency and mode chosen.
#[must_use]
pub fn amplifier_adjustment_ok(draft: &AssetDraft) -> bool {
    let required = draft.kind == AssetKind::Amplifier
        && draft.frequency.is_some()
        && draft.amplifier_mode.is_some();
    !required || draft.amplifier_adjustment.is_complete()
}

/// False when the draft is a NODE and the report already has another one.
#[must_use]
pub fn node_allowed(draft: &AssetDraft, siblings: &[Asset]) -> bool {
    draft.kind != AssetKind::Node
        || !siblings
            .iter()
            .any(|a| a.kind == AssetKind::Node && Some(a.id) != draft.id)
}

/// Another amplifier of the report at the draft's (port, index), if any.
#[must_use]
pub fn find_port_conflict<'a>(draft: &AssetDraft, siblings: &'a [Asset]) -> Option<&'a Asset> {
    if draft.kind != AssetKind::Amplifier {
        return None;
    }
    let position = draft.position()?;
    siblings.iter().find(|a| {
        a.kind == AssetKind::Amplifier && a.position() == Some(position) && Some(a.id) != draft.id
    })
}

/// Evaluate a draft.
#[must_use]
pub fn evaluate(draft: &AssetDraft, ctx: &ValidationContext<'_>) -> Evaluation {
    let technology = match draft.kind {
        AssetKind::Node => resolve_technology(draft, ctx.plan_row),
        AssetKind::Amplifier => None,
    };
    let frequency_set = draft.frequency.is_some();

    let kind_fields_set = match draft.kind {
        AssetKind::Node => technology.is_some(),
        AssetKind::Amplifier => {
            draft.amplifier_mode.is_some() && draft.port.is_some() && draft.port_index.is_some()
        }
    };
    let node_adjustment_ok = match draft.kind {
        AssetKind::Node => node_adjustment_ok(technology, &draft.node_adjustment, frequency_set),
        AssetKind::Amplifier => true,
    };

    let checks = Checks {
        frequency_set,
        kind_fields_set,
        photos_ok: photos_satisfied(draft.kind, technology, &ctx.photos),
        amplifier_adjustment_ok: amplifier_adjustment_ok(draft),
        node_adjustment_ok,
        node_allowed: node_allowed(draft, ctx.siblings),
    };

    let ready = checks.all_pass();
    let message = if ready {
        None
    } else if !checks.node_allowed {
        Some(ValidationMessage::NodeAlreadyPresent)
    } else if !checks.amplifier_adjustment_ok {
        Some(ValidationMessage::AmplifierAdjustmentIncomplete)
    } else if !checks.node_adjustment_ok && ctx.plan_row.is_some() {
        Some(ValidationMessage::NodeAdjustmentIncomplete)
    } else {
        Some(ValidationMessage::MissingFieldsOrPhotos)
    };

    Evaluation {
        ready,
        message,
        technology,
        checks,
    }
}

/// Checks run when the technician presses save.
///
/// On top of [`evaluate`], rejects an amplifier whose position is taken by
/// another asset of the same report.
pub fn check_explicit_save(
    draft: &AssetDraft,
    ctx: &ValidationContext<'_>,
) -> Result<Evaluation, FieldError> {
    let evaluation = evaluate(draft, ctx);
    if !evaluation.checks.node_allowed {
        return Err(FieldError::NodeAlreadyPresent(draft.report_id));
    }
    if let Some(existing) = find_port_conflict(draft, ctx.siblings) {
        if let Some((port, index)) = existing.position() {
            return Err(FieldError::DuplicatePort {
                port,
                index,
                existing: existing.id,
            });
        }
    }
    match evaluation.message {
        Some(message) if !evaluation.ready => Err(FieldError::Incomplete(message)),
        _ => Ok(evaluation),
    }
}

// =============================================================================
// TESTS
// =============================================================================
