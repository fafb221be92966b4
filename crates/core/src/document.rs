//! Slide document model and the mutation applier.
//!
//! A document is one markdown string; the deck is always a derived view
//! obtained by splitting on [`SLIDE_DELIMITER`]. The applier is pure: it
//! never touches the input and either returns the next document state or
//! refuses with the document untouched.

use serde::{Deserialize, Serialize};

use crate::errors::MutationError;
use crate::proposal::ProposalInput;

/// Literal separator between slides inside a document string.
pub const SLIDE_DELIMITER: &str = "\n---\n";

pub fn split_slides(document: &str) -> Vec<&str> {
    document.split(SLIDE_DELIMITER).collect()
}

pub fn slide_count(document: &str) -> usize {
    split_slides(document).len()
}

/// Whether decoded proposals are applied to the conversation context
/// automatically or surfaced for manual review. Manual is the default; the
/// applier only ever runs when the caller opts in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    #[default]
    Manual,
    AutoApply,
}

impl MutationPolicy {
    pub fn auto_applies(self) -> bool {
        matches!(self, Self::AutoApply)
    }
}

/// Result of applying a proposal to a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The document advanced to a new state.
    Updated(String),
    /// The proposal was informational (plan, review); nothing changed.
    Unchanged,
}

impl MutationOutcome {
    pub fn into_document(self, current: &str) -> String {
        match self {
            Self::Updated(next) => next,
            Self::Unchanged => current.to_string(),
        }
    }
}

/// Apply a validated proposal to the current document.
///
/// Edit refuses an out-of-bounds slide index outright; insert clamps its
/// position into `[0, slide_count]` by contract.
pub fn apply_proposal(
    document: &str,
    proposal: &ProposalInput,
) -> Result<MutationOutcome, MutationError> {
    match proposal {
        ProposalInput::Plan(_) | ProposalInput::Review(_) => Ok(MutationOutcome::Unchanged),
        ProposalInput::Replace(input) => Ok(MutationOutcome::Updated(input.new_markdown.clone())),
        ProposalInput::Edit(input) => {
            let mut slides = split_slides(document);
            if input.slide_index >= slides.len() {
                return Err(MutationError::SlideOutOfBounds {
                    slide_index: input.slide_index,
                    slide_count: slides.len(),
                });
            }
            slides[input.slide_index] = &input.new_markdown;
            Ok(MutationOutcome::Updated(slides.join(SLIDE_DELIMITER)))
        }
        ProposalInput::Insert(input) => {
            let mut slides = split_slides(document);
            // insert_after is already validated to be >= -1
            let position = usize::try_from(input.insert_after + 1)
                .unwrap_or(0)
                .min(slides.len());
            slides.insert(position, &input.new_markdown);
            Ok(MutationOutcome::Updated(slides.join(SLIDE_DELIMITER)))
        }
    }
}
