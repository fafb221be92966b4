//! The proposal tool catalog.
//!
//! Agents never mutate the document directly. They emit one of five
//! structured proposals; the client renders them with the deterministic
//! formatters below and may hand them to the mutation applier. The catalog is
//! a closed enum: dispatch is total over the five known kinds, with an
//! explicit raw-dump fallback for anything else on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::document::SLIDE_DELIMITER;
use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProposalKind {
    Plan,
    Review,
    Edit,
    Insert,
    Replace,
}

impl ProposalKind {
    pub const ALL: [ProposalKind; 5] =
        [Self::Plan, Self::Review, Self::Edit, Self::Insert, Self::Replace];

    pub fn tool_name(self) -> &'static str {
        match self {
            Self::Plan => "propose_plan",
            Self::Review => "propose_review",
            Self::Edit => "propose_edit",
            Self::Insert => "propose_insert",
            Self::Replace => "propose_replace",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tool_name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            Self::Plan => {
                "Propose a plan for the presentation structure. Use this when creating a new \
                 deck or significantly restructuring."
            }
            Self::Review => {
                "Review the current presentation: a 1-5 score, an overview, strengths, and \
                 per-slide improvement suggestions. Never modifies slides."
            }
            Self::Edit => {
                "Propose edits to a specific slide. Call multiple times when editing multiple \
                 slides. Other slides remain unchanged."
            }
            Self::Insert => {
                "Propose inserting new slide(s) at a specific position. Existing slides remain \
                 unchanged."
            }
            Self::Replace => {
                "Propose replacing ALL slides with new content. Use ONLY when creating from \
                 scratch or the user explicitly wants to rewrite everything."
            }
        }
    }

    /// JSON schema in OpenAI function-calling shape, as sent to the model.
    pub fn schema(self) -> Value {
        let parameters = match self {
            Self::Plan => json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The presentation title"
                    },
                    "outline": {
                        "type": "array",
                        "description": "Ordered slide topics",
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string" },
                                "description": { "type": "string" }
                            },
                            "required": ["title"]
                        }
                    },
                    "rationale": {
                        "type": "string",
                        "description": "Why this structure fits the request"
                    }
                },
                "required": ["title", "outline"]
            }),
            Self::Review => json!({
                "type": "object",
                "properties": {
                    "score": {
                        "type": "integer",
                        "description": "Overall rating from 1 (poor) to 5 (excellent)"
                    },
                    "overview": {
                        "type": "string",
                        "description": "One-paragraph summary of the assessment"
                    },
                    "good": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "What already works well"
                    },
                    "improvements": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "slideIndex": { "type": "integer" },
                                "title": { "type": "string" },
                                "problem": { "type": "string" },
                                "suggestion": { "type": "string" }
                            },
                            "required": ["slideIndex", "title", "problem", "suggestion"]
                        }
                    }
                },
                "required": ["score", "overview", "good", "improvements"]
            }),
            Self::Edit => json!({
                "type": "object",
                "properties": {
                    "slideIndex": {
                        "type": "integer",
                        "description": "The 0-based index from the context (e.g., [0], [1], [2])"
                    },
                    "newMarkdown": {
                        "type": "string",
                        "description": "The new markdown content for the slide. Do NOT include slide separator ---"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Brief explanation of changes for the user"
                    }
                },
                "required": ["slideIndex", "newMarkdown", "reason"]
            }),
            Self::Insert => json!({
                "type": "object",
                "properties": {
                    "insertAfter": {
                        "type": "integer",
                        "description": "Insert after this slide index. Use -1 to insert at the beginning."
                    },
                    "newMarkdown": {
                        "type": "string",
                        "description": "The markdown content for new slide(s). Use --- to separate multiple slides. Do NOT start with ---."
                    },
                    "reason": {
                        "type": "string",
                        "description": "Brief explanation for this insertion"
                    }
                },
                "required": ["insertAfter", "newMarkdown", "reason"]
            }),
            Self::Replace => json!({
                "type": "object",
                "properties": {
                    "newMarkdown": {
                        "type": "string",
                        "description": "The complete markdown content for the new presentation. Use --- to separate slides. Do NOT start with ---."
                    },
                    "reason": {
                        "type": "string",
                        "description": "Brief explanation for this replacement"
                    }
                },
                "required": ["newMarkdown", "reason"]
            }),
        };

        json!({
            "type": "function",
            "function": {
                "name": self.tool_name(),
                "description": self.description(),
                "parameters": parameters
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    pub title: String,
    pub outline: Vec<OutlineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewImprovement {
    pub slide_index: usize,
    pub title: String,
    pub problem: String,
    pub suggestion: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub score: u8,
    pub overview: String,
    pub good: Vec<String>,
    pub improvements: Vec<ReviewImprovement>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInput {
    pub slide_index: usize,
    pub new_markdown: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertInput {
    pub insert_after: i64,
    pub new_markdown: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceInput {
    pub new_markdown: String,
    pub reason: String,
}

/// A decoded, validated proposal input. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProposalInput {
    Plan(PlanInput),
    Review(ReviewInput),
    Edit(EditInput),
    Insert(InsertInput),
    Replace(ReplaceInput),
}

impl ProposalInput {
    pub fn kind(&self) -> ProposalKind {
        match self {
            Self::Plan(_) => ProposalKind::Plan,
            Self::Review(_) => ProposalKind::Review,
            Self::Edit(_) => ProposalKind::Edit,
            Self::Insert(_) => ProposalKind::Insert,
            Self::Replace(_) => ProposalKind::Replace,
        }
    }

    /// Decode raw tool-call arguments against the catalog.
    ///
    /// Missing or mistyped fields (including negative values for unsigned
    /// index fields) surface as `MalformedInput`; bounds the schema cannot
    /// express are checked afterwards.
    pub fn parse(tool_name: &str, input: &Value) -> Result<Self, ValidationError> {
        let kind = ProposalKind::from_tool_name(tool_name)
            .ok_or_else(|| ValidationError::UnknownTool { tool_name: tool_name.to_string() })?;

        let malformed = |error: serde_json::Error| ValidationError::MalformedInput {
            tool_name: kind.tool_name(),
            detail: error.to_string(),
        };

        let proposal = match kind {
            ProposalKind::Plan => Self::Plan(PlanInput::deserialize(input).map_err(malformed)?),
            ProposalKind::Review => {
                Self::Review(ReviewInput::deserialize(input).map_err(malformed)?)
            }
            ProposalKind::Edit => Self::Edit(EditInput::deserialize(input).map_err(malformed)?),
            ProposalKind::Insert => {
                Self::Insert(InsertInput::deserialize(input).map_err(malformed)?)
            }
            ProposalKind::Replace => {
                Self::Replace(ReplaceInput::deserialize(input).map_err(malformed)?)
            }
        };
        proposal.validate()?;
        Ok(proposal)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Review(review) if !(1..=5).contains(&review.score) => {
                Err(ValidationError::ScoreOutOfRange { score: review.score })
            }
            Self::Edit(edit) if edit.new_markdown.contains(SLIDE_DELIMITER) => {
                Err(ValidationError::DelimiterInSingleSlide)
            }
            Self::Insert(insert) if insert.insert_after < -1 => {
                Err(ValidationError::InsertPositionOutOfRange { value: insert.insert_after })
            }
            _ => Ok(()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Plan(input) => json!(input),
            Self::Review(input) => json!(input),
            Self::Edit(input) => json!(input),
            Self::Insert(input) => json!(input),
            Self::Replace(input) => json!(input),
        }
    }

    /// Deterministic human-readable rendering of this proposal.
    pub fn format(&self) -> String {
        match self {
            Self::Plan(input) => format_plan(input),
            Self::Review(input) => format_review(input),
            Self::Edit(input) => format_edit(input),
            Self::Insert(input) => format_insert(input),
            Self::Replace(input) => format_replace(input),
        }
    }
}

/// Rendering for tool names outside the catalog. Kept distinct from the five
/// formatters so the known kinds never take this path.
pub fn format_unknown(output: &Value) -> String {
    serde_json::to_string_pretty(output).unwrap_or_else(|_| output.to_string())
}

/// Render already-decoded tool output by name, falling back to a raw dump for
/// unknown tools.
pub fn format_tool_output(tool_name: &str, output: &Value) -> String {
    match ProposalInput::parse(tool_name, output) {
        Ok(proposal) => proposal.format(),
        Err(_) => format_unknown(output),
    }
}

fn format_plan(input: &PlanInput) -> String {
    let title = if input.title.is_empty() { "(untitled)" } else { &input.title };
    let mut lines =
        vec!["## Proposed structure".to_string(), String::new(), format!("Title: {title}")];
    lines.push(String::new());
    lines.push("### Slide outline".to_string());
    for (position, item) in input.outline.iter().enumerate() {
        let description =
            item.description.as_deref().map(|text| format!(" - {text}")).unwrap_or_default();
        lines.push(format!("{}. {}{}", position + 1, item.title, description));
    }
    if let Some(rationale) = &input.rationale {
        lines.push(String::new());
        lines.push(format!("Rationale: {rationale}"));
    }
    lines.join("\n")
}

fn format_review(input: &ReviewInput) -> String {
    let score = usize::from(input.score.min(5));
    let stars = "★".repeat(score) + &"☆".repeat(5 - score);
    let mut lines = vec![
        "## Review".to_string(),
        String::new(),
        format!("Rating: {stars} ({}/5)", input.score),
        String::new(),
        input.overview.clone(),
    ];
    if !input.good.is_empty() {
        lines.push(String::new());
        lines.push("### Strengths".to_string());
        for point in &input.good {
            lines.push(format!("- {point}"));
        }
    }
    if !input.improvements.is_empty() {
        lines.push(String::new());
        lines.push("### Improvements".to_string());
        for item in &input.improvements {
            lines.push(format!(
                "- Slide {} \"{}\": {} -> {}",
                item.slide_index, item.title, item.problem, item.suggestion
            ));
        }
    }
    lines.join("\n")
}

fn format_edit(input: &EditInput) -> String {
    format!(
        "## Edit proposal\n\nTarget: slide {}\n\nNew content:\n```\n{}\n```\n\nReason: {}",
        input.slide_index, input.new_markdown, input.reason
    )
}

fn format_insert(input: &InsertInput) -> String {
    let position = if input.insert_after == -1 {
        "at the beginning".to_string()
    } else {
        format!("after slide {}", input.insert_after)
    };
    format!(
        "## Insert proposal\n\nPosition: {}\n\nNew content:\n```\n{}\n```\n\nReason: {}",
        position, input.new_markdown, input.reason
    )
}

fn format_replace(input: &ReplaceInput) -> String {
    format!(
        "## Full replacement proposal\n\nNew content:\n```\n{}\n```\n\nReason: {}",
        input.new_markdown, input.reason
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{format_tool_output, ProposalInput, ProposalKind};
    use crate::errors::ValidationError;

    #[test]
    fn catalog_round_trips_tool_names() {
        for kind in ProposalKind::ALL {
            assert_eq!(ProposalKind::from_tool_name(kind.tool_name()), Some(kind));
        }
        assert_eq!(ProposalKind::from_tool_name("propose_magic"), None);
    }

    #[test]
    fn every_schema_declares_a_function_with_required_fields() {
        for kind in ProposalKind::ALL {
            let schema = kind.schema();
            assert_eq!(schema["type"], "function");
            assert_eq!(schema["function"]["name"], kind.tool_name());
            assert!(schema["function"]["parameters"]["required"].is_array());
        }
    }

    #[test]
    fn edit_input_parses_and_formats() {
        let input = json!({
            "slideIndex": 2,
            "newMarkdown": "# Better slide",
            "reason": "tighten the headline"
        });
        let proposal = ProposalInput::parse("propose_edit", &input).expect("valid edit");
        assert_eq!(proposal.kind(), ProposalKind::Edit);

        let rendered = proposal.format();
        assert!(rendered.contains("Target: slide 2"));
        assert!(rendered.contains("# Better slide"));
        assert!(rendered.contains("Reason: tighten the headline"));
    }

    #[test]
    fn edit_with_embedded_delimiter_is_rejected() {
        let input = json!({
            "slideIndex": 0,
            "newMarkdown": "first\n---\nsecond",
            "reason": "split"
        });
        let error = ProposalInput::parse("propose_edit", &input).expect_err("must reject");
        assert_eq!(error, ValidationError::DelimiterInSingleSlide);
    }

    #[test]
    fn edit_with_negative_index_is_rejected_as_malformed() {
        let input = json!({
            "slideIndex": -1,
            "newMarkdown": "x",
            "reason": "r"
        });
        assert!(matches!(
            ProposalInput::parse("propose_edit", &input),
            Err(ValidationError::MalformedInput { tool_name: "propose_edit", .. })
        ));
    }

    #[test]
    fn edit_with_missing_reason_is_rejected() {
        let input = json!({ "slideIndex": 0, "newMarkdown": "x" });
        assert!(matches!(
            ProposalInput::parse("propose_edit", &input),
            Err(ValidationError::MalformedInput { .. })
        ));
    }

    #[test]
    fn insert_before_first_slide_is_valid_but_minus_two_is_not() {
        let valid = json!({ "insertAfter": -1, "newMarkdown": "Intro", "reason": "opening" });
        assert!(ProposalInput::parse("propose_insert", &valid).is_ok());

        let invalid = json!({ "insertAfter": -2, "newMarkdown": "Intro", "reason": "opening" });
        assert_eq!(
            ProposalInput::parse("propose_insert", &invalid),
            Err(ValidationError::InsertPositionOutOfRange { value: -2 })
        );
    }

    #[test]
    fn review_score_bounds_are_enforced() {
        let base = json!({
            "score": 0,
            "overview": "needs work",
            "good": [],
            "improvements": []
        });
        assert_eq!(
            ProposalInput::parse("propose_review", &base),
            Err(ValidationError::ScoreOutOfRange { score: 0 })
        );
    }

    #[test]
    fn review_formatter_renders_stars_and_improvements() {
        let input = json!({
            "score": 3,
            "overview": "Solid start.",
            "good": ["clear title"],
            "improvements": [{
                "slideIndex": 1,
                "title": "Agenda",
                "problem": "too dense",
                "suggestion": "split into two slides"
            }]
        });
        let proposal = ProposalInput::parse("propose_review", &input).expect("valid review");
        let rendered = proposal.format();
        assert!(rendered.contains("★★★☆☆ (3/5)"));
        assert!(rendered.contains("- clear title"));
        assert!(rendered.contains("Slide 1 \"Agenda\": too dense -> split into two slides"));
    }

    #[test]
    fn plan_formatter_numbers_outline_from_one() {
        let input = json!({
            "title": "Quarterly recap",
            "outline": [
                { "title": "Highlights" },
                { "title": "Numbers", "description": "revenue and churn" }
            ],
            "rationale": "keep it short"
        });
        let proposal = ProposalInput::parse("propose_plan", &input).expect("valid plan");
        let rendered = proposal.format();
        assert!(rendered.contains("1. Highlights"));
        assert!(rendered.contains("2. Numbers - revenue and churn"));
        assert!(rendered.contains("Rationale: keep it short"));
    }

    #[test]
    fn unknown_tool_falls_back_to_raw_dump() {
        let output = json!({ "anything": ["goes", 1] });
        let rendered = format_tool_output("propose_magic", &output);
        assert!(rendered.contains("\"anything\""));
        assert!(rendered.contains("goes"));
    }

    #[test]
    fn known_tools_never_take_the_fallback_path() {
        let output = json!({ "newMarkdown": "# Deck", "reason": "fresh start" });
        let rendered = format_tool_output("propose_replace", &output);
        assert!(rendered.starts_with("## Full replacement proposal"));
    }
}
