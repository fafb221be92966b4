//! System prompt assembly.
//!
//! Composition order is fixed: agent instructions, shared slide guidelines,
//! theme guideline (when the agent kind permits theming and the name is
//! acceptable), the live document, then the closing language instruction.
//! Guideline text is read-only external input; a missing file degrades to an
//! empty section.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Routing category for a chat turn. Doubles as the agent identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Architect,
    Writer,
    Editor,
    GeneralChat,
}

impl AgentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Architect => "architect",
            Self::Writer => "writer",
            Self::Editor => "editor",
            Self::GeneralChat => "general_chat",
        }
    }

    /// Theme guidelines only make sense for agents that write slide content.
    pub fn allows_theme(self) -> bool {
        matches!(self, Self::Writer | Self::Editor)
    }

    /// Target-slide focus only applies to content-producing agents.
    pub fn honors_target_slide(self) -> bool {
        matches!(self, Self::Writer | Self::Editor)
    }
}

/// Built-in theme names that ship with the renderer; they carry no guideline
/// file and must not hit the filesystem.
const RESERVED_THEMES: [&str; 3] = ["default", "gaia", "uncover"];

pub fn is_valid_theme_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && !RESERVED_THEMES.contains(&name)
}

const ARCHITECT_INSTRUCTIONS: &str = "You are the Architect Agent.
Your goal is to design and assess the structure of a presentation based on the user's request.
Use propose_plan to propose presentation structure.
Use propose_review to give a structured assessment of the current deck. Neither tool modifies slides.
Provide a brief conversational response alongside tool calls.
When referring to slides, use 1-based numbering (Slide 1, Slide 2, etc.).";

const WRITER_INSTRUCTIONS: &str = "You are the Writer Agent for slide presentations.
Your goal is to write full, polished slide content in markdown.

TOOL SELECTION:
- propose_edit: Rewrite the content of a single existing slide
- propose_insert: Add new slides at a specific position
- propose_replace: Write a complete presentation from scratch

RULES:
- Provide a brief conversational response alongside tool calls
- Use 1-based numbering when referring to slides (Slide 1, Slide 2, etc.)
- Do NOT include --- separator in propose_edit newMarkdown";

const EDITOR_INSTRUCTIONS: &str = "You are the Editor Agent for slide presentations.

TOOL SELECTION:
- propose_edit: Modify a single existing slide
- propose_insert: Add new slides at a specific position
- propose_replace: Replace all slides (create new presentation)

RULES:
- Provide a brief conversational response alongside tool calls
- Use 1-based numbering when referring to slides (Slide 1, Slide 2, etc.)
- Do NOT include --- separator in propose_edit newMarkdown";

const GENERAL_INSTRUCTIONS: &str = "You are a helpful assistant for a slide presentation editor.
Answer questions, discuss content, and provide feedback about the presentation.
Do NOT generate or modify slides directly - just have a conversation.
When referring to slides, use 1-based numbering (Slide 1, Slide 2, etc.).";

fn instructions_for(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Architect => ARCHITECT_INSTRUCTIONS,
        AgentKind::Writer => WRITER_INSTRUCTIONS,
        AgentKind::Editor => EDITOR_INSTRUCTIONS,
        AgentKind::GeneralChat => GENERAL_INSTRUCTIONS,
    }
}

/// Prompt builder with process-lifetime guideline caches.
///
/// Population is lazy and idempotent: re-reading the same file converges on
/// the same value, so racing initializers are harmless.
pub struct PromptBuilder {
    dir: PathBuf,
    base_rules: OnceLock<String>,
    theme_cache: Mutex<HashMap<String, String>>,
}

impl PromptBuilder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), base_rules: OnceLock::new(), theme_cache: Mutex::new(HashMap::new()) }
    }

    fn base_rules(&self) -> &str {
        self.base_rules.get_or_init(|| {
            let path = self.dir.join("base-rules.md");
            match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(error) => {
                    warn!(path = %path.display(), %error, "shared guidelines unavailable");
                    String::new()
                }
            }
        })
    }

    fn theme_guideline(&self, theme: &str) -> String {
        let mut cache = self.theme_cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cached) = cache.get(theme) {
            return cached.clone();
        }
        let path = self.dir.join("themes").join(format!("{theme}.md"));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                warn!(theme, "no guideline found for theme");
                String::new()
            }
        };
        cache.insert(theme.to_string(), text.clone());
        text
    }

    /// Assemble the system prompt for one agent invocation.
    pub fn build(
        &self,
        kind: AgentKind,
        context: &str,
        theme: Option<&str>,
        target_slide: Option<u32>,
    ) -> String {
        let mut prompt = format!(
            "{}\n\n## Slide Guidelines\n{}",
            instructions_for(kind),
            self.base_rules()
        );

        if kind.allows_theme() {
            if let Some(theme) = theme.filter(|name| is_valid_theme_name(name)) {
                let guideline = self.theme_guideline(theme);
                if !guideline.is_empty() {
                    prompt.push_str(&format!("\n\n## Theme: {theme}\n{guideline}"));
                }
            }
        }

        prompt.push_str(&format!("\n\n## Current Presentation\n{context}"));

        if kind.honors_target_slide() {
            let target =
                target_slide.map(|slide| slide.to_string()).unwrap_or_else(|| "All".to_string());
            prompt.push_str(&format!("\n\nTarget Slide: {target}"));
        }

        prompt.push_str("\n\nAlways respond in the user's input language.");
        prompt
    }
}
