//! Agent profiles: each routing category binds a fixed tool subset and a
//! step ceiling. Profiles are fixed at startup and never mutated at runtime.

use serde_json::Value;

use slidesmith_core::proposal::ProposalKind;

use crate::prompt::AgentKind;

/// Ceiling on agent-internal model turns. A step may contain any number of
/// tool calls; the ceiling guarantees termination when the model keeps
/// invoking tools without a final textual answer.
pub const DEFAULT_STEP_LIMIT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    pub kind: AgentKind,
    pub tools: &'static [ProposalKind],
    pub step_limit: usize,
}

const ARCHITECT_TOOLS: &[ProposalKind] = &[ProposalKind::Plan, ProposalKind::Review];
const WRITER_TOOLS: &[ProposalKind] =
    &[ProposalKind::Edit, ProposalKind::Insert, ProposalKind::Replace];
const EDITOR_TOOLS: &[ProposalKind] =
    &[ProposalKind::Edit, ProposalKind::Insert, ProposalKind::Replace];

pub fn profile_for(kind: AgentKind) -> AgentProfile {
    let tools: &'static [ProposalKind] = match kind {
        AgentKind::Architect => ARCHITECT_TOOLS,
        AgentKind::Writer => WRITER_TOOLS,
        AgentKind::Editor => EDITOR_TOOLS,
        AgentKind::GeneralChat => &[],
    };
    AgentProfile { kind, tools, step_limit: DEFAULT_STEP_LIMIT }
}

impl AgentProfile {
    pub fn tool_schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|kind| kind.schema()).collect()
    }

    pub fn binds_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|kind| kind.tool_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use slidesmith_core::proposal::ProposalKind;

    use super::{profile_for, DEFAULT_STEP_LIMIT};
    use crate::prompt::AgentKind;

    #[test]
    fn architect_only_binds_advisory_tools() {
        let profile = profile_for(AgentKind::Architect);
        assert!(profile.binds_tool("propose_plan"));
        assert!(profile.binds_tool("propose_review"));
        assert!(!profile.binds_tool("propose_edit"));
    }

    #[test]
    fn general_chat_binds_no_tools() {
        let profile = profile_for(AgentKind::GeneralChat);
        assert!(profile.tools.is_empty());
        assert!(profile.tool_schemas().is_empty());
    }

    #[test]
    fn mutating_agents_bind_the_three_mutation_tools() {
        for kind in [AgentKind::Writer, AgentKind::Editor] {
            let profile = profile_for(kind);
            assert_eq!(
                profile.tools,
                &[ProposalKind::Edit, ProposalKind::Insert, ProposalKind::Replace]
            );
            assert_eq!(profile.step_limit, DEFAULT_STEP_LIMIT);
        }
    }
}
