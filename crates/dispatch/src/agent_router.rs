//! Pre-dispatch `@mention` routing (C12). Scans the last user message for
//! an `@AgentName` / `@"Agent Name"` token, longest-match over the caller's
//! reachable agent set, and strips the mention from the transcript.
//!
//! Mirrors `parse_agent_mentions` in the teacher's completions endpoint,
//! generalised from a single flat agent list to the tenant-scoped
//! `Agent` model.

use crate::model_provider::{ChatMessage, MessageContent};
use regex::Regex;
use shared::error::{Error, Result};
use shared::models::Agent;
use uuid::Uuid;

/// Result of scanning a transcript for an `@mention`.
pub struct MentionOutcome {
    /// `Some` only when the mention should actually redirect dispatch;
    /// cross-tenant mentions are stripped but never routed (spec.md §4.12
    /// step 2).
    pub routed_agent: Option<Agent>,
    pub cleaned_messages: Vec<ChatMessage>,
}

pub struct AgentRouter;

impl AgentRouter {
    /// `conversation_tenant_id` is `None` for a fresh, not-yet-persisted
    /// conversation (e.g. `user == "-"`), in which case cross-tenant
    /// stripping is skipped — there is no tenant to compare against yet.
    pub fn route(
        messages: &[ChatMessage],
        reachable_agents: &[Agent],
        conversation_tenant_id: Option<Uuid>,
    ) -> MentionOutcome {
        let mut messages = messages.to_vec();

        let Some(last_user_idx) = messages.iter().rposition(|m| m.role.eq_ignore_ascii_case("user")) else {
            return MentionOutcome { routed_agent: None, cleaned_messages: messages };
        };

        let content = messages[last_user_idx].content.as_text();

        let mut names: Vec<&Agent> = reachable_agents.iter().collect();
        names.sort_by(|a, b| b.name.len().cmp(&a.name.len()));

        for agent in names {
            if agent.name.is_empty() {
                continue;
            }
            let escaped = regex::escape(&agent.name);

            let quoted = Regex::new(&format!(r#"(?i)@["\u{{201c}}]{}["\u{{201d}}]"#, escaped))
                .expect("quoted mention pattern is well-formed");
            if let Some(m) = quoted.find(&content) {
                return Self::finish(messages, last_user_idx, &content, m.start(), m.end(), agent, conversation_tenant_id);
            }

            let unquoted = Regex::new(&format!(r"(?i)@{}(?:\b|(?=\s|$|[,.:;!?]))", escaped))
                .expect("unquoted mention pattern is well-formed");
            if let Some(m) = unquoted.find(&content) {
                return Self::finish(messages, last_user_idx, &content, m.start(), m.end(), agent, conversation_tenant_id);
            }
        }

        MentionOutcome { routed_agent: None, cleaned_messages: messages }
    }

    fn finish(
        mut messages: Vec<ChatMessage>,
        last_user_idx: usize,
        content: &str,
        start: usize,
        end: usize,
        agent: &Agent,
        conversation_tenant_id: Option<Uuid>,
    ) -> MentionOutcome {
        let cleaned = format!("{}{}", &content[..start], &content[end..]).trim().to_string();
        messages[last_user_idx].content = MessageContent::Text(cleaned);

        let cross_tenant = conversation_tenant_id.is_some_and(|t| t != agent.tenant_id);
        let routed_agent = if cross_tenant { None } else { Some(agent.clone()) };

        MentionOutcome { routed_agent, cleaned_messages: messages }
    }

    /// Defense-in-depth DM guard (spec.md §4.12 step 3): refuse to trigger
    /// an agent response in a user-to-user DM, or a thread whose parent is
    /// one, unless an agent is already a participant.
    pub fn check_dm_guard(is_dm_or_dm_thread: bool, has_agent_participant: bool) -> Result<()> {
        if is_dm_or_dm_thread && !has_agent_participant {
            return Err(Error::bad_request("cannot trigger agent response in user-to-user DM"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn agent(name: &str, tenant_id: Uuid) -> Agent {
        Agent {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            provider_id: None,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    fn user_message(text: &str) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Text(text.to_string()),
            tool_call_id: None,
            name: None,
        }
    }

    #[test]
    fn longest_match_wins_over_prefix_name() {
        let tenant = Uuid::new_v4();
        let agents = vec![agent("Support", tenant), agent("Support Bot", tenant)];
        let messages = vec![user_message("@Support Bot please help")];

        let outcome = AgentRouter::route(&messages, &agents, Some(tenant));
        assert_eq!(outcome.routed_agent.unwrap().name, "Support Bot");
        assert_eq!(outcome.cleaned_messages[0].content.as_text(), "please help");
    }

    #[test]
    fn quoted_mention_with_spaces_matches() {
        let tenant = Uuid::new_v4();
        let agents = vec![agent("Research Assistant", tenant)];
        let messages = vec![user_message(r#"@"Research Assistant" summarize this"#)];

        let outcome = AgentRouter::route(&messages, &agents, Some(tenant));
        assert_eq!(outcome.routed_agent.unwrap().name, "Research Assistant");
        assert_eq!(outcome.cleaned_messages[0].content.as_text(), "summarize this");
    }

    #[test]
    fn cross_tenant_mention_is_stripped_but_not_routed() {
        let conversation_tenant = Uuid::new_v4();
        let other_tenant = Uuid::new_v4();
        let agents = vec![agent("Other", other_tenant)];
        let messages = vec![user_message("@Other hello")];

        let outcome = AgentRouter::route(&messages, &agents, Some(conversation_tenant));
        assert!(outcome.routed_agent.is_none());
        assert_eq!(outcome.cleaned_messages[0].content.as_text(), "hello");
    }

    #[test]
    fn no_mention_leaves_message_untouched() {
        let tenant = Uuid::new_v4();
        let agents = vec![agent("Support", tenant)];
        let messages = vec![user_message("no mention here")];

        let outcome = AgentRouter::route(&messages, &agents, Some(tenant));
        assert!(outcome.routed_agent.is_none());
        assert_eq!(outcome.cleaned_messages[0].content.as_text(), "no mention here");
    }

    #[test]
    fn dm_guard_rejects_without_agent_participant() {
        assert!(AgentRouter::check_dm_guard(true, false).is_err());
        assert!(AgentRouter::check_dm_guard(true, true).is_ok());
        assert!(AgentRouter::check_dm_guard(false, false).is_ok());
    }
}
