//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// At most one direct conversation per counterpart.
///
/// Covers both duplicated server entries and a synthetic placeholder listed
/// next to the real conversation it stands in for.
pub struct SingleDirectPerCounterpart;

impl Invariant for SingleDirectPerCounterpart {
    fn name(&self) -> &'static str {
        "single_direct_per_counterpart"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            for conversation in client.conversations.iter().filter(|c| c.direct) {
                let Some(counterpart) = &conversation.counterpart else {
                    continue;
                };
                if !seen.insert(counterpart) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: counterpart {} listed twice ({})",
                            client.name, counterpart, conversation.id
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Active conversation must be listed.
///
/// Prevents the UI from showing a selected conversation that isn't in the
/// sidebar.
pub struct ActiveConversationListed;

impl Invariant for ActiveConversationListed {
    fn name(&self) -> &'static str {
        "active_conversation_listed"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if let Some(active) = &client.active
                && !client.conversations.iter().any(|c| &c.id == active)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("client {}: active {} not listed", client.name, active),
                });
            }
        }
        Ok(())
    }
}

/// A bound history belongs to the active conversation.
pub struct HistoryMatchesActive;

impl Invariant for HistoryMatchesActive {
    fn name(&self) -> &'static str {
        "history_matches_active"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.history_for.is_some() && client.history_for != client.active {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: history for {:?} but active is {:?}",
                        client.name, client.history_for, client.active
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No message id appears twice in a history.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn name(&self) -> &'static str {
        "unique_message_ids"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            if let Some(dup) = client.message_ids.iter().find(|id| !seen.insert(*id)) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("client {}: message {} shown twice", client.name, dup),
                });
            }
        }
        Ok(())
    }
}

/// Synthetic placeholders exist only while selected.
pub struct SyntheticOnlyWhenActive;

impl Invariant for SyntheticOnlyWhenActive {
    fn name(&self) -> &'static str {
        "synthetic_only_when_active"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if let Some(stray) = client
                .conversations
                .iter()
                .find(|c| c.synthetic && client.active.as_ref() != Some(&c.id))
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("client {}: unselected placeholder {}", client.name, stray.id),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::{ClientSnapshot, ConversationSnapshot};

    fn direct(id: &str, counterpart: &str) -> ConversationSnapshot {
        ConversationSnapshot {
            id: id.into(),
            direct: true,
            counterpart: Some(counterpart.into()),
            synthetic: id.starts_with("temp-"),
        }
    }

    fn client(conversations: Vec<ConversationSnapshot>, active: Option<&str>) -> SystemSnapshot {
        SystemSnapshot::single(ClientSnapshot {
            name: "al".into(),
            conversations,
            active: active.map(Into::into),
            history_for: active.map(Into::into),
            message_ids: vec![],
        })
    }

    #[test]
    fn duplicate_counterpart_detected() {
        let state = client(vec![direct("temp-u2", "u2"), direct("c77", "u2")], Some("temp-u2"));
        assert!(SingleDirectPerCounterpart.check(&state).is_err());
    }

    #[test]
    fn unlisted_active_detected() {
        let state = client(vec![direct("c1", "u2")], Some("c9"));
        assert!(ActiveConversationListed.check(&state).is_err());
        assert!(ActiveConversationListed.check(&client(vec![], None)).is_ok());
    }

    #[test]
    fn stray_placeholder_detected() {
        let state = client(vec![direct("temp-u2", "u2"), direct("c1", "u3")], Some("c1"));
        assert!(SyntheticOnlyWhenActive.check(&state).is_err());
    }

    #[test]
    fn duplicate_message_detected() {
        let mut state = client(vec![direct("c1", "u2")], Some("c1"));
        state.clients[0].message_ids = vec!["m1".into(), "m1".into()];
        assert!(UniqueMessageIds.check(&state).is_err());
    }
}
