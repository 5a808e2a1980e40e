//! Visible conversation list and snapshot reconciliation.
//!
//! The list is always rebuilt from the server's dashboard snapshot rather
//! than patched. The only local addition is a synthetic direct conversation
//! that stands in for a chat the server has not created yet.
//!
//! # Invariants
//!
//! - At most one direct conversation per counterpart. A synthetic entry is
//!   never inserted next to a real one for the same user, and a snapshot
//!   that repeats a counterpart keeps only the first entry.
//! - The active conversation, when one is selected, is in the list after
//!   every reconciliation.

use darkchat_proto::{ChatKind, Conversation, ConversationId};

/// Outcome of reconciling the active selection against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing was selected.
    NoSelection,
    /// The selection is still present.
    Kept,
    /// A synthetic selection now has a real conversation.
    Promoted {
        /// Placeholder that was replaced.
        from: ConversationId,
        /// Server-issued id for the same counterpart.
        to: ConversationId,
    },
    /// A synthetic selection has no real counterpart yet and stays listed.
    KeptSynthetic,
    /// The selection is gone from the server's view.
    Cleared,
}

/// Conversations shown in the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationList {
    items: Vec<Conversation>,
}

impl ConversationList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// All conversations in server order, synthetic entries first.
    pub fn items(&self) -> &[Conversation] {
        &self.items
    }

    /// Number of conversations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Conversation with `id`.
    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.items.iter().find(|c| &c.conversation_id == id)
    }

    /// Direct conversation with `user_id`, real or synthetic.
    pub fn direct_with(&self, user_id: &str) -> Option<&Conversation> {
        self.items.iter().find(|c| c.is_direct_with(user_id))
    }

    /// Group whose channel id is `group_id`.
    pub fn group(&self, group_id: &str) -> Option<&Conversation> {
        self.items.iter().find(|c| c.is_group(group_id))
    }

    /// Conversations of `kind`, in list order.
    pub fn of_kind(&self, kind: ChatKind) -> impl Iterator<Item = &Conversation> {
        self.items.iter().filter(move |c| c.kind == kind)
    }

    /// Sidebar order: direct conversations, then groups.
    pub fn sidebar_order(&self) -> Vec<&Conversation> {
        self.of_kind(ChatKind::Direct).chain(self.of_kind(ChatKind::Group)).collect()
    }

    /// Insert a synthetic direct conversation at the top.
    ///
    /// Returns `false` without inserting if the counterpart already has a
    /// conversation.
    pub fn insert_synthetic(&mut self, conversation: Conversation) -> bool {
        let Some(counterpart) = conversation.counterpart_user_id.as_deref() else {
            return false;
        };
        if self.direct_with(counterpart).is_some() {
            return false;
        }
        self.items.insert(0, conversation);
        true
    }

    /// Remove synthetic entries other than `keep`.
    pub fn drop_synthetic_except(&mut self, keep: &ConversationId) {
        self.items.retain(|c| !c.is_synthetic() || &c.conversation_id == keep);
    }

    /// Replace the list with `snapshot` and reconcile the `active` selection.
    pub fn reconcile(
        &mut self,
        snapshot: Vec<Conversation>,
        active: Option<&ConversationId>,
    ) -> Reconciliation {
        let previous = active.and_then(|id| self.get(id)).cloned();
        self.items = dedupe_directs(snapshot);

        let Some(active) = active else {
            return Reconciliation::NoSelection;
        };
        let Some(previous) = previous else {
            return Reconciliation::Cleared;
        };

        if previous.is_synthetic() {
            let real = previous
                .counterpart_user_id
                .as_deref()
                .and_then(|user_id| self.direct_with(user_id))
                .map(|c| c.conversation_id.clone());

            return match real {
                Some(to) => Reconciliation::Promoted { from: previous.conversation_id, to },
                None => {
                    self.items.insert(0, previous);
                    Reconciliation::KeptSynthetic
                },
            };
        }

        if self.get(active).is_some() { Reconciliation::Kept } else { Reconciliation::Cleared }
    }

    /// Drop every conversation.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Keep the first direct conversation per counterpart.
fn dedupe_directs(snapshot: Vec<Conversation>) -> Vec<Conversation> {
    let mut items: Vec<Conversation> = Vec::with_capacity(snapshot.len());
    for conversation in snapshot {
        let duplicate = conversation
            .counterpart_user_id
            .as_deref()
            .filter(|_| conversation.kind == ChatKind::Direct)
            .is_some_and(|user_id| items.iter().any(|c| c.is_direct_with(user_id)));

        if duplicate {
            tracing::warn!(
                conversation_id = %conversation.conversation_id,
                "dropping duplicate direct conversation from snapshot"
            );
            continue;
        }
        items.push(conversation);
    }
    items
}

#[cfg(test)]
mod tests {
    use darkchat_proto::DirectoryEntry;

    use super::*;

    fn direct(id: &str, user_id: &str) -> Conversation {
        Conversation {
            conversation_id: ConversationId::new(id),
            kind: ChatKind::Direct,
            display_name: user_id.to_uppercase(),
            group_id: None,
            counterpart_user_id: Some(user_id.into()),
        }
    }

    fn group(id: &str, channel: &str) -> Conversation {
        Conversation {
            conversation_id: ConversationId::new(id),
            kind: ChatKind::Group,
            display_name: format!("#{channel}"),
            group_id: Some(channel.into()),
            counterpart_user_id: None,
        }
    }

    fn synthetic(user_id: &str) -> Conversation {
        Conversation::synthetic_direct(&DirectoryEntry {
            user_id: user_id.into(),
            user_name: user_id.into(),
            email: format!("{user_id}@example.com"),
            name: None,
            online: false,
        })
    }

    #[test]
    fn synthetic_refused_when_real_exists() {
        let mut list = ConversationList::new();
        list.reconcile(vec![direct("c1", "u2")], None);

        assert!(!list.insert_synthetic(synthetic("u2")));
        assert!(list.insert_synthetic(synthetic("u3")));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn promotion_replaces_synthetic() {
        let mut list = ConversationList::new();
        list.insert_synthetic(synthetic("u2"));
        let temp = ConversationId::synthetic("u2");

        let outcome = list.reconcile(vec![direct("c77", "u2")], Some(&temp));

        assert_eq!(outcome, Reconciliation::Promoted { from: temp, to: ConversationId::new("c77") });
        assert_eq!(list.len(), 1);
        assert!(!list.items()[0].is_synthetic());
    }

    #[test]
    fn synthetic_survives_snapshot_without_counterpart() {
        let mut list = ConversationList::new();
        list.insert_synthetic(synthetic("u2"));
        let temp = ConversationId::synthetic("u2");

        let outcome = list.reconcile(vec![group("g1", "ch1")], Some(&temp));

        assert_eq!(outcome, Reconciliation::KeptSynthetic);
        assert!(list.get(&temp).is_some());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn unselected_synthetic_is_dropped() {
        let mut list = ConversationList::new();
        list.insert_synthetic(synthetic("u2"));

        let outcome = list.reconcile(vec![group("g1", "ch1")], None);

        assert_eq!(outcome, Reconciliation::NoSelection);
        assert!(list.direct_with("u2").is_none());
    }

    #[test]
    fn missing_real_selection_is_cleared() {
        let mut list = ConversationList::new();
        list.reconcile(vec![direct("c1", "u2"), group("g1", "ch1")], None);
        let active = ConversationId::new("g1");

        assert_eq!(list.reconcile(vec![direct("c1", "u2")], Some(&active)), Reconciliation::Cleared);
        assert_eq!(
            list.reconcile(vec![direct("c1", "u2")], Some(&ConversationId::new("c1"))),
            Reconciliation::Kept
        );
    }

    #[test]
    fn duplicate_directs_collapse() {
        let mut list = ConversationList::new();
        list.reconcile(vec![direct("c1", "u2"), direct("c2", "u2"), group("g1", "ch1")], None);

        assert_eq!(list.len(), 2);
        assert_eq!(
            list.direct_with("u2").map(|c| c.conversation_id.as_str()),
            Some("c1")
        );
    }

    #[test]
    fn stale_synthetic_entries_are_dropped() {
        let mut list = ConversationList::new();
        list.insert_synthetic(synthetic("u2"));
        list.insert_synthetic(synthetic("u3"));

        list.drop_synthetic_except(&ConversationId::synthetic("u3"));
        assert_eq!(list.len(), 1);
        assert!(list.direct_with("u3").is_some());
    }

    #[test]
    fn sidebar_puts_directs_first() {
        let mut list = ConversationList::new();
        list.reconcile(vec![group("g1", "ch1"), direct("c1", "u2")], None);

        let order: Vec<_> = list.sidebar_order().iter().map(|c| c.conversation_id.as_str()).collect();
        assert_eq!(order, ["c1", "g1"]);
    }
}
