//! Order history - append-only action log
//!
//! Entries are structured; [`HistoryEntry::render`] produces the display line.

use super::event::{EventPayload, OrderEvent};
use super::types::Role;
use crate::util::format_millis;
use serde::{Deserialize, Serialize};

/// History action kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Imported,
    Received,
    Completed,
    Amended,
    Reassigned,
    DeadlineSet,
    DeadlineCleared,
}

impl HistoryAction {
    fn verb(&self) -> &'static str {
        match self {
            HistoryAction::Imported => "imported and dispatched",
            HistoryAction::Received => "received the order",
            HistoryAction::Completed => "completed the order",
            HistoryAction::Amended => "amended the completion",
            HistoryAction::Reassigned => "reassigned the order",
            HistoryAction::DeadlineSet => "set the deadline",
            HistoryAction::DeadlineCleared => "cleared the deadline",
        }
    }
}

/// One history record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub action: HistoryAction,
    /// Operator name
    pub actor: String,
    pub role: Role,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HistoryEntry {
    pub fn new(action: HistoryAction, actor: impl Into<String>, role: Role, timestamp: i64) -> Self {
        Self {
            action,
            actor: actor.into(),
            role,
            timestamp,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Build the entry recorded for an applied event
    pub fn from_event(event: &OrderEvent) -> Self {
        let (action, detail) = match &event.payload {
            EventPayload::OrderReceived { .. } => (HistoryAction::Received, None),
            EventPayload::OrderCompleted {
                amended,
                return_reason,
                verification,
                ..
            } => {
                let action = if *amended {
                    HistoryAction::Amended
                } else {
                    HistoryAction::Completed
                };
                let mut detail = format!("reason: {}", return_reason.label());
                if let Some(v) = verification {
                    detail.push_str(&format!("; serial check: {}", v.message));
                }
                (action, Some(detail))
            }
            EventPayload::OrderReassigned {
                previous_user,
                previous_team,
                user_name,
                team,
            } => (
                HistoryAction::Reassigned,
                Some(format!(
                    "{}/{} -> {}/{}",
                    previous_team, previous_user, team, user_name
                )),
            ),
            EventPayload::DeadlineChanged { deadline, .. } => match deadline {
                Some(ts) => (HistoryAction::DeadlineSet, Some(format_millis(*ts))),
                None => (HistoryAction::DeadlineCleared, None),
            },
        };

        Self {
            action,
            actor: event.operator_name.clone(),
            role: event.operator_role,
            timestamp: event.timestamp,
            detail,
        }
    }

    /// Human-readable line, e.g. `2024-05-01 09:30 Zhang received the order`
    pub fn render(&self) -> String {
        let mut line = format!(
            "{} {} {}",
            format_millis(self.timestamp),
            self.actor,
            self.action.verb()
        );
        if let Some(detail) = &self.detail {
            line.push_str(" (");
            line.push_str(detail);
            line.push(')');
        }
        line
    }
}

/// Append-only sequence of [`HistoryEntry`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    pub fn push(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    pub fn render(&self) -> Vec<String> {
        self.0.iter().map(HistoryEntry::render).collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_actor_action_detail() {
        let entry = HistoryEntry::new(HistoryAction::Reassigned, "Admin", Role::Admin, 0)
            .with_detail("North/Zhang -> South/Li");
        let line = entry.render();
        assert!(line.contains("Admin reassigned the order"));
        assert!(line.ends_with("(North/Zhang -> South/Li)"));
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut history = History::default();
        history.push(HistoryEntry::new(HistoryAction::Imported, "Admin", Role::Admin, 0));
        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["action"], "IMPORTED");
    }
}
