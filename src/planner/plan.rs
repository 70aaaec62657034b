//! Action and plan types.
//!
//! An [`Action`] is one edit needed to bring the live tree toward the
//! desired tree. A [`ReconcilePlan`] is the ordered action sequence produced
//! by one diff, plus the fingerprints it was computed from.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Kinds of edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Create a node with a value.
    Create,
    /// Delete a childless node.
    Delete,
    /// Replace the value of an existing node.
    SetValue,
}

/// A single required change. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    kind: ActionKind,
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_value: Option<String>,
}

impl Action {
    /// A CREATE of `key` carrying the value to create it with.
    #[must_use]
    pub fn create(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Create,
            key: key.into(),
            new_value: Some(value.into()),
            old_value: None,
        }
    }

    /// A DELETE of `key`.
    #[must_use]
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Delete,
            key: key.into(),
            new_value: None,
            old_value: None,
        }
    }

    /// A SET_VALUE of `key` from `old_value` to `new_value`.
    #[must_use]
    pub fn set_value(
        key: impl Into<String>,
        new_value: impl Into<String>,
        old_value: impl Into<String>,
    ) -> Self {
        Self {
            kind: ActionKind::SetValue,
            key: key.into(),
            new_value: Some(new_value.into()),
            old_value: Some(old_value.into()),
        }
    }

    /// Kind of edit.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Full path of the affected node.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value written by CREATE or SET_VALUE.
    #[must_use]
    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    /// Prior value, known for SET_VALUE.
    #[must_use]
    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }
}

/// The ordered action sequence for one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcilePlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Fingerprint of the desired tree.
    pub desired_hash: String,
    /// Fingerprint of the live snapshot.
    pub live_hash: String,
    /// Actions in execution order.
    pub actions: Vec<Action>,
}

impl ReconcilePlan {
    /// Creates a plan from an already ordered action sequence.
    #[must_use]
    pub fn new(actions: Vec<Action>, desired_hash: &str, live_hash: &str) -> Self {
        Self {
            created_at: Utc::now(),
            desired_hash: desired_hash.to_string(),
            live_hash: live_hash.to_string(),
            actions,
        }
    }

    /// Returns true if the plan is empty (no changes).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the number of actions.
    #[must_use]
    pub const fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns the number of create actions.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.count(ActionKind::Create)
    }

    /// Returns the number of delete actions.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.count(ActionKind::Delete)
    }

    /// Returns the number of value updates.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.count(ActionKind::SetValue)
    }

    fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::SetValue => "SET_VALUE",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.key)
    }
}

impl std::fmt::Display for ReconcilePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.actions.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(f, "Reconcile Plan ({} actions):", self.actions.len())?;
        for (i, action) in self.actions.iter().enumerate() {
            writeln!(f, "  {i}. {action}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_populate_values() {
        let create = Action::create("/a", "1");
        assert_eq!(create.new_value(), Some("1"));
        assert_eq!(create.old_value(), None);

        let delete = Action::delete("/a");
        assert_eq!(delete.new_value(), None);

        let set = Action::set_value("/a", "2", "1");
        assert_eq!(set.kind(), ActionKind::SetValue);
        assert_eq!(set.old_value(), Some("1"));
        assert_eq!(set.to_string(), "SET_VALUE /a");
    }

    #[test]
    fn test_plan_counts() {
        let plan = ReconcilePlan::new(
            vec![
                Action::delete("/x/y"),
                Action::delete("/x"),
                Action::create("/a", ""),
                Action::set_value("/b", "2", "1"),
            ],
            "desired",
            "live",
        );

        assert_eq!(plan.action_count(), 4);
        assert_eq!(plan.delete_count(), 2);
        assert_eq!(plan.create_count(), 1);
        assert_eq!(plan.update_count(), 1);
        assert!(plan.to_string().starts_with("Reconcile Plan (4 actions):"));
    }

    #[test]
    fn test_action_json_shape() {
        let json = serde_json::to_string(&Action::create("/a", "1")).expect("serialize");
        assert_eq!(json, r#"{"kind":"CREATE","key":"/a","new_value":"1"}"#);
    }
}
