use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;

use super::{AccidentType, Rule};
use crate::features::users::models::User;

/// Workflow state of an accident, matching the `accident_status` database enum.
///
/// Only `New` is assigned automatically (on creation). Other transitions are
/// requested explicitly and are not restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "accident_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccidentStatus {
    #[default]
    New,
    Accepted,
    Rejected,
    Resolved,
}

impl std::fmt::Display for AccidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccidentStatus::New => write!(f, "NEW"),
            AccidentStatus::Accepted => write!(f, "ACCEPTED"),
            AccidentStatus::Rejected => write!(f, "REJECTED"),
            AccidentStatus::Resolved => write!(f, "RESOLVED"),
        }
    }
}

/// Accident aggregate: the row plus its resolved type, reporter and rules.
///
/// `id == 0` marks an accident that has not been saved yet.
#[derive(Debug, Clone)]
pub struct Accident {
    pub id: i32,
    pub name: String,
    pub text: String,
    pub address: String,
    pub status: AccidentStatus,
    pub accident_type: AccidentType,
    pub user: Option<User>,
    pub rules: HashSet<Rule>,
    pub file_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Accident {
    pub const NEW_ID: i32 = 0;

    /// Unsaved accident referencing its type by id only
    pub fn draft(
        name: impl Into<String>,
        text: impl Into<String>,
        address: impl Into<String>,
        type_id: i32,
    ) -> Self {
        Self {
            id: Self::NEW_ID,
            name: name.into(),
            text: text.into(),
            address: address.into(),
            status: AccidentStatus::New,
            accident_type: AccidentType::reference(type_id),
            user: None,
            rules: HashSet::new(),
            file_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == Self::NEW_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_is_new_and_unbound() {
        let accident = Accident::draft("Crash", "Two cars", "Main St 1", 5);

        assert!(accident.is_new());
        assert_eq!(accident.accident_type, AccidentType::reference(5));
        assert!(accident.user.is_none());
        assert!(accident.rules.is_empty());
        assert!(accident.file_id.is_none());
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&AccidentStatus::Accepted).unwrap();
        assert_eq!(json, "\"ACCEPTED\"");

        let status: AccidentStatus = serde_json::from_str("\"RESOLVED\"").unwrap();
        assert_eq!(status, AccidentStatus::Resolved);
        assert_eq!(status.to_string(), "RESOLVED");
    }
}
