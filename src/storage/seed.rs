//! Seed data written on first initialization

use chrono::{DateTime, Utc};
use crate::record::User;
use crate::workspace::{Position, Relationship, WorkspaceData, WorkspaceObject};

/// 2025-07-09T13:16:20.329Z
const SEED_TIMESTAMP_MS: i64 = 1_752_066_980_329;
/// 2025-07-09T13:16:20.341Z
const SEED_SAVED_AT_MS: i64 = 1_752_066_980_341;

fn instant(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// The administrator account
pub fn admin_user() -> User {
    User::new(1, "Admin", "Administrator")
}

/// The sample workspace graph: six objects, three relationships
pub fn sample_workspace() -> WorkspaceData {
    WorkspaceData {
        method_name: "Methods of run.json".to_string(),
        title: "Methods of run.json".to_string(),
        objects: vec![
            WorkspaceObject::new("Primitive", "primitive", Position::new(196.0, 156.0)),
            WorkspaceObject::new("External Method", "persistent", Position::new(27.0, 93.0)),
            WorkspaceObject::new("Local Method", "local", Position::new(187.0, 94.0)),
            WorkspaceObject::new("Evaluation", "evaluation", Position::new(195.0, 286.0)),
            WorkspaceObject::new("Persistent", "persistent", Position::new(310.0, 356.0)),
            WorkspaceObject::new("Match", "match", Position::new(51.0, 280.0)),
        ],
        relationships: vec![
            Relationship::new("Match", "External Method"),
            Relationship::new("Evaluation", "Primitive"),
            Relationship::new("Persistent", "Primitive"),
        ],
        timestamp: instant(SEED_TIMESTAMP_MS),
        saved_at: instant(SEED_SAVED_AT_MS),
        version: "1.0".to_string(),
        workspace: "antlr".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SecondsFormat;

    #[test]
    fn test_seed_instants() {
        let workspace = sample_workspace();
        assert_eq!(
            workspace.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            "2025-07-09T13:16:20.329Z"
        );
        assert_eq!(
            workspace.saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            "2025-07-09T13:16:20.341Z"
        );
    }

    #[test]
    fn test_seed_relationships_resolve() {
        let workspace = sample_workspace();
        assert_eq!(workspace.objects.len(), 6);
        assert_eq!(workspace.relationships.len(), 3);
        assert!(workspace.dangling_relationships().is_empty());
    }
}
