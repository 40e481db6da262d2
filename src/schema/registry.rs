//! Static type registry
//!
//! One descriptor per persistable record type, in registration order. Type
//! tags name the declared shape of each property; container properties list
//! their element types as generic arguments.

use serde::Serialize;

/// One property of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub is_generic: bool,
    pub generic_arguments: &'static [&'static str],
}

impl PropertyDescriptor {
    const fn scalar(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            type_name,
            is_generic: false,
            generic_arguments: &[],
        }
    }

    const fn list(name: &'static str, element: &'static [&'static str]) -> Self {
        Self {
            name,
            type_name: "List`1",
            is_generic: true,
            generic_arguments: element,
        }
    }
}

/// Shape of a registered record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub type_name: &'static str,
    pub full_name: &'static str,
    pub properties: &'static [PropertyDescriptor],
}

pub static USER: TypeDescriptor = TypeDescriptor {
    type_name: "User",
    full_name: "workspace_db::record::User",
    properties: &[
        PropertyDescriptor::scalar("Id", "Int32"),
        PropertyDescriptor::scalar("Name", "String"),
        PropertyDescriptor::scalar("Role", "String"),
    ],
};

pub static WORKSPACE_DATA: TypeDescriptor = TypeDescriptor {
    type_name: "WorkspaceData",
    full_name: "workspace_db::workspace::WorkspaceData",
    properties: &[
        PropertyDescriptor::scalar("MethodName", "String"),
        PropertyDescriptor::scalar("Title", "String"),
        PropertyDescriptor::list("Objects", &["WorkspaceObject"]),
        PropertyDescriptor::list("Relationships", &["Relationship"]),
        PropertyDescriptor::scalar("Timestamp", "DateTime"),
        PropertyDescriptor::scalar("SavedAt", "DateTime"),
        PropertyDescriptor::scalar("Version", "String"),
        PropertyDescriptor::scalar("Workspace", "String"),
    ],
};

pub static WORKSPACE_OBJECT: TypeDescriptor = TypeDescriptor {
    type_name: "WorkspaceObject",
    full_name: "workspace_db::workspace::WorkspaceObject",
    properties: &[
        PropertyDescriptor::scalar("Name", "String"),
        PropertyDescriptor::scalar("Type", "String"),
        PropertyDescriptor::scalar("Position", "Position"),
    ],
};

pub static POSITION: TypeDescriptor = TypeDescriptor {
    type_name: "Position",
    full_name: "workspace_db::workspace::Position",
    properties: &[
        PropertyDescriptor::scalar("X", "Double"),
        PropertyDescriptor::scalar("Y", "Double"),
    ],
};

pub static RELATIONSHIP: TypeDescriptor = TypeDescriptor {
    type_name: "Relationship",
    full_name: "workspace_db::workspace::Relationship",
    properties: &[
        PropertyDescriptor::scalar("From", "String"),
        PropertyDescriptor::scalar("To", "String"),
    ],
};

/// All registered types, in registration order
pub static REGISTERED_TYPES: [&TypeDescriptor; 5] =
    [&USER, &WORKSPACE_DATA, &WORKSPACE_OBJECT, &POSITION, &RELATIONSHIP];

/// Case-insensitive lookup by simple type name
pub fn find(name: &str) -> Option<&'static TypeDescriptor> {
    REGISTERED_TYPES
        .iter()
        .copied()
        .find(|d| d.type_name.eq_ignore_ascii_case(name))
}

/// Simple names of all registered types
pub fn type_names() -> Vec<&'static str> {
    REGISTERED_TYPES.iter().map(|d| d.type_name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, User};
    use crate::workspace::{Position, Relationship, WorkspaceData, WorkspaceObject};

    #[test]
    fn test_registry_has_five_types_with_properties() {
        assert_eq!(REGISTERED_TYPES.len(), 5);
        for descriptor in REGISTERED_TYPES {
            assert!(!descriptor.properties.is_empty(), "{} has no properties", descriptor.type_name);
        }
    }

    #[test]
    fn test_workspace_data_properties_in_order() {
        let names: Vec<&str> = WORKSPACE_DATA.properties.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["MethodName", "Title", "Objects", "Relationships", "Timestamp", "SavedAt", "Version", "Workspace"]
        );
        let objects = &WORKSPACE_DATA.properties[2];
        assert!(objects.is_generic);
        assert_eq!(objects.generic_arguments, &["WorkspaceObject"]);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("workspacedata").map(|d| d.type_name), Some("WorkspaceData"));
        assert_eq!(find("USER").map(|d| d.type_name), Some("User"));
        assert!(find("Nonexistent").is_none());
    }

    #[test]
    fn test_descriptors_match_record_types() {
        assert_eq!(User::descriptor().type_name, User::TYPE_NAME);
        assert_eq!(WorkspaceData::descriptor().type_name, WorkspaceData::TYPE_NAME);
        assert_eq!(WorkspaceObject::descriptor().type_name, WorkspaceObject::TYPE_NAME);
        assert_eq!(Position::descriptor().type_name, Position::TYPE_NAME);
        assert_eq!(Relationship::descriptor().type_name, Relationship::TYPE_NAME);
        assert_eq!(User::descriptor().full_name, std::any::type_name::<User>());
        assert_eq!(Position::descriptor().full_name, std::any::type_name::<Position>());
    }

    #[test]
    fn test_property_serializes_type_key() {
        let json = serde_json::to_value(POSITION.properties[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "X", "type": "Double", "isGeneric": false, "genericArguments": []})
        );
    }
}
