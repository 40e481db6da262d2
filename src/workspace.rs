//! Workspace graph records
//!
//! A [`WorkspaceData`] owns its objects and relationships by value:
//! - `WorkspaceObject`: a named, typed node placed at a [`Position`]
//! - `Relationship`: a directed link between two objects, by name
//!
//! Relationship endpoints are plain names; dangling names are accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::record::{Embedded, Record};
use crate::schema::{registry, TypeDescriptor};
use crate::{Error, Result};

/// Canvas coordinates of a workspace object
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Record for Position {
    const TYPE_NAME: &'static str = "Position";

    fn descriptor() -> &'static TypeDescriptor {
        &registry::POSITION
    }

    /// Non-finite coordinates encode as JSON `null` and cannot be read back
    fn validate(&self) -> Result<()> {
        if self.is_finite() {
            return Ok(());
        }
        Err(Error::InvalidRecord(format!(
            "position ({}, {}) has a non-finite coordinate",
            self.x, self.y
        )))
    }
}

/// Directed link `from -> to` between two objects, referenced by name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
}

impl Relationship {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Record for Relationship {
    const TYPE_NAME: &'static str = "Relationship";

    fn descriptor() -> &'static TypeDescriptor {
        &registry::RELATIONSHIP
    }
}

/// A node of the workspace graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceObject {
    pub name: String,
    /// Open tag set: "primitive", "persistent", "local", "evaluation", "match", ...
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Position,
}

impl WorkspaceObject {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            position,
        }
    }
}

impl Record for WorkspaceObject {
    const TYPE_NAME: &'static str = "WorkspaceObject";

    fn descriptor() -> &'static TypeDescriptor {
        &registry::WORKSPACE_OBJECT
    }

    fn embedded(&self) -> Result<Vec<Embedded>> {
        Ok(vec![Embedded::of(&self.position)?])
    }

    fn validate(&self) -> Result<()> {
        if self.position.is_finite() {
            return Ok(());
        }
        Err(Error::InvalidRecord(format!(
            "object '{}' has a non-finite position ({}, {})",
            self.name, self.position.x, self.position.y
        )))
    }
}

/// A saved workspace: metadata plus its object graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceData {
    pub method_name: String,
    pub title: String,
    pub objects: Vec<WorkspaceObject>,
    pub relationships: Vec<Relationship>,
    pub timestamp: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub version: String,
    pub workspace: String,
}

impl WorkspaceData {
    /// Find an object by name (names are not guaranteed unique; first wins)
    pub fn object(&self, name: &str) -> Option<&WorkspaceObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Relationships whose endpoints do not name any object in this workspace
    pub fn dangling_relationships(&self) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| self.object(&r.from).is_none() || self.object(&r.to).is_none())
            .collect()
    }
}

impl Record for WorkspaceData {
    const TYPE_NAME: &'static str = "WorkspaceData";

    fn descriptor() -> &'static TypeDescriptor {
        &registry::WORKSPACE_DATA
    }

    fn embedded(&self) -> Result<Vec<Embedded>> {
        let mut children = Vec::with_capacity(self.objects.len() * 2 + self.relationships.len());
        for object in &self.objects {
            children.push(Embedded::of(object)?);
            children.extend(object.embedded()?);
        }
        for relationship in &self.relationships {
            children.push(Embedded::of(relationship)?);
        }
        Ok(children)
    }

    fn validate(&self) -> Result<()> {
        self.objects.iter().try_for_each(|object| object.validate())
    }
}
