//! Record types - plain data persisted by the store
//!
//! Every persistable type implements [`Record`], which ties it to its entry in
//! the static type registry and lists the owned children that are persisted
//! alongside it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::schema::{registry, TypeDescriptor};
use crate::Result;

/// A plain data type the store can persist and read back.
pub trait Record: Serialize + DeserializeOwned + Send + 'static {
    /// Registered simple type name, used to tag stored rows
    const TYPE_NAME: &'static str;

    /// Static descriptor of this type in the registry
    fn descriptor() -> &'static TypeDescriptor;

    /// Owned children persisted as their own rows under this record.
    ///
    /// Children are returned flattened, so grandchildren appear next to
    /// their parents.
    fn embedded(&self) -> Result<Vec<Embedded>> {
        Ok(Vec::new())
    }

    /// Reject values that would not read back, checked before any write
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// A child record encoded for storage under its owner
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    pub type_name: &'static str,
    pub body: serde_json::Value,
}

impl Embedded {
    /// Encode a record as an embedded child
    pub fn of<T: Record>(record: &T) -> Result<Self> {
        Ok(Self {
            type_name: T::TYPE_NAME,
            body: serde_json::to_value(record)?,
        })
    }
}

/// An account allowed to use the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub role: String,
}

impl User {
    pub fn new(id: i32, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: role.into(),
        }
    }
}

impl Record for User {
    const TYPE_NAME: &'static str = "User";

    fn descriptor() -> &'static TypeDescriptor {
        &registry::USER
    }
}
