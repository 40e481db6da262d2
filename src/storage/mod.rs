//! Storage Layer - SQLite-backed object persistence
//!
//! One store is one directory holding the engine file, with tables:
//! - objects(oid, type_name, owner_oid, body, created_at)
//! - registered_types(name, full_name, registered_at)
//! - store_meta(key, value)

pub mod schema;
pub mod store_config;
pub mod session;
pub mod gateway;
pub mod initializer;
pub mod seed;

pub use store_config::StoreConfig;
pub use session::{Oid, Session, SessionMode};
pub use gateway::{Gateway, StoreStatus};
pub use initializer::{InitOutcome, StoreInitializer};
