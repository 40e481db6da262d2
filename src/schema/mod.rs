//! Schema Layer - static registry and best-effort introspection
//!
//! The registry is a compile-time table of record shapes. The introspector
//! joins it with live counts and samples read from the store.

pub mod registry;
pub mod introspect;

pub use registry::{PropertyDescriptor, TypeDescriptor, REGISTERED_TYPES};
pub use introspect::{DatabaseSchema, IndexInfo, Introspector, Statistics, StructureSample, TypeSchema};
