//! tfcore - Terraform provider framework for Rust
//!
//! The building blocks shared by every provider: the value model exchanged
//! with Terraform core, declarative attribute schemas with validation, the
//! resource and data source adapter traits, replacement planning, and a
//! bounded retry combinator for eventual-consistency windows.
//!
//! Terraform core remains the host: it owns graph ordering, diffing
//! persistence and parallelism, and drives the adapter callbacks defined
//! here through the plugin boundary.

// Core modules
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod plan;
pub mod retry;
pub mod validator;

// Re-exports for convenience
pub use data_source::{require_single, DataSource};
pub use error::{Result, TfError};
pub use plan::{plan, PlannedAction};
pub use provider::Provider;
pub use resource::Resource;
pub use retry::{retry_on, RetryPolicy};
pub use schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder, SemanticEquality};
pub use types::{AttributeMap, Config, Diagnostic, Diagnostics, State, Value};
