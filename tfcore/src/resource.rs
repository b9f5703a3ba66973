//! Resource adapter contract
//!
//! A resource adapter pairs a declarative schema with the four lifecycle
//! callbacks the host drives: Create, Read, Update, Delete. Each callback
//! translates between the attribute map and remote request/response structs.
//! Instances move through `absent -> creating -> present -> deleting ->
//! absent`, with Update as a self-loop on `present`; there is no durable
//! `updating` state.

use crate::error::Result;
use crate::schema::Schema;
use crate::types::{Config, Diagnostics, State};
use async_trait::async_trait;

#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name is constant (e.g., "aws_iam_role") and MUST match the key
    /// used in the provider registry.
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// Fail-fast configuration check, run before any remote call.
    fn validate(&self, config: &Config) -> Diagnostics {
        self.schema().validate(config)
    }

    /// Create the remote entity and return state carrying the new
    /// identifier plus every schema attribute, computed ones included.
    async fn create(&self, config: Config) -> Result<State>;

    /// Re-read the remote entity keyed by the stored id, overwriting every
    /// attribute with the authoritative remote value. Returns `Ok(None)`
    /// when the remote reports the entity gone, which tells the host to
    /// clear state instead of erroring; this is the drift-detection
    /// contract refresh relies on.
    async fn read(&self, state: State) -> Result<Option<State>>;

    /// Apply changed attributes to the remote entity. Attributes marked
    /// force-new never reach this callback; the host replaces the resource
    /// instead. Either fully succeeds or fails with prior state intact.
    async fn update(&self, prior: State, config: Config) -> Result<State>;

    /// Delete the remote entity. Idempotent: a remote "already gone" error
    /// is success, anything else propagates.
    async fn delete(&self, state: State) -> Result<()>;
}

impl std::fmt::Debug for dyn Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("type_name", &self.type_name())
            .finish()
    }
}
