//! Data source adapter contract
//!
//! The read-only variant of the resource adapter: one Read callback that
//! performs a lookup against the remote API and populates computed
//! attributes. No remote entity is owned, so the id is synthetic or derived
//! from the matched record's natural key.

use crate::error::{Result, TfError};
use crate::schema::Schema;
use crate::types::{Config, Diagnostics, State};
use async_trait::async_trait;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name is constant (e.g., "aws_caller_identity") and MUST match
    /// the key used in the provider registry.
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    fn validate(&self, config: &Config) -> Diagnostics {
        self.schema().validate(config)
    }

    /// Perform the lookup and populate all attributes, including the id.
    async fn read(&self, config: Config) -> Result<State>;
}

impl std::fmt::Debug for dyn DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// Disambiguation by cardinality for data sources that search a listing:
/// exactly one match is returned, zero or several fail with errors telling
/// the operator to adjust or narrow the filter.
pub fn require_single<T>(matches: Vec<T>, type_label: &str) -> Result<T> {
    let mut iter = matches.into_iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(TfError::Message(format!(
            "no {} found matching criteria; try different search",
            type_label
        ))),
        (Some(_), Some(_)) => Err(TfError::Message(format!(
            "multiple {} found matching criteria; try different search",
            type_label
        ))),
    }
}
