//! Inventory service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::PartId;
use domain::Part;
use thiserror::Error;

/// Errors reported by the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The service could not be reached or failed internally.
    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only source of part names, prices and stock levels.
#[async_trait]
pub trait PartOracle: Send + Sync {
    /// Looks up the given parts.
    ///
    /// Unknown ids are absent from the returned map rather than reported as
    /// an error.
    async fn list_parts(&self, part_ids: &[PartId])
    -> Result<HashMap<PartId, Part>, InventoryError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    parts: HashMap<PartId, Part>,
    list_calls: usize,
    fail_on_list: bool,
}

/// In-memory part catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the given parts.
    pub fn with_parts(parts: impl IntoIterator<Item = Part>) -> Self {
        let service = Self::new();
        for part in parts {
            service.upsert_part(part);
        }
        service
    }

    /// Adds a part, or replaces the part with the same id.
    pub fn upsert_part(&self, part: Part) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .parts
            .insert(part.part_id.clone(), part);
    }

    /// Configures the service to fail every lookup.
    pub fn set_fail_on_list(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_list = fail;
    }

    /// Returns the number of lookups served, including failed ones.
    pub fn list_call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list_calls
    }
}

#[async_trait]
impl PartOracle for InMemoryInventoryService {
    async fn list_parts(
        &self,
        part_ids: &[PartId],
    ) -> Result<HashMap<PartId, Part>, InventoryError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.list_calls += 1;

        if state.fail_on_list {
            return Err(InventoryError::Unavailable(
                "inventory lookup failed".to_string(),
            ));
        }

        let found = part_ids
            .iter()
            .filter_map(|id| state.parts.get(id))
            .map(|part| (part.part_id.clone(), part.clone()))
            .collect();

        Ok(found)
    }
}
