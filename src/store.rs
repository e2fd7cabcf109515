//! Persistence collaborator.
//!
//! The overlay treats `save` as fire-and-forget: a failed save is logged
//! and never interrupts the interaction, but the `Result` channel is there
//! for hosts that want to retry or surface errors.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

use crate::record::{AnnotationId, AnnotationRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode annotation record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("annotation record has no id")]
    MissingId,
    #[error("storage backend unavailable: {0}")]
    Backend(String),
}

/// Where committed annotation mutations go.
pub trait AnnotationStore {
    /// Persist one record, keyed by its id.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be encoded or the backend
    /// rejects the write.
    fn save(&self, record: &AnnotationRecord) -> Result<(), StoreError>;
}

/// In-memory store for native hosts and tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<AnnotationId, AnnotationRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &AnnotationId) -> Option<AnnotationRecord> {
        self.records.borrow().get(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl AnnotationStore for MemoryStore {
    fn save(&self, record: &AnnotationRecord) -> Result<(), StoreError> {
        let id = record.id.ok_or(StoreError::MissingId)?;
        self.records.borrow_mut().insert(id, record.clone());
        Ok(())
    }
}
