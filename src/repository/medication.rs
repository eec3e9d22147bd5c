/// Medication operations: list, save and delete

use chrono::Utc;

use crate::domain::{Medication, MedicationId};
use crate::storage::{JournalStore, StorageError};

/// Manage medications through any store backend
pub struct MedicationRepository<'a, S: JournalStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: JournalStore + ?Sized> MedicationRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All medications, newest first
    pub fn list(&self) -> Result<Vec<Medication>, StorageError> {
        self.store.list_medications()
    }

    /// Insert a new medication, or update an existing one when `id` is set
    ///
    /// The name must be non-blank after trimming. Updating an id that does
    /// not exist fails with `MedicationNotFound` instead of inserting. The
    /// returned medication is the one the store wrote; other medications
    /// are not read.
    pub fn save(&self, medication: Medication) -> Result<Medication, StorageError> {
        let medication = medication.normalized()?;
        let now = Utc::now();

        match medication.id {
            Some(id) => {
                let updated = self
                    .store
                    .update_medication(id, &medication, now)?
                    .ok_or(StorageError::MedicationNotFound { id })?;
                tracing::info!("Updated medication {}: {}", id, updated.medication_name);
                Ok(updated)
            }
            None => {
                let created = self.store.insert_medication(&medication, now)?;
                tracing::info!(
                    "Created medication {:?}: {}",
                    created.id,
                    created.medication_name
                );
                Ok(created)
            }
        }
    }

    /// Delete medication `id`; deleting an unknown id is not an error
    pub fn delete(&self, id: MedicationId) -> Result<(), StorageError> {
        if self.store.delete_medication(id)? {
            tracing::info!("Deleted medication {}", id);
        } else {
            tracing::debug!("Medication {} was already gone", id);
        }
        Ok(())
    }
}
