/// Medication entity and related functionality
///
/// This module defines the Medication struct that represents a drug regimen
/// the user wants to keep track of, along with its validation rules.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::dates::DateCode;
use crate::domain::{DomainError, IntakeTiming, MedicationId};

/// A tracked medication regimen
///
/// `id` is `None` until the store assigns one on insert. Start and end dates
/// are independent: nothing requires `start_date <= end_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    /// Store-assigned identifier (None for a not-yet-saved medication)
    pub id: Option<MedicationId>,
    /// Display name (e.g., "Levetiracetam")
    pub medication_name: String,
    /// Free-text dosage (e.g., "500mg", "1 tablet")
    pub dosage: Option<String>,
    /// When the dose is taken
    pub intake_timing: IntakeTiming,
    /// First day of the regimen, as YYYYMMDD
    pub start_date: Option<DateCode>,
    /// Last day of the regimen, as YYYYMMDD
    pub end_date: Option<DateCode>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Medication {
    /// Create a new, unsaved medication with validation
    ///
    /// The name and dosage are trimmed; a blank dosage becomes `None`.
    pub fn new(
        medication_name: &str,
        dosage: Option<&str>,
        intake_timing: IntakeTiming,
        start_date: Option<DateCode>,
        end_date: Option<DateCode>,
    ) -> Result<Self, DomainError> {
        Self {
            id: None,
            medication_name: medication_name.to_string(),
            dosage: dosage.map(str::to_string),
            intake_timing,
            start_date,
            end_date,
            created_at: None,
            updated_at: None,
        }
        .normalized()
    }

    /// Give this medication an existing id so saving it updates in place
    pub fn with_id(mut self, id: MedicationId) -> Self {
        self.id = Some(id);
        self
    }

    /// Trim text fields and enforce the non-blank name precondition
    ///
    /// Every medication must pass through here before it is persisted.
    pub fn normalized(mut self) -> Result<Self, DomainError> {
        let name = self.medication_name.trim();
        if name.is_empty() {
            return Err(DomainError::BlankMedicationName);
        }
        if name.chars().count() > 200 {
            return Err(DomainError::Validation {
                message: "Medication name cannot be longer than 200 characters".to_string(),
            });
        }
        self.medication_name = name.to_string();

        self.dosage = self
            .dosage
            .as_deref()
            .map(str::trim)
            .filter(|dosage| !dosage.is_empty())
            .map(str::to_string);

        Ok(self)
    }

    /// Get a one-line display string (e.g., "Levetiracetam 500mg, After breakfast")
    pub fn summary_line(&self) -> String {
        match &self.dosage {
            Some(dosage) => format!("{} {}, {}", self.medication_name, dosage, self.intake_timing),
            None => format!("{}, {}", self.medication_name, self.intake_timing),
        }
    }
}
