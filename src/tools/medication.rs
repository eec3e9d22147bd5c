/// Tools for managing medications
///
/// This module implements the medication_list, medication_save and
/// medication_delete MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::dates::DateCode;
use crate::domain::{IntakeTiming, Medication, MedicationId};
use crate::repository::MedicationRepository;
use crate::storage::{JournalStore, StorageError};

/// Parameters for creating or updating a medication
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveMedicationParams {
    /// Id of the medication to update; omit to create a new one
    pub id: Option<i64>,
    /// Name of the medication (required)
    pub medication_name: String,
    /// Free-text dosage, e.g. "500mg"
    pub dosage: Option<String>,
    /// Intake timing code: 1 morning, 2 before breakfast, 3 after breakfast,
    /// 4 noon, 5 before lunch, 6 after lunch, 7 evening, 8 before dinner,
    /// 9 after dinner, 10 bedtime, 11 between meals, 12 as needed
    #[serde(default = "default_intake_timing")]
    pub intake_timing: i64,
    /// First day as YYYYMMDD, e.g. 20250115
    pub start_date: Option<i64>,
    /// Last day as YYYYMMDD
    pub end_date: Option<i64>,
}

fn default_intake_timing() -> i64 {
    IntakeTiming::default().code()
}

/// Parameters for deleting a medication
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteMedicationParams {
    /// Id of the medication to delete
    pub id: i64,
}

/// Parameters for listing medications (none)
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListMedicationsParams {}

/// Response from listing medications
#[derive(Debug, Serialize)]
pub struct ListMedicationsResponse {
    pub message: String,
    pub medications: Vec<Medication>,
}

/// Response from saving or deleting a medication
#[derive(Debug, Serialize)]
pub struct MedicationResponse {
    pub success: bool,
    pub message: String,
    pub medication: Option<Medication>,
}

/// List all medications, newest first
pub fn list_medications<S: JournalStore + ?Sized>(
    store: &S,
    _params: ListMedicationsParams,
) -> Result<ListMedicationsResponse, StorageError> {
    let medications = MedicationRepository::new(store).list()?;

    let message = if medications.is_empty() {
        "No medications recorded yet.".to_string()
    } else {
        let lines = medications
            .iter()
            .map(|med| {
                format!(
                    "#{} {} (from {} to {})",
                    med.id.map_or(0, MedicationId::value),
                    med.summary_line(),
                    med.start_date.map_or("-".to_string(), |d| d.to_string()),
                    med.end_date.map_or("-".to_string(), |d| d.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("{} medication(s):\n{}", medications.len(), lines)
    };

    Ok(ListMedicationsResponse {
        message,
        medications,
    })
}

/// Create a medication, or update it when `id` is given
pub fn save_medication<S: JournalStore + ?Sized>(
    store: &S,
    params: SaveMedicationParams,
) -> Result<MedicationResponse, StorageError> {
    let start_date = params.start_date.map(DateCode::parse_checked).transpose()?;
    let end_date = params.end_date.map(DateCode::parse_checked).transpose()?;

    let mut medication = Medication::new(
        &params.medication_name,
        params.dosage.as_deref(),
        IntakeTiming::from_code(params.intake_timing)?,
        start_date,
        end_date,
    )?;
    if let Some(id) = params.id {
        medication = medication.with_id(MedicationId(id));
    }

    let updating = medication.id.is_some();
    let saved = MedicationRepository::new(store).save(medication)?;

    let verb = if updating { "Updated" } else { "Added" };
    Ok(MedicationResponse {
        success: true,
        message: format!(
            "{} medication #{}: {}",
            verb,
            saved.id.map_or(0, MedicationId::value),
            saved.summary_line()
        ),
        medication: Some(saved),
    })
}

/// Delete a medication; an unknown id is not an error
pub fn delete_medication<S: JournalStore + ?Sized>(
    store: &S,
    params: DeleteMedicationParams,
) -> Result<MedicationResponse, StorageError> {
    MedicationRepository::new(store).delete(MedicationId(params.id))?;

    Ok(MedicationResponse {
        success: true,
        message: format!("Medication #{} deleted", params.id),
        medication: None,
    })
}
