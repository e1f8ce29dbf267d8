use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single medical record contributed by a clinician for a patient.
///
/// Created once, then mutated only through the amend operation; `amended`
/// is monotonic: once set it is never reset.
#[derive(Debug, Clone, Serialize)]
pub struct MedicalEntry {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub clinician_id: Uuid,
    pub entry_date: DateTime<Utc>,
    pub test_type: String,
    pub test_results: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub amended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicalEntry {
    /// Capture the tracked field tuple as it currently stands.
    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            test_type: self.test_type.clone(),
            test_results: self.test_results.clone(),
            diagnosis: self.diagnosis.clone(),
            prescription: self.prescription.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Apply a partial patch: only fields present in the patch overwrite.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(test_type) = &patch.test_type {
            self.test_type = test_type.clone();
        }
        if let Some(test_results) = &patch.test_results {
            self.test_results = test_results.clone();
        }
        if let Some(diagnosis) = &patch.diagnosis {
            self.diagnosis = diagnosis.clone();
        }
        if let Some(prescription) = &patch.prescription {
            self.prescription = prescription.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
    }
}

/// Full tuple of an entry's tracked fields. Amendments store complete
/// before/after snapshots, never diffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub test_type: String,
    pub test_results: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

/// Partial update to an entry. The outer `Option` marks presence in the
/// patch; the inner `Option` lets a present key clear a field to null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPatch {
    pub test_type: Option<String>,
    pub test_results: Option<Option<String>>,
    pub diagnosis: Option<Option<String>>,
    pub prescription: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.test_type.is_none()
            && self.test_results.is_none()
            && self.diagnosis.is_none()
            && self.prescription.is_none()
            && self.notes.is_none()
    }
}

/// Immutable audit record of one amend operation. `seq` orders amendments
/// within an entry starting at 1; rows are never updated or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Amendment {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub clinician_id: Uuid,
    pub original_data: EntrySnapshot,
    pub amended_data: EntrySnapshot,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub seq: i64,
}
