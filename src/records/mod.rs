//! Medical record custody: entry creation, partial amendment, and the
//! append-only amendment ledger.
//!
//! Every amend call mutates the entry and appends exactly one ledger row in
//! a single SQLite transaction; either both commit or neither does. The
//! ledger records clinician actions, not value changes: an empty or no-op
//! patch still produces one amendment whose before and after snapshots are
//! equal.
//!
//! Concurrent amends on the same entry serialize at the SQLite write lock;
//! the later commit wins on field values while both land in the ledger in
//! commit order (last-write-wins, no version counter).

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::*;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Clinician not found: {0}")]
    ClinicianNotFound(Uuid),

    #[error("Medical entry not found: {0}")]
    EntryNotFound(Uuid),

    #[error("test_type is required")]
    MissingTestType,
}

/// Fields supplied when a clinician creates an entry.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NewEntry {
    pub test_type: String,
    pub test_results: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

/// Create a medical entry for the patient named by `card_token`.
///
/// Creation is not an amendment: the ledger is untouched.
pub fn create_entry(
    conn: &Connection,
    clinician_id: &Uuid,
    card_token: &str,
    new: NewEntry,
) -> Result<MedicalEntry, RecordError> {
    if new.test_type.trim().is_empty() {
        return Err(RecordError::MissingTestType);
    }

    let patient = db::find_patient_by_card_token(conn, card_token)?
        .ok_or_else(|| RecordError::PatientNotFound(card_token.to_string()))?;
    let clinician = db::get_clinician(conn, clinician_id)?
        .ok_or(RecordError::ClinicianNotFound(*clinician_id))?;

    let now = Utc::now();
    let entry = MedicalEntry {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        clinician_id: clinician.id,
        entry_date: now,
        test_type: new.test_type,
        test_results: new.test_results,
        diagnosis: new.diagnosis,
        prescription: new.prescription,
        notes: new.notes,
        amended: false,
        created_at: now,
        updated_at: now,
    };
    db::insert_entry(conn, &entry)?;

    info!(
        entry_id = %entry.id,
        clinician_id = %clinician.id,
        patient = %patient.card_token,
        "Medical entry created"
    );
    Ok(entry)
}

/// Amend an entry with a partial patch, appending exactly one ledger row.
///
/// Only fields present in the patch overwrite; the full before and after
/// field tuples are captured as snapshots; `amended` is set unconditionally.
/// Entry mutation and ledger append are one atomic transaction.
pub fn amend_entry(
    conn: &mut Connection,
    clinician_id: &Uuid,
    entry_id: &Uuid,
    patch: &EntryPatch,
    reason: Option<String>,
) -> Result<(MedicalEntry, Amendment), RecordError> {
    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let mut entry =
        db::get_entry(&tx, entry_id)?.ok_or(RecordError::EntryNotFound(*entry_id))?;
    let clinician = db::get_clinician(&tx, clinician_id)?
        .ok_or(RecordError::ClinicianNotFound(*clinician_id))?;

    let original_data = entry.snapshot();
    entry.apply(patch);
    entry.amended = true;
    entry.updated_at = Utc::now();
    let amended_data = entry.snapshot();

    db::update_entry_fields(&tx, &entry)?;

    let amendment = Amendment {
        id: Uuid::new_v4(),
        entry_id: entry.id,
        clinician_id: clinician.id,
        original_data,
        amended_data,
        reason,
        created_at: entry.updated_at,
        seq: db::amendment_count(&tx, entry_id)? + 1,
    };
    db::insert_amendment(&tx, &amendment)?;

    tx.commit().map_err(DatabaseError::from)?;

    info!(
        entry_id = %entry.id,
        clinician_id = %clinician.id,
        seq = amendment.seq,
        no_op = patch.is_empty(),
        "Medical entry amended"
    );
    Ok((entry, amendment))
}

/// All amendments for an entry, oldest first. Fails if the entry is absent.
pub fn entry_history(
    conn: &Connection,
    entry_id: &Uuid,
) -> Result<Vec<Amendment>, RecordError> {
    if db::get_entry(conn, entry_id)?.is_none() {
        return Err(RecordError::EntryNotFound(*entry_id));
    }
    Ok(db::list_amendments(conn, entry_id)?)
}

/// A patient's entries, filtered and ordered per `HistoryFilter`.
pub fn patient_history(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &HistoryFilter,
) -> Result<Vec<MedicalEntry>, RecordError> {
    Ok(db::list_entries_for_patient(conn, patient_id, filter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn seed(conn: &Connection) -> (Patient, Clinician) {
        let patient =
            Patient::new("a@x.com".into(), "hash".into(), "Ada".into(), "Lovelace".into());
        let clinician = Clinician::new(
            "d@h.org".into(),
            "hash".into(),
            "Gregory".into(),
            "House".into(),
            "LIC-001".into(),
            "PPTH".into(),
        );
        db::insert_patient(conn, &patient).unwrap();
        db::insert_clinician(conn, &clinician).unwrap();
        (patient, clinician)
    }

    fn cbc() -> NewEntry {
        NewEntry {
            test_type: "CBC".into(),
            ..Default::default()
        }
    }

    #[test]
    fn create_requires_test_type() {
        let conn = open_memory_database().unwrap();
        let (p, c) = seed(&conn);
        let err = create_entry(
            &conn,
            &c.id,
            &p.card_token,
            NewEntry {
                test_type: "  ".into(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::MissingTestType));
    }

    #[test]
    fn create_requires_existing_patient() {
        let conn = open_memory_database().unwrap();
        let (_p, c) = seed(&conn);
        let err = create_entry(&conn, &c.id, "no-such-token", cbc()).unwrap_err();
        assert!(matches!(err, RecordError::PatientNotFound(_)));
    }

    #[test]
    fn create_does_not_touch_ledger() {
        let conn = open_memory_database().unwrap();
        let (p, c) = seed(&conn);
        let entry = create_entry(&conn, &c.id, &p.card_token, cbc()).unwrap();
        assert!(!entry.amended);
        assert_eq!(db::amendment_count(&conn, &entry.id).unwrap(), 0);
    }

    #[test]
    fn amend_partial_patch_leaves_other_fields() {
        let mut conn = open_memory_database().unwrap();
        let (p, c) = seed(&conn);
        let entry = create_entry(&conn, &c.id, &p.card_token, cbc()).unwrap();

        let patch = EntryPatch {
            diagnosis: Some(Some("anemia".into())),
            ..Default::default()
        };
        let (amended, amendment) =
            amend_entry(&mut conn, &c.id, &entry.id, &patch, Some("lab review".into()))
                .unwrap();

        assert_eq!(amended.test_type, "CBC");
        assert!(amended.amended);
        assert_eq!(amended.diagnosis.as_deref(), Some("anemia"));
        assert_eq!(amendment.original_data.diagnosis, None);
        assert_eq!(amendment.amended_data.diagnosis.as_deref(), Some("anemia"));
        assert_eq!(amendment.reason.as_deref(), Some("lab review"));
        assert_eq!(amendment.seq, 1);
    }

    #[test]
    fn empty_patch_still_appends_one_amendment() {
        let mut conn = open_memory_database().unwrap();
        let (p, c) = seed(&conn);
        let entry = create_entry(&conn, &c.id, &p.card_token, cbc()).unwrap();

        let (amended, amendment) =
            amend_entry(&mut conn, &c.id, &entry.id, &EntryPatch::default(), None).unwrap();

        assert!(amended.amended, "amended flag set even for a no-op patch");
        assert_eq!(amendment.original_data, amendment.amended_data);
        assert_eq!(entry_history(&conn, &entry.id).unwrap().len(), 1);
    }

    #[test]
    fn history_has_one_record_per_amend_and_chains() {
        let mut conn = open_memory_database().unwrap();
        let (p, c) = seed(&conn);
        let entry = create_entry(&conn, &c.id, &p.card_token, cbc()).unwrap();
        let creation_state = entry.snapshot();

        let patches = [
            EntryPatch {
                diagnosis: Some(Some("anemia".into())),
                ..Default::default()
            },
            EntryPatch {
                prescription: Some(Some("ferrous sulfate".into())),
                ..Default::default()
            },
            EntryPatch {
                diagnosis: Some(Some("iron-deficiency anemia".into())),
                notes: Some(Some("follow up in 6 weeks".into())),
                ..Default::default()
            },
        ];
        for patch in &patches {
            amend_entry(&mut conn, &c.id, &entry.id, patch, None).unwrap();
        }

        let history = entry_history(&conn, &entry.id).unwrap();
        assert_eq!(history.len(), patches.len());

        // Chain: before of k+1 equals after of k; before of the first equals
        // the post-creation state; replay reconstructs the final state.
        assert_eq!(history[0].original_data, creation_state);
        for pair in history.windows(2) {
            assert_eq!(pair[0].amended_data, pair[1].original_data);
        }
        let final_entry = db::get_entry(&conn, &entry.id).unwrap().unwrap();
        assert_eq!(history.last().unwrap().amended_data, final_entry.snapshot());
    }

    #[test]
    fn amend_missing_entry_leaves_no_ledger_rows() {
        let mut conn = open_memory_database().unwrap();
        let (_p, c) = seed(&conn);
        let ghost = Uuid::new_v4();
        let err = amend_entry(&mut conn, &c.id, &ghost, &EntryPatch::default(), None)
            .unwrap_err();
        assert!(matches!(err, RecordError::EntryNotFound(_)));
        assert_eq!(db::amendment_count(&conn, &ghost).unwrap(), 0);
    }

    #[test]
    fn amend_with_unknown_clinician_rolls_back() {
        let mut conn = open_memory_database().unwrap();
        let (p, c) = seed(&conn);
        let entry = create_entry(&conn, &c.id, &p.card_token, cbc()).unwrap();

        let patch = EntryPatch {
            notes: Some(Some("should not land".into())),
            ..Default::default()
        };
        let err =
            amend_entry(&mut conn, &Uuid::new_v4(), &entry.id, &patch, None).unwrap_err();
        assert!(matches!(err, RecordError::ClinicianNotFound(_)));

        // Neither the entry mutation nor a ledger row survived
        let unchanged = db::get_entry(&conn, &entry.id).unwrap().unwrap();
        assert!(!unchanged.amended);
        assert_eq!(unchanged.notes, None);
        assert_eq!(db::amendment_count(&conn, &entry.id).unwrap(), 0);
    }

    #[test]
    fn history_for_missing_entry_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = entry_history(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, RecordError::EntryNotFound(_)));
    }

    #[test]
    fn patient_history_respects_filter() {
        let mut conn = open_memory_database().unwrap();
        let (p, c) = seed(&conn);
        create_entry(&conn, &c.id, &p.card_token, cbc()).unwrap();
        let xray = create_entry(
            &conn,
            &c.id,
            &p.card_token,
            NewEntry {
                test_type: "X-Ray".into(),
                ..Default::default()
            },
        )
        .unwrap();
        amend_entry(&mut conn, &c.id, &xray.id, &EntryPatch::default(), None).unwrap();

        let all = patient_history(&conn, &p.id, &HistoryFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let filtered = patient_history(
            &conn,
            &p.id,
            &HistoryFilter {
                test_type: Some("X-Ray".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].amended);
    }
}
