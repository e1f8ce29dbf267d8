use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::*;

fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidUuid {
        value: value.into(),
    })
}

fn parse_dt(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidTimestamp { value: value.into() })
}

// ═══════════════════════════════════════════
// Patient Repository
// ═══════════════════════════════════════════

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, card_token, email, password_hash, first_name, last_name,
         phone, date_of_birth, gender, address, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            patient.id.to_string(),
            patient.card_token,
            patient.email,
            patient.password_hash,
            patient.first_name,
            patient.last_name,
            patient.phone,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.gender,
            patient.address,
            patient.created_at.to_rfc3339(),
            patient.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

const PATIENT_COLUMNS: &str = "id, card_token, email, password_hash, first_name, last_name,
     phone, date_of_birth, gender, address, created_at, updated_at";

struct PatientRow {
    id: String,
    card_token: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    address: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        card_token: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        phone: row.get(6)?,
        date_of_birth: row.get(7)?,
        gender: row.get(8)?,
        address: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    let date_of_birth = match row.date_of_birth {
        Some(s) => Some(s.parse::<NaiveDate>().map_err(|_| {
            DatabaseError::InvalidTimestamp { value: s }
        })?),
        None => None,
    };
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        card_token: row.card_token,
        email: row.email,
        password_hash: row.password_hash,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
        date_of_birth,
        gender: row.gender,
        address: row.address,
        created_at: parse_dt(&row.created_at)?,
        updated_at: parse_dt(&row.updated_at)?,
    })
}

fn query_one_patient(
    conn: &Connection,
    where_clause: &str,
    param: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE {where_clause}");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![param], read_patient_row);
    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    query_one_patient(conn, "id = ?1", &id.to_string())
}

pub fn find_patient_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Patient>, DatabaseError> {
    query_one_patient(conn, "email = ?1", email)
}

pub fn find_patient_by_card_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<Patient>, DatabaseError> {
    query_one_patient(conn, "card_token = ?1", token)
}

// ═══════════════════════════════════════════
// Clinician Repository
// ═══════════════════════════════════════════

pub fn insert_clinician(conn: &Connection, clinician: &Clinician) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinicians (id, email, password_hash, first_name, last_name,
         license_number, hospital, specialization, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            clinician.id.to_string(),
            clinician.email,
            clinician.password_hash,
            clinician.first_name,
            clinician.last_name,
            clinician.license_number,
            clinician.hospital,
            clinician.specialization,
            clinician.phone,
            clinician.created_at.to_rfc3339(),
            clinician.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

const CLINICIAN_COLUMNS: &str = "id, email, password_hash, first_name, last_name,
     license_number, hospital, specialization, phone, created_at, updated_at";

struct ClinicianRow {
    id: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    license_number: String,
    hospital: String,
    specialization: Option<String>,
    phone: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_clinician_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClinicianRow> {
    Ok(ClinicianRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        license_number: row.get(5)?,
        hospital: row.get(6)?,
        specialization: row.get(7)?,
        phone: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn clinician_from_row(row: ClinicianRow) -> Result<Clinician, DatabaseError> {
    Ok(Clinician {
        id: parse_uuid(&row.id)?,
        email: row.email,
        password_hash: row.password_hash,
        first_name: row.first_name,
        last_name: row.last_name,
        license_number: row.license_number,
        hospital: row.hospital,
        specialization: row.specialization,
        phone: row.phone,
        created_at: parse_dt(&row.created_at)?,
        updated_at: parse_dt(&row.updated_at)?,
    })
}

fn query_one_clinician(
    conn: &Connection,
    where_clause: &str,
    param: &str,
) -> Result<Option<Clinician>, DatabaseError> {
    let sql = format!("SELECT {CLINICIAN_COLUMNS} FROM clinicians WHERE {where_clause}");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![param], read_clinician_row);
    match result {
        Ok(row) => Ok(Some(clinician_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_clinician(conn: &Connection, id: &Uuid) -> Result<Option<Clinician>, DatabaseError> {
    query_one_clinician(conn, "id = ?1", &id.to_string())
}

pub fn find_clinician_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Clinician>, DatabaseError> {
    query_one_clinician(conn, "email = ?1", email)
}

pub fn find_clinician_by_license(
    conn: &Connection,
    license_number: &str,
) -> Result<Option<Clinician>, DatabaseError> {
    query_one_clinician(conn, "license_number = ?1", license_number)
}

// ═══════════════════════════════════════════
// MedicalEntry Repository
// ═══════════════════════════════════════════

pub fn insert_entry(conn: &Connection, entry: &MedicalEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medical_entries (id, patient_id, clinician_id, entry_date, test_type,
         test_results, diagnosis, prescription, notes, amended, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            entry.id.to_string(),
            entry.patient_id.to_string(),
            entry.clinician_id.to_string(),
            entry.entry_date.to_rfc3339(),
            entry.test_type,
            entry.test_results,
            entry.diagnosis,
            entry.prescription,
            entry.notes,
            entry.amended as i32,
            entry.created_at.to_rfc3339(),
            entry.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Persist the mutable portion of an entry after an amend: tracked fields,
/// the monotonic `amended` flag, and the last-update timestamp.
pub fn update_entry_fields(conn: &Connection, entry: &MedicalEntry) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medical_entries SET test_type = ?2, test_results = ?3, diagnosis = ?4,
         prescription = ?5, notes = ?6, amended = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            entry.id.to_string(),
            entry.test_type,
            entry.test_results,
            entry.diagnosis,
            entry.prescription,
            entry.notes,
            entry.amended as i32,
            entry.updated_at.to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "MedicalEntry".into(),
            id: entry.id.to_string(),
        });
    }
    Ok(())
}

const ENTRY_COLUMNS: &str = "id, patient_id, clinician_id, entry_date, test_type,
     test_results, diagnosis, prescription, notes, amended, created_at, updated_at";

struct EntryRow {
    id: String,
    patient_id: String,
    clinician_id: String,
    entry_date: String,
    test_type: String,
    test_results: Option<String>,
    diagnosis: Option<String>,
    prescription: Option<String>,
    notes: Option<String>,
    amended: i32,
    created_at: String,
    updated_at: String,
}

fn read_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        clinician_id: row.get(2)?,
        entry_date: row.get(3)?,
        test_type: row.get(4)?,
        test_results: row.get(5)?,
        diagnosis: row.get(6)?,
        prescription: row.get(7)?,
        notes: row.get(8)?,
        amended: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn entry_from_row(row: EntryRow) -> Result<MedicalEntry, DatabaseError> {
    Ok(MedicalEntry {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        clinician_id: parse_uuid(&row.clinician_id)?,
        entry_date: parse_dt(&row.entry_date)?,
        test_type: row.test_type,
        test_results: row.test_results,
        diagnosis: row.diagnosis,
        prescription: row.prescription,
        notes: row.notes,
        amended: row.amended != 0,
        created_at: parse_dt(&row.created_at)?,
        updated_at: parse_dt(&row.updated_at)?,
    })
}

pub fn get_entry(conn: &Connection, id: &Uuid) -> Result<Option<MedicalEntry>, DatabaseError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM medical_entries WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id.to_string()], read_entry_row);
    match result {
        Ok(row) => Ok(Some(entry_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List a patient's entries, filtered and ordered per `HistoryFilter`.
///
/// Sort key and direction come from fixed enum-to-identifier mappings,
/// never from caller strings, so the interpolation stays injection-safe.
pub fn list_entries_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &HistoryFilter,
) -> Result<Vec<MedicalEntry>, DatabaseError> {
    let mut sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM medical_entries WHERE patient_id = ?1"
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> =
        vec![Box::new(patient_id.to_string())];

    if let Some(test_type) = &filter.test_type {
        params_vec.push(Box::new(test_type.clone()));
        sql.push_str(&format!(" AND test_type = ?{}", params_vec.len()));
    }
    if let Some(clinician_id) = &filter.clinician_id {
        params_vec.push(Box::new(clinician_id.to_string()));
        sql.push_str(&format!(" AND clinician_id = ?{}", params_vec.len()));
    }

    sql.push_str(&format!(
        " ORDER BY {} {}",
        filter.sort_by.column(),
        filter.order.keyword()
    ));

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), read_entry_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(entry_from_row(row?)?);
    }
    Ok(entries)
}

// ═══════════════════════════════════════════
// Amendment Repository (append-only)
// ═══════════════════════════════════════════

pub fn insert_amendment(conn: &Connection, amendment: &Amendment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO amendments (id, entry_id, clinician_id, original_data, amended_data,
         reason, created_at, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            amendment.id.to_string(),
            amendment.entry_id.to_string(),
            amendment.clinician_id.to_string(),
            serde_json::to_string(&amendment.original_data)?,
            serde_json::to_string(&amendment.amended_data)?,
            amendment.reason,
            amendment.created_at.to_rfc3339(),
            amendment.seq,
        ],
    )?;
    Ok(())
}

pub fn amendment_count(conn: &Connection, entry_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM amendments WHERE entry_id = ?1",
        params![entry_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct AmendmentRow {
    id: String,
    entry_id: String,
    clinician_id: String,
    original_data: String,
    amended_data: String,
    reason: Option<String>,
    created_at: String,
    seq: i64,
}

fn amendment_from_row(row: AmendmentRow) -> Result<Amendment, DatabaseError> {
    Ok(Amendment {
        id: parse_uuid(&row.id)?,
        entry_id: parse_uuid(&row.entry_id)?,
        clinician_id: parse_uuid(&row.clinician_id)?,
        original_data: serde_json::from_str(&row.original_data)?,
        amended_data: serde_json::from_str(&row.amended_data)?,
        reason: row.reason,
        created_at: parse_dt(&row.created_at)?,
        seq: row.seq,
    })
}

/// All amendments for an entry in creation order (oldest first).
pub fn list_amendments(
    conn: &Connection,
    entry_id: &Uuid,
) -> Result<Vec<Amendment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, entry_id, clinician_id, original_data, amended_data, reason, created_at, seq
         FROM amendments WHERE entry_id = ?1 ORDER BY seq ASC",
    )?;
    let rows = stmt.query_map(params![entry_id.to_string()], |row| {
        Ok(AmendmentRow {
            id: row.get(0)?,
            entry_id: row.get(1)?,
            clinician_id: row.get(2)?,
            original_data: row.get(3)?,
            amended_data: row.get(4)?,
            reason: row.get(5)?,
            created_at: row.get(6)?,
            seq: row.get(7)?,
        })
    })?;

    let mut amendments = Vec::new();
    for row in rows {
        amendments.push(amendment_from_row(row?)?);
    }
    Ok(amendments)
}
