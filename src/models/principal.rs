use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A patient principal. `card_token` is the opaque identifier embedded in the
/// patient's QR card: unique, immutable once issued, and the only value a
/// clinician needs to look the patient up after a scan.
#[derive(Debug, Clone, Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub card_token: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            card_token: Uuid::new_v4().to_string(),
            email,
            password_hash,
            first_name,
            last_name,
            phone: None,
            date_of_birth: None,
            gender: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A clinician principal, identified by a globally unique license number.
#[derive(Debug, Clone, Serialize)]
pub struct Clinician {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub hospital: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

impl Clinician {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        license_number: String,
        hospital: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name,
            last_name,
            license_number,
            hospital,
            specialization: None,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }
}
