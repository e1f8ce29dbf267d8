use serde::{Deserialize, Serialize};

/// Principal kind. Patient and clinician credentials live in
/// independent uniqueness domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Clinician,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Clinician).unwrap(), "\"clinician\"");
    }

    #[test]
    fn unknown_role_fails_deserialization() {
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }
}
