use serde::Deserialize;
use uuid::Uuid;

/// Filter + ordering for a patient's medical history listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    pub test_type: Option<String>,
    pub clinician_id: Option<Uuid>,
    #[serde(default)]
    pub sort_by: HistorySort,
    #[serde(default)]
    pub order: SortOrder,
}

/// Sort key for history listings. Defaults to entry date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySort {
    #[default]
    EntryDate,
    UpdatedAt,
}

impl HistorySort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::EntryDate => "entry_date",
            Self::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction. Defaults to descending (newest first).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_sorts_entry_date_desc() {
        let f = HistoryFilter::default();
        assert_eq!(f.sort_by, HistorySort::EntryDate);
        assert_eq!(f.order, SortOrder::Desc);
        assert!(f.test_type.is_none());
    }

    #[test]
    fn filter_deserializes_from_query_shape() {
        let f: HistoryFilter = serde_json::from_str(
            r#"{"test_type": "CBC", "sort_by": "updated_at", "order": "asc"}"#,
        )
        .unwrap();
        assert_eq!(f.test_type.as_deref(), Some("CBC"));
        assert_eq!(f.sort_by, HistorySort::UpdatedAt);
        assert_eq!(f.order, SortOrder::Asc);
    }

    #[test]
    fn sort_columns_are_fixed_identifiers() {
        assert_eq!(HistorySort::EntryDate.column(), "entry_date");
        assert_eq!(HistorySort::UpdatedAt.column(), "updated_at");
        assert_eq!(SortOrder::Asc.keyword(), "ASC");
        assert_eq!(SortOrder::Desc.keyword(), "DESC");
    }
}
