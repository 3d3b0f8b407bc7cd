use serde::{Deserialize, Serialize};

use crate::roster::{RollState, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    None,
    FirstName,
    LastName,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::None),
            "firstName" => Some(Self::FirstName),
            "lastName" => Some(Self::LastName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::None,
            direction: SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollFilter {
    All,
    Present,
    Absent,
    Late,
}

impl RollFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(Self::All),
            other => RollState::parse(other).map(Self::from),
        }
    }

    /// Students with no recorded roll-state never match a concrete value.
    pub fn matches(self, student: &Student) -> bool {
        match self {
            Self::All => true,
            Self::Present => student.roll_state == Some(RollState::Present),
            Self::Absent => student.roll_state == Some(RollState::Absent),
            Self::Late => student.roll_state == Some(RollState::Late),
        }
    }
}

impl From<RollState> for RollFilter {
    fn from(state: RollState) -> Self {
        match state {
            RollState::Present => Self::Present,
            RollState::Absent => Self::Absent,
            RollState::Late => Self::Late,
        }
    }
}

/// Case-insensitive substring match on either name. The search string is
/// taken verbatim: only the truly empty string passes everything through,
/// so a whitespace-only search is still a search.
pub fn search_matches(student: &Student, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    student.first_name.to_lowercase().contains(&needle)
        || student.last_name.to_lowercase().contains(&needle)
}

/// Canonical derivation pipeline: search, then roll-state filter, then sort.
/// The input order is the fetch order and ties keep it (stable sort), so
/// re-sorting with identical keys never reshuffles the list.
pub fn derive_visible(
    full: &[Student],
    search: &str,
    sort: SortSpec,
    roll_filter: RollFilter,
) -> Vec<Student> {
    let mut visible: Vec<Student> = full
        .iter()
        .filter(|s| search_matches(s, search))
        .filter(|s| roll_filter.matches(s))
        .cloned()
        .collect();

    match sort.field {
        SortField::None => {}
        SortField::FirstName => sort_by_name(&mut visible, sort.direction, |s| s.first_name.as_str()),
        SortField::LastName => sort_by_name(&mut visible, sort.direction, |s| s.last_name.as_str()),
    }
    visible
}

fn sort_by_name<F>(students: &mut [Student], direction: SortDirection, field: F)
where
    F: Fn(&Student) -> &str,
{
    students.sort_by(|a, b| {
        let ord = field(a).to_lowercase().cmp(&field(b).to_lowercase());
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}
