use serde::{Deserialize, Serialize};

/// A student's recorded attendance value for the current roll. Absence of a
/// value means the student has not been marked this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollState {
    Present,
    Absent,
    Late,
}

impl RollState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_state: Option<RollState>,
}

impl Student {
    /// "First Last", the display form the board tiles render.
    #[allow(dead_code)]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceCounts {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
}

impl AttendanceCounts {
    /// Unmarked students contribute to none of the buckets, so this is at
    /// most the size of the set the counts were derived from.
    #[allow(dead_code)]
    pub fn total_marked(&self) -> usize {
        self.present + self.absent + self.late
    }
}

pub fn attendance_counts<'a, I>(students: I) -> AttendanceCounts
where
    I: IntoIterator<Item = &'a Student>,
{
    let mut counts = AttendanceCounts::default();
    for student in students {
        match student.roll_state {
            Some(RollState::Present) => counts.present += 1,
            Some(RollState::Absent) => counts.absent += 1,
            Some(RollState::Late) => counts.late += 1,
            None => {}
        }
    }
    counts
}
