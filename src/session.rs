use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::roster::{RollState, Student};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Inactive,
    Active,
    Saving,
}

/// One attendance-taking session. While a roll is open the pre-session
/// roll-states are held here so an exit can restore them exactly; while a
/// save is outstanding the minted token here is the only one a
/// `saveResult` may resolve.
#[derive(Debug, Default)]
pub struct RollSession {
    phase: SessionPhase,
    snapshot: HashMap<i64, Option<RollState>>,
    pending_save: Option<String>,
    last_save_error: Option<String>,
}

impl RollSession {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn pending_save_id(&self) -> Option<&str> {
        self.pending_save.as_deref()
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Opens the session and captures every student's current roll-state.
    pub fn start(&mut self, students: &[Student]) {
        self.snapshot = students.iter().map(|s| (s.id, s.roll_state)).collect();
        self.phase = SessionPhase::Active;
        self.pending_save = None;
        self.last_save_error = None;
    }

    /// Closes the session, restoring the roll-states captured at start.
    pub fn rollback(&mut self, students: &mut [Student]) {
        for student in students.iter_mut() {
            if let Some(previous) = self.snapshot.get(&student.id) {
                student.roll_state = *previous;
            }
        }
        self.reset();
    }

    /// Moves into the saving phase and mints the token the host must echo
    /// back in `saveResult`.
    pub fn begin_save(&mut self) -> String {
        let save_id = Uuid::new_v4().to_string();
        self.pending_save = Some(save_id.clone());
        self.phase = SessionPhase::Saving;
        self.last_save_error = None;
        save_id
    }

    pub fn is_current_save(&self, save_id: &str) -> bool {
        self.pending_save.as_deref() == Some(save_id)
    }

    /// The save was acknowledged: edits are committed, the session ends.
    pub fn commit_save(&mut self) {
        self.reset();
    }

    /// The save failed: the session returns to active with edits and the
    /// snapshot intact, so the user can retry or exit.
    pub fn fail_save(&mut self, message: String) {
        self.pending_save = None;
        self.phase = SessionPhase::Active;
        self.last_save_error = Some(message);
    }

    fn reset(&mut self) {
        self.phase = SessionPhase::Inactive;
        self.snapshot.clear();
        self.pending_save = None;
        self.last_save_error = None;
    }
}
