use chrono::Utc;
use serde::Serialize;

use crate::engine::{self, RollFilter, SortSpec};
use crate::roster::{self, AttendanceCounts, RollState, Student};
use crate::session::{RollSession, SessionPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    Loading,
    Loaded,
    Error,
}

#[derive(Debug)]
pub struct BoardError {
    pub code: &'static str,
    pub message: String,
}

impl BoardError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The save request handed to the host when a roll completes. The host
/// posts `payload` to the gateway and reports back with the token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub save_id: String,
    pub payload: SavePayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub students: Vec<Student>,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollView {
    pub phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_save_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_save_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub load_state: LoadPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    pub search: String,
    pub sort: SortSpec,
    pub roll_filter: RollFilter,
    pub roll: RollView,
    pub counts: AttendanceCounts,
    pub total_visible: usize,
    pub students: Vec<Student>,
}

/// The authoritative in-memory state of one home board page: the roster as
/// fetched, the view criteria, and the roll session. The visible list and
/// the counts are never stored; `view()` re-derives both from the source
/// list, so they cannot drift apart.
#[derive(Debug)]
pub struct Board {
    class_name: Option<String>,
    load: LoadPhase,
    load_error: Option<String>,
    generation: u64,
    students: Vec<Student>,
    search: String,
    sort: SortSpec,
    roll_filter: RollFilter,
    session: RollSession,
}

impl Board {
    /// A fresh board opens in the loading phase: the page fetches on mount,
    /// so there is no observable idle state before the first load.
    pub fn open(class_name: Option<String>) -> Self {
        Self {
            class_name,
            load: LoadPhase::Loading,
            load_error: None,
            generation: 0,
            students: Vec::new(),
            search: String::new(),
            sort: SortSpec::default(),
            roll_filter: RollFilter::All,
            session: RollSession::default(),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    fn guard_no_session(&self) -> Result<(), BoardError> {
        match self.session.phase() {
            SessionPhase::Inactive => Ok(()),
            SessionPhase::Active => Err(BoardError::new(
                "roll_active",
                "close the active roll first",
            )),
            SessionPhase::Saving => Err(BoardError::new(
                "save_in_flight",
                "a roll save is outstanding",
            )),
        }
    }

    /// Starts a fetch round. The returned generation must accompany the
    /// matching `loadResult`; any earlier generation is stale from now on.
    pub fn begin_load(&mut self) -> Result<u64, BoardError> {
        self.guard_no_session()?;
        self.generation += 1;
        self.load = LoadPhase::Loading;
        self.load_error = None;
        Ok(self.generation)
    }

    /// Replaces the roster wholesale. Resets the roll-state filter view to
    /// "all" but keeps search and sort: reloading is not a reason to lose
    /// what the user typed into the toolbar. Returns false for a stale
    /// generation, leaving the superseding roster untouched.
    pub fn apply_load(&mut self, generation: u64, students: Vec<Student>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.students = students;
        self.load = LoadPhase::Loaded;
        self.load_error = None;
        self.roll_filter = RollFilter::All;
        true
    }

    pub fn fail_load(&mut self, generation: u64, message: String) -> bool {
        if generation != self.generation {
            return false;
        }
        self.load = LoadPhase::Error;
        self.load_error = Some(message);
        true
    }

    /// Installs a locally generated roster. Bumps the generation so a fetch
    /// still in flight cannot overwrite the seeded list.
    pub fn seed(&mut self, students: Vec<Student>) -> Result<u64, BoardError> {
        self.guard_no_session()?;
        self.generation += 1;
        self.students = students;
        self.load = LoadPhase::Loaded;
        self.load_error = None;
        self.roll_filter = RollFilter::All;
        Ok(self.generation)
    }

    pub fn set_search(&mut self, value: String) {
        self.search = value;
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
    }

    pub fn set_roll_filter(&mut self, filter: RollFilter) {
        self.roll_filter = filter;
    }

    pub fn start_roll(&mut self) -> Result<(), BoardError> {
        match self.session.phase() {
            SessionPhase::Active => {
                return Err(BoardError::new("roll_active", "a roll is already active"))
            }
            SessionPhase::Saving => {
                return Err(BoardError::new(
                    "save_in_flight",
                    "a roll save is outstanding",
                ))
            }
            SessionPhase::Inactive => {}
        }
        if self.load != LoadPhase::Loaded {
            return Err(BoardError::new(
                "not_loaded",
                "load a roster before starting a roll",
            ));
        }
        self.session.start(&self.students);
        // Marking needs the whole searched set on screen.
        self.roll_filter = RollFilter::All;
        Ok(())
    }

    /// Records a roll-state for one student; `None` clears back to unset.
    /// Returns false when the id names nobody on the roster; stale tile
    /// events are dropped, not failed.
    pub fn mark(&mut self, student_id: i64, state: Option<RollState>) -> Result<bool, BoardError> {
        match self.session.phase() {
            SessionPhase::Inactive => {
                return Err(BoardError::new(
                    "no_active_roll",
                    "start a roll before marking attendance",
                ))
            }
            SessionPhase::Saving => {
                return Err(BoardError::new(
                    "save_in_flight",
                    "a roll save is outstanding",
                ))
            }
            SessionPhase::Active => {}
        }
        let Some(student) = self.students.iter_mut().find(|s| s.id == student_id) else {
            return Ok(false);
        };
        student.roll_state = state;
        Ok(true)
    }

    /// Abandons the session and restores every pre-session roll-state.
    pub fn exit_roll(&mut self) -> Result<(), BoardError> {
        match self.session.phase() {
            SessionPhase::Inactive => {
                return Err(BoardError::new("no_active_roll", "no roll to exit"))
            }
            SessionPhase::Saving => {
                return Err(BoardError::new(
                    "save_in_flight",
                    "a roll save is outstanding",
                ))
            }
            SessionPhase::Active => {}
        }
        self.session.rollback(&mut self.students);
        self.roll_filter = RollFilter::All;
        Ok(())
    }

    /// Moves to the saving phase and emits exactly one save request for the
    /// host to deliver. A second complete while one is outstanding is
    /// rejected, not queued.
    pub fn complete_roll(&mut self) -> Result<SaveRequest, BoardError> {
        match self.session.phase() {
            SessionPhase::Inactive => {
                return Err(BoardError::new("no_active_roll", "no roll to complete"))
            }
            SessionPhase::Saving => {
                return Err(BoardError::new(
                    "save_in_flight",
                    "a roll save is already outstanding",
                ))
            }
            SessionPhase::Active => {}
        }
        let save_id = self.session.begin_save();
        Ok(SaveRequest {
            save_id,
            payload: SavePayload {
                students: self.students.clone(),
                completed_at: Utc::now().to_rfc3339(),
            },
        })
    }

    /// Applies the host's report for an outstanding save. A token that does
    /// not match the pending save is ignored (false): it belongs to a
    /// superseded attempt or a board that has since been reopened.
    pub fn resolve_save(&mut self, save_id: &str, ok: bool, error: Option<String>) -> bool {
        if self.session.phase() != SessionPhase::Saving || !self.session.is_current_save(save_id) {
            return false;
        }
        if ok {
            self.session.commit_save();
            self.roll_filter = RollFilter::All;
        } else {
            self.session
                .fail_save(error.unwrap_or_else(|| "save failed".to_string()));
        }
        true
    }

    /// Derives the complete render model. Counts come from the searched set
    /// only: the roll-state filter narrows the list, never the tallies.
    pub fn view(&self) -> BoardView {
        let students =
            engine::derive_visible(&self.students, &self.search, self.sort, self.roll_filter);
        let counts = roster::attendance_counts(
            self.students
                .iter()
                .filter(|s| engine::search_matches(s, &self.search)),
        );
        BoardView {
            load_state: self.load,
            load_error: self.load_error.clone(),
            search: self.search.clone(),
            sort: self.sort,
            roll_filter: self.roll_filter,
            roll: RollView {
                phase: self.session.phase(),
                pending_save_id: self.session.pending_save_id().map(str::to_string),
                last_save_error: self.session.last_save_error().map(str::to_string),
            },
            counts,
            total_visible: students.len(),
            students,
        }
    }
}
