//! Period assignment orchestrator.
//!
//! Walks periods 1..=N. Within a period every absent teacher with a class is
//! covered in absentee-list order; a replacement chosen for one absentee is
//! unavailable to the rest of that period, and only that period.

use crate::error::ArrangementError;
use crate::filter::CandidateFilter;
use crate::grade::extract_grade;
use crate::pipeline::{build_pipeline, AbsenceContext, CustomRule};
use crate::subjects::SubjectCatalog;
use crate::timetable::{teacher_key, TeacherProfile, Timetable};
use crate::workload::{daily_workload_map, rank, WorkloadLedger, WorkloadMap};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Teachers already handed a substitution in one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusySet {
    period: u8,
    ids: BTreeSet<String>,
}

impl BusySet {
    pub fn new(period: u8) -> Self {
        Self {
            period,
            ids: BTreeSet::new(),
        }
    }

    pub fn period(&self) -> u8 {
        self.period
    }

    pub fn contains(&self, teacher_id: &str) -> bool {
        self.ids.contains(&teacher_key(teacher_id))
    }

    pub fn insert(&mut self, teacher_id: &str) {
        self.ids.insert(teacher_key(teacher_id));
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    ProcessingPeriod(u8),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnassignedReason {
    NotInSchedule,
    NoFreeTeachers,
    NoSuitableReplacement,
    ErrorOccurred,
}

impl UnassignedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            UnassignedReason::NotInSchedule => "Teacher Not in Schedule",
            UnassignedReason::NoFreeTeachers => "No Free Teachers",
            UnassignedReason::NoSuitableReplacement => "No Suitable Replacement",
            UnassignedReason::ErrorOccurred => "Error Occurred",
        }
    }
}

impl fmt::Display for UnassignedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Assigned,
    Unassigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub teacher_id: String,
    pub name: String,
    pub category: String,
}

/// One (absent teacher, period) outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub absent_teacher_id: String,
    pub absent_name: String,
    pub absent_category: String,
    pub replacement: Option<Replacement>,
    /// `None` only for the summary row of an absentee missing from the timetable.
    pub period: Option<u8>,
    pub class_info: Option<String>,
    pub status: AssignmentStatus,
    /// Tier label on success, reason text otherwise.
    pub quality: String,
    pub reason: Option<UnassignedReason>,
}

impl AssignmentResult {
    fn assigned(absent: &TeacherProfile, period: u8, class_info: &str, with: &TeacherProfile, quality: &str) -> Self {
        Self {
            absent_teacher_id: absent.teacher_id.clone(),
            absent_name: absent.name.clone(),
            absent_category: absent.category_label.clone(),
            replacement: Some(Replacement {
                teacher_id: with.teacher_id.clone(),
                name: with.name.clone(),
                category: with.category_label.clone(),
            }),
            period: Some(period),
            class_info: Some(class_info.to_string()),
            status: AssignmentStatus::Assigned,
            quality: quality.to_string(),
            reason: None,
        }
    }

    fn unassigned(absent: &TeacherProfile, period: u8, class_info: &str, reason: UnassignedReason) -> Self {
        Self {
            absent_teacher_id: absent.teacher_id.clone(),
            absent_name: absent.name.clone(),
            absent_category: absent.category_label.clone(),
            replacement: None,
            period: Some(period),
            class_info: Some(class_info.to_string()),
            status: AssignmentStatus::Unassigned,
            quality: reason.to_string(),
            reason: Some(reason),
        }
    }

    fn not_in_schedule(teacher_id: &str) -> Self {
        let reason = UnassignedReason::NotInSchedule;
        Self {
            absent_teacher_id: teacher_id.to_string(),
            absent_name: teacher_id.to_string(),
            absent_category: String::new(),
            replacement: None,
            period: None,
            class_info: None,
            status: AssignmentStatus::Unassigned,
            quality: reason.to_string(),
            reason: Some(reason),
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.status == AssignmentStatus::Assigned
    }
}

/// Substitute assignment for one school and one day.
///
/// The engine borrows its inputs and owns the ledger; pass `&mut ledger` to
/// keep ownership with the caller.
pub struct ArrangementEngine<'a, L: WorkloadLedger> {
    catalog: &'a SubjectCatalog,
    timetable: &'a Timetable,
    custom_rules: &'a [CustomRule],
    ledger: L,
    absentees: Vec<&'a TeacherProfile>,
    absent_keys: BTreeSet<String>,
    daily: WorkloadMap,
    state: RunState,
    results: Vec<AssignmentResult>,
}

impl<'a, L: WorkloadLedger> ArrangementEngine<'a, L> {
    pub fn new(catalog: &'a SubjectCatalog, timetable: &'a Timetable, ledger: L) -> Self {
        Self {
            catalog,
            timetable,
            custom_rules: &[],
            ledger,
            absentees: Vec::new(),
            absent_keys: BTreeSet::new(),
            daily: WorkloadMap::new(),
            state: RunState::NotStarted,
            results: Vec::new(),
        }
    }

    /// School-configured rules; when non-empty they replace the built-in tiers.
    pub fn with_custom_rules(mut self, rules: &'a [CustomRule]) -> Self {
        self.custom_rules = rules;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Results recorded so far.
    pub fn results(&self) -> &[AssignmentResult] {
        &self.results
    }

    /// Reset the run for a new absentee list.
    ///
    /// Duplicate ids are kept once. Ids missing from the timetable get a
    /// single summary result up front and take no further part.
    pub fn begin<S: AsRef<str>>(&mut self, absent_ids: &[S]) -> Result<(), ArrangementError> {
        if self.timetable.is_empty() {
            return Err(ArrangementError::EmptyTimetable);
        }
        if self.timetable.period_count == 0 {
            return Err(ArrangementError::NoPeriods);
        }

        self.state = RunState::NotStarted;
        self.results.clear();
        self.absentees.clear();
        self.absent_keys.clear();
        self.daily = daily_workload_map(self.timetable);

        let timetable = self.timetable;
        for raw in absent_ids {
            let id = raw.as_ref().trim();
            if id.is_empty() || !self.absent_keys.insert(teacher_key(id)) {
                continue;
            }
            match timetable.find(id) {
                Some(profile) => self.absentees.push(profile),
                None => {
                    warn!(teacher_id = id, "Absent teacher not found in timetable");
                    self.results.push(AssignmentResult::not_in_schedule(id));
                }
            }
        }

        info!(
            absentees = self.absentees.len(),
            periods = timetable.period_count,
            teachers = timetable.len(),
            "Arrangement run started"
        );
        Ok(())
    }

    /// Move to the next state, processing one period on the way.
    pub fn advance(&mut self) -> RunState {
        let next = match self.state {
            RunState::NotStarted => RunState::ProcessingPeriod(1),
            RunState::ProcessingPeriod(p) if p < self.timetable.period_count => RunState::ProcessingPeriod(p + 1),
            _ => RunState::Done,
        };
        if let RunState::ProcessingPeriod(p) = next {
            let busy = self.process_period(p);
            debug!(period = busy.period(), assigned = busy.len(), "Period complete");
        } else if self.state != RunState::Done {
            let assigned = self.results.iter().filter(|r| r.is_assigned()).count();
            info!(results = self.results.len(), assigned, "Arrangement run finished");
        }
        self.state = next;
        next
    }

    /// Full run: `begin` then `advance` until done.
    pub fn run<S: AsRef<str>>(&mut self, absent_ids: &[S]) -> Result<Vec<AssignmentResult>, ArrangementError> {
        self.begin(absent_ids)?;
        while self.advance() != RunState::Done {}
        Ok(std::mem::take(&mut self.results))
    }

    fn process_period(&mut self, period: u8) -> BusySet {
        let mut busy = BusySet::new(period);
        let absentees = self.absentees.clone();
        for absent in absentees {
            let Some(class_info) = absent.slot(period).class_info() else {
                continue;
            };
            let result = match self.cover(absent, period, class_info, &busy) {
                Ok(result) => result,
                Err(err) => {
                    error!(
                        teacher_id = %absent.teacher_id,
                        period,
                        error = %err,
                        "Failed to arrange substitute"
                    );
                    AssignmentResult::unassigned(absent, period, class_info, UnassignedReason::ErrorOccurred)
                }
            };
            if let Some(rep) = &result.replacement {
                busy.insert(&rep.teacher_id);
            }
            self.results.push(result);
        }
        busy
    }

    fn cover(
        &mut self,
        absent: &TeacherProfile,
        period: u8,
        class_info: &str,
        busy: &BusySet,
    ) -> Result<AssignmentResult> {
        let timetable = self.timetable;
        let pool: Vec<&TeacherProfile> = timetable
            .free_in(period)
            .filter(|t| !self.absent_keys.contains(&t.key()) && !busy.contains(&t.teacher_id))
            .collect();
        if pool.is_empty() {
            debug!(teacher_id = %absent.teacher_id, period, "No free teachers");
            return Ok(AssignmentResult::unassigned(
                absent,
                period,
                class_info,
                UnassignedReason::NoFreeTeachers,
            ));
        }

        let ctx = AbsenceContext {
            category: absent.category,
            subject: self.catalog.extract_subject_from_class_info(class_info),
            grade: extract_grade(class_info),
        };
        let tiers = build_pipeline(self.catalog, &ctx, self.custom_rules);
        let filter = CandidateFilter::new(self.catalog);

        for tier in tiers.iter().filter(|t| t.condition) {
            let candidates = filter.apply(&pool, tier);
            debug!(
                teacher_id = %absent.teacher_id,
                period,
                tier = %tier.quality,
                candidates = candidates.len(),
                "Trying tier"
            );
            if candidates.is_empty() {
                continue;
            }
            let ids: Vec<&str> = candidates.iter().map(|t| t.teacher_id.as_str()).collect();
            let historical = self.ledger.historical(&ids)?;
            let Some(best) = rank(&candidates, &self.daily, &historical).first().map(|r| r.teacher) else {
                continue;
            };

            self.ledger.record_substitution(&best.teacher_id)?;
            info!(
                absent = %absent.teacher_id,
                replacement = %best.teacher_id,
                period,
                quality = %tier.quality,
                "Substitute assigned"
            );
            return Ok(AssignmentResult::assigned(absent, period, class_info, best, &tier.quality));
        }

        debug!(teacher_id = %absent.teacher_id, period, "Every tier exhausted");
        Ok(AssignmentResult::unassigned(
            absent,
            period,
            class_info,
            UnassignedReason::NoSuitableReplacement,
        ))
    }
}
