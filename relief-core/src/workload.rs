//! Workload ranking.
//!
//! Two measures decide who covers a class: today's own teaching load
//! (scanned from the timetable, never stored) and the historical count of
//! substitutions, which lives with the caller behind [`WorkloadLedger`].

use crate::timetable::{teacher_key, TeacherProfile, Timetable};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Keyed by [`teacher_key`].
pub type WorkloadMap = HashMap<String, u32>;

/// Storage for cumulative substitution counts.
///
/// The engine reads counts while ranking and calls
/// [`record_substitution`](WorkloadLedger::record_substitution) once per
/// successful assignment.
pub trait WorkloadLedger {
    fn historical(&self, teacher_ids: &[&str]) -> Result<WorkloadMap>;
    fn record_substitution(&mut self, teacher_id: &str) -> Result<()>;
}

impl<L: WorkloadLedger + ?Sized> WorkloadLedger for &mut L {
    fn historical(&self, teacher_ids: &[&str]) -> Result<WorkloadMap> {
        (**self).historical(teacher_ids)
    }

    fn record_substitution(&mut self, teacher_id: &str) -> Result<()> {
        (**self).record_substitution(teacher_id)
    }
}

/// Ledger held in memory; serializable so callers can persist it between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    counts: BTreeMap<String, u32>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, teacher_id: &str, count: u32) -> Self {
        self.counts.insert(teacher_key(teacher_id), count);
        self
    }

    pub fn count(&self, teacher_id: &str) -> u32 {
        self.counts.get(&teacher_key(teacher_id)).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }

    pub fn reset(&mut self) {
        self.counts.clear();
    }
}

impl WorkloadLedger for InMemoryLedger {
    fn historical(&self, teacher_ids: &[&str]) -> Result<WorkloadMap> {
        Ok(teacher_ids
            .iter()
            .map(|id| (teacher_key(id), self.count(id)))
            .collect())
    }

    fn record_substitution(&mut self, teacher_id: &str) -> Result<()> {
        *self.counts.entry(teacher_key(teacher_id)).or_insert(0) += 1;
        Ok(())
    }
}

/// Own-class count for every teacher in the timetable.
pub fn daily_workload_map(timetable: &Timetable) -> WorkloadMap {
    timetable
        .teachers
        .iter()
        .map(|t| (t.key(), t.daily_workload()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate<'t> {
    pub teacher: &'t TeacherProfile,
    pub daily: u32,
    pub historical: u32,
}

/// Order candidates by (daily load, historical load, name), least loaded first.
///
/// Missing map entries count as zero. The teacher id breaks any remaining tie
/// so identical inputs always rank identically.
pub fn rank<'t>(
    pool: &[&'t TeacherProfile],
    daily: &WorkloadMap,
    historical: &WorkloadMap,
) -> Vec<RankedCandidate<'t>> {
    let mut ranked: Vec<RankedCandidate<'t>> = pool
        .iter()
        .map(|&t| {
            let key = t.key();
            RankedCandidate {
                teacher: t,
                daily: daily.get(&key).copied().unwrap_or(0),
                historical: historical.get(&key).copied().unwrap_or(0),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.daily
            .cmp(&b.daily)
            .then_with(|| a.historical.cmp(&b.historical))
            .then_with(|| a.teacher.name.cmp(&b.teacher.name))
            .then_with(|| a.teacher.teacher_id.cmp(&b.teacher.teacher_id))
    });
    ranked
}
