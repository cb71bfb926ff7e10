//! One school's arrangement for one date: load inputs, run the engine,
//! persist the ledger.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use relief_core::{ArrangementEngine, AssignmentResult, CustomRule, SubjectCatalog, Timetable};
use relief_ingest::{load_absentees, load_auto_marked, load_rules, load_timetable, AutoMark};
use std::path::PathBuf;
use tracing::info;

use crate::config::{weekday_name, Config, SchoolSection};
use crate::state::{load_ledger, save_ledger, Suspensions};

/// Where today's absentees come from.
#[derive(Debug, Clone)]
pub enum AbsenceSource {
    Ids(Vec<String>),
    Attendance(PathBuf),
    /// Attendance sheet where teachers without a row for the day are absent.
    AutoMark(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ArrangeJob {
    pub school_id: String,
    pub date: NaiveDate,
    pub timetable: PathBuf,
    pub absences: AbsenceSource,
    pub rules: Option<PathBuf>,
    pub periods: Option<u8>,
}

#[derive(Debug)]
pub enum Outcome {
    Suspended,
    /// Sunday, or nobody marked present under auto-marking.
    Holiday,
    NoAbsentees,
    Arranged(Vec<AssignmentResult>),
}

impl ArrangeJob {
    /// Job for a configured school, reading that weekday's timetable file.
    pub fn for_school(cfg: &Config, school: &SchoolSection, date: NaiveDate) -> Result<Self> {
        let attendance = school
            .attendance_csv
            .clone()
            .with_context(|| format!("school {} has no attendance_csv configured", school.id))?;
        Ok(Self {
            school_id: school.id.clone(),
            date,
            timetable: school.timetable_for(date.weekday()),
            absences: if school.auto_mark {
                AbsenceSource::AutoMark(attendance)
            } else {
                AbsenceSource::Attendance(attendance)
            },
            rules: school.rules.clone(),
            periods: cfg.general.periods,
        })
    }

    pub fn run(&self, catalog: &SubjectCatalog) -> Result<Outcome> {
        if Suspensions::load()?.is_suspended(&self.school_id, self.date) {
            info!(school = %self.school_id, date = %self.date, "Arrangements suspended");
            return Ok(Outcome::Suspended);
        }

        let (absent, loaded) = match &self.absences {
            AbsenceSource::Ids(ids) => (ids.clone(), None),
            AbsenceSource::Attendance(path) => (load_absentees(path, self.date)?, None),
            AbsenceSource::AutoMark(path) => {
                if self.date.weekday() == Weekday::Sun {
                    info!(school = %self.school_id, date = %self.date, "Sunday, skipping auto-marking");
                    return Ok(Outcome::Holiday);
                }
                let timetable = self.load_timetable()?;
                match load_auto_marked(path, self.date, &timetable)? {
                    AutoMark::Absent(ids) => (ids, Some(timetable)),
                    AutoMark::Sunday | AutoMark::Holiday => {
                        info!(school = %self.school_id, date = %self.date, "Nobody marked present, assuming holiday");
                        return Ok(Outcome::Holiday);
                    }
                }
            }
        };
        if absent.is_empty() {
            info!(school = %self.school_id, date = %self.date, "No absentees");
            return Ok(Outcome::NoAbsentees);
        }

        let timetable = match loaded {
            Some(t) => t,
            None => self.load_timetable()?,
        };
        let rules: Vec<CustomRule> = match &self.rules {
            Some(path) => load_rules(path)?,
            None => Vec::new(),
        };

        let mut ledger = load_ledger(&self.school_id)?;
        let results = ArrangementEngine::new(catalog, &timetable, &mut ledger)
            .with_custom_rules(&rules)
            .run(absent.as_slice())
            .with_context(|| format!("arranging {} on {}", self.school_id, self.date))?;
        save_ledger(&self.school_id, &ledger)?;

        Ok(Outcome::Arranged(results))
    }

    fn load_timetable(&self) -> Result<Timetable> {
        let mut timetable = load_timetable(&self.timetable).with_context(|| {
            format!("{} timetable for {}", weekday_name(self.date.weekday()), self.school_id)
        })?;
        if let Some(periods) = self.periods {
            timetable.period_count = periods;
        }
        Ok(timetable)
    }
}
