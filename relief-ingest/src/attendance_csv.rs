//! Attendance sheet: `teacher_id,date,status` rows, dates as YYYY-MM-DD.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use relief_core::{teacher_key, Timetable};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct AttendanceRow {
    teacher_id: String,
    date: String,
    status: String,
}

/// Rows dated `date`, in file order. Rows with an unparseable date are skipped.
fn rows_on<R: Read>(reader: R, date: NaiveDate) -> Result<Vec<AttendanceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for (row, result) in rdr.deserialize::<AttendanceRow>().enumerate() {
        let record = result.with_context(|| format!("reading attendance row {}", row + 2))?;
        let row_date = match NaiveDate::parse_from_str(&record.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                warn!(row = row + 2, date = %record.date, "Skipping attendance row with unparseable date");
                continue;
            }
        };
        if row_date == date && !record.teacher_id.is_empty() {
            out.push(record);
        }
    }
    Ok(out)
}

/// Ids marked absent on `date`, in file order, each once.
pub fn absentees_on<R: Read>(reader: R, date: NaiveDate) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    Ok(rows_on(reader, date)?
        .into_iter()
        .filter(|r| r.status.eq_ignore_ascii_case("absent"))
        .filter(|r| seen.insert(teacher_key(&r.teacher_id)))
        .map(|r| r.teacher_id)
        .collect())
}

/// Result of auto-marking one school day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoMark {
    Sunday,
    /// Nobody was marked present, so the day is treated as a holiday.
    Holiday,
    Absent(Vec<String>),
}

/// Absentees for `date` when unmarked teachers count as absent.
///
/// Explicit ABSENT rows come first in file order, followed by every
/// timetable teacher without a row for the day, in timetable order.
pub fn auto_mark_absentees<R: Read>(reader: R, date: NaiveDate, timetable: &Timetable) -> Result<AutoMark> {
    if date.weekday() == Weekday::Sun {
        return Ok(AutoMark::Sunday);
    }
    let rows = rows_on(reader, date)?;
    if !rows.iter().any(|r| r.status.eq_ignore_ascii_case("present")) {
        return Ok(AutoMark::Holiday);
    }

    let marked: HashSet<String> = rows.iter().map(|r| teacher_key(&r.teacher_id)).collect();
    let mut seen = HashSet::new();
    let mut absent = Vec::new();
    for row in rows.iter().filter(|r| r.status.eq_ignore_ascii_case("absent")) {
        if seen.insert(teacher_key(&row.teacher_id)) {
            absent.push(row.teacher_id.clone());
        }
    }
    let mut unmarked = 0usize;
    for teacher in &timetable.teachers {
        let key = teacher.key();
        if !marked.contains(&key) && seen.insert(key) {
            absent.push(teacher.teacher_id.clone());
            unmarked += 1;
        }
    }
    if unmarked > 0 {
        info!(date = %date, unmarked, "Marked teachers without attendance as absent");
    }
    Ok(AutoMark::Absent(absent))
}

pub fn load_absentees(path: impl AsRef<Path>, date: NaiveDate) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    absentees_on(file, date).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_auto_marked(path: impl AsRef<Path>, date: NaiveDate, timetable: &Timetable) -> Result<AutoMark> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    auto_mark_absentees(file, date, timetable).with_context(|| format!("parsing {}", path.display()))
}
