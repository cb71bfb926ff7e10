//! Parse one weekday's timetable export.
//!
//! Expected header:
//! teacher_id,name,category,classes,subject,period1,period2,...
//!
//! Period columns may be named anything containing the period number
//! ("period1", "P 2", "3"). Cells that are blank or "FREE" are free periods.

use anyhow::{bail, Context, Result};
use regex::Regex;
use relief_core::{teacher_key, PeriodSlot, TeacherProfile, Timetable};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const FIXED_COLUMNS: usize = 5;

/// Parse a timetable CSV from any reader.
pub fn parse_timetable_csv<R: Read>(reader: R) -> Result<Timetable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("reading timetable header")?.clone();
    if headers.len() <= FIXED_COLUMNS {
        bail!(
            "timetable header has {} columns; expected teacher_id,name,category,classes,subject followed by period columns",
            headers.len()
        );
    }

    let number_re = Regex::new(r"\d+")?;
    let mut period_columns: Vec<(usize, u8)> = Vec::new();
    for (idx, name) in headers.iter().enumerate().skip(FIXED_COLUMNS) {
        let Some(m) = number_re.find(name) else {
            bail!("period column {name:?} carries no period number");
        };
        let period: u8 = m
            .as_str()
            .parse()
            .with_context(|| format!("period number in column {name:?}"))?;
        if period == 0 {
            bail!("period column {name:?} has period number 0");
        }
        period_columns.push((idx, period));
    }
    let period_count = period_columns.iter().map(|(_, p)| *p).max().unwrap_or(0);

    let mut seen = HashSet::new();
    let mut teachers = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading timetable row {}", row + 2))?;
        let teacher_id = record.get(0).unwrap_or("");
        if teacher_id.is_empty() {
            debug!(row = row + 2, "Skipping timetable row without teacher id");
            continue;
        }
        if !seen.insert(teacher_key(teacher_id)) {
            warn!(teacher_id, "Duplicate timetable row; keeping the first");
            continue;
        }

        let mut teacher = TeacherProfile::new(
            teacher_id,
            record.get(1).unwrap_or(""),
            record.get(2).unwrap_or(""),
        )
        .with_subjects(record.get(4).unwrap_or(""));
        for (idx, period) in &period_columns {
            teacher.set_period(*period, PeriodSlot::parse(record.get(*idx).unwrap_or("")));
        }
        teachers.push(teacher);
    }

    Ok(Timetable::new(period_count, teachers))
}

/// Load a timetable CSV from disk.
pub fn load_timetable(path: impl AsRef<Path>) -> Result<Timetable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_timetable_csv(file).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_core::Category;

    const SAMPLE: &str = "\
teacher_id,name,category,classes,subject,period1,period2,period3
T01,Asha Rao,P.R.T,I-II,\"Maths, EVS\",II MATH,FREE,
T02,Bilal Khan,TGT,VI-X,Science,,IX-A SCIENCE,VII SCIENCE
,Orphan,PRT,,,I MATH,,
t01,Duplicate,PGT,,,XI MATH,,
";

    #[test]
    fn parses_rows_and_periods() {
        let tt = parse_timetable_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tt.period_count, 3);
        assert_eq!(tt.len(), 2);

        let asha = tt.find("T01").unwrap();
        assert_eq!(asha.name, "Asha Rao");
        assert_eq!(asha.category, Some(Category::Primary));
        assert_eq!(asha.subjects, vec!["Maths", "EVS"]);
        assert_eq!(asha.slot(1).class_info(), Some("II MATH"));
        assert!(asha.is_free(2));
        assert!(asha.is_free(3));

        let bilal = tt.find("T02").unwrap();
        assert!(bilal.is_free(1));
        assert_eq!(bilal.daily_workload(), 2);
    }

    #[test]
    fn period_numbers_come_from_header_digits() {
        let csv = "teacher_id,name,category,classes,subject,P 2,P 4\nT1,A,PRT,,,I EVS,II EVS\n";
        let tt = parse_timetable_csv(csv.as_bytes()).unwrap();
        assert_eq!(tt.period_count, 4);
        let t = tt.find("T1").unwrap();
        assert!(t.is_free(1));
        assert_eq!(t.slot(4).class_info(), Some("II EVS"));
    }

    #[test]
    fn rejects_headers_without_periods() {
        let err = parse_timetable_csv("teacher_id,name,category,classes,subject\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("period columns"));

        let err = parse_timetable_csv("teacher_id,name,category,classes,subject,lunch\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("lunch"));
    }
}
