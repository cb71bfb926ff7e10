//! relief-ingest: loaders for timetables, attendance sheets and school rule sets.

pub mod attendance_csv;
pub mod rules;
pub mod timetable_csv;

pub use attendance_csv::{absentees_on, auto_mark_absentees, load_absentees, load_auto_marked, AutoMark};
pub use rules::{load_rules, parse_rules_json};
pub use timetable_csv::{load_timetable, parse_timetable_csv};
