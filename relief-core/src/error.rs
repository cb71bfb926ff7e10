//! Run-level failures. Anything that goes wrong for a single absentee is
//! reported in that absentee's result instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArrangementError {
    #[error("Timetable is empty; nothing to arrange against")]
    EmptyTimetable,
    #[error("Timetable declares no periods")]
    NoPeriods,
}
