//! relief-core: substitute-teacher assignment engine

pub mod arrangement;
pub mod category;
pub mod error;
pub mod filter;
pub mod grade;
pub mod notify;
pub mod pipeline;
pub mod subjects;
pub mod timetable;
pub mod workload;

pub use arrangement::{
    ArrangementEngine, AssignmentResult, AssignmentStatus, BusySet, Replacement, RunState,
    UnassignedReason,
};
pub use category::Category;
pub use error::ArrangementError;
pub use filter::CandidateFilter;
pub use grade::{extract_class_level, extract_grade, Grade, GradeBand};
pub use notify::{group_by_replacement, ReplacementDigest};
pub use pipeline::{build_pipeline, AbsenceContext, CustomRule, SearchCriterion, SubjectMatch};
pub use subjects::{Stream, SubjectCatalog, SubjectMapping};
pub use timetable::{teacher_key, PeriodSlot, TeacherProfile, Timetable};
pub use workload::{daily_workload_map, rank, InMemoryLedger, RankedCandidate, WorkloadLedger, WorkloadMap};
