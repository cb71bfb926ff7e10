//! Daily timetable model: one row per teacher, one slot per period.

use crate::category::{normalize_category_label, Category};
use crate::grade::{extract_grade, Grade};
use crate::subjects::split_subjects;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodSlot {
    Free,
    /// Opaque class-info text, e.g. "IX-B MATHS".
    Class(String),
}

impl PeriodSlot {
    /// Blank cells and the "FREE"/"NAN" markers left by spreadsheet exports are free.
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("FREE") || t.eq_ignore_ascii_case("NAN") {
            PeriodSlot::Free
        } else {
            PeriodSlot::Class(t.to_string())
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, PeriodSlot::Free)
    }

    pub fn class_info(&self) -> Option<&str> {
        match self {
            PeriodSlot::Free => None,
            PeriodSlot::Class(info) => Some(info),
        }
    }
}

/// Case-insensitive lookup key for teacher ids.
pub fn teacher_key(id: &str) -> String {
    id.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub teacher_id: String,
    pub name: String,
    /// `None` when the raw category is not one of the three tiers.
    pub category: Option<Category>,
    /// Normalized raw category, kept for display.
    pub category_label: String,
    pub subjects: Vec<String>,
    /// Index 0 is period 1.
    pub periods: Vec<PeriodSlot>,
}

impl TeacherProfile {
    pub fn new(teacher_id: impl Into<String>, name: impl Into<String>, category: &str) -> Self {
        Self {
            teacher_id: teacher_id.into().trim().to_string(),
            name: name.into().trim().to_string(),
            category: Category::parse(category),
            category_label: normalize_category_label(category),
            subjects: Vec::new(),
            periods: Vec::new(),
        }
    }

    /// Subjects from a comma-separated cell.
    pub fn with_subjects(mut self, subjects: &str) -> Self {
        self.subjects = split_subjects(subjects);
        self
    }

    /// Set period `period` (1-based), growing the row with free slots as needed.
    pub fn with_period(mut self, period: u8, class_info: &str) -> Self {
        self.set_period(period, PeriodSlot::parse(class_info));
        self
    }

    pub fn set_period(&mut self, period: u8, slot: PeriodSlot) {
        if period == 0 {
            return;
        }
        let idx = usize::from(period - 1);
        if self.periods.len() <= idx {
            self.periods.resize(idx + 1, PeriodSlot::Free);
        }
        self.periods[idx] = slot;
    }

    pub fn key(&self) -> String {
        teacher_key(&self.teacher_id)
    }

    /// Slot for a 1-based period; periods past the end of the row are free.
    pub fn slot(&self, period: u8) -> &PeriodSlot {
        static FREE: PeriodSlot = PeriodSlot::Free;
        if period == 0 {
            return &FREE;
        }
        self.periods.get(usize::from(period - 1)).unwrap_or(&FREE)
    }

    pub fn is_free(&self, period: u8) -> bool {
        self.slot(period).is_free()
    }

    /// Own teaching load for the day: non-free periods.
    pub fn daily_workload(&self) -> u32 {
        self.periods.iter().filter(|p| !p.is_free()).count() as u32
    }

    /// Does any scheduled class of this teacher fall in one of `grades`?
    pub fn teaches_any_grade(&self, grades: &[Grade]) -> bool {
        self.periods
            .iter()
            .filter_map(PeriodSlot::class_info)
            .filter_map(extract_grade)
            .any(|g| grades.contains(&g))
    }
}

/// One school's timetable for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    pub period_count: u8,
    pub teachers: Vec<TeacherProfile>,
}

impl Timetable {
    pub fn new(period_count: u8, teachers: Vec<TeacherProfile>) -> Self {
        Self {
            period_count,
            teachers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.teachers.len()
    }

    pub fn find(&self, teacher_id: &str) -> Option<&TeacherProfile> {
        let key = teacher_key(teacher_id);
        self.teachers.iter().find(|t| t.key() == key)
    }

    /// Teachers free in `period`, in timetable order.
    pub fn free_in(&self, period: u8) -> impl Iterator<Item = &TeacherProfile> {
        self.teachers.iter().filter(move |t| t.is_free(period))
    }
}
