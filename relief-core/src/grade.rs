//! Grade tokens and grade bands extracted from free-text class cells.
//!
//! Timetables mix roman and decimal notation ("IX-B MATHS", "9A Maths"), so
//! both are folded into [`Grade`] before any comparison.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

const ROMAN: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

/// A school grade, 1 through 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Grade::new(n).ok_or_else(|| format!("grade {n} outside 1..=12"))
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> u8 {
        grade.0
    }
}

impl Grade {
    pub fn new(n: u8) -> Option<Self> {
        (1..=12).contains(&n).then_some(Grade(n))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn roman(self) -> &'static str {
        ROMAN[usize::from(self.0 - 1)]
    }

    /// Parse a bare token: "IX", "9", "9A".
    pub fn from_token(token: &str) -> Option<Self> {
        let t = token.trim().to_uppercase();
        if let Some(pos) = ROMAN.iter().position(|r| *r == t) {
            return Grade::new(pos as u8 + 1);
        }
        let digits: String = t.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse::<u8>().ok().and_then(Grade::new)
    }

    pub fn band(self) -> GradeBand {
        match self.0 {
            1..=5 => GradeBand::Primary,
            6..=8 => GradeBand::Middle,
            9 | 10 => GradeBand::Secondary,
            _ => GradeBand::SeniorSecondary,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.roman())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeBand {
    Primary,
    Middle,
    Secondary,
    SeniorSecondary,
}

fn grade_regex() -> &'static Regex {
    static GRADE_RE: OnceLock<Regex> = OnceLock::new();
    GRADE_RE.get_or_init(|| {
        // Roman numerals must stand alone ("IT" is a subject, not grade I);
        // decimal grades may carry a section letter ("9A").
        Regex::new(r"\b(?:(XII|XI|IX|X|VIII|VII|VI|IV|V|III|II|I)|(1[0-2]|[1-9])[A-Z]?)\b")
            .expect("grade pattern is valid")
    })
}

/// First grade token found in a class-info cell.
pub fn extract_grade(class_info: &str) -> Option<Grade> {
    let upper = class_info.trim().to_uppercase();
    let caps = grade_regex().captures(&upper)?;
    let token = caps.get(1).or_else(|| caps.get(2))?;
    Grade::from_token(token.as_str())
}

pub fn extract_class_level(class_info: &str) -> Option<GradeBand> {
    extract_grade(class_info).map(Grade::band)
}

/// Grades named in a list of tokens; unknown tokens are dropped.
pub fn grades(tokens: &[&str]) -> Vec<Grade> {
    tokens.iter().filter_map(|t| Grade::from_token(t)).collect()
}
