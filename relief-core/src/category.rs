//! Teacher seniority tiers.
//!
//! Schools write these inconsistently ("P.G.T", "pgt ", "PGT"), so every raw
//! value goes through [`normalize_category_label`] once, when a profile or a
//! rule is built, and the rest of the engine only sees the closed enum.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Primary teacher (PRT).
    Primary,
    /// Trained graduate teacher (TGT).
    Graduate,
    /// Post-graduate teacher (PGT).
    PostGraduate,
}

impl Category {
    pub fn code(self) -> &'static str {
        match self {
            Category::Primary => "PRT",
            Category::Graduate => "TGT",
            Category::PostGraduate => "PGT",
        }
    }

    /// Parse a raw category cell. Returns `None` for anything outside the three tiers.
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_category_label(raw).as_str() {
            "PRT" => Some(Category::Primary),
            "TGT" => Some(Category::Graduate),
            "PGT" => Some(Category::PostGraduate),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Strip punctuation and whitespace, uppercase the rest.
pub fn normalize_category_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}
