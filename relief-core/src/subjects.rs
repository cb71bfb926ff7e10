//! Subject normalization: synonyms, abbreviations, streams and subject families.
//!
//! The catalog is built once and then shared by reference; nothing mutates it
//! after construction. A school with local abbreviations gets its own catalog
//! through [`SubjectCatalog::with_aliases`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Canonical subject and the spellings that resolve to it.
const STANDARD_SUBJECTS: &[(&str, &[&str])] = &[
    ("MATHEMATICS", &["MATH", "MATHS", "MATHEMATICS", "APPLIED MATH", "APPLIED MATHEMATICS"]),
    ("SCIENCE", &["SCIENCE", "SCI", "PHYSICS", "CHEMISTRY", "BIOLOGY"]),
    ("PHYSICS", &["PHYSICS", "PHY", "SCIENCE"]),
    ("CHEMISTRY", &["CHEMISTRY", "CHEM", "SCIENCE"]),
    ("BIOLOGY", &["BIOLOGY", "BIO", "SCIENCE"]),
    (
        "SST",
        &[
            "SST",
            "S.ST",
            "SOCIAL STUDIES",
            "SOCIAL SCIENCE",
            "HISTORY",
            "GEOGRAPHY",
            "POLITICAL SCIENCE",
            "ECONOMICS",
            "CIVICS",
        ],
    ),
    ("HISTORY", &["HISTORY", "HIST", "SST", "SOCIAL STUDIES"]),
    ("GEOGRAPHY", &["GEOGRAPHY", "GEO", "SST", "SOCIAL STUDIES"]),
    ("POLITICAL SCIENCE", &["POLITICAL SCIENCE", "POL.SC", "CIVICS", "SST"]),
    ("ECONOMICS", &["ECONOMICS", "ECO", "SST"]),
    ("CIVICS", &["CIVICS", "POLITICAL SCIENCE", "SST"]),
    (
        "COMPUTER SCIENCE",
        &["COMPUTER SCIENCE", "CS", "COMPUTER", "COMPUTERS", "IT", "ICT", "AI", "ARTIFICIAL INTELLIGENCE"],
    ),
    ("IT", &["IT", "INFORMATION TECHNOLOGY", "COMPUTER", "CS"]),
    ("AI", &["AI", "A.I.", "ARTIFICIAL INTELLIGENCE", "COMPUTER", "IT"]),
    ("HINDI", &["HINDI", "SANSKRIT"]),
    ("EVS", &["EVS", "ENVIRONMENTAL SCIENCE", "ENVIRONMENTAL STUDIES"]),
    ("SANSKRIT", &["SANSKRIT", "SKT", "HINDI"]),
    ("ENGLISH", &["ENGLISH", "ENG"]),
    ("BUSINESS STUDIES", &["BUSINESS STUDIES", "BST", "BUSINESS"]),
    ("BST", &["BST", "BUSINESS STUDIES", "BUSINESS"]),
    ("ACCOUNTANCY", &["ACCOUNTANCY", "ACCOUNTS", "ACCOUNTING"]),
    ("ACCOUNTS", &["ACCOUNTS", "ACCOUNTANCY", "ACCOUNTING"]),
    ("PHYSICAL EDUCATION", &["PE", "PHYSICAL", "PHE", "GAME", "SPORTS"]),
    ("ART", &["ART", "ARTS", "DRAWING", "PAINTING"]),
    ("MUSIC", &["MUSIC", "SINGING", "VOCAL"]),
    ("GK", &["GK", "GENERAL KNOWLEDGE"]),
    ("MORAL SCIENCE", &["MORAL SCIENCE", "MORAL ED", "VALUE EDUCATION", "VALUES"]),
    ("URDU", &["URDU"]),
    ("SOCIOLOGY", &["SOCIOLOGY"]),
    ("PSYCHOLOGY", &["PSYCHOLOGY"]),
];

const STANDARD_STREAMS: &[(Stream, &[&str])] = &[
    (Stream::Science, &["PHYSICS", "CHEMISTRY", "BIOLOGY", "ENGLISH"]),
    (
        Stream::Commerce,
        &["BUSINESS STUDIES", "BST", "ACCOUNTANCY", "ACCOUNTS", "ECONOMICS", "ENGLISH"],
    ),
    (Stream::Arts, &["HISTORY", "GEOGRAPHY", "POLITICAL SCIENCE", "ECONOMICS", "ENGLISH"]),
    (Stream::Humanities, &["HISTORY", "GEOGRAPHY", "POLITICAL SCIENCE", "ECONOMICS", "ENGLISH"]),
    (Stream::Sociology, &["SOCIOLOGY"]),
    (Stream::Psychology, &["PSYCHOLOGY"]),
];

/// (subjects that trigger the family, family members)
const FAMILIES: &[(&[&str], &[&str])] = &[
    (
        &["SCIENCE", "PHYSICS", "CHEMISTRY", "BIOLOGY"],
        &["PHYSICS", "CHEMISTRY", "BIOLOGY"],
    ),
    (
        &["SST", "HISTORY", "GEOGRAPHY", "POLITICAL SCIENCE", "ECONOMICS", "CIVICS"],
        &["HISTORY", "GEOGRAPHY", "POLITICAL SCIENCE", "ECONOMICS", "CIVICS"],
    ),
];

/// Senior-secondary subject streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stream {
    Science,
    Commerce,
    Arts,
    Humanities,
    Sociology,
    Psychology,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectMapping {
    pub canonical: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Clone)]
struct VariantPattern {
    variant: String,
    word: Regex,
    /// Relaxed whitespace-bounded match for dotted variants ("A.I."),
    /// where `\b` cannot sit next to the punctuation.
    spaced: Option<Regex>,
}

impl VariantPattern {
    fn compile(variant: &str) -> Result<Self, regex::Error> {
        let escaped = regex::escape(variant);
        let word = Regex::new(&format!(r"\b{escaped}\b"))?;
        let spaced = if variant.contains('.') {
            Some(Regex::new(&format!(r"(^|\s){escaped}(\s|$)"))?)
        } else {
            None
        };
        Ok(Self {
            variant: variant.to_string(),
            word,
            spaced,
        })
    }

    fn is_match(&self, haystack: &str) -> bool {
        self.word.is_match(haystack) || self.spaced.as_ref().is_some_and(|re| re.is_match(haystack))
    }
}

#[derive(Debug, Clone)]
pub struct SubjectCatalog {
    mappings: Vec<SubjectMapping>,
    streams: Vec<(Stream, Vec<String>)>,
    /// Longest variant first so "POLITICAL SCIENCE" wins over "SCIENCE".
    patterns: Vec<VariantPattern>,
}

impl SubjectCatalog {
    pub fn new(
        mappings: Vec<SubjectMapping>,
        streams: Vec<(Stream, Vec<String>)>,
    ) -> Result<Self, regex::Error> {
        let mappings: Vec<SubjectMapping> = mappings
            .into_iter()
            .map(|m| SubjectMapping {
                canonical: clean(&m.canonical),
                variants: m.variants.iter().map(|v| clean(v)).filter(|v| !v.is_empty()).collect(),
            })
            .collect();

        let mut spellings: BTreeSet<String> = BTreeSet::new();
        for m in &mappings {
            spellings.insert(m.canonical.clone());
            spellings.extend(m.variants.iter().cloned());
        }
        let mut ordered: Vec<String> = spellings.into_iter().collect();
        // BTreeSet already gives alphabetical order; stable sort keeps it for equal lengths.
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));

        let patterns = ordered
            .iter()
            .map(|v| VariantPattern::compile(v))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mappings,
            streams,
            patterns,
        })
    }

    /// The built-in table.
    pub fn standard() -> Self {
        let mappings = STANDARD_SUBJECTS
            .iter()
            .map(|(canonical, variants)| SubjectMapping {
                canonical: canonical.to_string(),
                variants: variants.iter().map(|v| v.to_string()).collect(),
            })
            .collect();
        let streams = STANDARD_STREAMS
            .iter()
            .map(|(stream, subjects)| (*stream, subjects.iter().map(|s| s.to_string()).collect()))
            .collect();
        Self::new(mappings, streams).expect("built-in subject table compiles")
    }

    /// A new catalog with extra spellings for `canonical` (added as a new
    /// canonical entry at the end when it is not already known).
    pub fn with_aliases(&self, canonical: &str, aliases: &[String]) -> Result<Self, regex::Error> {
        let canonical = clean(canonical);
        let mut mappings = self.mappings.clone();
        match mappings.iter_mut().find(|m| m.canonical == canonical) {
            Some(m) => m.variants.extend(aliases.iter().map(|a| clean(a))),
            None => mappings.push(SubjectMapping {
                canonical,
                variants: aliases.iter().map(|a| clean(a)).collect(),
            }),
        }
        Self::new(mappings, self.streams.clone())
    }

    /// Resolve a subject spelling to its canonical tag.
    ///
    /// An exact canonical tag resolves to itself; otherwise the first entry
    /// listing the spelling wins. Unknown subjects come back uppercased so
    /// they still take part in exact matching.
    pub fn normalize_subject(&self, raw: &str) -> Option<String> {
        let s = clean(raw);
        if s.is_empty() {
            return None;
        }
        if self.mappings.iter().any(|m| m.canonical == s) {
            return Some(s);
        }
        let found = self
            .mappings
            .iter()
            .find(|m| m.variants.iter().any(|v| *v == s))
            .map(|m| m.canonical.clone());
        Some(found.unwrap_or(s))
    }

    /// Find the most specific known subject mentioned in a class-info cell.
    pub fn extract_subject_from_class_info(&self, class_info: &str) -> Option<String> {
        let upper = clean(class_info);
        if upper.is_empty() {
            return None;
        }
        match self.patterns.iter().find(|p| p.is_match(&upper)) {
            Some(p) => self.normalize_subject(&p.variant),
            None => {
                warn!(class_info, "could not extract a known subject");
                None
            }
        }
    }

    /// Does `canonical`'s entry list `spelling` as a variant?
    pub fn is_variant_of(&self, spelling: &str, canonical: &str) -> bool {
        self.mappings
            .iter()
            .find(|m| m.canonical == canonical)
            .is_some_and(|m| m.variants.iter().any(|v| v == spelling))
    }

    /// Can a teacher listing `candidate_subjects` take a class in any of `targets`?
    ///
    /// An empty target list means no subject constraint. Besides a direct
    /// canonical overlap, either side being a listed variant of the other
    /// counts (a PHYSICS teacher can take SCIENCE and vice versa).
    pub fn can_teach<S: AsRef<str>, T: AsRef<str>>(&self, candidate_subjects: &[S], targets: &[T]) -> bool {
        let wanted: BTreeSet<String> = targets
            .iter()
            .filter_map(|t| self.normalize_subject(t.as_ref()))
            .collect();
        if wanted.is_empty() {
            return true;
        }
        let offered: BTreeSet<String> = candidate_subjects
            .iter()
            .filter_map(|s| self.normalize_subject(s.as_ref()))
            .collect();
        if offered.is_empty() {
            return false;
        }
        if !offered.is_disjoint(&wanted) {
            return true;
        }
        offered.iter().any(|have| {
            wanted
                .iter()
                .any(|want| self.is_variant_of(have, want) || self.is_variant_of(want, have))
        })
    }

    pub fn stream_for_subject(&self, subject: &str) -> Option<Stream> {
        let std_subject = self.normalize_subject(subject)?;
        self.streams
            .iter()
            .find(|(_, subjects)| {
                subjects
                    .iter()
                    .any(|s| self.normalize_subject(s).as_deref() == Some(std_subject.as_str()))
            })
            .map(|(stream, _)| *stream)
    }

    pub fn stream_subjects(&self, stream: Stream) -> Vec<String> {
        self.streams
            .iter()
            .find(|(s, _)| *s == stream)
            .map(|(_, subjects)| subjects.clone())
            .unwrap_or_default()
    }

    /// Other members of the subject family `subject` belongs to.
    pub fn related_subjects(&self, subject: &str) -> Vec<String> {
        let Some(std_subject) = self.normalize_subject(subject) else {
            return Vec::new();
        };
        FAMILIES
            .iter()
            .find(|(triggers, _)| triggers.contains(&std_subject.as_str()))
            .map(|(_, members)| {
                members
                    .iter()
                    .filter(|m| **m != std_subject)
                    .map(|m| m.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn clean(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Split a "MATH, SCIENCE" cell into trimmed, non-empty entries.
pub fn split_subjects(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
