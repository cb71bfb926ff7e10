//! Rule pipeline: the ordered search tiers tried for one absence.
//!
//! Tiers run best match first. Ordering is fixed when the pipeline is built;
//! a tier's `condition` only gates whether it runs.

use crate::category::Category;
use crate::grade::{grades, Grade, GradeBand};
use crate::subjects::{Stream, SubjectCatalog};
use serde::{Deserialize, Serialize};

const MIDDLE_GRADES: &[&str] = &["VI", "VII", "VIII"];
const SECONDARY_GRADES: &[&str] = &["IX", "X"];

/// One tier of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriterion {
    /// Human-readable match quality reported on success.
    pub quality: String,
    pub category: Option<Category>,
    /// Acceptable subjects; empty means any.
    pub subjects: Vec<String>,
    /// Candidate must already teach one of these grades.
    pub teaches_grades: Option<Vec<Grade>>,
    /// Evaluated at build time; a false tier is skipped when the pipeline runs.
    pub condition: bool,
}

impl SearchCriterion {
    pub fn new(quality: impl Into<String>, category: Category) -> Self {
        Self {
            quality: quality.into(),
            category: Some(category),
            subjects: Vec::new(),
            teaches_grades: None,
            condition: true,
        }
    }

    /// Require `subject`; `None` leaves the tier open to any subject.
    pub fn subject(mut self, subject: Option<&str>) -> Self {
        if let Some(s) = subject {
            self.subjects.push(s.to_string());
        }
        self
    }

    pub fn subjects<S: AsRef<str>>(mut self, subjects: &[S]) -> Self {
        self.subjects
            .extend(subjects.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn teaching(mut self, tokens: &[&str]) -> Self {
        self.teaches_grades = Some(grades(tokens));
        self
    }

    pub fn when(mut self, condition: bool) -> Self {
        self.condition = condition;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectMatch {
    /// Candidate must teach the absent teacher's subject.
    Exact,
    Any,
}

/// School-configured override of the built-in tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub name: String,
    /// Absent-teacher categories this rule applies to.
    pub absent_categories: Vec<Category>,
    pub candidate_category: Category,
    pub subject_match: SubjectMatch,
}

/// What is known about the class being covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceContext {
    pub category: Option<Category>,
    /// Canonical subject of the class, when one could be extracted.
    pub subject: Option<String>,
    pub grade: Option<Grade>,
}

impl AbsenceContext {
    pub fn band(&self) -> Option<GradeBand> {
        self.grade.map(Grade::band)
    }

    fn grade_in(&self, range: std::ops::RangeInclusive<u8>) -> bool {
        self.grade.is_some_and(|g| range.contains(&g.number()))
    }
}

/// Build the search tiers for one absence.
///
/// Configured custom rules replace the built-in tiers entirely, even when
/// none of them triggers for this absence.
pub fn build_pipeline(
    catalog: &SubjectCatalog,
    ctx: &AbsenceContext,
    custom_rules: &[CustomRule],
) -> Vec<SearchCriterion> {
    if !custom_rules.is_empty() {
        return custom_pipeline(ctx, custom_rules);
    }
    match ctx.category {
        Some(Category::Primary) => primary_pipeline(ctx),
        Some(Category::Graduate) => graduate_pipeline(catalog, ctx),
        Some(Category::PostGraduate) => post_graduate_pipeline(catalog, ctx),
        None => Vec::new(),
    }
}

fn custom_pipeline(ctx: &AbsenceContext, rules: &[CustomRule]) -> Vec<SearchCriterion> {
    let Some(category) = ctx.category else {
        return Vec::new();
    };
    rules
        .iter()
        .filter(|r| r.absent_categories.contains(&category))
        .map(|r| {
            let tier = SearchCriterion::new(r.name.clone(), r.candidate_category);
            match r.subject_match {
                SubjectMatch::Exact => tier.subject(ctx.subject.as_deref()),
                SubjectMatch::Any => tier,
            }
        })
        .collect()
}

fn primary_pipeline(ctx: &AbsenceContext) -> Vec<SearchCriterion> {
    let subject = ctx.subject.as_deref();
    let mut tiers = vec![
        SearchCriterion::new("Ideal - Same Category, Same Subject", Category::Primary).subject(subject),
    ];
    match ctx.band() {
        Some(GradeBand::Primary) => tiers.push(
            SearchCriterion::new("Good - TGT (Class 6-8) for Adjacent Class", Category::Graduate)
                .subject(subject)
                .teaching(MIDDLE_GRADES)
                .when(ctx.grade_in(5..=5)),
        ),
        Some(GradeBand::Middle) => tiers.push(
            SearchCriterion::new("Good - TGT with Same Subject for Middle Class", Category::Graduate)
                .subject(subject),
        ),
        _ => {}
    }
    tiers.push(SearchCriterion::new(
        "Acceptable - Same Category, Any Subject",
        Category::Primary,
    ));
    tiers
}

fn graduate_pipeline(catalog: &SubjectCatalog, ctx: &AbsenceContext) -> Vec<SearchCriterion> {
    let subject = ctx.subject.as_deref();
    let std_subject = subject.and_then(|s| catalog.normalize_subject(s));

    if ctx.grade_in(9..=10) {
        let mut tiers = vec![
            SearchCriterion::new("Ideal - TGT (Teaches 9-10), Same Subject", Category::Graduate)
                .subject(subject)
                .teaching(SECONDARY_GRADES),
        ];
        match std_subject.as_deref() {
            Some("HINDI") => tiers.push(
                SearchCriterion::new("Good - TGT (Teaches 9-10), Related (Sanskrit)", Category::Graduate)
                    .subject(Some("SANSKRIT"))
                    .teaching(SECONDARY_GRADES),
            ),
            Some("COMPUTER SCIENCE") => tiers.push(
                SearchCriterion::new("Good - TGT (Teaches 9-10), Related (IT/AI)", Category::Graduate)
                    .subjects(&["IT", "AI"])
                    .teaching(SECONDARY_GRADES),
            ),
            _ => {}
        }
        tiers.push(SearchCriterion::new("Very Good - PGT, Same Subject", Category::PostGraduate).subject(subject));
        let related = std_subject
            .as_deref()
            .map(|s| catalog.related_subjects(s))
            .unwrap_or_default();
        if !related.is_empty() {
            tiers.push(
                SearchCriterion::new("Acceptable - PGT, Related Subject", Category::PostGraduate).subjects(&related),
            );
        }
        tiers.push(
            SearchCriterion::new("Suboptimal - TGT (Teaches 9-10), Any Subject", Category::Graduate)
                .teaching(SECONDARY_GRADES),
        );
        tiers.push(SearchCriterion::new("Fallback - Any PGT", Category::PostGraduate));
        return tiers;
    }

    if ctx.grade_in(6..=8) {
        return vec![
            SearchCriterion::new("Ideal - TGT, Same Subject", Category::Graduate).subject(subject),
            SearchCriterion::new("Good - PGT, Same Subject", Category::PostGraduate).subject(subject),
            SearchCriterion::new("Acceptable - Any TGT", Category::Graduate),
            SearchCriterion::new("Fallback - Any PGT", Category::PostGraduate),
        ];
    }

    if ctx.grade_in(4..=5) {
        return vec![
            SearchCriterion::new("Ideal - TGT, Same Subject", Category::Graduate).subject(subject),
            SearchCriterion::new("Good - PRT, Same Subject", Category::Primary).subject(subject),
            SearchCriterion::new("Acceptable - Any TGT", Category::Graduate),
            SearchCriterion::new("Fallback - Any PRT", Category::Primary),
        ];
    }

    vec![SearchCriterion::new("Fallback - Any TGT", Category::Graduate)]
}

fn post_graduate_pipeline(catalog: &SubjectCatalog, ctx: &AbsenceContext) -> Vec<SearchCriterion> {
    let subject = ctx.subject.as_deref();
    let std_subject = subject.and_then(|s| catalog.normalize_subject(s));

    let mut tiers = vec![
        SearchCriterion::new("Ideal - PGT with Same Subject", Category::PostGraduate).subject(subject),
        SearchCriterion::new("Very Good - TGT with Same Subject", Category::Graduate).subject(subject),
    ];

    match ctx.band() {
        Some(GradeBand::SeniorSecondary) => {
            let stream = subject.and_then(|s| catalog.stream_for_subject(s));
            let stream_tier = match stream {
                Some(Stream::Commerce) => Some(("Good - PGT from Same Stream (Commerce)", Stream::Commerce)),
                Some(Stream::Science) => Some(("Good - PGT from Same Stream (Science)", Stream::Science)),
                Some(Stream::Arts | Stream::Humanities) => {
                    Some(("Good - PGT from Same Stream (Arts)", Stream::Arts))
                }
                _ => None,
            };
            if let Some((quality, stream)) = stream_tier {
                tiers.push(
                    SearchCriterion::new(quality, Category::PostGraduate).subjects(&catalog.stream_subjects(stream)),
                );
            }
            match std_subject.as_deref() {
                Some("ENGLISH") => tiers.push(
                    SearchCriterion::new("Acceptable - TGT (9/10) for English", Category::Graduate)
                        .subject(Some("ENGLISH"))
                        .teaching(SECONDARY_GRADES),
                ),
                Some("COMPUTER SCIENCE") => tiers.push(
                    SearchCriterion::new("Acceptable - TGT (9/10) for CS/IT/AI", Category::Graduate)
                        .subjects(&["COMPUTER SCIENCE", "IT", "AI"])
                        .teaching(SECONDARY_GRADES),
                ),
                _ => {}
            }
        }
        Some(GradeBand::Secondary) => {
            let related = match std_subject.as_deref() {
                Some("MATHEMATICS") => vec!["APPLIED MATHEMATICS".to_string()],
                Some(s) => catalog.related_subjects(s),
                None => Vec::new(),
            };
            if !related.is_empty() {
                tiers.push(
                    SearchCriterion::new("Acceptable - PGT with Related Subject", Category::PostGraduate)
                        .subjects(&related),
                );
            }
            if std_subject.as_deref() == Some("HINDI") {
                tiers.push(
                    SearchCriterion::new("Acceptable - TGT with Sanskrit", Category::Graduate)
                        .subject(Some("SANSKRIT")),
                );
            }
        }
        _ => {}
    }

    tiers.push(SearchCriterion::new(
        "Fallback - Any free PGT teacher",
        Category::PostGraduate,
    ));
    tiers
}
