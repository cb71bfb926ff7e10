//! School rule sets, stored as a JSON array:
//!
//! ```json
//! [{"rule_name": "TGT to PGT",
//!   "criteria": {"absent_category": ["TGT"], "candidate_category": "PGT", "subject_match": "exact"}}]
//! ```
//!
//! Array order is tier order.

use anyhow::{bail, Context, Result};
use relief_core::{Category, CustomRule, SubjectMatch};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RuleRecord {
    rule_name: String,
    criteria: RuleCriteria,
}

#[derive(Debug, Deserialize)]
struct RuleCriteria {
    #[serde(default)]
    absent_category: Vec<String>,
    candidate_category: String,
    /// Only "exact" constrains the subject.
    #[serde(default)]
    subject_match: Option<String>,
}

fn category(rule: &str, raw: &str) -> Result<Category> {
    match Category::parse(raw) {
        Some(c) => Ok(c),
        None => bail!("rule {rule:?}: unknown category {raw:?}"),
    }
}

pub fn parse_rules_json(text: &str) -> Result<Vec<CustomRule>> {
    let records: Vec<RuleRecord> = serde_json::from_str(text).context("parsing rules JSON")?;
    records
        .into_iter()
        .map(|r| {
            let absent_categories = r
                .criteria
                .absent_category
                .iter()
                .map(|c| category(&r.rule_name, c))
                .collect::<Result<Vec<_>>>()?;
            let subject_match = match r.criteria.subject_match.as_deref() {
                Some(m) if m.trim().eq_ignore_ascii_case("exact") => SubjectMatch::Exact,
                _ => SubjectMatch::Any,
            };
            Ok(CustomRule {
                candidate_category: category(&r.rule_name, &r.criteria.candidate_category)?,
                name: r.rule_name,
                absent_categories,
                subject_match,
            })
        })
        .collect()
}

pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<CustomRule>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_rules_json(&text).with_context(|| format!("loading rules from {}", path.display()))
}
