//! Per-replacement digests, one message body per teacher who picked up classes.
//!
//! Delivery belongs to the caller; this only groups and formats.

use crate::arrangement::AssignmentResult;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementDigest {
    pub teacher_id: String,
    pub name: String,
    /// One line per covered period, in period order.
    pub lines: Vec<String>,
}

impl ReplacementDigest {
    pub fn message(&self) -> String {
        format!("Dear {}, you have been assigned:\n{}", self.name, self.lines.join("\n"))
    }
}

/// Group assigned results by replacement teacher id.
pub fn group_by_replacement(results: &[AssignmentResult]) -> BTreeMap<String, ReplacementDigest> {
    let mut covered: BTreeMap<String, Vec<&AssignmentResult>> = BTreeMap::new();
    for result in results {
        if let Some(rep) = &result.replacement {
            covered.entry(rep.teacher_id.clone()).or_default().push(result);
        }
    }

    covered
        .into_iter()
        .filter_map(|(id, mut rows)| {
            rows.sort_by_key(|r| r.period);
            let name = rows.first()?.replacement.as_ref()?.name.clone();
            let lines = rows
                .iter()
                .map(|r| {
                    format!(
                        "Period {}: {} (for {})",
                        r.period.unwrap_or_default(),
                        r.class_info.as_deref().unwrap_or_default(),
                        r.absent_name
                    )
                })
                .collect();
            Some((
                id.clone(),
                ReplacementDigest {
                    teacher_id: id,
                    name,
                    lines,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::ArrangementEngine;
    use crate::subjects::SubjectCatalog;
    use crate::timetable::{TeacherProfile, Timetable};
    use crate::workload::InMemoryLedger;

    #[test]
    fn groups_lines_per_replacement() {
        let tt = Timetable::new(
            2,
            vec![
                TeacherProfile::new("A1", "Asha", "PRT")
                    .with_subjects("Maths")
                    .with_period(1, "II MATH")
                    .with_period(2, "III MATH"),
                TeacherProfile::new("S1", "Sunil", "PRT").with_subjects("Maths"),
            ],
        );
        let catalog = SubjectCatalog::standard();
        let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
            .run(&["A1"])
            .unwrap();

        let digests = group_by_replacement(&results);
        assert_eq!(digests.len(), 1);
        let digest = &digests["S1"];
        assert_eq!(
            digest.lines,
            vec!["Period 1: II MATH (for Asha)", "Period 2: III MATH (for Asha)"]
        );
        assert!(digest.message().starts_with("Dear Sunil"));
    }

    #[test]
    fn unassigned_results_are_ignored() {
        assert!(group_by_replacement(&[]).is_empty());
    }
}
