//! Candidate filter: narrow a free-teacher pool to those a search tier accepts.

use crate::category::Category;
use crate::grade::Grade;
use crate::pipeline::SearchCriterion;
use crate::subjects::SubjectCatalog;
use crate::timetable::TeacherProfile;

#[derive(Debug, Clone, Copy)]
pub struct CandidateFilter<'a> {
    catalog: &'a SubjectCatalog,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(catalog: &'a SubjectCatalog) -> Self {
        Self { catalog }
    }

    /// Keep the teachers in `pool` matching every active constraint.
    ///
    /// - `category`: `None` disables the tier check; teachers whose own
    ///   category is unknown never match a set category.
    /// - `subjects`: empty means any subject.
    /// - `teaches_grades`: the teacher must already take one of these grades.
    ///
    /// An empty result is not an error; the caller moves to the next tier.
    pub fn filter<'t>(
        &self,
        pool: &[&'t TeacherProfile],
        category: Option<Category>,
        subjects: &[String],
        teaches_grades: Option<&[Grade]>,
    ) -> Vec<&'t TeacherProfile> {
        pool.iter()
            .copied()
            .filter(|t| category.is_none_or(|c| t.category == Some(c)))
            .filter(|t| subjects.is_empty() || self.catalog.can_teach(&t.subjects, subjects))
            .filter(|t| teaches_grades.is_none_or(|grades| t.teaches_any_grade(grades)))
            .collect()
    }

    pub fn apply<'t>(&self, pool: &[&'t TeacherProfile], criterion: &SearchCriterion) -> Vec<&'t TeacherProfile> {
        self.filter(
            pool,
            criterion.category,
            &criterion.subjects,
            criterion.teaches_grades.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<TeacherProfile> {
        vec![
            TeacherProfile::new("P1", "Anil", "PRT").with_subjects("Maths, EVS"),
            TeacherProfile::new("P2", "Bina", "P.R.T").with_subjects("English"),
            TeacherProfile::new("T1", "Chetan", "TGT")
                .with_subjects("Physics")
                .with_period(2, "IX-A PHYSICS"),
            TeacherProfile::new("T2", "Deepa", "TGT").with_subjects(""),
            TeacherProfile::new("X1", "Esha", "Librarian").with_subjects("English"),
        ]
    }

    fn ids(found: &[&TeacherProfile]) -> Vec<String> {
        found.iter().map(|t| t.teacher_id.clone()).collect()
    }

    #[test]
    fn category_filter_ignores_punctuation() {
        let catalog = SubjectCatalog::standard();
        let teachers = pool();
        let refs: Vec<&TeacherProfile> = teachers.iter().collect();
        let f = CandidateFilter::new(&catalog);
        let found = f.filter(&refs, Some(Category::Primary), &[], None);
        assert_eq!(ids(&found), vec!["P1", "P2"]);
    }

    #[test]
    fn no_category_keeps_everyone() {
        let catalog = SubjectCatalog::standard();
        let teachers = pool();
        let refs: Vec<&TeacherProfile> = teachers.iter().collect();
        let f = CandidateFilter::new(&catalog);
        assert_eq!(f.filter(&refs, None, &[], None).len(), 5);
    }

    #[test]
    fn subject_filter_uses_synonyms_and_rejects_blank_subjects() {
        let catalog = SubjectCatalog::standard();
        let teachers = pool();
        let refs: Vec<&TeacherProfile> = teachers.iter().collect();
        let f = CandidateFilter::new(&catalog);
        let found = f.filter(&refs, Some(Category::Graduate), &["SCIENCE".to_string()], None);
        assert_eq!(ids(&found), vec!["T1"]);
    }

    #[test]
    fn grade_constraint() {
        let catalog = SubjectCatalog::standard();
        let teachers = pool();
        let refs: Vec<&TeacherProfile> = teachers.iter().collect();
        let f = CandidateFilter::new(&catalog);
        let nine_ten = [Grade::new(9).unwrap(), Grade::new(10).unwrap()];
        let found = f.filter(&refs, Some(Category::Graduate), &[], Some(&nine_ten));
        assert_eq!(ids(&found), vec!["T1"]);
        let eleven = [Grade::new(11).unwrap()];
        assert!(f.filter(&refs, None, &[], Some(&eleven)).is_empty());
    }
}
