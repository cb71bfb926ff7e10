use anyhow::Result;
use relief_core::{group_by_replacement, AssignmentResult};

pub fn print_results(results: &[AssignmentResult]) {
    if results.is_empty() {
        println!("No classes needed cover.");
        return;
    }
    for r in results {
        let period = r.period.map(|p| format!("P{p}")).unwrap_or_else(|| "--".to_string());
        let replacement = r
            .replacement
            .as_ref()
            .map(|rep| format!("{} ({}, {})", rep.name, rep.teacher_id, rep.category))
            .unwrap_or_else(|| "UNASSIGNED".to_string());
        println!(
            "{period:<3} | {} ({}) | {} | {} | {}",
            r.absent_name,
            r.absent_teacher_id,
            r.class_info.as_deref().unwrap_or("-"),
            replacement,
            r.quality
        );
    }
    let assigned = results.iter().filter(|r| r.is_assigned()).count();
    println!("\nAssigned {assigned} of {} rows", results.len());
}

pub fn print_digests(results: &[AssignmentResult]) {
    let digests = group_by_replacement(results);
    if digests.is_empty() {
        return;
    }
    println!("\n## Notifications\n");
    for digest in digests.values() {
        println!("{}\n", digest.message());
    }
}

pub fn print_json(results: &[AssignmentResult]) -> Result<()> {
    let digests = group_by_replacement(results);
    let out = serde_json::json!({
        "results": results,
        "notifications": digests,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
