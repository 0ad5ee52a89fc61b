use crate::validate::{Check, Outcome};
use indexmap::IndexMap;

const RULE_WIDTH: usize = 60;

/// Console summary grouped into passed, notices and failed checks.
pub fn format_summary(checks: &[Check]) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut passed = Vec::new();
    let mut notices = Vec::new();
    let mut failed = Vec::new();

    for check in checks {
        match check.outcome {
            Outcome::Pass => passed.push(format!("  {}: PASS", check.name)),
            Outcome::Notice => notices.push(format!(
                "  {}: {}",
                check.name,
                check.message.as_deref().unwrap_or("NOTICE")
            )),
            Outcome::Fail => failed.push(format!(
                "  {}: {}",
                check.name,
                check.message.as_deref().unwrap_or("FAIL")
            )),
        }
    }

    let mut out = vec![String::new(), "PDF VALIDATION RESULTS".to_string(), rule.clone()];
    for (title, lines) in [("PASSED:", passed), ("NOTICES:", notices), ("FAILED:", failed)] {
        if lines.is_empty() {
            continue;
        }
        if out.len() > 3 {
            out.push(String::new());
        }
        out.push(title.to_string());
        out.extend(lines);
    }
    out.push(String::new());
    out.push(rule);
    out.push(String::new());
    out.join("\n")
}

/// One-line verdict over the `__exists` checks only.
pub fn summarize_full_doc(checks: &[Check]) -> String {
    let existence: Vec<&Check> = checks
        .iter()
        .filter(|c| c.name.ends_with("__exists"))
        .collect();

    if existence.is_empty() {
        return "FULL DOC CHECK: NO EXISTENCE CHECKS FOUND".to_string();
    }

    let failed: Vec<&str> = existence
        .iter()
        .filter(|c| !c.pass)
        .map(|c| c.name.trim_end_matches("__exists"))
        .collect();

    if failed.is_empty() {
        "PASSED FULL DOC CHECK".to_string()
    } else {
        format!("FAILED FULL DOC CHECK: {}", failed.join(", "))
    }
}

/// Legacy `name -> verdict` map in check order. Every passing value contains "PASS".
pub fn flat_results(checks: &[Check]) -> IndexMap<String, String> {
    checks
        .iter()
        .map(|c| {
            let message = c.message.as_deref().unwrap_or_default();
            let verdict = match c.outcome {
                Outcome::Pass => "PASS".to_string(),
                Outcome::Fail => format!("FAIL - {}", message),
                Outcome::Notice => format!("Mismatch - {}", message),
            };
            (c.name.clone(), verdict)
        })
        .collect()
}
