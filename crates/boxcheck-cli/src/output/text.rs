use boxcheck_core::report;
use boxcheck_core::validate::ValidationReport;

pub fn print(result: &ValidationReport) {
    if let Some(ref doc) = result.doc_path {
        println!("Document: {}", doc);
    }
    print!("{}", report::format_summary(&result.checks));
    println!("{}", report::summarize_full_doc(&result.checks));

    let failed = result.failures().count();
    let notices = result.notices().count();
    let passed = result.checks.len() - failed - notices;
    println!("{} passed, {} notice(s), {} failed", passed, notices, failed);
}
