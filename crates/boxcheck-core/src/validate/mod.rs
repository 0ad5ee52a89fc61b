pub mod engine;
pub mod outcome;

pub use engine::{
    box_checks, cross_checks, document_checks, full_doc_checks, run_checks, section_checks,
    unreadable_check, BoxCheckOptions,
};
pub use outcome::{Check, NoticePolicy, Outcome, ValidationReport};
