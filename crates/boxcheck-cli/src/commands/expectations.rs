use boxcheck_core::error::BoxcheckError;
use boxcheck_core::expectations::{self, builtin};
use std::path::Path;

use crate::output;

pub fn list() -> Result<(), BoxcheckError> {
    println!("Available expectation sets:\n");
    for name in builtin::PRESETS {
        let set = builtin::load_preset(name)?;
        println!("  {:<8} {} (v{})", name, set.name, set.version);
        if let Some(ref desc) = set.description {
            println!("           {}", desc);
        }
        println!(
            "           {} value(s), {} box(es){}",
            set.expected.len(),
            set.box_mapping.len(),
            set.section
                .as_ref()
                .map(|s| format!(", cross-checks section '{}' from page {}", s.name, s.start_page))
                .unwrap_or_default()
        );
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), BoxcheckError> {
    let set = builtin::load_preset(preset)?;
    output::json::print(&set)
}

pub fn validate(file: &Path) -> Result<(), BoxcheckError> {
    let set = expectations::load_expectations(file)?;

    println!("Expectation set '{}' (v{}) is valid.", set.name, set.version);
    println!("  Expected values: {}", set.expected.len());
    println!("  Boxes: {}", set.box_mapping.len());
    println!("  Aliases: {}", set.aliases.len());
    if let Some(ref section) = set.section {
        println!(
            "  Section: {} (from page {}, {} own values, {} indicators)",
            section.name,
            section.start_page,
            section.expected.len(),
            section.indicators.len()
        );
    }

    let warnings = expectations::expectation_warnings(&set);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
