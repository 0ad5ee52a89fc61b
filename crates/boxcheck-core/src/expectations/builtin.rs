use crate::error::BoxcheckError;
use crate::expectations::schema::ExpectationSet;
use crate::expectations::validate_expectations;

const UMS025_JSON: &str = include_str!("../../../../expectations/ums025.json");

/// Available predefined expectation sets.
pub const PRESETS: &[&str] = &["ums025"];

/// Load a predefined expectation set by name.
pub fn load_preset(name: &str) -> Result<ExpectationSet, BoxcheckError> {
    let json = match name {
        "ums025" => UMS025_JSON,
        _ => {
            return Err(BoxcheckError::UnknownPreset {
                name: name.to_string(),
                available: PRESETS.join(", "),
            })
        }
    };
    let set: ExpectationSet = serde_json::from_str(json)?;
    validate_expectations(&set)?;
    Ok(set)
}
