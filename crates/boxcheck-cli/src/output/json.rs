use boxcheck_core::error::BoxcheckError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), BoxcheckError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
