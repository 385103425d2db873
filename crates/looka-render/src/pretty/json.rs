use crate::error::Result;

/// Canonical two-space JSON, key order preserved
pub fn pretty_json(source: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(source)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
