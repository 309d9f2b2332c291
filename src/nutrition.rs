use thiserror::Error;

/// Unit tokens stripped from the end of a nutrition value before parsing
const UNIT_SUFFIXES: &[&str] = &["kcal", "g"];

/// A nutrition value with no numeric form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("nutrition value {raw:?} has no numeric form")]
pub struct Unparsable {
    /// The text that failed to parse, `None` when the field was missing
    pub raw: Option<String>,
}

/// Parse a free-form nutrition value such as `"12 g"` or `"300kcal"`.
///
/// A missing value is `Unparsable`, never zero.
pub fn parse_nutrition_value(raw: Option<&str>) -> Result<f64, Unparsable> {
    let unparsable = || Unparsable {
        raw: raw.map(str::to_string),
    };

    let trimmed = raw.ok_or_else(unparsable)?.trim();
    let lower = trimmed.to_ascii_lowercase();
    let number = UNIT_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &trimmed[..trimmed.len() - suffix.len()])
        .unwrap_or(trimmed)
        .trim();

    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(unparsable()),
    }
}
