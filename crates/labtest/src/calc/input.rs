//! Parsing and checking of raw numeric form fields.
//!
//! Form screens hand over text exactly as typed. Everything here turns that
//! text into finite `f64` values or a [`ValidationError`] naming the field.

use std::collections::BTreeMap;

use crate::error::ValidationError;

/// Named raw field values as entered on a form.
pub type Fields = BTreeMap<String, String>;

/// Parse a single decimal value.
///
/// Surrounding whitespace is ignored and a decimal comma is accepted.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the text is blank, unparseable, or not finite.
pub fn parse_number(field: &str, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::missing(field));
    }
    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::not_a_number(field, trimmed))?;
    finite(field, value)
}

/// Look up and parse a field that must be present.
pub(crate) fn required(fields: &Fields, field: &str) -> Result<f64, ValidationError> {
    match fields.get(field) {
        Some(raw) => parse_number(field, raw),
        None => Err(ValidationError::missing(field)),
    }
}

/// Look up and parse a field that defaults to zero when absent or blank.
pub(crate) fn or_zero(fields: &Fields, field: &str) -> Result<f64, ValidationError> {
    match fields.get(field) {
        Some(raw) if !raw.trim().is_empty() => parse_number(field, raw),
        _ => Ok(0.0),
    }
}

pub(crate) fn finite(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::not_a_number(field, &value.to_string()))
    }
}

pub(crate) fn non_negative(field: &str, value: f64) -> Result<f64, ValidationError> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::negative(field));
    }
    Ok(value)
}

pub(crate) fn positive(field: &str, value: f64) -> Result<f64, ValidationError> {
    let value = finite(field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::not_positive(field));
    }
    Ok(value)
}

/// Build a [`Fields`] map from `name=value` pairs.
///
/// # Errors
///
/// Returns a [`ValidationError`] for an entry without `=` or with an empty name.
pub fn fields_from_pairs<I, S>(pairs: I) -> Result<Fields, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fields = Fields::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| ValidationError::new(pair, "expected name=value"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::new(pair, "field name is empty"));
        }
        fields.insert(name.to_string(), value.to_string());
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_number_plain() {
        assert_eq!(parse_number("load", "35000").unwrap(), 35000.0);
        assert_eq!(parse_number("load", " 1.45 ").unwrap(), 1.45);
    }

    #[test]
    fn test_parse_number_decimal_comma() {
        assert_eq!(parse_number("w4", "1,45").unwrap(), 1.45);
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        let err = parse_number("load", "12kg").unwrap_err();
        assert_eq!(err.field, "load");
        assert!(err.message.contains("12kg"));
    }

    #[test]
    fn test_parse_number_rejects_blank() {
        let err = parse_number("fc", "   ").unwrap_err();
        assert_eq!(err, ValidationError::missing("fc"));
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert!(parse_number("fc", "inf").is_err());
        assert!(parse_number("fc", "NaN").is_err());
    }

    #[test]
    fn test_required_missing_field() {
        let err = required(&Fields::new(), "diameter").unwrap_err();
        assert_eq!(err.field, "diameter");
    }

    #[test]
    fn test_or_zero_defaults() {
        let f = fields(&[("no4", ""), ("1in", "12.5")]);
        assert_eq!(or_zero(&f, "no4").unwrap(), 0.0);
        assert_eq!(or_zero(&f, "2in").unwrap(), 0.0);
        assert_eq!(or_zero(&f, "1in").unwrap(), 12.5);
    }

    #[test]
    fn test_positive_and_non_negative() {
        assert!(positive("w6", 0.0).is_err());
        assert!(positive("w6", -1.0).is_err());
        assert!(positive("w6", f64::NAN).is_err());
        assert_eq!(positive("w6", 1.95).unwrap(), 1.95);
        assert!(non_negative("tare", -0.1).is_err());
        assert_eq!(non_negative("tare", 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_fields_from_pairs() {
        let f = fields_from_pairs(["load=35000", "fc = 210"]).unwrap();
        assert_eq!(f.get("load").map(String::as_str), Some("35000"));
        assert_eq!(f.get("fc").map(String::as_str), Some(" 210"));
    }

    #[test]
    fn test_fields_from_pairs_rejects_malformed() {
        assert!(fields_from_pairs(["load"]).is_err());
        assert!(fields_from_pairs(["=5"]).is_err());
    }
}
