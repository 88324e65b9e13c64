//! Registration form checks.
//!
//! A form that passes is turned into a [`Registration`]: the collection to
//! write to, the fields to store, and how many records to create.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::Collection;
use crate::calc::Fields;
use crate::config::RegistrationConfig;
use crate::error::ValidationError;

/// Field holding the number of concrete specimens.
pub const SPECIMEN_COUNT_FIELD: &str = "noEspecimenes";

/// Field holding the sampling date.
pub const DATE_FIELD: &str = "fecha";

/// Soil form fields that must be filled with text.
pub const SOIL_REQUIRED_FIELDS: [&str; 5] = ["obra", "cliente", "muestra", "ubicacion", "tecnico"];

/// Date format used for stored soil dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

fn digits_only() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+$").expect("Invalid regex pattern"))
}

/// A checked form, ready for [`RecordSequencer::register`](super::RecordSequencer::register).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Target collection.
    pub collection: Collection,
    /// Fields to store on every created record.
    pub fields: Fields,
    /// Number of records to create.
    pub count: u64,
}

/// Check a form for `collection`.
///
/// # Errors
///
/// Returns the first problem found, naming the offending field.
pub fn registration(
    collection: Collection,
    fields: &Fields,
    rules: &RegistrationConfig,
    today: NaiveDate,
) -> Result<Registration, ValidationError> {
    match collection {
        Collection::Concrete => concrete(fields, rules),
        Collection::Soil => soil(fields, rules, today),
    }
}

/// Check a concrete form.
///
/// The specimen count falls back to 1 when absent, blank, or zero, and must
/// otherwise be a whole number within `1..=max_specimens`. Other fields are
/// stored as entered.
///
/// # Errors
///
/// Returns an error on `noEspecimenes` when the count is not a whole number
/// or is out of range.
pub fn concrete(
    fields: &Fields,
    rules: &RegistrationConfig,
) -> Result<Registration, ValidationError> {
    let requested = match fields.get(SPECIMEN_COUNT_FIELD).map(|raw| raw.trim()) {
        None | Some("") => 1,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ValidationError::not_a_number(SPECIMEN_COUNT_FIELD, raw))?,
    };
    let requested = if requested == 0 { 1 } else { requested };

    let count = u64::try_from(requested)
        .ok()
        .filter(|n| *n <= rules.max_specimens)
        .ok_or_else(|| {
            ValidationError::new(
                SPECIMEN_COUNT_FIELD,
                format!("must be between 1 and {}", rules.max_specimens),
            )
        })?;

    Ok(Registration {
        collection: Collection::Concrete,
        fields: fields.clone(),
        count,
    })
}

/// Check a soil form.
///
/// `fecha` defaults to `today` when absent or blank and is stored as
/// `YYYY-MM-DD`. Each required field must be non-blank and must contain
/// something other than digits.
///
/// # Errors
///
/// Returns an error naming the first bad field.
pub fn soil(
    fields: &Fields,
    rules: &RegistrationConfig,
    today: NaiveDate,
) -> Result<Registration, ValidationError> {
    let date = match fields.get(DATE_FIELD).map(|d| d.trim()) {
        None | Some("") => today,
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
            ValidationError::new(DATE_FIELD, format!("'{raw}' is not a date (YYYY-MM-DD)"))
        })?,
    };

    if rules.reject_past_dates && date < today {
        return Err(ValidationError::new(DATE_FIELD, "must not be earlier than today"));
    }

    for name in SOIL_REQUIRED_FIELDS {
        let value = fields.get(name).map_or("", |v| v.trim());
        if value.is_empty() {
            return Err(ValidationError::missing(name));
        }
        if digits_only().is_match(value) {
            return Err(ValidationError::new(name, "must not contain only numbers"));
        }
    }

    let mut stored = fields.clone();
    stored.insert(DATE_FIELD.to_string(), date.format(DATE_FORMAT).to_string());

    Ok(Registration {
        collection: Collection::Soil,
        fields: stored,
        count: 1,
    })
}
