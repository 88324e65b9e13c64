//! Sieve analysis: granulometry, asphalt content, and the washed-sieve variant.
//!
//! Percent passing is a running quantity: each row depends on the row above
//! it, so rows are produced by a single fold over the ordered sieve list,
//! largest opening first, ending with a computed "passes" row.

use std::iter;

use serde::{Deserialize, Serialize};

use super::input::{non_negative, or_zero, required, Fields};
use crate::error::ValidationError;

/// Assumed dry sample weight for a washed-sieve test, in grams.
pub const WASHED_SAMPLE_WEIGHT: f64 = 200.0;

/// Allowance for floating-point noise when comparing weight totals.
const WEIGHT_EPSILON: f64 = 1e-9;

/// A mesh screen in a sieve stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sieve {
    /// Field name used on forms.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
}

/// Coarse stack used for granulometry and asphalt content, largest first.
pub const COARSE_SIEVES: [Sieve; 8] = [
    Sieve { id: "2in", label: "2\"" },
    Sieve { id: "1_1/2in", label: "1 1/2\"" },
    Sieve { id: "1in", label: "1\"" },
    Sieve { id: "3/4in", label: "3/4\"" },
    Sieve { id: "1/2in", label: "1/2\"" },
    Sieve { id: "3/8in", label: "3/8\"" },
    Sieve { id: "1/4in", label: "1/4\"" },
    Sieve { id: "no4", label: "No.4" },
];

/// Computed row for material finer than No.4.
pub const PASSES_NO4: Sieve = Sieve {
    id: "passes_no4",
    label: "Passes No.4",
};

/// Fine stack used for the washed-sieve test, largest first.
pub const FINE_SIEVES: [Sieve; 6] = [
    Sieve { id: "no10", label: "No.10" },
    Sieve { id: "no20", label: "No.20" },
    Sieve { id: "no40", label: "No.40" },
    Sieve { id: "no60", label: "No.60" },
    Sieve { id: "no100", label: "No.100" },
    Sieve { id: "no200", label: "No.200" },
];

/// Computed row for material finer than No.200.
pub const PASSES_NO200: Sieve = Sieve {
    id: "passes_no200",
    label: "Passes No.200",
};

/// Which coarse-sieve test a [`SieveAnalysis`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SieveTest {
    /// Granulometry of a soil or aggregate sample.
    Granulometry,
    /// Aggregate gradation of an asphalt sample.
    AsphaltContent,
}

/// Inputs for a granulometry or asphalt content analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SieveInput {
    /// Sample plus container.
    pub gross_weight: f64,
    /// Container alone.
    pub tare_weight: f64,
    /// Sample volume, used for the volumetric weight.
    pub sample_volume: f64,
    /// Retained weight per sieve in [`COARSE_SIEVES`] order.
    pub retained: Vec<f64>,
}

impl SieveInput {
    /// Parse a sieve form: `gross`, `tare`, `volume` and one optional field per
    /// coarse sieve id (blank or absent sieves count as zero).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for the first missing or unparseable field.
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationError> {
        let retained = COARSE_SIEVES
            .iter()
            .map(|sieve| or_zero(fields, sieve.id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            gross_weight: required(fields, "gross")?,
            tare_weight: required(fields, "tare")?,
            sample_volume: or_zero(fields, "volume")?,
            retained,
        })
    }
}

/// Inputs for a washed-sieve analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashedSieveInput {
    /// Percent passing No.4 from the preceding granulometry.
    pub passing_no4: f64,
    /// Retained weight per sieve in [`FINE_SIEVES`] order.
    pub retained: Vec<f64>,
}

impl WashedSieveInput {
    /// Parse a washed-sieve form: `passing_no4` and one optional field per fine sieve id.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for the first missing or unparseable field.
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationError> {
        let retained = FINE_SIEVES
            .iter()
            .map(|sieve| or_zero(fields, sieve.id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            passing_no4: required(fields, "passing_no4")?,
            retained,
        })
    }
}

/// One line of a sieve table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SieveRow {
    /// The sieve this row reports.
    pub sieve: Sieve,
    /// Weight caught by this sieve.
    pub retained_weight: f64,
    /// Partial percent retained.
    pub percent_retained: f64,
    /// Partial percent retained, rounded to the nearest integer.
    pub percent_retained_rounded: f64,
    /// Running total of percent retained down to this sieve.
    pub cumulative_retained: f64,
    /// Percent of the sample finer than this sieve.
    pub percent_passing: f64,
}

/// Result of a granulometry or asphalt content analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SieveAnalysis {
    /// The test the table was requested for.
    pub test_type: SieveTest,
    /// `gross - tare`.
    pub net_weight: f64,
    /// `net / volume * 1000`, or zero when either is not positive.
    pub volumetric_weight: f64,
    /// One row per coarse sieve followed by the "passes No.4" row.
    pub rows: Vec<SieveRow>,
}

/// Result of a washed-sieve analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WashedSieveAnalysis {
    /// Percent passing No.4 the table is scaled by.
    pub passing_no4: f64,
    /// Assumed sample weight.
    pub sample_weight: f64,
    /// One row per fine sieve followed by the "passes No.200" row.
    pub rows: Vec<SieveRow>,
}

/// Check entered weights and compute the leftover that passes the finest sieve.
///
/// A leftover below zero means the entered weights add up to more than the
/// sample; the error names the sieve where the running total first overshoots.
fn remainder(sieves: &[Sieve], retained: &[f64], total: f64) -> Result<f64, ValidationError> {
    if retained.len() != sieves.len() {
        return Err(ValidationError::new(
            "retained",
            format!(
                "expected {} retained weights, got {}",
                sieves.len(),
                retained.len()
            ),
        ));
    }

    let mut sum = 0.0;
    for (sieve, weight) in sieves.iter().zip(retained) {
        sum += non_negative(sieve.id, *weight)?;
        if total > 0.0 && sum > total + WEIGHT_EPSILON {
            return Err(ValidationError::new(
                sieve.id,
                format!("retained weights ({sum}) exceed the sample weight ({total})"),
            ));
        }
    }
    Ok(total - sum)
}

/// Run a granulometry (or asphalt content) analysis.
///
/// Each row subtracts its rounded percent retained from the running percent
/// passing, so rounding error accumulates down the table and the final row
/// can land slightly below zero. A tare heavier than the gross weight gives a
/// negative net weight; every percentage is then zero and the "passes No.4"
/// row carries the negative leftover.
///
/// # Errors
///
/// Returns a [`ValidationError`] for negative or non-finite weights, a retained
/// list of the wrong length, or retained weights exceeding the net weight.
pub fn sieve_analysis(
    test_type: SieveTest,
    input: &SieveInput,
) -> Result<SieveAnalysis, ValidationError> {
    let gross = non_negative("gross", input.gross_weight)?;
    let tare = non_negative("tare", input.tare_weight)?;
    let volume = non_negative("volume", input.sample_volume)?;

    let net_weight = gross - tare;
    let volumetric_weight = if net_weight > 0.0 && volume > 0.0 {
        net_weight / volume * 1000.0
    } else {
        0.0
    };

    let passes = remainder(&COARSE_SIEVES, &input.retained, net_weight)?;

    let rows = COARSE_SIEVES
        .iter()
        .chain(iter::once(&PASSES_NO4))
        .zip(input.retained.iter().copied().chain(iter::once(passes)))
        .scan(100.0_f64, |passing, (sieve, retained_weight)| {
            let percent_retained = if net_weight > 0.0 {
                retained_weight / net_weight * 100.0
            } else {
                0.0
            };
            let percent_retained_rounded = percent_retained.round();
            *passing -= percent_retained_rounded;
            Some(SieveRow {
                sieve: *sieve,
                retained_weight,
                percent_retained,
                percent_retained_rounded,
                cumulative_retained: 100.0 - *passing,
                percent_passing: *passing,
            })
        })
        .collect();

    Ok(SieveAnalysis {
        test_type,
        net_weight,
        volumetric_weight,
        rows,
    })
}

/// Run a washed-sieve analysis scaled by the granulometry's percent passing No.4.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `passing_no4` is outside 0..=100, for
/// negative or non-finite weights, or if the weights exceed the sample weight.
pub fn washed_sieve_analysis(
    input: &WashedSieveInput,
) -> Result<WashedSieveAnalysis, ValidationError> {
    let passing_no4 = non_negative("passing_no4", input.passing_no4)?;
    if passing_no4 > 100.0 {
        return Err(ValidationError::new("passing_no4", "must not exceed 100 percent"));
    }

    let finest = remainder(&FINE_SIEVES, &input.retained, WASHED_SAMPLE_WEIGHT)?;
    let last = FINE_SIEVES.len();

    let rows = FINE_SIEVES
        .iter()
        .chain(iter::once(&PASSES_NO200))
        .zip(input.retained.iter().copied().chain(iter::once(finest)))
        .enumerate()
        .scan(0.0_f64, |cumulative, (idx, (sieve, retained_weight))| {
            let partial = retained_weight / WASHED_SAMPLE_WEIGHT * 100.0;
            let percent_retained = partial * passing_no4 / 100.0;
            *cumulative += percent_retained;
            // nothing passes the pan row
            let percent_passing = if idx == last {
                0.0
            } else {
                passing_no4 - *cumulative
            };
            Some(SieveRow {
                sieve: *sieve,
                retained_weight,
                percent_retained,
                percent_retained_rounded: percent_retained.round(),
                cumulative_retained: *cumulative,
                percent_passing,
            })
        })
        .collect();

    Ok(WashedSieveAnalysis {
        passing_no4,
        sample_weight: WASHED_SAMPLE_WEIGHT,
        rows,
    })
}
