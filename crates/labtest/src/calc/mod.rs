//! Derived measurement calculator.
//!
//! Every formula set is a pure function from an immutable input value to an
//! immutable result value. [`calculate`] dispatches a [`SampleInput`] to the
//! matching formula set; the individual functions can also be called directly.
//!
//! # Example
//!
//! ```
//! use labtest::calc::{calculate, CylinderInput, DerivedResult, SampleInput};
//!
//! let input = SampleInput::Cylinder(CylinderInput {
//!     diameter: 15.2,
//!     load: 35000.0,
//!     fc: 210.0,
//! });
//!
//! match calculate(&input) {
//!     Ok(DerivedResult::Cylinder(result)) => println!("{:.2}%", result.percent),
//!     Ok(_) => unreachable!(),
//!     Err(err) => println!("{err}"),
//! }
//! ```

mod compaction;
mod input;
mod sieve;
mod strength;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::ValidationError;

pub use compaction::{compaction, CompactionInput, CompactionResult};
pub use input::{fields_from_pairs, parse_number, Fields};
pub use sieve::{
    sieve_analysis, washed_sieve_analysis, Sieve, SieveAnalysis, SieveInput, SieveRow, SieveTest,
    WashedSieveAnalysis, WashedSieveInput, COARSE_SIEVES, FINE_SIEVES, PASSES_NO200, PASSES_NO4,
    WASHED_SAMPLE_WEIGHT,
};
pub use strength::{
    beam, cylinder, mortar, BeamInput, BeamResult, BreakType, CylinderInput, CylinderResult,
    MortarInput, MortarResult, MORTAR_AREA,
};

/// The kinds of calculation a form can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// Sand cone compaction.
    Compaction,
    /// Concrete cylinder compressive strength.
    Cylinder,
    /// Concrete beam modulus of rupture.
    Beam,
    /// Mortar cube compressive strength.
    Mortar,
    /// Granulometry of a soil or aggregate sample.
    Granulometry,
    /// Aggregate gradation of an asphalt sample.
    AsphaltContent,
    /// Washed fine-sieve analysis.
    WashedSieve,
}

impl From<SieveTest> for TestType {
    fn from(test: SieveTest) -> Self {
        match test {
            SieveTest::Granulometry => Self::Granulometry,
            SieveTest::AsphaltContent => Self::AsphaltContent,
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compaction => write!(f, "compaction"),
            Self::Cylinder => write!(f, "cylinder"),
            Self::Beam => write!(f, "beam"),
            Self::Mortar => write!(f, "mortar"),
            Self::Granulometry => write!(f, "granulometry"),
            Self::AsphaltContent => write!(f, "asphalt_content"),
            Self::WashedSieve => write!(f, "washed_sieve"),
        }
    }
}

/// One calculation's worth of raw inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleInput {
    /// Sand cone compaction inputs.
    Compaction(CompactionInput),
    /// Cylinder inputs.
    Cylinder(CylinderInput),
    /// Beam inputs.
    Beam(BeamInput),
    /// Mortar inputs.
    Mortar(MortarInput),
    /// Granulometry inputs.
    Granulometry(SieveInput),
    /// Asphalt content inputs.
    AsphaltContent(SieveInput),
    /// Washed-sieve inputs.
    WashedSieve(WashedSieveInput),
}

impl SampleInput {
    /// Build the input for `test_type` from raw form fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first field that is missing or
    /// cannot be read as a finite number.
    pub fn from_fields(test_type: TestType, fields: &Fields) -> Result<Self, ValidationError> {
        Ok(match test_type {
            TestType::Compaction => Self::Compaction(CompactionInput::from_fields(fields)?),
            TestType::Cylinder => Self::Cylinder(CylinderInput::from_fields(fields)?),
            TestType::Beam => Self::Beam(BeamInput::from_fields(fields)?),
            TestType::Mortar => Self::Mortar(MortarInput::from_fields(fields)?),
            TestType::Granulometry => Self::Granulometry(SieveInput::from_fields(fields)?),
            TestType::AsphaltContent => Self::AsphaltContent(SieveInput::from_fields(fields)?),
            TestType::WashedSieve => Self::WashedSieve(WashedSieveInput::from_fields(fields)?),
        })
    }

    /// The calculation this input is for.
    #[must_use]
    pub fn test_type(&self) -> TestType {
        match self {
            Self::Compaction(_) => TestType::Compaction,
            Self::Cylinder(_) => TestType::Cylinder,
            Self::Beam(_) => TestType::Beam,
            Self::Mortar(_) => TestType::Mortar,
            Self::Granulometry(_) => TestType::Granulometry,
            Self::AsphaltContent(_) => TestType::AsphaltContent,
            Self::WashedSieve(_) => TestType::WashedSieve,
        }
    }
}

/// The output of a calculation. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DerivedResult {
    /// Compaction chain.
    Compaction(CompactionResult),
    /// Cylinder strength.
    Cylinder(CylinderResult),
    /// Beam modulus of rupture.
    Beam(BeamResult),
    /// Mortar strength.
    Mortar(MortarResult),
    /// Granulometry or asphalt content table.
    Sieve(SieveAnalysis),
    /// Washed-sieve table.
    WashedSieve(WashedSieveAnalysis),
}

/// Run the formula set matching `input`.
///
/// # Errors
///
/// Returns a [`ValidationError`] if any input violates its constraints. No
/// partial result is produced.
pub fn calculate(input: &SampleInput) -> Result<DerivedResult, ValidationError> {
    let result = match input {
        SampleInput::Compaction(i) => compaction(i).map(DerivedResult::Compaction),
        SampleInput::Cylinder(i) => cylinder(i).map(DerivedResult::Cylinder),
        SampleInput::Beam(i) => beam(i).map(DerivedResult::Beam),
        SampleInput::Mortar(i) => mortar(i).map(DerivedResult::Mortar),
        SampleInput::Granulometry(i) => {
            sieve_analysis(SieveTest::Granulometry, i).map(DerivedResult::Sieve)
        }
        SampleInput::AsphaltContent(i) => {
            sieve_analysis(SieveTest::AsphaltContent, i).map(DerivedResult::Sieve)
        }
        SampleInput::WashedSieve(i) => washed_sieve_analysis(i).map(DerivedResult::WashedSieve),
    };

    match &result {
        Ok(_) => debug!(test_type = %input.test_type(), "calculation completed"),
        Err(err) => debug!(test_type = %input.test_type(), "calculation rejected: {}", err),
    }
    result
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
    fn test_test_type_display() {
        assert_eq!(TestType::Compaction.to_string(), "compaction");
        assert_eq!(TestType::AsphaltContent.to_string(), "asphalt_content");
        assert_eq!(TestType::WashedSieve.to_string(), "washed_sieve");
    }

    #[test]
    fn test_from_fields_round_trips_test_type() {
        let input = SampleInput::from_fields(
            TestType::Mortar,
            &fields(&[("load", "5000"), ("fc", "250")]),
        )
        .unwrap();
        assert_eq!(input.test_type(), TestType::Mortar);
    }

    #[test]
    fn test_calculate_cylinder() {
        let input = SampleInput::from_fields(
            TestType::Cylinder,
            &fields(&[("diameter", "15.2"), ("load", "35000"), ("fc", "210")]),
        )
        .unwrap();
        match calculate(&input).unwrap() {
            DerivedResult::Cylinder(result) => assert!((result.area - 181.46).abs() < 0.01),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_asphalt_content_uses_sieve_table() {
        let input = SampleInput::from_fields(
            TestType::AsphaltContent,
            &fields(&[("gross", "1100"), ("tare", "100"), ("volume", "0.5"), ("no4", "400")]),
        )
        .unwrap();
        match calculate(&input).unwrap() {
            DerivedResult::Sieve(analysis) => {
                assert_eq!(analysis.test_type, SieveTest::AsphaltContent);
                assert_eq!(analysis.net_weight, 1000.0);
                assert_eq!(analysis.rows.last().unwrap().retained_weight, 600.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_zero_denominators_fail_everywhere() {
        let cases = [
            SampleInput::Compaction(CompactionInput {
                initial_sand: 3800.0,
                leftover_sand: 1500.0,
                wet_material: 450.0,
                sand_volumetric_weight: 0.0,
                moisture_percent: 8.0,
                max_volumetric_weight: 1.95,
            }),
            SampleInput::Cylinder(CylinderInput {
                diameter: 15.2,
                load: 35000.0,
                fc: 0.0,
            }),
            SampleInput::Beam(BeamInput {
                load: -10.0,
                break_type: BreakType::Lateral,
            }),
            SampleInput::Mortar(MortarInput {
                load: 0.0,
                fc: 250.0,
            }),
        ];
        for input in &cases {
            assert!(calculate(input).is_err(), "{:?} should fail", input.test_type());
        }
    }

    #[test]
    fn test_derived_result_serializes_with_tag() {
        let result = calculate(&SampleInput::Mortar(MortarInput {
            load: 5000.0,
            fc: 250.0,
        }))
        .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "mortar");
        assert_eq!(json["area"], 25.0);
    }

    #[test]
    fn test_sieve_result_names_its_test_type() {
        let form = fields(&[("gross", "1100"), ("tare", "100"), ("no4", "400")]);
        for (test_type, name) in [
            (TestType::Granulometry, "granulometry"),
            (TestType::AsphaltContent, "asphalt_content"),
        ] {
            let result = calculate(&SampleInput::from_fields(test_type, &form).unwrap()).unwrap();
            let json = serde_json::to_value(&result).unwrap();
            assert_eq!(json["type"], "sieve");
            assert_eq!(json["test_type"], name);
            assert_eq!(json["test_type"], test_type.to_string());
        }
    }

    #[test]
    fn test_sieve_test_maps_to_test_type() {
        assert_eq!(TestType::from(SieveTest::Granulometry), TestType::Granulometry);
        assert_eq!(TestType::from(SieveTest::AsphaltContent), TestType::AsphaltContent);
    }
}
