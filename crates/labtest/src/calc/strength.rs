//! Compressive and flexural strength of concrete and mortar specimens.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::input::{positive, required, Fields};
use crate::error::ValidationError;

/// Loaded area of a standard mortar cube, in cm² (5 cm x 5 cm).
pub const MORTAR_AREA: f64 = 25.0;

/// Cylinder specimen measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderInput {
    /// Specimen diameter.
    pub diameter: f64,
    /// Breaking load.
    pub load: f64,
    /// Design strength f'c.
    pub fc: f64,
}

impl CylinderInput {
    /// Parse a cylinder form (`diameter`, `load`, `fc`).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for the first missing or unparseable field.
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationError> {
        Ok(Self {
            diameter: required(fields, "diameter")?,
            load: required(fields, "load")?,
            fc: required(fields, "fc")?,
        })
    }
}

/// Cylinder strength results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderResult {
    /// Cross-section area `π d² / 4`.
    pub area: f64,
    /// `load / area`.
    pub simple_strength: f64,
    /// Simple strength as a percentage of f'c.
    pub percent: f64,
}

/// Compute cylinder compressive strength.
///
/// # Errors
///
/// Returns a [`ValidationError`] unless diameter, load and f'c are all positive.
pub fn cylinder(input: &CylinderInput) -> Result<CylinderResult, ValidationError> {
    let diameter = positive("diameter", input.diameter)?;
    let load = positive("load", input.load)?;
    let fc = positive("fc", input.fc)?;

    let area = PI * diameter * diameter / 4.0;
    let simple_strength = load / area;
    Ok(CylinderResult {
        area,
        simple_strength,
        percent: simple_strength / fc * 100.0,
    })
}

/// Where a beam specimen broke, which selects the modulus factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    /// Failure within the middle third.
    #[default]
    Center,
    /// Failure outside the middle third.
    Lateral,
}

impl BreakType {
    /// Factor applied to the modulus of rupture.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Center => 42.0,
            Self::Lateral => 45.0,
        }
    }
}

impl fmt::Display for BreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Center => write!(f, "center"),
            Self::Lateral => write!(f, "lateral"),
        }
    }
}

impl FromStr for BreakType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "center" | "centro" | "42" => Ok(Self::Center),
            "lateral" | "45" => Ok(Self::Lateral),
            other => Err(ValidationError::new(
                "break_type",
                format!("unknown break type '{other}', expected center or lateral"),
            )),
        }
    }
}

/// Beam specimen measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamInput {
    /// Breaking load.
    pub load: f64,
    /// Break location.
    pub break_type: BreakType,
}

impl BeamInput {
    /// Parse a beam form (`load`, optional `break_type` defaulting to center).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a bad load or unknown break type.
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationError> {
        let break_type = match fields.get("break_type") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => BreakType::default(),
        };
        Ok(Self {
            load: required(fields, "load")?,
            break_type,
        })
    }
}

/// Beam modulus of rupture result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamResult {
    /// Factor selected by the break type.
    pub factor: f64,
    /// `(75 / load) / factor * 100000`.
    pub modulus_of_rupture: f64,
}

/// Compute the beam modulus of rupture.
///
/// # Errors
///
/// Returns a [`ValidationError`] unless the load is positive.
pub fn beam(input: &BeamInput) -> Result<BeamResult, ValidationError> {
    let load = positive("load", input.load)?;
    let factor = input.break_type.factor();
    Ok(BeamResult {
        factor,
        modulus_of_rupture: 75.0 / load / factor * 100_000.0,
    })
}

/// Mortar cube measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortarInput {
    /// Maximum load.
    pub load: f64,
    /// Characteristic strength f'c.
    pub fc: f64,
}

impl MortarInput {
    /// Parse a mortar form (`load`, `fc`).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for the first missing or unparseable field.
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationError> {
        Ok(Self {
            load: required(fields, "load")?,
            fc: required(fields, "fc")?,
        })
    }
}

/// Mortar strength results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortarResult {
    /// Fixed cube area.
    pub area: f64,
    /// `load / area`.
    pub simple_strength: f64,
    /// Simple strength as a percentage of f'c.
    pub percent: f64,
}

/// Compute mortar cube strength.
///
/// # Errors
///
/// Returns a [`ValidationError`] unless load and f'c are positive.
pub fn mortar(input: &MortarInput) -> Result<MortarResult, ValidationError> {
    let load = positive("load", input.load)?;
    let fc = positive("fc", input.fc)?;
    let simple_strength = load / MORTAR_AREA;
    Ok(MortarResult {
        area: MORTAR_AREA,
        simple_strength,
        percent: simple_strength / fc * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() < tolerance
    }

    #[test]
    fn test_cylinder_reference_sample() {
        let result = cylinder(&CylinderInput {
            diameter: 15.2,
            load: 35000.0,
            fc: 210.0,
        })
        .unwrap();

        assert!(close(result.area, 181.46, 0.01));
        assert!(close(result.simple_strength, 192.88, 0.05));
        assert!(close(result.percent, 91.84, 0.05));
    }

    #[test]
    fn test_cylinder_rejects_zero_diameter() {
        let err = cylinder(&CylinderInput {
            diameter: 0.0,
            load: 35000.0,
            fc: 210.0,
        })
        .unwrap_err();
        assert_eq!(err.field, "diameter");
    }

    #[test]
    fn test_cylinder_rejects_negative_fc() {
        let err = cylinder(&CylinderInput {
            diameter: 15.0,
            load: 35000.0,
            fc: -210.0,
        })
        .unwrap_err();
        assert_eq!(err.field, "fc");
    }

    #[test]
    fn test_beam_factors() {
        let center = beam(&BeamInput {
            load: 3000.0,
            break_type: BreakType::Center,
        })
        .unwrap();
        let lateral = beam(&BeamInput {
            load: 3000.0,
            break_type: BreakType::Lateral,
        })
        .unwrap();

        assert_eq!(center.factor, 42.0);
        assert_eq!(lateral.factor, 45.0);
        assert!(close(center.modulus_of_rupture, 75.0 / 3000.0 / 42.0 * 100_000.0, 1e-9));
        assert!(close(center.modulus_of_rupture, 59.52, 0.01));
        assert!(lateral.modulus_of_rupture < center.modulus_of_rupture);
    }

    #[test]
    fn test_beam_rejects_zero_load() {
        let err = beam(&BeamInput {
            load: 0.0,
            break_type: BreakType::Center,
        })
        .unwrap_err();
        assert_eq!(err.field, "load");
    }

    #[test]
    fn test_break_type_parse() {
        assert_eq!("center".parse::<BreakType>().unwrap(), BreakType::Center);
        assert_eq!("Centro".parse::<BreakType>().unwrap(), BreakType::Center);
        assert_eq!("lateral".parse::<BreakType>().unwrap(), BreakType::Lateral);
        assert_eq!("45".parse::<BreakType>().unwrap(), BreakType::Lateral);
        let err = "diagonal".parse::<BreakType>().unwrap_err();
        assert_eq!(err.field, "break_type");
    }

    #[test]
    fn test_beam_from_fields_defaults_to_center() {
        let mut fields = Fields::new();
        fields.insert("load".to_string(), "2500".to_string());
        let input = BeamInput::from_fields(&fields).unwrap();
        assert_eq!(input.break_type, BreakType::Center);
    }

    #[test]
    fn test_mortar() {
        let result = mortar(&MortarInput {
            load: 5000.0,
            fc: 250.0,
        })
        .unwrap();
        assert_eq!(result.area, 25.0);
        assert!(close(result.simple_strength, 200.0, 1e-9));
        assert!(close(result.percent, 80.0, 1e-9));
    }

    #[test]
    fn test_mortar_rejects_zero_fc() {
        let err = mortar(&MortarInput {
            load: 5000.0,
            fc: 0.0,
        })
        .unwrap_err();
        assert_eq!(err.field, "fc");
    }

    #[test]
    fn test_cylinder_from_fields_unparseable() {
        let mut fields = Fields::new();
        fields.insert("diameter".to_string(), "15.2".to_string());
        fields.insert("load".to_string(), "lots".to_string());
        fields.insert("fc".to_string(), "210".to_string());
        let err = CylinderInput::from_fields(&fields).unwrap_err();
        assert_eq!(err.field, "load");
    }
}
