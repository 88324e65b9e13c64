//! Field compaction by the sand cone method.

use serde::{Deserialize, Serialize};

use super::input::{non_negative, positive, required, Fields};
use crate::error::ValidationError;

/// Raw measurements from a sand cone density test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompactionInput {
    /// Sand weight in the cone before the test.
    pub initial_sand: f64,
    /// Sand weight left over after filling the hole.
    pub leftover_sand: f64,
    /// Weight of the wet material dug out of the hole.
    pub wet_material: f64,
    /// Calibrated volumetric weight of the sand.
    pub sand_volumetric_weight: f64,
    /// Moisture content of the material, in percent.
    pub moisture_percent: f64,
    /// Laboratory maximum dry volumetric weight.
    pub max_volumetric_weight: f64,
}

impl CompactionInput {
    /// Field names accepted by [`CompactionInput::from_fields`].
    pub const FIELDS: [&'static str; 6] = [
        "initial_sand",
        "leftover_sand",
        "wet_material",
        "sand_volumetric_weight",
        "moisture_percent",
        "max_volumetric_weight",
    ];

    /// Parse a compaction form.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for the first missing or unparseable field.
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationError> {
        Ok(Self {
            initial_sand: required(fields, "initial_sand")?,
            leftover_sand: required(fields, "leftover_sand")?,
            wet_material: required(fields, "wet_material")?,
            sand_volumetric_weight: required(fields, "sand_volumetric_weight")?,
            moisture_percent: required(fields, "moisture_percent")?,
            max_volumetric_weight: required(fields, "max_volumetric_weight")?,
        })
    }
}

/// Every intermediate of the compaction chain, each displayable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompactionResult {
    /// Sand used to fill the hole.
    pub used_sand: f64,
    /// Volume of the bored hole.
    pub bored_volume: f64,
    /// Volumetric weight of the wet material.
    pub wet_volumetric_weight: f64,
    /// `1 + moisture / 100`.
    pub moisture_factor: f64,
    /// Dry volumetric weight at the site.
    pub dry_volumetric_weight: f64,
    /// Degree of compaction against the laboratory maximum, in percent.
    pub compaction_percent: f64,
}

/// Compute the degree of compaction.
///
/// Denominators are checked before any division happens.
///
/// # Errors
///
/// Returns a [`ValidationError`] if any input is negative or non-finite, if the
/// sand or maximum volumetric weight is not positive, or if no sand was used.
pub fn compaction(input: &CompactionInput) -> Result<CompactionResult, ValidationError> {
    let initial_sand = non_negative("initial_sand", input.initial_sand)?;
    let leftover_sand = non_negative("leftover_sand", input.leftover_sand)?;
    let wet_material = non_negative("wet_material", input.wet_material)?;
    let sand_volumetric_weight = positive("sand_volumetric_weight", input.sand_volumetric_weight)?;
    let moisture_percent = non_negative("moisture_percent", input.moisture_percent)?;
    let max_volumetric_weight = positive("max_volumetric_weight", input.max_volumetric_weight)?;

    let used_sand = initial_sand - leftover_sand;
    if used_sand <= 0.0 {
        return Err(ValidationError::new("leftover_sand", "used sand must be positive"));
    }

    let bored_volume = used_sand / sand_volumetric_weight;
    let wet_volumetric_weight = wet_material / bored_volume;
    let moisture_factor = 1.0 + moisture_percent / 100.0;
    let dry_volumetric_weight = wet_volumetric_weight / moisture_factor;
    let compaction_percent = dry_volumetric_weight / max_volumetric_weight * 100.0;

    Ok(CompactionResult {
        used_sand,
        bored_volume,
        wet_volumetric_weight,
        moisture_factor,
        dry_volumetric_weight,
        compaction_percent,
    })
}
