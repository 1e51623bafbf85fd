//! Blood-pressure evaluation for the health-check service.
//!
//! A [`HealthReading`] is parsed from the flat JSON map the mobile client
//! posts, classified into a [`BloodPressureStatus`] by age band, and rendered
//! into a plain-text [`HealthReport`] that the model is asked to analyse.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{MedchatError, Result};

/// Message returned when any numeric field fails to parse.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input data. Please provide numeric values for age, systolic_bp, diastolic_bp, and weight.";

/// Closing line appended to every report.
const REPORT_FOOTER: &str = "如果上述任何指标不正常，请咨询医疗保健专业人员以获得进一步指导。";

/// Gender recorded when the client sends none.
const UNKNOWN_GENDER: &str = "不知道";

// Each field is looked up under its Chinese key first, then the English alias.
const AGE_KEYS: [&str; 2] = ["年龄", "age"];
const SYSTOLIC_KEYS: [&str; 2] = ["收缩压", "systolic_bp"];
const DIASTOLIC_KEYS: [&str; 2] = ["舒张压", "diastolic_bp"];
const WEIGHT_KEYS: [&str; 2] = ["体重", "weight"];
const GENDER_KEYS: [&str; 2] = ["gender", "性别"];

/// One set of self-reported measurements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReading {
    /// Age in years.
    pub age: i64,
    /// Free-text gender.
    pub gender: String,
    /// Systolic pressure in mmHg.
    pub systolic_bp: i64,
    /// Diastolic pressure in mmHg.
    pub diastolic_bp: i64,
    /// Weight in kilograms.
    pub weight: i64,
}

impl HealthReading {
    /// Parse a reading from a flat JSON object.
    ///
    /// Numeric fields accept JSON integers, floats (truncated) and strings
    /// holding an integer; absent fields default to 0.
    ///
    /// # Errors
    /// Returns [`MedchatError::Validation`] with [`INVALID_INPUT_MESSAGE`] if a
    /// present numeric field is not an integer.
    pub fn from_json(fields: &Map<String, Value>) -> Result<Self> {
        let gender = match lookup(fields, &GENDER_KEYS) {
            None | Some(Value::Null) => UNKNOWN_GENDER.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            age: numeric_field(fields, &AGE_KEYS)?,
            gender,
            systolic_bp: numeric_field(fields, &SYSTOLIC_KEYS)?,
            diastolic_bp: numeric_field(fields, &DIASTOLIC_KEYS)?,
            weight: numeric_field(fields, &WEIGHT_KEYS)?,
        })
    }
}

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| fields.get(*k))
}

fn numeric_field(fields: &Map<String, Value>, keys: &[&str]) -> Result<i64> {
    let Some(value) = lookup(fields, keys) else {
        return Ok(0);
    };
    parse_integer(value).ok_or_else(|| MedchatError::validation(INVALID_INPUT_MESSAGE))
}

#[allow(clippy::cast_possible_truncation)]
fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Blood-pressure band for a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BloodPressureStatus {
    /// Within the band for the age group.
    Normal,
    /// Outside the band for children, teenagers or seniors.
    Abnormal,
    /// Adult 120–139 / 80–89.
    PreHypertension,
    /// Adult 140–159 / 90–99.
    Stage1Hypertension,
    /// Adult above stage 1.
    Stage2Hypertension,
}

impl BloodPressureStatus {
    /// Label used in the report text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Abnormal => "Abnormal",
            Self::PreHypertension => "Pre-hypertension",
            Self::Stage1Hypertension => "Stage 1 Hypertension",
            Self::Stage2Hypertension => "Stage 2 Hypertension",
        }
    }
}

impl fmt::Display for BloodPressureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a reading by age band.
///
/// Children (≤ 12), teenagers (13–18) and seniors (> 60) are only
/// normal/abnormal; adults (19–60) are staged.
#[must_use]
pub fn classify_blood_pressure(age: i64, systolic: i64, diastolic: i64) -> BloodPressureStatus {
    use BloodPressureStatus::{
        Abnormal, Normal, PreHypertension, Stage1Hypertension, Stage2Hypertension,
    };

    let within = |ok: bool| if ok { Normal } else { Abnormal };

    if age <= 12 {
        within((90..=110).contains(&systolic) && (55..=75).contains(&diastolic))
    } else if (13..=18).contains(&age) {
        within((110..=135).contains(&systolic) && (65..=85).contains(&diastolic))
    } else if age > 60 {
        within(systolic < 150 && diastolic < 90)
    } else if systolic < 120 && diastolic < 80 {
        Normal
    } else if (120..=139).contains(&systolic) || (80..=89).contains(&diastolic) {
        PreHypertension
    } else if (140..=159).contains(&systolic) || (90..=99).contains(&diastolic) {
        Stage1Hypertension
    } else {
        Stage2Hypertension
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Evaluated reading, ready to be summarised for the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Age in years.
    pub age: i64,
    /// Free-text gender.
    pub gender: String,
    /// Classified pressure band.
    pub blood_pressure_status: BloodPressureStatus,
    /// Weight in kilograms.
    pub weight: i64,
}

impl HealthReport {
    /// Evaluate a reading.
    #[must_use]
    pub fn evaluate(reading: &HealthReading) -> Self {
        Self {
            age: reading.age,
            gender: reading.gender.clone(),
            blood_pressure_status: classify_blood_pressure(
                reading.age,
                reading.systolic_bp,
                reading.diastolic_bp,
            ),
            weight: reading.weight,
        }
    }

    /// Plain-text summary, one `- Key: value` line per field.
    #[must_use]
    pub fn to_summary(&self) -> String {
        format!(
            "Here is your health evaluation report:\n\
             - Age: {}\n\
             - Gender: {}\n\
             - Blood Pressure Status: {}\n\
             - Weight: {}\n\
             \n{REPORT_FOOTER}",
            self.age, self.gender, self.blood_pressure_status, self.weight
        )
    }
}
