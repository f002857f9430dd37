//! Lab panel interpretation
//!
//! Turns raw lab values into a retrieval query, the guideline families worth
//! searching, a readable summary and micronutrient limits.

use crate::error::{NutriRagError, Result};
use serde::{Deserialize, Serialize};

/// Query used when no lab value crosses a threshold
pub const GENERAL_QUERY: &str = "general healthy eating guidelines";

/// Optional lab values; every present value must be finite and non-negative
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabPanel {
    /// Fasting glucose (mg/dL)
    #[serde(default)]
    pub glucose_fasting: Option<f64>,
    /// HbA1c (%)
    #[serde(default)]
    pub a1c: Option<f64>,
    /// Total cholesterol (mg/dL)
    #[serde(default)]
    pub total_cholesterol: Option<f64>,
    #[serde(default)]
    pub ldl: Option<f64>,
    #[serde(default)]
    pub hdl: Option<f64>,
    #[serde(default)]
    pub triglycerides: Option<f64>,
    /// Blood pressure (mmHg)
    #[serde(default)]
    pub systolic_bp: Option<f64>,
    #[serde(default)]
    pub diastolic_bp: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    /// Estimated glomerular filtration rate (mL/min/1.73m²)
    #[serde(default)]
    pub egfr: Option<f64>,
}

/// Daily micronutrient and fat-quality limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientLimits {
    pub sodium_mg: f64,
    pub fiber_g: f64,
    pub saturated_fat_max_g: f64,
}

impl LabPanel {
    fn values(&self) -> [(&'static str, Option<f64>); 10] {
        [
            ("glucose_fasting", self.glucose_fasting),
            ("a1c", self.a1c),
            ("total_cholesterol", self.total_cholesterol),
            ("ldl", self.ldl),
            ("hdl", self.hdl),
            ("triglycerides", self.triglycerides),
            ("systolic_bp", self.systolic_bp),
            ("diastolic_bp", self.diastolic_bp),
            ("bmi", self.bmi),
            ("egfr", self.egfr),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|(_, v)| v.is_none())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.values() {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(NutriRagError::validation(format!(
                        "lab value {} must be a non-negative number, got {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Retrieval query from the conditions the panel indicates
    pub fn build_query(&self) -> String {
        let mut conditions = Vec::new();

        if let Some(glucose) = self.glucose_fasting {
            if glucose >= 126.0 {
                conditions.push("diabetic blood glucose management diet");
            } else if glucose >= 100.0 {
                conditions.push("prediabetes blood sugar control nutrition");
            }
        }
        if let Some(a1c) = self.a1c {
            if a1c >= 6.5 {
                conditions.push("diabetes A1C dietary management");
            } else if a1c >= 5.7 {
                conditions.push("prediabetes A1C prevention diet");
            }
        }
        if self.total_cholesterol.is_some_and(|v| v >= 200.0) {
            conditions.push("high cholesterol heart healthy diet");
        }
        if self.ldl.is_some_and(|v| v >= 130.0) {
            conditions.push("LDL cholesterol reduction dietary guidelines");
        }
        if self.hdl.is_some_and(|v| v < 40.0) {
            conditions.push("increase HDL cholesterol nutrition");
        }
        if self.triglycerides.is_some_and(|v| v >= 150.0) {
            conditions.push("lower triglycerides diet recommendations");
        }
        if let (Some(sys), Some(dia)) = (self.systolic_bp, self.diastolic_bp) {
            if sys >= 140.0 || dia >= 90.0 {
                conditions.push("hypertension DASH diet blood pressure");
            } else if sys >= 120.0 || dia >= 80.0 {
                conditions.push("elevated blood pressure dietary changes");
            }
        }
        if let Some(bmi) = self.bmi {
            if bmi >= 30.0 {
                conditions.push("obesity weight management nutrition plan");
            } else if bmi >= 25.0 {
                conditions.push("overweight healthy weight loss diet");
            }
        }
        if self.egfr.is_some_and(|v| v < 60.0) {
            conditions.push("chronic kidney disease protein restriction diet");
        }

        if conditions.is_empty() {
            GENERAL_QUERY.to_string()
        } else {
            conditions.join(" ")
        }
    }

    /// Guideline families relevant to the measured markers (sorted, unique)
    pub fn relevant_guidelines(&self) -> Vec<String> {
        let mut guidelines: Vec<&str> = Vec::new();

        if self.glucose_fasting.is_some() || self.a1c.is_some() {
            guidelines.push("ADA");
        }
        if self.total_cholesterol.is_some()
            || self.ldl.is_some()
            || self.hdl.is_some()
            || self.triglycerides.is_some()
        {
            guidelines.extend(["AHA", "LIPID"]);
        }
        if self.systolic_bp.is_some() || self.diastolic_bp.is_some() {
            guidelines.extend(["DASH", "AHA"]);
        }
        if self.egfr.is_some_and(|v| v < 60.0) {
            guidelines.push("KDIGO");
        }
        if guidelines.is_empty() {
            guidelines.push("GENERAL");
        }

        guidelines.sort_unstable();
        guidelines.dedup();
        guidelines.into_iter().map(String::from).collect()
    }

    /// Human-readable summary of abnormal findings
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        match (self.a1c, self.glucose_fasting) {
            (Some(a1c), _) if a1c >= 6.5 => parts.push(format!("diabetes (A1C {}%)", a1c)),
            (Some(a1c), _) if a1c >= 5.7 => parts.push(format!("prediabetes (A1C {}%)", a1c)),
            (_, Some(glucose)) if glucose >= 126.0 => {
                parts.push(format!("elevated fasting glucose ({} mg/dL)", glucose))
            }
            _ => {}
        }
        if let Some(ldl) = self.ldl.filter(|v| *v >= 130.0) {
            parts.push(format!("elevated LDL cholesterol ({} mg/dL)", ldl));
        }
        if let Some(sys) = self.systolic_bp.filter(|v| *v >= 130.0) {
            match self.diastolic_bp {
                Some(dia) => parts.push(format!("elevated blood pressure ({}/{} mmHg)", sys, dia)),
                None => parts.push(format!("elevated systolic blood pressure ({} mmHg)", sys)),
            }
        }
        if let Some(egfr) = self.egfr {
            if egfr < 60.0 {
                parts.push(format!("moderate kidney disease (eGFR {})", egfr));
            } else if egfr < 90.0 {
                parts.push(format!("mild kidney function decline (eGFR {})", egfr));
            }
        }

        if parts.is_empty() {
            "Lab values are generally within normal ranges".to_string()
        } else {
            format!("Lab results indicate: {}", parts.join(", "))
        }
    }

    /// Sodium, fiber and saturated fat limits for a calorie budget
    pub fn nutrient_limits(&self, tdee: f64) -> NutrientLimits {
        let sodium_mg = if self.systolic_bp.is_some_and(|v| v > 130.0) {
            1500.0
        } else {
            2300.0
        };
        NutrientLimits {
            sodium_mg,
            fiber_g: 30.0,
            saturated_fat_max_g: tdee * 0.07 / 9.0,
        }
    }
}
