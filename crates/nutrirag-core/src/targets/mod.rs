//! Nutrition targets engine
//!
//! Pure computation of daily energy and macronutrient targets:
//! - BMR via Mifflin-St Jeor (1990)
//! - TDEE from a fixed activity multiplier table
//! - Protein from a per-kg policy, lowered by the renal safety gate
//! - Fat and carbohydrate split from the remaining calorie budget

pub mod renal;

use crate::config::TargetsPolicy;
use crate::error::{NutriRagError, Result};
use renal::RenalAssessment;
use serde::{Deserialize, Serialize};

pub use renal::{RenalRule, RENAL_PROTEIN_RULES};

/// kcal per gram of protein or carbohydrate
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARB: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Accepted physiological ranges
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 1..=120;
pub const WEIGHT_RANGE_KG: std::ops::RangeInclusive<f64> = 2.0..=500.0;
pub const HEIGHT_RANGE_CM: std::ops::RangeInclusive<f64> = 30.0..=272.0;

/// Biological sex for the BMR constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    fn bmr_constant(self) -> f64 {
        match self {
            Self::Male => 5.0,
            Self::Female => -161.0,
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = NutriRagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            other => Err(NutriRagError::validation(format!(
                "unknown sex '{}', expected male or female",
                other
            ))),
        }
    }
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// 1-3 days/week
    LightlyActive,
    /// 3-5 days/week
    ModeratelyActive,
    /// 6-7 days/week
    VeryActive,
    /// Hard training twice a day
    ExtraActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        Self::Sedentary,
        Self::LightlyActive,
        Self::ModeratelyActive,
        Self::VeryActive,
        Self::ExtraActive,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::LightlyActive => 1.375,
            Self::ModeratelyActive => 1.55,
            Self::VeryActive => 1.725,
            Self::ExtraActive => 1.9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::LightlyActive => "lightly_active",
            Self::ModeratelyActive => "moderately_active",
            Self::VeryActive => "very_active",
            Self::ExtraActive => "extra_active",
        }
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = NutriRagError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| {
                NutriRagError::validation(format!("unknown activity level '{}'", s))
            })
    }
}

/// User demographics for the targets engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub sex: Sex,
    pub activity_level: ActivityLevel,
    /// Estimated glomerular filtration rate (mL/min/1.73m²)
    #[serde(default)]
    pub egfr: Option<f64>,
}

impl UserProfile {
    /// Check the profile against physiological bounds
    pub fn validate(&self) -> Result<()> {
        if !self.weight_kg.is_finite() || !WEIGHT_RANGE_KG.contains(&self.weight_kg) {
            return Err(NutriRagError::validation(format!(
                "weight must be between {} and {} kg, got {}",
                WEIGHT_RANGE_KG.start(),
                WEIGHT_RANGE_KG.end(),
                self.weight_kg
            )));
        }
        if !self.height_cm.is_finite() || !HEIGHT_RANGE_CM.contains(&self.height_cm) {
            return Err(NutriRagError::validation(format!(
                "height must be between {} and {} cm, got {}",
                HEIGHT_RANGE_CM.start(),
                HEIGHT_RANGE_CM.end(),
                self.height_cm
            )));
        }
        if !AGE_RANGE.contains(&self.age) {
            return Err(NutriRagError::validation(format!(
                "age must be between {} and {} years, got {}",
                AGE_RANGE.start(),
                AGE_RANGE.end(),
                self.age
            )));
        }
        if let Some(egfr) = self.egfr {
            if !egfr.is_finite() || egfr < 0.0 {
                return Err(NutriRagError::validation(format!(
                    "eGFR must be a non-negative number, got {}",
                    egfr
                )));
            }
        }
        Ok(())
    }
}

/// Daily energy and macronutrient targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
    /// Basal metabolic rate (kcal/day)
    pub bmr: f64,
    /// Total daily energy expenditure (kcal/day)
    pub tdee: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    /// Effective protein ratio after safety rules
    pub protein_g_per_kg: f64,
    pub renal: RenalAssessment,
    /// Every rule that changed a default value, in the order applied
    pub applied_adjustments: Vec<String>,
}

impl NutritionTargets {
    /// kcal implied by the macro targets
    pub fn macro_energy(&self) -> f64 {
        self.protein_g * KCAL_PER_G_PROTEIN
            + self.fat_g * KCAL_PER_G_FAT
            + self.carbs_g * KCAL_PER_G_CARB
    }

    /// Plain key/value facts, in a fixed order
    pub fn facts(&self) -> Vec<(&'static str, String)> {
        vec![
            ("BMR", format!("{:.0} kcal/day", self.bmr)),
            ("TDEE", format!("{:.0} kcal/day", self.tdee)),
            (
                "Protein",
                format!("{:.1} g/day ({:.2} g/kg)", self.protein_g, self.protein_g_per_kg),
            ),
            ("Fat", format!("{:.1} g/day", self.fat_g)),
            ("Carbohydrate", format!("{:.1} g/day", self.carbs_g)),
        ]
    }
}

/// Mifflin-St Jeor basal metabolic rate
pub fn mifflin_st_jeor(weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> f64 {
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + sex.bmr_constant()
}

/// Compute daily targets for a profile.
///
/// # Errors
///
/// Returns `Validation` when the profile is out of bounds, when it yields a
/// non-positive BMR, or when the protein target alone exceeds TDEE.
pub fn compute_targets(profile: &UserProfile, policy: &TargetsPolicy) -> Result<NutritionTargets> {
    profile.validate()?;

    let bmr = mifflin_st_jeor(profile.weight_kg, profile.height_cm, profile.age, profile.sex);
    if bmr <= 0.0 {
        return Err(NutriRagError::validation(format!(
            "profile yields a non-positive BMR ({:.1} kcal)",
            bmr
        )));
    }
    let tdee = bmr * profile.activity_level.multiplier();

    let mut adjustments = Vec::new();
    let mut protein_g_per_kg = policy.protein_g_per_kg;
    let baseline_protein_g = profile.weight_kg * policy.protein_g_per_kg;

    let renal = match profile.egfr {
        None => RenalAssessment::NotEvaluated,
        Some(egfr) => match renal::rule_for(egfr) {
            None => RenalAssessment::NoRestriction { egfr },
            Some(rule) => {
                let capped = rule.protein_cap_g_per_kg < protein_g_per_kg;
                if capped {
                    protein_g_per_kg = rule.protein_cap_g_per_kg;
                    adjustments.push(format!(
                        "Protein restricted from {:.1} g to {:.1} g/day ({} g/kg) for eGFR {} (CKD stage {}) per KDIGO guidance",
                        baseline_protein_g,
                        profile.weight_kg * protein_g_per_kg,
                        rule.protein_cap_g_per_kg,
                        egfr,
                        rule.stage
                    ));
                }
                if rule.nephrology_referral {
                    adjustments.push(format!(
                        "Nephrology referral recommended: eGFR {} is below {} (CKD stage {})",
                        egfr, rule.egfr_max, rule.stage
                    ));
                }
                RenalAssessment::Restricted {
                    egfr,
                    stage: rule.stage.to_string(),
                    protein_cap_g_per_kg: rule.protein_cap_g_per_kg,
                    capped,
                    nephrology_referral: rule.nephrology_referral,
                }
            }
        },
    };

    let protein_g = profile.weight_kg * protein_g_per_kg;
    let remaining_kcal = tdee - protein_g * KCAL_PER_G_PROTEIN;
    if remaining_kcal < 0.0 {
        return Err(NutriRagError::validation(format!(
            "protein target ({:.1} g) exceeds the daily energy budget ({:.0} kcal)",
            protein_g, tdee
        )));
    }
    let fat_g = remaining_kcal * policy.fat_share / KCAL_PER_G_FAT;
    let carbs_g = remaining_kcal * policy.carb_share() / KCAL_PER_G_CARB;

    tracing::debug!(
        bmr,
        tdee,
        protein_g,
        fat_g,
        carbs_g,
        adjustments = adjustments.len(),
        "Computed nutrition targets"
    );

    Ok(NutritionTargets {
        bmr,
        tdee,
        protein_g,
        fat_g,
        carbs_g,
        protein_g_per_kg,
        renal,
        applied_adjustments: adjustments,
    })
}
