//! Staged renal protein rules
//!
//! KDIGO-style protein ceilings keyed by eGFR band. The table is evaluated
//! top-down and the first band containing the eGFR wins. A cap is applied as
//! `min(baseline, cap)` so it can only ever lower protein.

use serde::{Deserialize, Serialize};

/// eGFR below which kidney function counts as reduced (mL/min/1.73m²)
pub const REDUCED_KIDNEY_FUNCTION_EGFR: f64 = 60.0;

/// One band of the renal protein table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenalRule {
    /// CKD stage label for the band
    pub stage: &'static str,
    /// Inclusive lower bound
    pub egfr_min: f64,
    /// Exclusive upper bound
    pub egfr_max: f64,
    /// Protein ceiling in g per kg body weight
    pub protein_cap_g_per_kg: f64,
    pub nephrology_referral: bool,
}

impl RenalRule {
    pub fn contains(&self, egfr: f64) -> bool {
        egfr >= self.egfr_min && egfr < self.egfr_max
    }
}

pub const RENAL_PROTEIN_RULES: &[RenalRule] = &[
    RenalRule {
        stage: "G5",
        egfr_min: 0.0,
        egfr_max: 15.0,
        protein_cap_g_per_kg: 0.6,
        nephrology_referral: true,
    },
    RenalRule {
        stage: "G4",
        egfr_min: 15.0,
        egfr_max: 30.0,
        protein_cap_g_per_kg: 0.6,
        nephrology_referral: false,
    },
    RenalRule {
        stage: "G3",
        egfr_min: 30.0,
        egfr_max: REDUCED_KIDNEY_FUNCTION_EGFR,
        protein_cap_g_per_kg: 0.8,
        nephrology_referral: false,
    },
];

/// Find the band for an eGFR value, if kidney function is reduced
pub fn rule_for(egfr: f64) -> Option<&'static RenalRule> {
    RENAL_PROTEIN_RULES.iter().find(|rule| rule.contains(egfr))
}

/// How the renal safety gate treated a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenalAssessment {
    /// No eGFR supplied; protein was not checked against kidney function
    NotEvaluated,
    /// eGFR at or above the reduced-function threshold
    NoRestriction { egfr: f64 },
    /// eGFR fell in a restricted band
    Restricted {
        egfr: f64,
        stage: String,
        protein_cap_g_per_kg: f64,
        /// Whether the cap actually lowered the baseline
        capped: bool,
        nephrology_referral: bool,
    },
}

impl RenalAssessment {
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Restricted { .. })
    }
}
