//! Daily, weekly and monthly dietary budgets derived from nutrition targets

use crate::config::TargetsPolicy;
use crate::error::{NutriRagError, Result};
use crate::labs::{LabPanel, NutrientLimits};
use crate::recommend::effective_profile;
use crate::targets::{compute_targets, NutritionTargets, UserProfile};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const FLEXIBILITY_NOTE: &str =
    "Budget allows 10-15% daily flexibility while maintaining weekly/monthly targets";

/// Budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl std::str::FromStr for BudgetPeriod {
    type Err = NutriRagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(NutriRagError::validation(format!(
                "unknown budget period '{}', expected daily, weekly or monthly",
                other
            ))),
        }
    }
}

/// Per-day amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBudget {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sodium_mg: f64,
}

/// Totals over a span of days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub days: u32,
    /// Month label ("March 2026") for monthly budgets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sodium_mg: f64,
}

/// Budget for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietaryBudget {
    pub period: BudgetPeriod,
    pub daily: DailyBudget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly: Option<PeriodTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly: Option<PeriodTotals>,
    pub calculation_method: String,
    pub notes: Vec<String>,
}

impl DailyBudget {
    fn totals(&self, days: u32, label: Option<String>) -> PeriodTotals {
        let n = f64::from(days);
        PeriodTotals {
            days,
            label,
            calories: self.calories * n,
            protein_g: self.protein_g * n,
            carbs_g: self.carbs_g * n,
            fat_g: self.fat_g * n,
            fiber_g: self.fiber_g * n,
            sodium_mg: self.sodium_mg * n,
        }
    }
}

/// Number of days in the calendar month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

impl DietaryBudget {
    /// Build a budget; weekly totals cover monthly requests too
    pub fn from_targets(
        targets: &NutritionTargets,
        limits: &NutrientLimits,
        period: BudgetPeriod,
        start_date: NaiveDate,
        allow_flexibility: bool,
        activity_label: &str,
    ) -> Self {
        let daily = DailyBudget {
            calories: targets.tdee,
            protein_g: targets.protein_g,
            carbs_g: targets.carbs_g,
            fat_g: targets.fat_g,
            fiber_g: limits.fiber_g,
            sodium_mg: limits.sodium_mg,
        };

        let weekly = matches!(period, BudgetPeriod::Weekly | BudgetPeriod::Monthly)
            .then(|| daily.totals(7, None));
        let monthly = (period == BudgetPeriod::Monthly).then(|| {
            daily.totals(
                days_in_month(start_date),
                Some(start_date.format("%B %Y").to_string()),
            )
        });

        let mut notes = Vec::new();
        if allow_flexibility {
            notes.push(FLEXIBILITY_NOTE.to_string());
        }
        notes.extend(targets.applied_adjustments.iter().cloned());

        Self {
            period,
            daily,
            weekly,
            monthly,
            calculation_method: format!(
                "Mifflin-St Jeor TDEE with {} activity",
                activity_label
            ),
            notes,
        }
    }
}

/// Targets, lab limits and budget in one step; a lab eGFR tightens the profile
pub fn plan(
    profile: &UserProfile,
    labs: Option<&LabPanel>,
    policy: &TargetsPolicy,
    period: BudgetPeriod,
    start_date: NaiveDate,
    allow_flexibility: bool,
) -> Result<DietaryBudget> {
    if let Some(labs) = labs {
        labs.validate()?;
    }
    let targets = compute_targets(&effective_profile(profile, labs), policy)?;
    let limits = labs.cloned().unwrap_or_default().nutrient_limits(targets.tdee);
    Ok(DietaryBudget::from_targets(
        &targets,
        &limits,
        period,
        start_date,
        allow_flexibility,
        profile.activity_level.as_str(),
    ))
}
