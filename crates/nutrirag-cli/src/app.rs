//! CLI argument definitions

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nutrirag_core::{ActivityLevel, BudgetPeriod, LabPanel, Sex, UserProfile};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nutrirag")]
#[command(
    author,
    version,
    about = "Nutrition targets and guideline-grounded dietary recommendations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Config file (defaults to NUTRIRAG_CONFIG or the user config dir)
    #[arg(long, global = true, env = "NUTRIRAG_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute daily energy and macronutrient targets
    Targets(TargetsArgs),

    /// Generate a guideline-grounded recommendation
    Recommend(RecommendArgs),

    /// Build a daily, weekly or monthly dietary budget
    Budget(BudgetArgs),

    /// Show configuration and probe external services
    Status,

    /// Start MCP server
    Mcp,
}

#[derive(Args)]
pub struct ProfileArgs {
    /// Body weight in kg
    #[arg(long)]
    pub weight: f64,

    /// Height in cm
    #[arg(long)]
    pub height: f64,

    /// Age in years
    #[arg(long)]
    pub age: u32,

    /// male or female
    #[arg(long)]
    pub sex: Sex,

    /// sedentary, lightly_active, moderately_active, very_active, extra_active
    #[arg(long, default_value = "sedentary")]
    pub activity: ActivityLevel,

    /// eGFR in mL/min/1.73m²
    #[arg(long)]
    pub egfr: Option<f64>,
}

impl ProfileArgs {
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            weight_kg: self.weight,
            height_cm: self.height,
            age: self.age,
            sex: self.sex,
            activity_level: self.activity,
            egfr: self.egfr,
        }
    }
}

/// Profile flags for commands where a profile is optional
#[derive(Args)]
pub struct OptionalProfileArgs {
    /// Body weight in kg
    #[arg(long, requires = "height", requires = "age", requires = "sex")]
    pub weight: Option<f64>,

    /// Height in cm
    #[arg(long, requires = "weight")]
    pub height: Option<f64>,

    /// Age in years
    #[arg(long, requires = "weight")]
    pub age: Option<u32>,

    /// male or female
    #[arg(long, requires = "weight")]
    pub sex: Option<Sex>,

    /// sedentary, lightly_active, moderately_active, very_active, extra_active
    #[arg(long, default_value = "sedentary")]
    pub activity: ActivityLevel,

    /// eGFR in mL/min/1.73m²
    #[arg(long, requires = "weight")]
    pub egfr: Option<f64>,
}

impl OptionalProfileArgs {
    pub fn to_profile(&self) -> Option<UserProfile> {
        Some(UserProfile {
            weight_kg: self.weight?,
            height_cm: self.height?,
            age: self.age?,
            sex: self.sex?,
            activity_level: self.activity,
            egfr: self.egfr,
        })
    }
}

#[derive(Args)]
pub struct LabArgs {
    /// Fasting glucose (mg/dL)
    #[arg(long)]
    pub glucose: Option<f64>,

    /// HbA1c (%)
    #[arg(long)]
    pub a1c: Option<f64>,

    /// Total cholesterol (mg/dL)
    #[arg(long)]
    pub total_cholesterol: Option<f64>,

    /// LDL cholesterol (mg/dL)
    #[arg(long)]
    pub ldl: Option<f64>,

    /// HDL cholesterol (mg/dL)
    #[arg(long)]
    pub hdl: Option<f64>,

    /// Triglycerides (mg/dL)
    #[arg(long)]
    pub triglycerides: Option<f64>,

    /// Systolic blood pressure (mmHg)
    #[arg(long)]
    pub systolic: Option<f64>,

    /// Diastolic blood pressure (mmHg)
    #[arg(long)]
    pub diastolic: Option<f64>,

    /// Body mass index
    #[arg(long)]
    pub bmi: Option<f64>,

    /// eGFR from the lab report
    #[arg(long)]
    pub lab_egfr: Option<f64>,
}

impl LabArgs {
    pub fn to_panel(&self) -> Option<LabPanel> {
        let panel = LabPanel {
            glucose_fasting: self.glucose,
            a1c: self.a1c,
            total_cholesterol: self.total_cholesterol,
            ldl: self.ldl,
            hdl: self.hdl,
            triglycerides: self.triglycerides,
            systolic_bp: self.systolic,
            diastolic_bp: self.diastolic,
            bmi: self.bmi,
            egfr: self.lab_egfr,
        };
        (!panel.is_empty()).then_some(panel)
    }
}

#[derive(Args)]
pub struct TargetsArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Args)]
pub struct RecommendArgs {
    /// Question (free text)
    pub query: Vec<String>,

    #[command(flatten)]
    pub profile: OptionalProfileArgs,

    #[command(flatten)]
    pub labs: LabArgs,

    /// Number of guideline passages to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Read the whole request as JSON from a file ("-" for stdin)
    #[arg(long, conflicts_with_all = ["query", "weight", "top_k"])]
    pub input: Option<PathBuf>,

    /// List retrieved passages in terminal output
    #[arg(long)]
    pub show_context: bool,
}

#[derive(Args)]
pub struct BudgetArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[command(flatten)]
    pub labs: LabArgs,

    /// daily, weekly or monthly
    #[arg(long, default_value = "weekly")]
    pub period: BudgetPeriod,

    /// First day of the budget (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Omit the daily flexibility note
    #[arg(long)]
    pub strict: bool,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    Cli,
    Json,
}
