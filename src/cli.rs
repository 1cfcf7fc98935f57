use clap::{Args, Parser, Subcommand};

use crate::classify::Strategy;

/// LLM-assisted review theming and moderation helpers
#[derive(Parser, Debug, Clone)]
#[command(name = "review-themes", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Path to config file (default: review-themes.toml if present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Completion model identifier
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory with prompt template overrides
    #[arg(long, global = true)]
    pub prompts_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Extract, consolidate and rank review themes
    Classify(ClassifyArgs),

    /// Find reviews complaining about flagged or removed reviews
    Flag(FlagArgs),

    /// Explain review removals and propose compliant rewrites
    Reformulate(ReformulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Input workbook
    #[arg(long, default_value = "Trust_Pilot_Reviews.xlsx")]
    pub input: String,

    /// Output workbook
    #[arg(long, default_value = "Review_Theme_Analysis.xlsx")]
    pub output: String,

    /// Worksheet to read (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Column holding the review text
    #[arg(long)]
    pub column: Option<String>,

    /// Maximum number of themes in the report
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_themes: Option<usize>,

    /// Example selection and counting strategy
    #[arg(long, value_enum, default_value_t = Strategy::Ranked)]
    pub strategy: Strategy,
}

#[derive(Args, Debug, Clone)]
pub struct FlagArgs {
    /// Input workbook
    #[arg(long, default_value = "Trust_Pilot_Reviews.xlsx")]
    pub input: String,

    /// Output workbook
    #[arg(long, default_value = "Review_Flagging_Analysis.xlsx")]
    pub output: String,

    /// Worksheet to read (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Column holding the review text
    #[arg(long)]
    pub column: Option<String>,

    /// Minimum relevance score (0-10) for a review to be reported
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub threshold: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct ReformulateArgs {
    /// Input workbook
    #[arg(long, default_value = "Trustpilot_Dataset.xlsx")]
    pub input: String,

    /// Output workbook
    #[arg(long, default_value = "output_trustpilot.xlsx")]
    pub output: String,

    /// Worksheet holding the removal complaints
    #[arg(long, default_value = "dataset")]
    pub sheet: String,

    /// Guidelines document (PDF or plain text)
    #[arg(long, default_value = "trustpilot_guidelines.pdf")]
    pub guidelines: String,
}
