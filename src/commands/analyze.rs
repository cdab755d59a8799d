//! Analyze command - estimate how detectable hidden data in an image is.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use stegsuite::{analyze, AppConfig};

use super::{load_carrier, CommandExecutor};

/// Run steganalysis on an image.
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Image to analyze
    #[arg(short, long)]
    pub image: PathBuf,

    /// Also print the raw detector outputs
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommandExecutor for AnalyzeCommand {
    fn execute(&self, _config: &AppConfig) -> Result<()> {
        let buffer = load_carrier(&self.image)?;
        let report = analyze(&buffer);

        println!("Security score: {:.1}%", report.security_score * 100.0);
        println!("Security level: {}", report.security_level);
        println!("Detection risk: {}", report.detection_risk);
        println!("{}", report.recommendation);

        if self.verbose {
            println!();
            println!("Chi-square probability: {:.4}", report.signals.chi_square);
            println!("Sequential evidence:    {:.4}", report.signals.sequential);
            println!("RS embedding estimate:  {:.4}", report.signals.rs_estimate);
            println!("Samples analyzed:       {}", report.signals.samples_analyzed);
        }
        Ok(())
    }
}
