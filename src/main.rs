//! Honeypot Scanner CLI
//!
//! Usage:
//!   honeypot-scanner 0xABCDEF... --chain bsc
//!   honeypot-scanner 0xABCDEF... --json --out report.json
//!   honeypot-scanner 0xABCDEF... --source Token.sol
//!
//! Environment:
//!   ETHERSCAN_API_KEY  - Etherscan V2 key (chain-specific keys take precedence)
//!   HDP_FLAG_WEIGHTS   - weight overrides, e.g. "minting=3,proxy_pattern=1"
//!   RUST_LOG           - log filter (default: warn)

use clap::Parser;
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use honeypot_scanner::{
    ChainId, ContractAnalyzer, EtherscanClient, RiskLevel, RiskReport, ScannerConfig,
    ScoringConfig, SourceDocument,
};

#[derive(Parser, Debug)]
#[command(name = "honeypot-scanner", version)]
#[command(about = "Scan a verified ERC-20 contract for honeypot and rug-pull patterns")]
struct Cli {
    /// Contract address (0x + 40 hex digits)
    address: String,

    /// Target chain (ethereum, bsc, polygon, arbitrum, optimism, avalanche, base or a chain id)
    #[arg(short, long, default_value = "ethereum")]
    chain: String,

    /// Also save the report as JSON to this file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Analyze a local source file instead of fetching from the explorer
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let debug_env = std::env::var("HDP_DEBUG").is_ok_and(|v| v == "1");
    let default_level = if verbose || debug_env {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

async fn run(cli: Cli) -> eyre::Result<()> {
    let chain = ChainId::resolve(Some(&cli.chain))?;
    let scanner = ScannerConfig::from_env();
    let scoring = Arc::new(ScoringConfig::from_env()?);

    debug!("Scanning {} on {}", cli.address, chain.name());

    let report = match &cli.source {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| eyre::eyre!("Cannot read {}: {}", path.display(), e))?;
            let client = EtherscanClient::with_api_key(chain, &scanner, String::new())?;
            ContractAnalyzer::new(client, scoring)
                .analyze_source(&cli.address, SourceDocument::verified(text))?
        }
        None => {
            let client = EtherscanClient::new(chain, &scanner)?;
            ContractAnalyzer::new(client, scoring).analyze(&cli.address).await?
        }
    };

    if let Some(path) = &cli.out {
        save_report(&report, path);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    Ok(())
}

/// Write the pretty JSON report; failures only warn
fn save_report(report: &RiskReport, path: &Path) {
    let result = serde_json::to_string_pretty(report)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));

    match result {
        Ok(()) => eprintln!("📁 Report saved to {}", path.display()),
        Err(e) => eprintln!(
            "{} could not save report to {}: {}",
            "⚠️  Warning:".yellow(),
            path.display(),
            e
        ),
    }
}

fn colored_risk(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::Safe => risk.as_str().green().bold(),
        RiskLevel::Medium => risk.as_str().yellow().bold(),
        RiskLevel::High => risk.as_str().red().bold(),
    }
}

fn render_report(report: &RiskReport) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("Contract: {}\n", report.address));
    out.push_str(&format!("Score: {}/10\n", report.score));
    out.push_str(&format!("Risk: {}\n", colored_risk(report.risk)));

    if !report.flags.is_empty() {
        out.push_str("Flags:\n");
        for flag in &report.flags {
            out.push_str(&format!("  - {}\n", flag));
        }
    }
    out.push_str(&format!("Summary: {}\n\n", report.summary));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use honeypot_scanner::RiskFlag;

    fn report(flags: Vec<RiskFlag>) -> RiskReport {
        RiskReport {
            address: "0x1234567890abcdef1234567890abcdef12345678".to_string(),
            score: 7,
            risk: RiskLevel::High,
            flags,
            summary: "Something bad.".to_string(),
        }
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "honeypot-scanner",
            "0xabc",
            "--chain",
            "bsc",
            "--json",
            "--out",
            "r.json",
        ]);
        assert_eq!(cli.address, "0xabc");
        assert_eq!(cli.chain, "bsc");
        assert!(cli.json);
        assert_eq!(cli.out, Some(PathBuf::from("r.json")));
        assert!(cli.source.is_none());
    }

    #[test]
    fn test_render_report() {
        colored::control::set_override(false);
        let text = render_report(&report(vec![RiskFlag::Minting, RiskFlag::TransferTrap]));

        assert!(text.contains("Contract: 0x1234567890abcdef1234567890abcdef12345678\n"));
        assert!(text.contains("Score: 7/10\n"));
        assert!(text.contains("Risk: HIGH\n"));
        assert!(text.contains("Flags:\n  - minting\n  - transfer_trap\n"));
        assert!(text.contains("Summary: Something bad.\n"));
    }

    #[test]
    fn test_render_without_flags() {
        colored::control::set_override(false);
        let text = render_report(&report(vec![]));
        assert!(!text.contains("Flags:"));
    }

    #[test]
    fn test_save_report_failure_is_not_fatal() {
        save_report(
            &report(vec![]),
            Path::new("/nonexistent-dir/definitely/missing/report.json"),
        );
    }
}
