use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "medrec",
    about = "Medication reconciliation with an auditable ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Rule tables (TOML) to use instead of the built-in tables
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile a current list against a prior list
    Reconcile(ReconcileArgs),
    /// Print canonical records for medication lines
    Normalize(NormalizeArgs),
    /// Compare two medication lines
    Compare(CompareArgs),
    /// Run safety checks over one list
    Check(CheckArgs),
    /// Print the active rule tables as TOML
    Rules(RulesArgs),
}

/// Lab inputs shared by `reconcile` and `check`.
#[derive(Args, Clone, Debug, Default)]
pub struct LabArgs {
    /// JSON object of lab values, e.g. {"egfr": 25}
    #[arg(long)]
    pub labs: Option<PathBuf>,
    /// eGFR in mL/min/1.73m²; overrides any value in --labs
    #[arg(long)]
    pub egfr: Option<f64>,
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Current ("now") list, one medication per line
    #[arg(long)]
    pub baseline: PathBuf,
    /// Prior ("then") list, one medication per line
    #[arg(long)]
    pub reference: PathBuf,
    #[command(flatten)]
    pub labs: LabArgs,
    /// Reasoning collaborator response to validate and merge
    #[arg(long)]
    pub opinion: Option<PathBuf>,
    /// Read both lists as JSON arrays of extraction records
    #[arg(long)]
    pub mentions: bool,
}

#[derive(Args)]
pub struct NormalizeArgs {
    #[arg(required = true)]
    pub lines: Vec<String>,
}

#[derive(Args)]
pub struct CompareArgs {
    pub first: String,
    pub second: String,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Medication list, one per line
    pub file: PathBuf,
    #[command(flatten)]
    pub labs: LabArgs,
}

#[derive(Args)]
pub struct RulesArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reconcile() {
        let cli = Cli::try_parse_from([
            "medrec", "reconcile", "--baseline", "now.txt", "--reference", "then.txt",
        ])
        .unwrap();
        if let Command::Reconcile(args) = cli.command {
            assert_eq!(args.baseline, PathBuf::from("now.txt"));
            assert_eq!(args.reference, PathBuf::from("then.txt"));
            assert!(!args.mentions);
            assert!(args.opinion.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_reconcile_with_context() {
        let cli = Cli::try_parse_from([
            "medrec", "reconcile", "--baseline", "a.json", "--reference", "b.json",
            "--egfr", "25", "--labs", "labs.json", "--opinion", "llm.txt", "--mentions",
        ])
        .unwrap();
        if let Command::Reconcile(args) = cli.command {
            assert_eq!(args.labs.egfr, Some(25.0));
            assert_eq!(args.labs.labs, Some(PathBuf::from("labs.json")));
            assert_eq!(args.opinion, Some(PathBuf::from("llm.txt")));
            assert!(args.mentions);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn reconcile_requires_both_lists() {
        assert!(Cli::try_parse_from(["medrec", "reconcile", "--baseline", "a.txt"]).is_err());
    }

    #[test]
    fn parse_normalize_many() {
        let cli = Cli::try_parse_from(["medrec", "normalize", "Lasix 40mg PO", "Tylenol 500mg"]).unwrap();
        if let Command::Normalize(args) = cli.command {
            assert_eq!(args.lines, vec!["Lasix 40mg PO", "Tylenol 500mg"]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn normalize_requires_a_line() {
        assert!(Cli::try_parse_from(["medrec", "normalize"]).is_err());
    }

    #[test]
    fn parse_compare() {
        let cli = Cli::try_parse_from(["medrec", "compare", "Lasix 40mg", "Furosemide 40mg"]).unwrap();
        if let Command::Compare(args) = cli.command {
            assert_eq!(args.first, "Lasix 40mg");
            assert_eq!(args.second, "Furosemide 40mg");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_check_with_egfr() {
        let cli = Cli::try_parse_from(["medrec", "check", "meds.txt", "--egfr", "28.5"]).unwrap();
        if let Command::Check(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("meds.txt"));
            assert_eq!(args.labs.egfr, Some(28.5));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_rules() {
        let cli = Cli::try_parse_from(["medrec", "rules", "--rules", "tenant.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Rules(_)));
        assert_eq!(cli.rules, Some(PathBuf::from("tenant.toml")));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["medrec", "--verbose", "rules"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["medrec", "--format", "json", "rules"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
