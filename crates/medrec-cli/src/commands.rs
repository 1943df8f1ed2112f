use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::{ColoredString, Colorize};
use medrec_normalize::Normalizer;
use medrec_reconcile::{MentionRequest, ReconcileRequest, ReconciliationReport, Reconciler};
use medrec_rules::RuleTables;
use medrec_safety::{issue_counts, SafetyOptions, SafetyValidator};
use medrec_types::{LabValues, Medication, MedicationMention, ReconciliationStatus, SafetyIssue, Severity};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let tables = load_tables(cli.rules.as_deref())?;
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Reconcile(args) => cmd_reconcile(tables, args, json),
        Command::Normalize(args) => cmd_normalize(tables, args, json),
        Command::Compare(args) => cmd_compare(tables, args, json),
        Command::Check(args) => cmd_check(tables, args, json),
        Command::Rules(_) => cmd_rules(&tables, json),
    }
}

// ---- Input loading ----

fn load_tables(path: Option<&Path>) -> anyhow::Result<Arc<RuleTables>> {
    let tables = match path {
        Some(path) => RuleTables::load(path)
            .with_context(|| format!("loading rule tables from {}", path.display()))?,
        None => RuleTables::default(),
    };
    Ok(Arc::new(tables))
}

/// One medication per line; blank lines and `#` comments are skipped.
fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_lines(&content))
}

fn read_mentions(path: &Path) -> anyhow::Result<Vec<MedicationMention>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing medication mentions in {}", path.display()))
}

fn load_labs(args: &LabArgs) -> anyhow::Result<Option<LabValues>> {
    let mut labs = match &args.labs {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let labs: LabValues = serde_json::from_str(&content)
                .with_context(|| format!("parsing lab values in {}", path.display()))?;
            Some(labs)
        }
        None => None,
    };
    if let Some(egfr) = args.egfr {
        labs.get_or_insert_with(LabValues::new)
            .insert(LabValues::EGFR, egfr);
    }
    Ok(labs)
}

// ---- Commands ----

fn cmd_reconcile(tables: Arc<RuleTables>, args: ReconcileArgs, json: bool) -> anyhow::Result<()> {
    let reconciler = Reconciler::new(tables, SafetyOptions::default())?;
    let labs = load_labs(&args.labs)?;
    let opinion = match &args.opinion {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        ),
        None => None,
    };

    let report = if args.mentions {
        reconciler.reconcile_mentions(&MentionRequest {
            baseline: read_mentions(&args.baseline)?,
            reference: read_mentions(&args.reference)?,
            labs,
            opinion,
            ..MentionRequest::default()
        })?
    } else {
        reconciler.reconcile(&ReconcileRequest {
            baseline: read_lines(&args.baseline)?,
            reference: read_lines(&args.reference)?,
            labs,
            opinion,
            ..ReconcileRequest::default()
        })?
    };

    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn cmd_normalize(tables: Arc<RuleTables>, args: NormalizeArgs, json: bool) -> anyhow::Result<()> {
    let normalizer = Normalizer::new(tables)?;
    let meds = normalizer.normalize_batch(&args.lines);
    if json {
        println!("{}", serde_json::to_string_pretty(&meds)?);
        return Ok(());
    }
    for med in &meds {
        println!("{} → {}", med.raw_input.bold(), describe(med));
    }
    Ok(())
}

fn cmd_compare(tables: Arc<RuleTables>, args: CompareArgs, json: bool) -> anyhow::Result<()> {
    let normalizer = Normalizer::new(tables)?;
    let first = normalizer.normalize(&args.first);
    let second = normalizer.normalize(&args.second);
    let equivalent = normalizer.check_equivalence(&first, &second);
    let score = normalizer.equivalence_score(&first.name, &second.name);

    if json {
        let value = serde_json::json!({
            "first": first,
            "second": second,
            "equivalent": equivalent,
            "name_similarity": score,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("  {}", describe(&first));
    println!("  {}", describe(&second));
    if equivalent {
        println!("{} Equivalent", "✓".green().bold());
    } else {
        println!("{} Not equivalent", "✗".red().bold());
    }
    println!("  Name similarity: {score:.2}");
    Ok(())
}

fn cmd_check(tables: Arc<RuleTables>, args: CheckArgs, json: bool) -> anyhow::Result<()> {
    let normalizer = Normalizer::new(Arc::clone(&tables))?;
    let validator = SafetyValidator::new(tables);
    let meds = normalizer.normalize_batch(&read_lines(&args.file)?);
    let labs = load_labs(&args.labs)?;
    let report = validator.evaluate(&meds, labs.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.issues)?);
        return Ok(());
    }

    for result in &report.check_results {
        tracing::debug!(
            check = %result.check_name,
            issues = result.issue_count,
            elapsed_us = result.elapsed.as_micros() as u64,
            "check finished"
        );
    }
    if labs.as_ref().and_then(LabValues::egfr).is_none() {
        println!("{}", "No eGFR supplied; renal checks skipped.".dimmed());
    }
    print_issues(&report.issues);
    Ok(())
}

fn cmd_rules(tables: &RuleTables, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tables)?);
    } else {
        print!("{}", tables.to_toml()?);
    }
    Ok(())
}

// ---- Text rendering ----

fn describe(med: &Medication) -> String {
    let confidence = format!("{:?}", med.confidence).to_lowercase();
    format!("{med} ({confidence})")
}

fn status_label(status: ReconciliationStatus) -> ColoredString {
    let label = status.label();
    match status {
        ReconciliationStatus::New => label.green(),
        ReconciliationStatus::NotContinued => label.red(),
        ReconciliationStatus::Changed => label.yellow(),
        ReconciliationStatus::ContinuedNoChange => label.normal(),
        ReconciliationStatus::UnmatchedVerify => label.magenta().bold(),
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.label().to_uppercase();
    match severity {
        Severity::High => label.red().bold(),
        Severity::Moderate => label.yellow(),
        Severity::Low => label.normal(),
    }
}

fn print_issues(issues: &[SafetyIssue]) {
    if issues.is_empty() {
        println!("{} No safety issues.", "✓".green().bold());
        return;
    }
    let counts = issue_counts(issues);
    let totals: Vec<String> = counts
        .iter()
        .map(|(severity, n)| format!("{n} {severity}"))
        .collect();
    println!("Safety issues: {}", totals.join(", ").bold());
    for issue in issues {
        println!(
            "  [{}] {}: {}",
            severity_label(issue.severity()),
            issue.category(),
            issue.description()
        );
    }
}

fn print_report(report: &ReconciliationReport) {
    let labels = &report.meta.labels;
    println!("Reconciliation {}", report.meta.run_id.to_string().dimmed());
    println!(
        "  {}: {} medications, {}: {} medications",
        labels.baseline,
        report.normalized_baseline.len(),
        labels.reference,
        report.normalized_reference.len()
    );

    println!("\n{}", "Ledger".bold());
    for entry in report.ledger.entries() {
        let mut line = format!(
            "  {:>3}  {:<22} {}",
            entry.seq,
            status_label(entry.reconciliation_status),
            entry.input_medication
        );
        if !entry.notes.is_empty() {
            line.push_str(&format!("  {}", entry.notes.dimmed()));
        }
        println!("{line}");
    }
    let summary: Vec<String> = report
        .ledger_summary
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(status, n)| format!("{n} {status}"))
        .collect();
    println!("  {}", summary.join(", "));
    println!("  Digest: {}", report.ledger_digest.dimmed());

    println!();
    print_issues(&report.safety_issues);

    println!();
    let completeness = &report.completeness;
    if completeness.is_complete {
        println!(
            "{} All {} input medications accounted for",
            "✓".green().bold(),
            completeness.input_count
        );
    } else {
        println!(
            "{} Ledger incomplete: {} missing, {} unexpected",
            "✗".red().bold(),
            completeness.missing_count,
            completeness.unexpected_entries.len()
        );
        for missing in &completeness.missing_medications {
            println!("    missing: {}", missing.red());
        }
    }

    for rejected in &report.rejected_suggestions {
        println!(
            "{} Ignored suggestion for {}: {}",
            "!".yellow().bold(),
            rejected.drug_name.bold(),
            rejected.reason
        );
    }
    for warning in &report.warnings {
        println!("{} {}", "!".yellow().bold(), warning);
    }
    if report.requires_review() {
        println!("\n{}", "Clinician review required.".magenta().bold());
    }
}
