//! `credstore policy check` command implementation.
//!
//! Loads a policy file and reports every consistency finding.

use anyhow::{Context, Result};
use credstore_core::PolicyConfig;
use credstore_policy::{PolicyIssue, Severity, validate_policy};
use std::path::Path;

/// Load and validate a policy file, returning all findings.
pub fn check_policy(path: &Path) -> Result<Vec<PolicyIssue>> {
    let policy = PolicyConfig::from_file(path)
        .with_context(|| format!("Failed to load policy file: {}", path.display()))?;
    Ok(validate_policy(&policy))
}

fn print_group(title: &str, issues: &[&PolicyIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("\n{} ({}):", title, issues.len());
    println!("{}", "─".repeat(60));
    for issue in issues {
        println!("  {}: {}", issue.location, issue.message);
    }
}

/// Run the policy check; fails when any error-level finding exists.
pub fn run(path: &Path) -> Result<()> {
    println!("Checking policy {}...", path.display());
    let issues = check_policy(path)?;

    let errors: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    let warnings: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .collect();

    print_group("Errors", &errors);
    print_group("Warnings", &warnings);

    println!();
    println!("{}", "═".repeat(60));
    if issues.is_empty() {
        println!("✅ All checks passed!");
    } else {
        println!(
            "Summary: {} error(s), {} warning(s)",
            errors.len(),
            warnings.len()
        );
    }

    if !errors.is_empty() {
        anyhow::bail!("policy has {} error(s) that must be fixed", errors.len());
    }
    Ok(())
}
