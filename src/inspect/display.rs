//! Rendering for `pollguard status`.

use super::{CheckOutcome, StatusReport};

/// Print the status report to stdout.
pub fn print_report(report: &StatusReport) {
    println!("Poller status on {}", report.host);
    println!("Lock file: {}", report.lock_path.display());
    println!();

    for finding in &report.findings {
        println!(
            "  [{}] {} - {}",
            finding.outcome, finding.check, finding.summary
        );

        for (label, value) in &finding.details {
            println!("     {}: {}", label, value);
        }

        if let Some(advice) = &finding.advice {
            println!("     Fix:  {}", advice);
        }
    }

    println!();
    println!(
        "Summary: {} ok, {} warnings, {} failures, {} unknown.",
        report.count(CheckOutcome::Ok),
        report.count(CheckOutcome::Warn),
        report.count(CheckOutcome::Fail),
        report.count(CheckOutcome::Unknown)
    );
    println!();
    println!("{}", recommendation(report));
}

/// One-line next step for the operator.
pub fn recommendation(report: &StatusReport) -> String {
    if report.lock_present {
        "The poller may be running in another process. If it is stuck, run `pollguard force-reset --yes`.".to_string()
    } else {
        "Ready to start: `pollguard run -- <command>`.".to_string()
    }
}
