use crate::support::{self, GlobalArgs};
use companion_reconcile::{
    CheckEvent, CheckFailure, CheckOptions, CheckProgress, CheckReport, TokenShape,
    spawn_full_check,
};
use serde_json::json;
use std::time::Duration;

const CHECK_KIND: &str = "companion.peer_check.v1";
const FAILURE_CLASS_FINDINGS: &str = "peer_manifest_mismatch";
const FAILURE_CLASS_CHECK: &str = "peer_check_failed";

pub struct Args {
    pub base: Option<String>,
    pub home: Option<String>,
    pub legacy_token_shape: bool,
    pub step_delay_ms: u64,
    pub json: bool,
}

enum Outcome {
    Complete(Box<CheckReport>),
    Failed(CheckFailure),
}

pub fn run(globals: &GlobalArgs, args: Args) {
    let runtime = support::runtime_or_exit();
    let resolved = support::resolve_base_or_exit(&runtime, globals, args.base, args.home);
    let options = CheckOptions {
        token_shape: if args.legacy_token_shape {
            TokenShape::Legacy
        } else {
            TokenShape::Strict
        },
        step_delay: Duration::from_millis(args.step_delay_ms),
    };
    let json_output = args.json;

    let base = resolved.base.clone();
    let (progress, outcome) = runtime.block_on(async move {
        let mut events = spawn_full_check(base, options);
        let mut progress = Vec::new();
        let mut outcome = None;
        while let Some(event) = events.recv().await {
            match event {
                CheckEvent::Progress(step) => {
                    if !json_output {
                        print_progress(&step);
                    }
                    progress.push(step);
                }
                CheckEvent::Complete(report) => outcome = Some(Outcome::Complete(report)),
                CheckEvent::Failed(failure) => outcome = Some(Outcome::Failed(failure)),
            }
        }
        (progress, outcome)
    });

    let Some(outcome) = outcome else {
        eprintln!("error: peer check ended without a result");
        std::process::exit(2);
    };

    if json_output {
        let mut payload = json!({
            "schema": 1,
            "checkKind": CHECK_KIND,
            "base": resolved.base.display().to_string(),
            "home": resolved.home,
            "progress": progress,
        });
        match &outcome {
            Outcome::Complete(report) => {
                let findings = report.has_findings();
                payload["result"] = json!(if findings { "rejected" } else { "accepted" });
                payload["failureClasses"] = if findings {
                    json!([FAILURE_CLASS_FINDINGS])
                } else {
                    json!([])
                };
                payload["report"] = json!(report);
            }
            Outcome::Failed(failure) => {
                payload["result"] = json!("failed");
                payload["failureClasses"] = json!([FAILURE_CLASS_CHECK]);
                payload["failure"] = json!({
                    "stage": failure.stage,
                    "errorKind": failure.error.kind(),
                    "message": failure.error.to_string(),
                });
            }
        }
        support::print_json_or_exit(&payload, "peer-check");
    } else {
        match &outcome {
            Outcome::Complete(report) => print_report(report),
            Outcome::Failed(failure) => println!("[peer-check] FAIL ({failure})"),
        }
    }

    match outcome {
        Outcome::Complete(report) if report.has_findings() => std::process::exit(1),
        Outcome::Complete(_) => {}
        Outcome::Failed(_) => std::process::exit(2),
    }
}

fn print_progress(step: &CheckProgress) {
    println!("[peer-check] {} {}: {}", step.stage, step.status, step.detail);
}

fn print_report(report: &CheckReport) {
    println!(
        "[peer-check] peers: {} ({})",
        report.peer_directory_count,
        report.root.peer_dir.display()
    );
    for name in &report.peer_directories {
        println!("  - {name}");
    }
    println!(
        "[peer-check] manifest entries: {} ({})",
        report.manifest_entry_count,
        report.root.manifest_file.display()
    );
    for key in &report.manifest_keys {
        println!("  - {key}");
    }

    if !report.duplicates.is_empty() {
        println!("[peer-check] duplicates: {}", report.duplicates.len());
        for (key, occurrences) in report.duplicates.iter() {
            println!("  - {key}: {} occurrences", occurrences.len());
        }
    }

    let orphans = &report.orphans;
    if !orphans.directories_without_manifest_entry.is_empty() {
        println!(
            "[peer-check] directories missing from drives.json: {}",
            orphans.directories_without_manifest_entry.len()
        );
        for name in &orphans.directories_without_manifest_entry {
            println!("  - {name}");
        }
    }
    if !orphans.manifest_entries_without_directory.is_empty() {
        println!(
            "[peer-check] drives.json references without a directory: {}",
            orphans.manifest_entries_without_directory.len()
        );
        for name in &orphans.manifest_entries_without_directory {
            println!("  - {name}");
        }
    }

    if report.has_findings() {
        println!(
            "[peer-check] FINDINGS (duplicates={}, orphans={})",
            report.duplicates.len(),
            orphans.len()
        );
    } else {
        println!(
            "[peer-check] OK (peers={}, entries={})",
            report.peer_directory_count, report.manifest_entry_count
        );
    }
}
