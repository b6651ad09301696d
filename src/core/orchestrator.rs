//! Sequential step runner with the required/optional failure policy.

use tracing::{debug, info, warn};

use crate::cli::output;
use crate::core::remote::Remote;
use crate::core::step::{Action, Outcome, Record, Report, Step, Tag};
use crate::error::Result;

/// Run the step sequence in declaration order.
///
/// Each step's idempotency check runs strictly before its action; a
/// satisfied check records [`Outcome::Skipped`] with no side effects. A
/// required step's failure aborts immediately with the partial report; an
/// optional step's failure is recorded and execution continues. Later steps
/// assume the side effects of all earlier ones, so there is no reordering
/// and no parallelism.
pub fn run(remote: &mut dyn Remote, steps: Vec<Step>) -> Result<Report> {
    let total = steps.len();
    let mut report = Report::default();

    for (i, step) in steps.into_iter().enumerate() {
        output::progress(&format!("[{}/{}] {}", i + 1, total, step.name));

        if let Some(check) = &step.check {
            debug!("check for '{}': {}", step.name, check);
            if remote.exec(check)?.success() {
                info!("'{}' already satisfied", step.name);
                output::progress_note("already satisfied");
                report.records.push(Record {
                    step: step.name,
                    outcome: Outcome::Skipped,
                });
                continue;
            }
        }

        match apply(remote, &step) {
            Ok(StepResult::Done) => {
                output::progress_done(true);
                report.records.push(Record {
                    step: step.name,
                    outcome: Outcome::Completed,
                });
            }
            Ok(StepResult::Warn(detail)) => {
                warn!("'{}': {}", step.name, detail);
                output::progress_done(false);
                output::warn(&format!("{}: {}", step.name, detail));
                report.records.push(Record {
                    step: step.name,
                    outcome: Outcome::Warned(detail),
                });
            }
            Err(detail) => match step.tag {
                Tag::Required => {
                    output::progress_done(false);
                    report.failed = Some((step.name, detail));
                    return Ok(report);
                }
                Tag::Optional => {
                    warn!("optional step '{}' failed: {}", step.name, detail);
                    output::progress_done(false);
                    output::warn(&format!("{} (continuing): {}", step.name, detail));
                    report.records.push(Record {
                        step: step.name,
                        outcome: Outcome::Warned(detail),
                    });
                }
            },
        }
    }

    Ok(report)
}

enum StepResult {
    Done,
    Warn(String),
}

/// Apply one step's action. The `Err` carries a human-readable detail used
/// either to abort (required) or to warn (optional).
fn apply(remote: &mut dyn Remote, step: &Step) -> std::result::Result<StepResult, String> {
    match &step.action {
        Action::Commands(cmds) => {
            for cmd in cmds {
                let out = remote.exec(cmd).map_err(|e| e.to_string())?;
                if !out.success() {
                    let detail = if out.stderr.trim().is_empty() {
                        format!("`{}` exited with status {}", cmd, out.code)
                    } else {
                        out.stderr.trim().to_string()
                    };
                    return Err(detail);
                }
            }
            Ok(StepResult::Done)
        }
        Action::Upload {
            path,
            content,
            mode,
        } => {
            remote
                .upload(path, content, *mode)
                .map_err(|e| e.to_string())?;
            Ok(StepResult::Done)
        }
        Action::Interactive(cmd) => {
            // Terminal handoff: a non-zero exit may just mean the operator
            // cancelled the program, so it is a warning either way.
            let code = remote.exec_interactive(cmd).map_err(|e| e.to_string())?;
            if code == 0 {
                Ok(StepResult::Done)
            } else {
                Ok(StepResult::Warn(format!(
                    "interactive program exited with status {}",
                    code
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::remote::fake::FakeRemote;

    fn touch_step(name: &str, path: &str, tag: Tag) -> Step {
        Step {
            name: name.to_string(),
            tag,
            check: Some(format!("test -f {}", path)),
            action: Step::cmds([format!("touch {}", path)]),
        }
    }

    #[test]
    fn runs_steps_in_declaration_order() {
        let mut remote = FakeRemote::new();
        let steps = vec![
            Step::required("first", Step::cmds(["do-first"])),
            Step::required("second", Step::cmds(["do-second"])),
        ];
        let report = run(&mut remote, steps).unwrap();
        assert!(report.is_success());
        assert_eq!(remote.history, vec!["do-first", "do-second"]);
    }

    #[test]
    fn required_failure_halts_before_subsequent_steps() {
        let mut remote = FakeRemote::new();
        remote.fail.insert("broken".to_string());
        let steps = vec![
            Step::required("ok", Step::cmds(["fine"])),
            Step::required("breaks", Step::cmds(["broken"])),
            Step::required("never runs", Step::cmds(["after"])),
        ];
        let report = run(&mut remote, steps).unwrap();
        let (failed, detail) = report.failed.expect("run should abort");
        assert_eq!(failed, "breaks");
        assert!(detail.contains("simulated failure"));
        assert!(!remote.history.iter().any(|c| c == "after"));
        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn optional_failure_warns_and_continues() {
        let mut remote = FakeRemote::new();
        remote.fail.insert("broken".to_string());
        let steps = vec![
            Step::optional("breaks", Step::cmds(["broken"])),
            Step::required("still runs", Step::cmds(["after"])),
        ];
        let report = run(&mut remote, steps).unwrap();
        assert!(report.is_success());
        assert!(remote.history.iter().any(|c| c == "after"));
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(
            report.warnings().next().unwrap().step,
            "breaks"
        );
    }

    #[test]
    fn satisfied_check_skips_without_side_effects() {
        let mut remote = FakeRemote::new();
        remote.files.insert("/marker".to_string(), (String::new(), 0o644));
        let steps = vec![touch_step("marked", "/marker", Tag::Required)];
        let report = run(&mut remote, steps).unwrap();
        assert_eq!(report.skipped(), 1);
        assert!(!remote.history.iter().any(|c| c.starts_with("touch")));
    }

    #[test]
    fn second_run_reports_everything_already_satisfied() {
        let steps = || {
            vec![
                touch_step("one", "/state/one", Tag::Required),
                touch_step("two", "/state/two", Tag::Required),
                touch_step("three", "/state/three", Tag::Optional),
            ]
        };

        let mut remote = FakeRemote::new();
        let first = run(&mut remote, steps()).unwrap();
        assert_eq!(first.completed(), 3);
        let state_after_first = remote.files.clone();

        let second = run(&mut remote, steps()).unwrap();
        assert_eq!(second.skipped(), 3);
        assert_eq!(second.completed(), 0);
        // Identical final remote state after the second run.
        assert_eq!(remote.files, state_after_first);
    }

    #[test]
    fn check_runs_strictly_before_action() {
        let mut remote = FakeRemote::new();
        let steps = vec![touch_step("ordered", "/thing", Tag::Required)];
        run(&mut remote, steps).unwrap();
        assert_eq!(
            remote.history,
            vec!["test -f /thing".to_string(), "touch /thing".to_string()]
        );
    }

    #[test]
    fn interactive_nonzero_exit_is_a_warning() {
        let mut remote = FakeRemote::new();
        remote.interactive_exit = 130;
        let steps = vec![
            Step::required("handoff", Action::Interactive("setup".to_string())),
            Step::required("after", Step::cmds(["after"])),
        ];
        let report = run(&mut remote, steps).unwrap();
        assert!(report.is_success());
        assert_eq!(report.warnings().count(), 1);
        assert!(remote.history.iter().any(|c| c == "after"));
    }

    #[test]
    fn upload_writes_file_with_mode() {
        let mut remote = FakeRemote::new();
        let steps = vec![Step::required(
            "write env",
            Action::Upload {
                path: "/etc/svc.env".to_string(),
                content: "# template\n".to_string(),
                mode: 0o600,
            },
        )
        .with_check("test -f /etc/svc.env")];
        let report = run(&mut remote, steps).unwrap();
        assert_eq!(report.completed(), 1);
        let (content, mode) = &remote.files["/etc/svc.env"];
        assert_eq!(content, "# template\n");
        assert_eq!(*mode, 0o600);
    }

    #[test]
    fn existing_file_is_left_byte_for_byte_unchanged() {
        let mut remote = FakeRemote::new();
        remote.files.insert(
            "/etc/svc.env".to_string(),
            ("OPERATOR_EDITED=1\n".to_string(), 0o600),
        );
        let steps = vec![Step::required(
            "write env",
            Action::Upload {
                path: "/etc/svc.env".to_string(),
                content: "# template\n".to_string(),
                mode: 0o600,
            },
        )
        .with_check("test -f /etc/svc.env")];
        let report = run(&mut remote, steps).unwrap();
        assert_eq!(report.skipped(), 1);
        assert_eq!(remote.files["/etc/svc.env"].0, "OPERATOR_EDITED=1\n");
    }
}
