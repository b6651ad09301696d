//! Final run report rendering.

use crate::cli::output;
use crate::core::step::{Outcome, Report};
use crate::error::{OutpostError, Result};

/// Print the end-of-run summary and convert a required-step failure into
/// the process-level error.
pub fn render(report: &Report) -> Result<()> {
    if let Some((step, detail)) = &report.failed {
        // On a required failure the per-step progress lines above already
        // show everything up to the failing step; point at the log instead
        // of repeating them.
        output::error(&format!("required step '{}' failed", step));
        output::hint("re-run with OUTPOST_LOG=outpost=debug for the full execution log");
        return Err(OutpostError::RequiredStep {
            step: step.clone(),
            detail: detail.clone(),
        });
    }

    output::section("Bootstrap report");
    output::kv("completed", report.completed());
    output::kv("already satisfied", report.skipped());

    let warnings: Vec<_> = report.warnings().collect();
    if warnings.is_empty() {
        output::success("all steps finished");
    } else {
        output::warn(&format!("{} warning(s):", warnings.len()));
        for record in warnings {
            if let Outcome::Warned(detail) = &record.outcome {
                output::list_item(&format!("{}: {}", record.step, detail));
            }
        }
    }
    Ok(())
}
