//! Command auditing interceptor.
//!
//! A process-level decorator: the real binary is renamed aside and a thin
//! shell interceptor takes its place, appending a timestamped record of
//! every invocation to an append-only log before `exec`ing the real
//! program. `exec` replaces the interceptor's process, so exit codes and
//! signals propagate transparently and no argument parsing is duplicated.

use crate::config::AuditConfig;
use crate::core::remote::sh_quote;
use crate::core::step::{Action, Step};

/// The interceptor installed under the wrapped command's original name.
pub fn interceptor_script(real: &str, log: &str) -> String {
    format!(
        "#!/bin/sh\n\
         printf '%s %s\\n' \"$(date -Is)\" \"$*\" >> '{log}'\n\
         exec '{real}' \"$@\"\n",
        log = log,
        real = real
    )
}

/// Build the interceptor installation step.
///
/// Idempotent: the renamed real binary (`<cmd>.real`) doubles as the
/// installed-marker. The log and the staged interceptor are prepared
/// first and the rename is the final, single compound command, so the
/// marker only ever appears once the interceptor is in place — a partial
/// failure leaves the real binary untouched and the step re-runnable.
pub fn install_step(audit: &AuditConfig) -> Step {
    let real = format!("{}.real", audit.command);
    let staged = format!("{}.new", audit.command);
    Step::required(
        "install command audit interceptor",
        Action::Commands(vec![
            format!("touch '{}' && chmod 600 '{}'", audit.log, audit.log),
            format!(
                "printf '%s' {} > '{}' && chmod 755 '{}'",
                sh_quote(&interceptor_script(&real, &audit.log)),
                staged,
                staged
            ),
            format!("mv '{}' '{}' && mv '{}' '{}'", audit.command, real, staged, audit.command),
        ]),
    )
    .with_check(format!("test -x {}", real))
}
