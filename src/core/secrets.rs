//! Write-once service environment file.
//!
//! The long-running service's process manager reads this file as its
//! environment at start (`EnvironmentFile=` style). It is created exactly
//! once with owner-only permissions; an operator-edited file is never
//! overwritten, which is why the step pairs an `Upload` action with a
//! `test -f` check.

use crate::core::step::{Action, Step};

/// Commented KEY=value template the operator fills in after bootstrap.
pub fn env_template(service_user: &str) -> String {
    format!(
        "# Environment for the {user} service.\n\
         # Filled in by the operator; read at service start, never by\n\
         # interactive shells.\n\
         #\n\
         # API_KEY=\n\
         # API_SECRET=\n\
         # ALERT_WEBHOOK=\n",
        user = service_user
    )
}

/// Build the write-once secrets step.
pub fn ensure_secrets_file(path: &str, service_user: &str) -> Step {
    Step::required(
        "write service secrets file",
        Action::Upload {
            path: path.to_string(),
            content: env_template(service_user),
            mode: 0o600,
        },
    )
    .with_check(format!("test -f {}", path))
}
