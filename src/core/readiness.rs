//! Bounded reachability polling.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::cli::output;
use crate::core::remote::Remote;
use crate::error::{OutpostError, Result};

/// 60 attempts at 5s puts the ceiling at five minutes of boot latency; an
/// instance still unreachable after that points at a provisioning problem
/// no amount of local waiting will fix.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// A dot per failed probe, a counter line roughly once a minute at the
/// default interval.
const PROGRESS_EVERY: u32 = 12;

/// Block until `probe` succeeds or `max_attempts` probes have failed.
///
/// Each probe carries its own connect timeout (see
/// [`SshRemote::with_connect_timeout`](crate::core::remote::SshRemote)), so
/// one slow attempt cannot eat the whole budget. Progress (attempt count,
/// elapsed time) is printed as the poll runs, at any log filter, so an
/// operator can tell "still booting" from "hung".
pub fn wait_reachable<F>(mut probe: F, max_attempts: u32, interval: Duration) -> Result<()>
where
    F: FnMut() -> bool,
{
    let started = Instant::now();
    for attempt in 1..=max_attempts {
        if probe() {
            info!(
                "reachable after {} attempt(s), {:.0?} elapsed",
                attempt,
                started.elapsed()
            );
            return Ok(());
        }
        debug!(
            "attempt {}/{} failed ({:.0?} elapsed)",
            attempt,
            max_attempts,
            started.elapsed()
        );
        output::tick();
        if attempt % PROGRESS_EVERY == 0 && attempt < max_attempts {
            output::tick_note(&progress_line(attempt, max_attempts, started.elapsed()));
        }
        if attempt < max_attempts {
            std::thread::sleep(interval);
        }
    }
    Err(OutpostError::Timeout {
        attempts: max_attempts,
    })
}

/// The operator-visible poll counter, e.g. `attempt 12/60, 60s elapsed`.
fn progress_line(attempt: u32, max_attempts: u32, elapsed: Duration) -> String {
    format!(
        "attempt {}/{}, {}s elapsed",
        attempt,
        max_attempts,
        elapsed.as_secs()
    )
}

/// The authenticated no-op probe used against a real server.
pub fn ssh_probe(remote: &mut dyn Remote) -> bool {
    remote.exec("true").map(|out| out.success()).unwrap_or(false)
}
