//! Step model and run report.

/// Failure policy tag for a bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Failure aborts the run; later steps depend on this one.
    Required,
    /// Failure is recorded as a warning and the run continues.
    Optional,
}

/// What a step does once its idempotency check says it is not yet applied.
#[derive(Debug, Clone)]
pub enum Action {
    /// Remote shell commands, run in order; the first non-zero exit fails
    /// the step.
    Commands(Vec<String>),
    /// Write a file on the remote host with the given mode. Combined with a
    /// `test -f` check this gives write-once semantics.
    Upload {
        path: String,
        content: String,
        mode: u32,
    },
    /// Hand the controlling terminal to a remote program and wait for it to
    /// exit. A non-zero exit is a warning, never a required failure: the
    /// operator may legitimately cancel an interactive program.
    Interactive(String),
}

/// One unit of remote configuration work.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub tag: Tag,
    /// Remote command whose success means the step is already applied.
    /// Steps without a check always run; their actions must be safe to
    /// repeat.
    pub check: Option<String>,
    pub action: Action,
}

impl Step {
    pub fn required(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            tag: Tag::Required,
            check: None,
            action,
        }
    }

    pub fn optional(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            tag: Tag::Optional,
            check: None,
            action,
        }
    }

    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }

    /// Shorthand for a command-list action.
    pub fn cmds<I, S>(cmds: I) -> Action
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Action::Commands(cmds.into_iter().map(Into::into).collect())
    }
}

/// Outcome of one step in a finished (or aborted) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Idempotency check was already satisfied; no side effects.
    Skipped,
    /// Optional step (or interactive handoff) failed.
    Warned(String),
}

#[derive(Debug, Clone)]
pub struct Record {
    pub step: String,
    pub outcome: Outcome,
}

/// Accumulated result of a bootstrap run.
///
/// Deliberately not persisted anywhere: a re-run restarts from the first
/// step and relies on each step's idempotency check, so "re-running the
/// whole sequence is always safe" is the invariant, not resumability.
#[derive(Debug, Default)]
pub struct Report {
    pub records: Vec<Record>,
    /// Name and detail of the required step that aborted the run, if any.
    pub failed: Option<(String, String)>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    /// Append a later phase's records onto this report.
    pub fn merge(&mut self, later: Report) {
        self.records.extend(later.records);
        self.failed = later.failed;
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Warned(_)))
    }

    pub fn completed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Completed)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Skipped)
            .count()
    }
}
