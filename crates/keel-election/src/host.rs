//! Contracts between the election and the host agent that owns it.

use std::time::Instant;

use crate::catchup::CatchUpCoordinator;
use crate::ElectionError;

/// High-level role hint reported to the host. The election's own state
/// remains the source of truth; the host uses this for its log writer
/// and client-facing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Following a leader (or looking for one).
    Follower,
    /// Standing for election in the current term.
    Candidate,
    /// Leading the cluster.
    Leader,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Follower => write!(f, "follower"),
            Role::Candidate => write!(f, "candidate"),
            Role::Leader => write!(f, "leader"),
        }
    }
}

/// Where this member's log ends on entry to the election.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryPlan {
    /// Position of the last locally appended log record.
    pub last_appended_log_position: i64,
}

/// The agent that owns the log stream and serves clients. The election
/// instructs it through this surface and nothing else.
pub trait HostAgent {
    /// Role hint; must not fail.
    fn role(&mut self, role: Role);

    /// Prepares the leader log stream. Returns the log session id that
    /// followers will subscribe with. A failure aborts the election.
    fn become_leader(&mut self) -> Result<i32, ElectionError>;

    /// Refreshes the host's view of the member set after a leadership
    /// change.
    fn update_member_details(&mut self);

    /// Starts recording the live log from `channel` as a follower.
    fn record_log_as_follower(
        &mut self,
        channel: &str,
        log_session_id: i32,
    ) -> Result<(), ElectionError>;

    /// Blocks out until downstream services are ready on `channel`; the
    /// host is expected to make this prompt.
    fn await_services_ready(
        &mut self,
        channel: &str,
        log_session_id: i32,
    ) -> Result<(), ElectionError>;

    /// Hands over a finished catch-up so the host can transition its
    /// log writer. The coordinator is released when this call returns;
    /// the host must take what it needs synchronously.
    fn catchup_log(&mut self, catch_up: &CatchUpCoordinator);

    /// Terminal: the election is decided and this instance is dead.
    fn election_complete(&mut self);
}

/// Durable record of leadership terms against log positions.
pub trait RecordingLog {
    /// Appends a term record. Idempotent for an identical
    /// `(term, position)` pair. `now` is the monotonic tick time; a
    /// durable implementation stamps wall-clock time itself.
    fn append_term(
        &mut self,
        leadership_term_id: i64,
        log_position: i64,
        now: Instant,
    ) -> Result<(), ElectionError>;
}

/// Builds the channel a follower subscribes to the live log on, from
/// the configured template, the follower's own log endpoint, and the
/// leader's log session id.
pub fn follower_log_channel(template: &str, log_endpoint: &str, log_session_id: i32) -> String {
    let separator = if template.contains('?') { '|' } else { '?' };
    format!("{template}{separator}endpoint={log_endpoint}|session-id={log_session_id}")
}
