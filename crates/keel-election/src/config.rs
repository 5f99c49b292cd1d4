//! Election timing and cluster configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::member::MemberId;

/// Configuration for the election state machine.
///
/// All timeouts are measured against the monotonic `now` passed into
/// [`Election::tick`](crate::Election::tick); the state machine never
/// reads a clock of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// How often a canvassing member broadcasts its `(term, position)`.
    pub status_interval: Duration,
    /// How often a newly elected leader re-announces its term while
    /// waiting for voters to reach its log position.
    pub leader_heartbeat_interval: Duration,
    /// Deadline for ballots and follower acknowledgements before the
    /// member falls back to canvassing.
    pub election_timeout: Duration,
    /// Canvass deadline used instead of `election_timeout` on the first
    /// election after process start, when peers may still be booting.
    pub startup_status_timeout: Duration,
    /// Statically appointed leader. When set, only the appointee ever
    /// nominates itself; everyone else waits for its term announcement.
    pub appointed_leader_id: Option<MemberId>,
    /// Channel template the follower log subscription is built from.
    pub log_channel: String,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_millis(100),
            leader_heartbeat_interval: Duration::from_millis(500),
            election_timeout: Duration::from_secs(1),
            startup_status_timeout: Duration::from_secs(5),
            appointed_leader_id: None,
            log_channel: "keel:udp?alias=log".to_string(),
        }
    }
}
