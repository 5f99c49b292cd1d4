//! Log catch-up for a follower that is behind the new leader.
//!
//! A lagging follower cannot subscribe to the live log stream until its
//! local log reaches the position the leader announced for the new
//! term. The coordinator closes that gap in phases: learn the leader's
//! recovery plan, find the recording that backs the missing range, then
//! drive the archive client to replicate it up to the target.
//!
//! Work is sliced; every call makes at most one step of progress and
//! returns. Queries to the leader are re-offered under back-pressure
//! and re-sent if no answer arrives within the retry interval.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::member::{MemberId, MemberTable};
use crate::message::{ElectionMessage, RecordingLogEntry};
use crate::transport::MessageTransport;
use crate::ElectionError;

/// Archive operations the coordinator drives to copy historical log
/// segments from the leader. All calls are non-blocking.
pub trait ArchiveClient {
    /// Starts replicating `recording_id` from the source archive until
    /// `stop_position`. Returns a replication id for later control.
    fn start_replication(
        &mut self,
        recording_id: i64,
        stop_position: i64,
        source_endpoint: &str,
    ) -> Result<i64, ElectionError>;

    /// Current recorded position of the local copy of `recording_id`.
    fn recorded_position(&mut self, recording_id: i64) -> Result<i64, ElectionError>;

    /// Stops an in-flight replication.
    fn stop_replication(&mut self, replication_id: i64) -> Result<(), ElectionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitRecoveryPlan,
    AwaitRecordingLog,
    StartReplication,
    AwaitPosition,
    Done,
}

/// Brings this member's log from its current end up to the position the
/// new leader announced, then reports done so the election can move the
/// follower onto the live stream.
#[derive(Debug)]
pub struct CatchUpCoordinator {
    leader_id: MemberId,
    self_id: MemberId,
    from_position: i64,
    target_position: i64,
    correlation_id: i64,
    query_retry_interval: Duration,
    phase: Phase,
    last_query: Option<Instant>,
    from_leadership_term_id: i64,
    recording_id: Option<i64>,
    replication_id: Option<i64>,
    failure: Option<String>,
}

impl CatchUpCoordinator {
    /// Creates a coordinator for the gap `from_position..target_position`
    /// against `leader_id`. `correlation_id` stamps the queries so stale
    /// answers from an earlier attempt are ignored.
    pub fn new(
        leader_id: MemberId,
        self_id: MemberId,
        from_position: i64,
        target_position: i64,
        correlation_id: i64,
        query_retry_interval: Duration,
    ) -> Self {
        Self {
            leader_id,
            self_id,
            from_position,
            target_position,
            correlation_id,
            query_retry_interval,
            phase: if from_position >= target_position {
                Phase::Done
            } else {
                Phase::AwaitRecoveryPlan
            },
            last_query: None,
            from_leadership_term_id: 0,
            recording_id: None,
            replication_id: None,
            failure: None,
        }
    }

    /// The leader this coordinator is catching up against.
    pub fn leader_id(&self) -> MemberId {
        self.leader_id
    }

    /// The log position to adopt once catch-up is done.
    pub fn target_position(&self) -> i64 {
        self.target_position
    }

    /// The log position catch-up started from.
    pub fn from_position(&self) -> i64 {
        self.from_position
    }

    /// The recording the gap was replicated from, once known.
    pub fn recording_id(&self) -> Option<i64> {
        self.recording_id
    }

    /// True once the local log end has reached the target.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Makes forward progress and returns the units of work done.
    pub fn do_work<T: MessageTransport, A: ArchiveClient>(
        &mut self,
        now: Instant,
        transport: &mut T,
        archive: &mut A,
        members: &MemberTable,
    ) -> Result<usize, ElectionError> {
        if let Some(reason) = self.failure.take() {
            return Err(ElectionError::CatchUp(reason));
        }

        match self.phase {
            Phase::AwaitRecoveryPlan => {
                let query = ElectionMessage::RecoveryPlanQuery {
                    correlation_id: self.correlation_id,
                    leader_id: self.leader_id,
                    requester_id: self.self_id,
                };
                Ok(self.offer_query(now, transport, &query))
            }
            Phase::AwaitRecordingLog => {
                let query = ElectionMessage::RecordingLogQuery {
                    correlation_id: self.correlation_id,
                    leader_id: self.leader_id,
                    requester_id: self.self_id,
                    from_leadership_term_id: self.from_leadership_term_id,
                    count: i32::MAX,
                };
                Ok(self.offer_query(now, transport, &query))
            }
            Phase::StartReplication => {
                let recording_id = self
                    .recording_id
                    .ok_or_else(|| ElectionError::invariant("replication without a recording"))?;
                let leader = members
                    .get(self.leader_id)
                    .ok_or(ElectionError::UnknownMember(self.leader_id))?;
                let replication_id = archive.start_replication(
                    recording_id,
                    self.target_position,
                    &leader.archive_endpoint,
                )?;
                debug!(
                    "replicating recording {} from {} up to {}",
                    recording_id, leader.archive_endpoint, self.target_position
                );
                self.replication_id = Some(replication_id);
                self.phase = Phase::AwaitPosition;
                Ok(1)
            }
            Phase::AwaitPosition => {
                let recording_id = self
                    .recording_id
                    .ok_or_else(|| ElectionError::invariant("replication without a recording"))?;
                let position = archive.recorded_position(recording_id)?;
                if position >= self.target_position {
                    if let Some(replication_id) = self.replication_id.take() {
                        archive.stop_replication(replication_id)?;
                    }
                    debug!("catch-up reached {} of {}", position, self.target_position);
                    self.phase = Phase::Done;
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
            Phase::Done => Ok(0),
        }
    }

    /// Accepts the leader's recovery plan, answered by its host.
    pub fn on_leader_recovery_plan(
        &mut self,
        correlation_id: i64,
        last_leadership_term_id: i64,
        last_appended_position: i64,
    ) {
        if self.phase != Phase::AwaitRecoveryPlan || correlation_id != self.correlation_id {
            return;
        }
        if last_appended_position < self.target_position {
            warn!(
                "leader reports {} appended but announced {}",
                last_appended_position, self.target_position
            );
        }
        self.from_leadership_term_id = last_leadership_term_id;
        self.last_query = None;
        self.phase = Phase::AwaitRecordingLog;
    }

    /// Accepts the leader's recording log, answered by its host. Picks
    /// the recording whose term range covers the start of the gap.
    pub fn on_leader_recording_log(&mut self, correlation_id: i64, entries: &[RecordingLogEntry]) {
        if self.phase != Phase::AwaitRecordingLog || correlation_id != self.correlation_id {
            return;
        }
        let covering = entries
            .iter()
            .filter(|e| e.term_base_position <= self.from_position)
            .last();
        match covering {
            Some(entry) => {
                self.recording_id = Some(entry.recording_id);
                self.last_query = None;
                self.phase = Phase::StartReplication;
            }
            None => {
                self.failure = Some(format!(
                    "no recording covers log position {}",
                    self.from_position
                ));
            }
        }
    }

    /// Releases owned archive resources. Safe to call more than once.
    pub fn close<A: ArchiveClient>(&mut self, archive: &mut A) {
        if let Some(replication_id) = self.replication_id.take() {
            if let Err(e) = archive.stop_replication(replication_id) {
                warn!("failed to stop replication {}: {}", replication_id, e);
            }
        }
    }

    fn offer_query<T: MessageTransport>(
        &mut self,
        now: Instant,
        transport: &mut T,
        query: &ElectionMessage,
    ) -> usize {
        let due = match self.last_query {
            None => true,
            Some(at) => now >= at + self.query_retry_interval,
        };
        if due && transport.try_send(self.leader_id, query) {
            self.last_query = Some(now);
            1
        } else {
            0
        }
    }
}
