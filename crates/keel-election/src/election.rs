//! The leader-election state machine.
//!
//! One `Election` runs on every member from the moment leadership is
//! unknown (startup, or a lost leader) until the cluster agrees on a
//! single leader carrying the most up-to-date log. The host agent owns
//! the instance and drives it with periodic [`Election::tick`] calls;
//! each tick drains inbound messages, advances the current state, and
//! offers outbound messages without ever blocking.
//!
//! The flow for a contested election:
//!
//! 1. **Canvass**: members exchange `(term, position)` until one of
//!    them can see it holds the best log.
//! 2. **Ballot**: that member nominates itself after a randomized
//!    backoff and gathers votes for a new term.
//! 3. **Transition**: the winner becomes leader; the rest subscribe to
//!    its log, catching up through the archive first if behind.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::catchup::{ArchiveClient, CatchUpCoordinator};
use crate::config::ElectionConfig;
use crate::host::{follower_log_channel, HostAgent, RecordingLog, RecoveryPlan, Role};
use crate::member::{MemberId, MemberTable};
use crate::message::ElectionMessage;
use crate::quorum;
use crate::transport::MessageTransport;
use crate::ElectionError;

/// Inbound messages handled per tick before state work runs.
const MESSAGE_POLL_LIMIT: usize = 10;

/// Election states. Codes are stable for external observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// One-shot bootstrap.
    Init,
    /// Broadcasting own `(position, term)` and gathering peers'.
    Canvass,
    /// Waiting out the randomized backoff before self-nominating.
    Nominate,
    /// Awaiting votes for own candidacy.
    CandidateBallot,
    /// Voted yes for another candidate; awaiting its announcement.
    FollowerBallot,
    /// One-shot: instruct the host to become leader.
    LeaderTransition,
    /// Waiting until all voters acknowledge the term at our position.
    LeaderReady,
    /// Copying log from the leader up to its position.
    FollowerCatchup,
    /// One-shot: subscribe to the leader's live log.
    FollowerTransition,
    /// Informing the leader of the appended position; then complete.
    FollowerReady,
}

impl State {
    /// The stable code published through the observable counter.
    pub const fn code(self) -> u32 {
        match self {
            State::Init => 0,
            State::Canvass => 1,
            State::Nominate => 2,
            State::CandidateBallot => 3,
            State::FollowerBallot => 4,
            State::LeaderTransition => 5,
            State::LeaderReady => 6,
            State::FollowerCatchup => 7,
            State::FollowerTransition => 8,
            State::FollowerReady => 9,
        }
    }

    /// Maps a counter code back to a state.
    pub fn from_code(code: u32) -> Result<Self, ElectionError> {
        match code {
            0 => Ok(State::Init),
            1 => Ok(State::Canvass),
            2 => Ok(State::Nominate),
            3 => Ok(State::CandidateBallot),
            4 => Ok(State::FollowerBallot),
            5 => Ok(State::LeaderTransition),
            6 => Ok(State::LeaderReady),
            7 => Ok(State::FollowerCatchup),
            8 => Ok(State::FollowerTransition),
            9 => Ok(State::FollowerReady),
            other => Err(ElectionError::InvalidStateCode(other)),
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::Init => "init",
            State::Canvass => "canvass",
            State::Nominate => "nominate",
            State::CandidateBallot => "candidate-ballot",
            State::FollowerBallot => "follower-ballot",
            State::LeaderTransition => "leader-transition",
            State::LeaderReady => "leader-ready",
            State::FollowerCatchup => "follower-catchup",
            State::FollowerTransition => "follower-transition",
            State::FollowerReady => "follower-ready",
        };
        write!(f, "{name}")
    }
}

/// Observable "Election State" counter.
///
/// Single writer (the election), any number of readers. Writes are
/// release-ordered so observers see monotonic code transitions; readers
/// validate the code on load.
#[derive(Debug, Clone)]
pub struct StateCounter {
    value: Arc<AtomicU32>,
}

impl StateCounter {
    fn new() -> Self {
        Self {
            value: Arc::new(AtomicU32::new(State::Init.code())),
        }
    }

    fn set(&self, state: State) {
        self.value.store(state.code(), Ordering::Release);
    }

    /// Reads the last published state.
    pub fn get(&self) -> Result<State, ElectionError> {
        State::from_code(self.value.load(Ordering::Acquire))
    }
}

/// The per-member election state machine.
///
/// Owns its collaborators for the duration of one election epoch and
/// releases them deterministically when the election completes, fails,
/// or is closed by the host.
pub struct Election<T, H, A, L> {
    config: ElectionConfig,
    members: MemberTable,
    transport: T,
    host: H,
    archive: A,
    recording_log: L,
    rng: SmallRng,
    is_startup: bool,

    state: State,
    leadership_term_id: i64,
    log_position: i64,
    log_session_id: Option<i32>,
    leader_id: Option<MemberId>,
    time_of_last_state_change: Instant,
    time_of_last_broadcast: Option<Instant>,
    nomination_deadline: Instant,
    state_counter: Option<StateCounter>,
    catch_up: Option<CatchUpCoordinator>,
    terminated: bool,
}

impl<T, H, A, L> Election<T, H, A, L>
where
    T: MessageTransport,
    H: HostAgent,
    A: ArchiveClient,
    L: RecordingLog,
{
    /// Creates an election for one epoch.
    ///
    /// `leadership_term_id` is the last term this member knows of and
    /// `recovery_plan` says where its log ends. `is_startup` widens the
    /// canvass deadline to cover peers that are still booting. The rng
    /// only breaks nomination-backoff symmetry and is injected so tests
    /// can be deterministic.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ElectionConfig,
        mut members: MemberTable,
        recovery_plan: RecoveryPlan,
        leadership_term_id: i64,
        is_startup: bool,
        rng: SmallRng,
        transport: T,
        host: H,
        archive: A,
        recording_log: L,
        now: Instant,
    ) -> Self {
        let log_position = recovery_plan.last_appended_log_position;
        let own = members.self_member_mut();
        own.leadership_term_id = leadership_term_id;
        own.log_position = log_position;

        Self {
            config,
            members,
            transport,
            host,
            archive,
            recording_log,
            rng,
            is_startup,
            state: State::Init,
            leadership_term_id,
            log_position,
            log_session_id: None,
            leader_id: None,
            time_of_last_state_change: now,
            time_of_last_broadcast: None,
            nomination_deadline: now,
            state_counter: None,
            catch_up: None,
            terminated: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Current leadership term.
    pub fn leadership_term_id(&self) -> i64 {
        self.leadership_term_id
    }

    /// Where this member's log ends. Only catch-up completion moves it.
    pub fn log_position(&self) -> i64 {
        self.log_position
    }

    /// The leader, once one is known for the current term.
    pub fn leader_id(&self) -> Option<MemberId> {
        self.leader_id
    }

    /// The member table as this election currently sees it.
    pub fn members(&self) -> &MemberTable {
        &self.members
    }

    /// True once the election has completed or been closed.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Handle to the observable state counter, once allocated.
    pub fn state_counter(&self) -> Option<StateCounter> {
        self.state_counter.clone()
    }

    /// Advances the state machine. `now` must come from a monotonic
    /// clock and never move backwards between calls.
    ///
    /// Returns the units of work done this tick. Errors are fatal to
    /// the election; the host must not tick again after one, nor after
    /// `election_complete` has been signalled.
    pub fn tick(&mut self, now: Instant) -> Result<usize, ElectionError> {
        if self.terminated {
            return Err(ElectionError::Terminated);
        }

        let mut work_count = 0;
        if self.state == State::Init {
            work_count += self.init(now)?;
        }

        work_count += self.poll_messages(now)?;

        work_count += match self.state {
            State::Init => 0,
            State::Canvass => self.canvass(now),
            State::Nominate => self.nominate(now)?,
            State::CandidateBallot => self.candidate_ballot(now),
            State::FollowerBallot => self.follower_ballot(now),
            State::LeaderTransition => self.leader_transition(now)?,
            State::LeaderReady => self.leader_ready(now)?,
            State::FollowerCatchup => self.follower_catchup(now)?,
            State::FollowerTransition => self.follower_transition(now)?,
            State::FollowerReady => self.follower_ready(now)?,
        };

        Ok(work_count)
    }

    /// Releases owned resources. The host may call this at any time to
    /// abandon the election; no tick is legal afterwards.
    pub fn close(&mut self) {
        self.release();
        self.terminated = true;
    }

    // -- state work --

    fn init(&mut self, now: Instant) -> Result<usize, ElectionError> {
        self.state_counter = Some(StateCounter::new());

        if self.members.len() == 1 {
            self.leadership_term_id += 1;
            self.leader_id = Some(self.members.self_id());
            self.members.self_member_mut().leadership_term_id = self.leadership_term_id;
            self.recording_log
                .append_term(self.leadership_term_id, self.log_position, now)?;
            self.transition(State::LeaderTransition, now);
        } else if self.config.appointed_leader_id == Some(self.members.self_id()) {
            self.nomination_deadline = now;
            self.transition(State::Nominate, now);
        } else {
            self.transition(State::Canvass, now);
        }

        Ok(1)
    }

    fn canvass(&mut self, now: Instant) -> usize {
        let mut work_count = 0;

        let broadcast_due = match self.time_of_last_broadcast {
            None => true,
            Some(at) => now >= at + self.config.status_interval,
        };
        if broadcast_due {
            self.time_of_last_broadcast = Some(now);
            let message = ElectionMessage::CanvassPosition {
                log_position: self.log_position,
                leadership_term_id: self.leadership_term_id,
                member_id: self.members.self_id(),
            };
            for peer in self.members.peers() {
                self.transport.try_send(peer.id, &message);
            }
            work_count += 1;
        }

        // With an appointed leader configured only the appointee ever
        // advances; everyone else waits for its term announcement.
        if self.config.appointed_leader_id.is_some() {
            return work_count;
        }

        let canvass_timeout = if self.is_startup {
            self.config.startup_status_timeout
        } else {
            self.config.election_timeout
        };
        let deadline_passed = now >= self.time_of_last_state_change + canvass_timeout;

        if quorum::is_unanimous_candidate(&self.members)
            || (quorum::is_quorum_candidate(&self.members) && deadline_passed)
        {
            self.nomination_deadline = now + self.nomination_backoff();
            self.transition(State::Nominate, now);
            work_count += 1;
        }

        work_count
    }

    fn nominate(&mut self, now: Instant) -> Result<usize, ElectionError> {
        if now < self.nomination_deadline {
            return Ok(0);
        }

        self.leadership_term_id += 1;
        self.members.become_candidate(self.leadership_term_id);
        self.recording_log
            .append_term(self.leadership_term_id, self.log_position, now)?;
        self.host.role(Role::Candidate);
        info!(
            "{} nominating self for term {}",
            self.members.self_id(),
            self.leadership_term_id
        );

        self.transition(State::CandidateBallot, now);
        Ok(1)
    }

    fn candidate_ballot(&mut self, now: Instant) -> usize {
        if quorum::has_won_vote_on_full_count(&self.members, self.leadership_term_id) {
            info!(
                "{} won election for term {} on full vote count",
                self.members.self_id(),
                self.leadership_term_id
            );
            self.leader_id = Some(self.members.self_id());
            self.transition(State::LeaderTransition, now);
            return 1;
        }

        if now >= self.time_of_last_state_change + self.config.election_timeout {
            if quorum::has_majority_vote(&self.members, self.leadership_term_id) {
                info!(
                    "{} won election for term {} on majority at timeout",
                    self.members.self_id(),
                    self.leadership_term_id
                );
                self.leader_id = Some(self.members.self_id());
                self.transition(State::LeaderTransition, now);
            } else {
                self.transition(State::Canvass, now);
            }
            return 1;
        }

        let mut work_count = 0;
        let pending: Vec<MemberId> = self
            .members
            .iter()
            .filter(|m| !m.is_ballot_sent)
            .map(|m| m.id)
            .collect();
        for id in pending {
            let message = ElectionMessage::RequestVote {
                log_position: self.log_position,
                candidate_term_id: self.leadership_term_id,
                candidate_id: self.members.self_id(),
            };
            if self.transport.try_send(id, &message) {
                if let Ok(row) = self.members.row_mut(id) {
                    row.is_ballot_sent = true;
                }
            }
            work_count += 1;
        }

        work_count
    }

    fn follower_ballot(&mut self, now: Instant) -> usize {
        if now >= self.time_of_last_state_change + self.config.election_timeout {
            self.transition(State::Canvass, now);
            return 1;
        }
        0
    }

    fn leader_transition(&mut self, now: Instant) -> Result<usize, ElectionError> {
        let log_session_id = self.host.become_leader()?;
        self.log_session_id = Some(log_session_id);
        self.members.reset_log_positions();
        self.members.self_member_mut().log_position = self.log_position;
        self.transition(State::LeaderReady, now);
        Ok(1)
    }

    fn leader_ready(&mut self, now: Instant) -> Result<usize, ElectionError> {
        if quorum::have_voters_reached_position(
            &self.members,
            self.log_position,
            self.leadership_term_id,
        ) {
            self.complete();
            return Ok(1);
        }

        let heartbeat_due = match self.time_of_last_broadcast {
            None => true,
            Some(at) => now > at + self.config.leader_heartbeat_interval,
        };
        if heartbeat_due {
            self.time_of_last_broadcast = Some(now);
            let message = ElectionMessage::NewLeadershipTerm {
                log_position: self.log_position,
                leadership_term_id: self.leadership_term_id,
                leader_id: self.members.self_id(),
                log_session_id: self.log_session_id.ok_or(ElectionError::NoLogSession)?,
            };
            for peer in self.members.peers() {
                self.transport.try_send(peer.id, &message);
            }
            return Ok(1);
        }

        Ok(0)
    }

    fn follower_catchup(&mut self, now: Instant) -> Result<usize, ElectionError> {
        let Some(catch_up) = self.catch_up.as_mut() else {
            return Err(ElectionError::invariant(
                "follower catch-up state without a coordinator",
            ));
        };

        if !catch_up.is_done() {
            match catch_up.do_work(now, &mut self.transport, &mut self.archive, &self.members) {
                Ok(work_count) => Ok(work_count),
                Err(e) => {
                    warn!("catch-up failed, canvassing again: {}", e);
                    self.transition(State::Canvass, now);
                    Ok(1)
                }
            }
        } else {
            self.log_position = catch_up.target_position();
            self.members.self_member_mut().log_position = self.log_position;
            self.host.catchup_log(catch_up);
            self.transition(State::FollowerTransition, now);
            Ok(1)
        }
    }

    fn follower_transition(&mut self, now: Instant) -> Result<usize, ElectionError> {
        self.host.update_member_details();

        let log_session_id = self.log_session_id.ok_or(ElectionError::NoLogSession)?;
        let log_endpoint = self.members.self_member().log_endpoint.clone();
        let channel = follower_log_channel(&self.config.log_channel, &log_endpoint, log_session_id);

        self.host.record_log_as_follower(&channel, log_session_id)?;
        self.host.await_services_ready(&channel, log_session_id)?;
        self.transition(State::FollowerReady, now);
        Ok(1)
    }

    fn follower_ready(&mut self, now: Instant) -> Result<usize, ElectionError> {
        let leader_id = self
            .leader_id
            .ok_or_else(|| ElectionError::invariant("follower ready without a leader"))?;

        let message = ElectionMessage::AppendedPosition {
            log_position: self.log_position,
            leadership_term_id: self.leadership_term_id,
            member_id: self.members.self_id(),
        };
        if self.transport.try_send(leader_id, &message) {
            self.complete();
            Ok(1)
        } else if now >= self.time_of_last_state_change + self.config.election_timeout {
            self.transition(State::Canvass, now);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    // -- message handling --

    fn poll_messages(&mut self, now: Instant) -> Result<usize, ElectionError> {
        let mut count = 0;
        while count < MESSAGE_POLL_LIMIT {
            let Some(message) = self.transport.poll_inbound() else {
                break;
            };
            self.handle_message(message, now)?;
            count += 1;
        }
        Ok(count)
    }

    fn handle_message(
        &mut self,
        message: ElectionMessage,
        now: Instant,
    ) -> Result<(), ElectionError> {
        match message {
            ElectionMessage::CanvassPosition {
                log_position,
                leadership_term_id,
                member_id,
            } => self.on_canvass_position(log_position, leadership_term_id, member_id, now),
            ElectionMessage::RequestVote {
                log_position,
                candidate_term_id,
                candidate_id,
            } => self.on_request_vote(log_position, candidate_term_id, candidate_id, now),
            ElectionMessage::Vote {
                candidate_term_id,
                candidate_id,
                voter_id,
                vote,
            } => self.on_vote(candidate_term_id, candidate_id, voter_id, vote),
            ElectionMessage::NewLeadershipTerm {
                log_position,
                leadership_term_id,
                leader_id,
                log_session_id,
            } => self.on_new_leadership_term(
                log_position,
                leadership_term_id,
                leader_id,
                log_session_id,
                now,
            ),
            ElectionMessage::AppendedPosition {
                log_position,
                leadership_term_id,
                member_id,
            } => {
                let row = self.members.row_mut(member_id)?;
                row.log_position = log_position;
                row.leadership_term_id = leadership_term_id;
                Ok(())
            }
            ElectionMessage::RecoveryPlan {
                correlation_id,
                last_leadership_term_id,
                last_appended_position,
                ..
            } => {
                if let Some(catch_up) = self.catch_up.as_mut() {
                    catch_up.on_leader_recovery_plan(
                        correlation_id,
                        last_leadership_term_id,
                        last_appended_position,
                    );
                }
                Ok(())
            }
            ElectionMessage::RecordingLog {
                correlation_id,
                ref entries,
                ..
            } => {
                if let Some(catch_up) = self.catch_up.as_mut() {
                    catch_up.on_leader_recording_log(correlation_id, entries);
                }
                Ok(())
            }
            ElectionMessage::RecoveryPlanQuery { requester_id, .. }
            | ElectionMessage::RecordingLogQuery { requester_id, .. } => {
                // answered by the host agent, not the election
                trace!("log query from {} left to the host", requester_id);
                Ok(())
            }
        }
    }

    fn on_canvass_position(
        &mut self,
        log_position: i64,
        leadership_term_id: i64,
        member_id: MemberId,
        now: Instant,
    ) -> Result<(), ElectionError> {
        let row = self.members.row_mut(member_id)?;
        row.log_position = log_position;
        row.leadership_term_id = leadership_term_id;

        if self.state == State::LeaderReady && leadership_term_id <= self.leadership_term_id {
            let reply = ElectionMessage::NewLeadershipTerm {
                log_position: self.log_position,
                leadership_term_id: self.leadership_term_id,
                leader_id: self.members.self_id(),
                log_session_id: self.log_session_id.ok_or(ElectionError::NoLogSession)?,
            };
            self.transport.try_send(member_id, &reply);
        } else if self.state != State::Canvass && leadership_term_id > self.leadership_term_id {
            self.transition(State::Canvass, now);
        }

        Ok(())
    }

    fn on_request_vote(
        &mut self,
        log_position: i64,
        candidate_term_id: i64,
        candidate_id: MemberId,
        now: Instant,
    ) -> Result<(), ElectionError> {
        if self.members.get(candidate_id).is_none() {
            return Err(ElectionError::UnknownMember(candidate_id));
        }

        if candidate_term_id <= self.leadership_term_id {
            self.place_vote(candidate_term_id, candidate_id, false);
        } else if candidate_term_id == self.leadership_term_id + 1
            && log_position < self.log_position
        {
            // fresher term but a shorter log: deny, adopt the term, and
            // canvass so the cluster can find the better candidate
            self.place_vote(candidate_term_id, candidate_id, false);
            self.leadership_term_id = candidate_term_id;
            self.recording_log
                .append_term(candidate_term_id, self.log_position, now)?;
            self.transition(State::Canvass, now);
        } else {
            self.leadership_term_id = candidate_term_id;
            self.recording_log
                .append_term(candidate_term_id, log_position, now)?;
            self.transition(State::FollowerBallot, now);
            self.place_vote(candidate_term_id, candidate_id, true);
        }

        Ok(())
    }

    fn on_vote(
        &mut self,
        candidate_term_id: i64,
        candidate_id: MemberId,
        voter_id: MemberId,
        vote: bool,
    ) -> Result<(), ElectionError> {
        if self.state == State::CandidateBallot
            && candidate_term_id == self.leadership_term_id
            && candidate_id == self.members.self_id()
        {
            let row = self.members.row_mut(voter_id)?;
            row.leadership_term_id = candidate_term_id;
            row.voted_for = Some(vote);
            debug!(
                "{} voted {} for term {}",
                voter_id,
                if vote { "yes" } else { "no" },
                candidate_term_id
            );
        }
        Ok(())
    }

    fn on_new_leadership_term(
        &mut self,
        log_position: i64,
        leadership_term_id: i64,
        leader_id: MemberId,
        log_session_id: i32,
        now: Instant,
    ) -> Result<(), ElectionError> {
        if self.members.get(leader_id).is_none() {
            return Err(ElectionError::UnknownMember(leader_id));
        }

        if (self.state == State::FollowerBallot || self.state == State::CandidateBallot)
            && leadership_term_id == self.leadership_term_id
        {
            self.leader_id = Some(leader_id);
            self.log_session_id = Some(log_session_id);

            if self.log_position < log_position && self.catch_up.is_none() {
                self.start_catchup(leader_id, log_position, now);
            } else {
                self.transition(State::FollowerTransition, now);
            }
        } else if leadership_term_id > self.leadership_term_id {
            // This member missed the election for a later term. Adopt
            // the term, record it at the leader's position, and close
            // the log gap against that leader.
            info!(
                "adopting later term {} from {}",
                leadership_term_id, leader_id
            );
            self.leadership_term_id = leadership_term_id;
            self.recording_log
                .append_term(leadership_term_id, log_position, now)?;
            if self.state == State::FollowerCatchup {
                self.close_catch_up();
            }
            self.leader_id = Some(leader_id);
            self.log_session_id = Some(log_session_id);

            if self.log_position < log_position {
                self.start_catchup(leader_id, log_position, now);
            } else {
                self.transition(State::FollowerTransition, now);
            }
        }

        Ok(())
    }

    // -- internals --

    fn start_catchup(&mut self, leader_id: MemberId, target_position: i64, now: Instant) {
        debug!(
            "catching up {} -> {} from {}",
            self.log_position, target_position, leader_id
        );
        self.transition(State::FollowerCatchup, now);
        self.catch_up = Some(CatchUpCoordinator::new(
            leader_id,
            self.members.self_id(),
            self.log_position,
            target_position,
            self.leadership_term_id,
            self.config.status_interval,
        ));
    }

    fn place_vote(&mut self, candidate_term_id: i64, candidate_id: MemberId, vote: bool) {
        info!(
            "{} voting {} for {} in term {}",
            self.members.self_id(),
            if vote { "yes" } else { "no" },
            candidate_id,
            candidate_term_id
        );
        let message = ElectionMessage::Vote {
            candidate_term_id,
            candidate_id,
            voter_id: self.members.self_id(),
            vote,
        };
        // a lost vote is recovered by the candidate's ballot timeout
        self.transport.try_send(candidate_id, &message);
    }

    fn nomination_backoff(&mut self) -> std::time::Duration {
        let interval_ms = self.config.status_interval.as_millis() as u64;
        if interval_ms == 0 {
            return std::time::Duration::ZERO;
        }
        std::time::Duration::from_millis(self.rng.random_range(0..interval_ms))
    }

    /// The transition primitive: stamps the change time, runs the
    /// current state's exit hook, publishes the new code, and applies
    /// entry behavior for `CANVASS`.
    fn transition(&mut self, next: State, now: Instant) {
        self.time_of_last_state_change = now;

        // per-state exit hooks
        if self.state == State::FollowerCatchup {
            self.close_catch_up();
        }

        debug!("election state {} -> {}", self.state, next);
        self.state = next;
        if let Some(counter) = &self.state_counter {
            counter.set(next);
        }

        if next == State::Canvass {
            self.members.reset(self.leadership_term_id, self.log_position);
            self.time_of_last_broadcast = None;
            self.host.role(Role::Follower);
        }
    }

    fn complete(&mut self) {
        info!(
            "election complete in term {} at position {}",
            self.leadership_term_id, self.log_position
        );
        self.host.election_complete();
        self.release();
        self.terminated = true;
    }

    fn release(&mut self) {
        self.close_catch_up();
        self.state_counter = None;
    }

    fn close_catch_up(&mut self) {
        if let Some(mut catch_up) = self.catch_up.take() {
            catch_up.close(&mut self.archive);
        }
    }
}
