//! Integration tests for the follower catch-up path.

use keel_election::{ElectionMessage, MemberId, State};

use crate::helpers::{ClusterOptions, TestCluster, LOG_SESSION_ID, RECORDING_ID};

#[test]
fn lagging_follower_catches_up_through_the_archive() {
    let mut cluster = TestCluster::start_with(ClusterOptions {
        positions: vec![400, 1000, 1000],
        ..Default::default()
    });

    cluster.run_until(8000, 10, TestCluster::all_live_nodes_complete);

    assert_eq!(cluster.leaders(), vec![MemberId(2)]);

    let node = &cluster.nodes[0];
    assert_eq!(node.election.log_position(), 1000);
    assert_eq!(node.host.borrow().catchup_targets, vec![1000]);

    // the gap was replicated from the leader's archive and then stopped
    let archive = node.archive.borrow();
    assert_eq!(
        archive.replications,
        vec![(RECORDING_ID, 1000, "node2:20002".to_string())]
    );
    assert_eq!(archive.stopped.len(), 1);
    drop(archive);

    // only then did it subscribe to the live log, on its own endpoint
    let host = node.host.borrow();
    assert_eq!(host.follower_channels.len(), 1);
    let (channel, session) = &host.follower_channels[0];
    assert!(channel.contains("endpoint=node0:20001"), "channel: {channel}");
    assert_eq!(*session, LOG_SESSION_ID);
}

#[test]
fn member_without_gap_skips_catchup() {
    let mut cluster = TestCluster::start_with(ClusterOptions {
        positions: vec![400, 1000, 1000],
        ..Default::default()
    });

    cluster.run_until(8000, 10, TestCluster::all_live_nodes_complete);

    let node = &cluster.nodes[1];
    assert!(node.host.borrow().catchup_targets.is_empty());
    assert!(node.archive.borrow().replications.is_empty());
    assert_eq!(node.election.log_position(), 1000);
}

#[test]
fn uncoverable_gap_returns_the_follower_to_canvass() {
    let mut cluster = TestCluster::start_with(ClusterOptions {
        positions: vec![400, 1000, 1000],
        auto_catchup: false,
        ..Default::default()
    });

    let mut offset = cluster.run_until(5000, 10, |c| {
        c.nodes[0].election.state() == State::FollowerCatchup
    });

    // the leader dies; its host can no longer answer, so the
    // coordinator's queries pile up at the dead member's endpoint
    cluster.stop(2);

    let mut plan_query = None;
    while plan_query.is_none() {
        offset += 10;
        assert!(offset < 8000, "no recovery plan query observed");
        cluster.tick_all_at(offset);
        plan_query = cluster
            .bus
            .take_queries(MemberId(2))
            .into_iter()
            .find(|q| matches!(q, ElectionMessage::RecoveryPlanQuery { .. }));
    }
    let Some(ElectionMessage::RecoveryPlanQuery {
        correlation_id,
        requester_id,
        ..
    }) = plan_query
    else {
        unreachable!()
    };
    cluster.bus.push(
        requester_id,
        ElectionMessage::RecoveryPlan {
            correlation_id,
            leader_id: MemberId(2),
            requester_id,
            last_leadership_term_id: 1,
            last_term_base_position: 0,
            last_appended_position: 1000,
        },
    );

    let mut log_query = None;
    while log_query.is_none() {
        offset += 10;
        assert!(offset < 10_000, "no recording log query observed");
        cluster.tick_all_at(offset);
        log_query = cluster
            .bus
            .take_queries(MemberId(2))
            .into_iter()
            .find(|q| matches!(q, ElectionMessage::RecordingLogQuery { .. }));
    }
    let Some(ElectionMessage::RecordingLogQuery {
        correlation_id,
        requester_id,
        ..
    }) = log_query
    else {
        unreachable!()
    };
    // nothing in the answer covers the follower's gap from 400
    cluster.bus.push(
        requester_id,
        ElectionMessage::RecordingLog {
            correlation_id,
            leader_id: MemberId(2),
            requester_id,
            entries: vec![keel_election::RecordingLogEntry {
                recording_id: RECORDING_ID,
                leadership_term_id: 1,
                term_base_position: 800,
            }],
        },
    );

    cluster.tick_all_at(offset + 10);
    cluster.tick_all_at(offset + 20);

    let node = &cluster.nodes[0];
    assert_eq!(node.election.state(), State::Canvass);
    assert_eq!(node.election.log_position(), 400, "position untouched");
    assert!(node.archive.borrow().replications.is_empty());
    assert!(node.host.borrow().catchup_targets.is_empty());
    assert!(!node.host.borrow().complete);
}
