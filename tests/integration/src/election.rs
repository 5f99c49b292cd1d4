//! Integration tests for multi-member leader elections.

use keel_election::{MemberId, Role, State};

use crate::helpers::{ClusterOptions, TestCluster, LOG_SESSION_ID};

#[test]
fn equal_logs_elect_the_highest_member_id() {
    let mut cluster = TestCluster::start();

    cluster.run_until(8000, 10, TestCluster::all_live_nodes_complete);

    assert_eq!(cluster.leaders(), vec![MemberId(2)], "id breaks the tie");
    for node in &cluster.nodes {
        assert_eq!(node.election.leadership_term_id(), 1);
        assert_eq!(node.election.leader_id(), Some(MemberId(2)));
        assert!(node.log.borrow().contains(&(1, 1000)));
    }

    // both followers subscribed with the announced log session
    for follower in [0, 1] {
        let host = cluster.nodes[follower].host.borrow();
        assert_eq!(host.follower_channels.len(), 1);
        assert_eq!(host.follower_channels[0].1, LOG_SESSION_ID);
        assert_eq!(host.services_ready, 1);
        assert!(host.complete);
    }
}

#[test]
fn most_up_to_date_log_wins_regardless_of_id() {
    let mut cluster = TestCluster::start_with(ClusterOptions {
        positions: vec![800, 1000, 900],
        ..Default::default()
    });

    cluster.run_until(8000, 10, TestCluster::all_live_nodes_complete);

    assert_eq!(cluster.leaders(), vec![MemberId(1)]);
    // the laggards were caught up to the leader's position before joining
    for follower in [0, 2] {
        let node = &cluster.nodes[follower];
        assert_eq!(node.election.log_position(), 1000);
        assert_eq!(node.host.borrow().catchup_targets, vec![1000]);
    }
}

#[test]
fn appointed_leader_is_followed_without_canvassing() {
    let mut cluster = TestCluster::start_with(ClusterOptions {
        appointed_leader: Some(0),
        ..Default::default()
    });

    cluster.run_until(8000, 10, TestCluster::all_live_nodes_complete);

    assert_eq!(cluster.leaders(), vec![MemberId(0)]);
    // the appointee never canvassed: its first role hint is candidate
    assert_eq!(cluster.nodes[0].host.borrow().roles.first(), Some(&Role::Candidate));
}

#[test]
fn backpressure_delays_but_does_not_break_the_election() {
    let mut cluster = TestCluster::start();

    cluster.bus.set_reject_sends(true);
    let mut offset = 0;
    while offset < 300 {
        cluster.tick_all_at(offset);
        offset += 10;
    }
    assert!(cluster.leaders().is_empty(), "nothing could be exchanged");

    cluster.bus.set_reject_sends(false);
    cluster.run_until(8000, 10, TestCluster::all_live_nodes_complete);
    assert_eq!(cluster.leaders(), vec![MemberId(2)]);
}

#[test]
fn leader_lost_before_announcing_triggers_reelection() {
    let mut cluster = TestCluster::start();

    // member 2 wins the first ballot but dies before any follower
    // hears its term announcement
    cluster.run_until(3000, 10, |c| {
        c.nodes[2].election.state() == State::LeaderReady
    });
    cluster.stop(2);

    cluster.run_until(10_000, 10, TestCluster::all_live_nodes_complete);

    assert_eq!(cluster.leaders(), vec![MemberId(1), MemberId(2)]);
    assert_eq!(
        cluster.nodes[1].election.leadership_term_id(),
        2,
        "re-election had to move to a later term"
    );
    assert!(cluster.nodes[0].host.borrow().complete);
    assert_eq!(cluster.nodes[0].election.leader_id(), Some(MemberId(1)));
}

#[test]
fn at_most_one_leader_per_election() {
    for seed in 0..5 {
        for positions in [
            vec![1000, 900, 800],
            vec![800, 1000, 900],
            vec![900, 800, 1000],
            vec![1000, 1000, 1000],
        ] {
            let expected = positions
                .iter()
                .enumerate()
                .max_by_key(|&(id, &position)| (position, id))
                .map(|(id, _)| MemberId(id as i32))
                .unwrap();

            let mut cluster = TestCluster::start_with(ClusterOptions {
                positions,
                seed,
                ..Default::default()
            });
            cluster.run_until(8000, 10, TestCluster::all_live_nodes_complete);

            let leaders = cluster.leaders();
            assert_eq!(leaders.len(), 1, "seed {seed}: exactly one leader");
            assert_eq!(leaders[0], expected, "seed {seed}: best log wins");
        }
    }
}

#[test]
fn startup_election_waits_out_the_startup_timeout_for_quorum() {
    // member 2 never boots, so candidacy can only be by quorum, which
    // on startup must wait out the longer startup status timeout
    let mut cluster = TestCluster::start_with(ClusterOptions {
        is_startup: true,
        ..Default::default()
    });
    cluster.stop(2);

    let mut offset = 0;
    while offset < 4900 {
        cluster.tick_all_at(offset);
        offset += 50;
    }
    assert!(cluster.leaders().is_empty(), "startup timeout still running");

    cluster.run_until(12_000, 50, |c| {
        c.nodes.iter().filter(|n| !n.stopped).all(|n| n.election.is_terminated())
    });
    assert_eq!(cluster.leaders(), vec![MemberId(1)]);
}
