//! End-to-end tests of the room actor and manager, driven through their
//! public handles with in-process channels standing in for connections.

use parlor_presence::PeerSender;
use parlor_protocol::{ConnId, Role, ServerEvent, UserId};
use parlor_room::{RoomConfig, RoomError, RoomManager, TicTacToe};
use tokio::sync::mpsc;

fn cid(n: u64) -> ConnId {
    ConnId::new(n)
}

fn uid(s: &str) -> UserId {
    UserId(s.to_string())
}

fn peer() -> (PeerSender, mpsc::UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn manager() -> RoomManager<TicTacToe> {
    RoomManager::new(TicTacToe, RoomConfig::default())
}

/// Joins two players into `room` and returns their event receivers.
async fn join_pair(
    mgr: &mut RoomManager<TicTacToe>,
    room: &str,
) -> (
    mpsc::UnboundedReceiver<ServerEvent>,
    mpsc::UnboundedReceiver<ServerEvent>,
) {
    let (tx1, rx1) = peer();
    let (tx2, rx2) = peer();
    mgr.join(room, cid(1), Some(uid("u1")), "alice", tx1)
        .await
        .unwrap();
    mgr.join(room, cid(2), Some(uid("u2")), "bob", tx2)
        .await
        .unwrap();
    (rx1, rx2)
}

/// Readies both players and returns each side's `GameStart`, draining
/// everything else. `member_count` doubles as a barrier: the actor
/// processes commands in order, so once it answers, the fire-and-forget
/// ready signals have been handled.
async fn start_match(
    mgr: &mut RoomManager<TicTacToe>,
    room: &str,
    rx1: &mut mpsc::UnboundedReceiver<ServerEvent>,
    rx2: &mut mpsc::UnboundedReceiver<ServerEvent>,
) -> (ServerEvent, ServerEvent) {
    let handle = mgr.get(room).unwrap();
    handle.ready(cid(1)).await.unwrap();
    handle.ready(cid(2)).await.unwrap();
    handle.member_count().await.unwrap();

    let start_of = |events: Vec<ServerEvent>| {
        events
            .into_iter()
            .find(|e| matches!(e, ServerEvent::GameStart { .. }))
            .expect("game_start not received")
    };
    (start_of(drain(rx1)), start_of(drain(rx2)))
}

/// Returns the conn id of the first mover after a started match.
fn first_mover(start1: &ServerEvent, _start2: &ServerEvent) -> (ConnId, ConnId) {
    match start1 {
        ServerEvent::GameStart {
            is_first_turn: true,
            ..
        } => (cid(1), cid(2)),
        _ => (cid(2), cid(1)),
    }
}

#[tokio::test]
async fn test_join_creates_room_implicitly() {
    let mut mgr = manager();
    assert_eq!(mgr.room_count(), 0);

    let (tx, mut rx) = peer();
    mgr.join("room_u1", cid(1), Some(uid("u1")), "alice", tx)
        .await
        .unwrap();

    assert_eq!(mgr.room_count(), 1);
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::ReceiveMessage { username, text, .. }
            if username == "System" && text == "alice joined the game."
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::RoomUsers { users } if users.len() == 1)));
}

#[tokio::test]
async fn test_third_join_rejected_when_full() {
    let mut mgr = manager();
    let (_rx1, _rx2) = join_pair(&mut mgr, "room_u1").await;

    let (tx3, _rx3) = peer();
    let err = mgr
        .join("room_u1", cid(3), None, "carol", tx3)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::Full { capacity: 2, .. }));
    assert_eq!(
        err.to_string(),
        "room room_u1 is full (max 2 players)"
    );
}

#[tokio::test]
async fn test_rejoin_same_connection_is_idempotent() {
    let mut mgr = manager();
    let (_rx1, _rx2) = join_pair(&mut mgr, "room_u1").await;

    // Same connection again does not count against capacity.
    let (tx, _rx) = peer();
    mgr.join("room_u1", cid(1), Some(uid("u1")), "alice", tx)
        .await
        .unwrap();

    let handle = mgr.get("room_u1").unwrap();
    assert_eq!(handle.member_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_ready_broadcasts_count_to_all_members() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    drain(&mut rx1);
    drain(&mut rx2);

    let handle = mgr.get("room_u1").unwrap();
    handle.ready(cid(1)).await.unwrap();
    handle.member_count().await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        let events = drain(rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::UpdateReadyCount { count: 1 })));
    }
}

#[tokio::test]
async fn test_ready_is_idempotent_per_connection() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    drain(&mut rx1);
    drain(&mut rx2);

    let handle = mgr.get("room_u1").unwrap();
    handle.ready(cid(1)).await.unwrap();
    handle.ready(cid(1)).await.unwrap();
    handle.member_count().await.unwrap();

    // Re-signaling never reaches 2; no match starts.
    let events = drain(&mut rx1);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ServerEvent::GameStart { .. })));
    assert!(events
        .iter()
        .all(|e| !matches!(e, ServerEvent::UpdateReadyCount { count } if *count > 1)));
}

#[tokio::test]
async fn test_both_ready_starts_match_with_complementary_roles() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    let (start1, start2) = start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;

    let (ServerEvent::GameStart {
        role: role1,
        is_first_turn: first1,
    }, ServerEvent::GameStart {
        role: role2,
        is_first_turn: first2,
    }) = (start1, start2)
    else {
        panic!("expected game_start on both sides");
    };

    assert_ne!(role1, role2, "roles must be complementary");
    assert!(first1 ^ first2, "exactly one side moves first");
    // Role A always moves first.
    let first_role = if first1 { role1 } else { role2 };
    assert_eq!(first_role, Role::A);
}

#[tokio::test]
async fn test_readiness_cleared_after_match_starts() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;

    // A rematch needs both to re-signal; one ready only reaches 1.
    let handle = mgr.get("room_u1").unwrap();
    handle.ready(cid(1)).await.unwrap();
    handle.member_count().await.unwrap();

    let events = drain(&mut rx1);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::UpdateReadyCount { count: 1 })));
}

#[tokio::test]
async fn test_join_after_match_start_reports_zero_ready_count() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;

    // A rejoin after the set was cleared still gets the count announced,
    // at zero, because readiness was signaled in this room before.
    let (tx, _rx) = peer();
    mgr.join("room_u1", cid(1), Some(uid("u1")), "alice", tx)
        .await
        .unwrap();

    let events = drain(&mut rx1);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::UpdateReadyCount { count: 0 })));
}

#[tokio::test]
async fn test_move_relayed_to_opponent_only() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    let (s1, s2) = start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;
    let (first, _second) = first_mover(&s1, &s2);

    let handle = mgr.get("room_u1").unwrap();
    let payload = serde_json::json!({ "room": "room_u1", "index": 4, "symbol": "X" });
    handle.relay_move(first, payload.clone()).await.unwrap();
    handle.member_count().await.unwrap();

    let (mover_rx, other_rx) = if first == cid(1) {
        (&mut rx1, &mut rx2)
    } else {
        (&mut rx2, &mut rx1)
    };
    let mover_events = drain(mover_rx);
    assert!(!mover_events
        .iter()
        .any(|e| matches!(e, ServerEvent::UpdateBoard { .. })));
    let other_events = drain(other_rx);
    assert!(other_events.iter().any(
        |e| matches!(e, ServerEvent::UpdateBoard { payload: p } if *p == payload)
    ));
}

#[tokio::test]
async fn test_move_out_of_turn_dropped() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    let (s1, s2) = start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;
    let (first, second) = first_mover(&s1, &s2);

    let handle = mgr.get("room_u1").unwrap();
    let payload = serde_json::json!({ "room": "room_u1", "index": 0, "symbol": "O" });
    handle.relay_move(second, payload).await.unwrap();
    handle.member_count().await.unwrap();

    // Neither side sees a board update from an out-of-turn move.
    for rx in [&mut rx1, &mut rx2] {
        assert!(!drain(rx)
            .iter()
            .any(|e| matches!(e, ServerEvent::UpdateBoard { .. })));
    }
    // The turn still belongs to the first mover.
    let payload = serde_json::json!({ "room": "room_u1", "index": 0, "symbol": "X" });
    handle.relay_move(first, payload).await.unwrap();
    handle.member_count().await.unwrap();
    let other_rx = if first == cid(1) { &mut rx2 } else { &mut rx1 };
    assert!(drain(other_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::UpdateBoard { .. })));
}

#[tokio::test]
async fn test_occupied_cell_move_dropped() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    let (s1, s2) = start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;
    let (first, second) = first_mover(&s1, &s2);

    let handle = mgr.get("room_u1").unwrap();
    let at = |i: u64| serde_json::json!({ "room": "room_u1", "index": i });
    handle.relay_move(first, at(4)).await.unwrap();
    handle.relay_move(second, at(4)).await.unwrap();
    handle.member_count().await.unwrap();
    drain(&mut rx1);
    drain(&mut rx2);

    // The illegal move did not consume the turn; the second mover may
    // still play a free cell.
    handle.relay_move(second, at(0)).await.unwrap();
    handle.member_count().await.unwrap();
    let first_rx = if first == cid(1) { &mut rx1 } else { &mut rx2 };
    assert!(drain(first_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::UpdateBoard { .. })));
}

#[tokio::test]
async fn test_winning_line_broadcasts_game_over() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    let (s1, s2) = start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;
    let (first, second) = first_mover(&s1, &s2);

    let handle = mgr.get("room_u1").unwrap();
    let at = |i: u64| serde_json::json!({ "room": "room_u1", "index": i });
    // X: 0, 1, 2 (top row). O: 3, 4.
    handle.relay_move(first, at(0)).await.unwrap();
    handle.relay_move(second, at(3)).await.unwrap();
    handle.relay_move(first, at(1)).await.unwrap();
    handle.relay_move(second, at(4)).await.unwrap();
    handle.relay_move(first, at(2)).await.unwrap();
    handle.member_count().await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        let events = drain(rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ServerEvent::GameOver {
                winner: Some(Role::A),
                reason,
            } if reason == "X wins!"
        )));
    }
}

#[tokio::test]
async fn test_leave_mid_match_forfeits_to_remaining_player() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    let (s1, s2) = start_match(&mut mgr, "room_u1", &mut rx1, &mut rx2).await;
    let (first, _second) = first_mover(&s1, &s2);
    // The first mover is always Role::A, so cid(1)'s role follows from it.
    let role1 = if first == cid(1) { Role::A } else { Role::B };

    // cid(1) leaves; cid(2) wins by forfeit whatever the roles were.
    assert!(mgr.leave("room_u1", cid(1)).await.unwrap());
    let expected = role1.opponent();

    let events = drain(&mut rx2);
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::GameOver { winner: Some(w), .. } if *w == expected
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::ReceiveMessage { username, text, .. }
            if username == "System" && text == "alice left the room."
    )));
}

#[tokio::test]
async fn test_kick_by_non_host_rejected() {
    let mut mgr = manager();
    let (_rx1, _rx2) = join_pair(&mut mgr, "room_u1").await;

    // cid(2) is u2, not the host of room_u1.
    let err = mgr.kick("room_u1", cid(2), cid(1)).await.unwrap_err();
    assert!(matches!(err, RoomError::NotHost(c, _) if c == cid(2)));

    let handle = mgr.get("room_u1").unwrap();
    assert_eq!(handle.member_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_kick_by_host_removes_target() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    drain(&mut rx1);
    drain(&mut rx2);

    mgr.kick("room_u1", cid(1), cid(2)).await.unwrap();

    let handle = mgr.get("room_u1").unwrap();
    assert_eq!(handle.member_count().await.unwrap(), 1);

    // The target gets the dedicated event plus the broadcast line.
    let events2 = drain(&mut rx2);
    assert!(events2
        .iter()
        .any(|e| matches!(e, ServerEvent::KickedFromRoom)));
    let events1 = drain(&mut rx1);
    assert!(events1.iter().any(|e| matches!(
        e,
        ServerEvent::ReceiveMessage { username, text, .. }
            if username == "System" && text == "bob was kicked from the room."
    )));
}

#[tokio::test]
async fn test_kick_in_unowned_room_rejected_for_everyone() {
    let mut mgr = manager();
    let (tx1, _rx1) = peer();
    let (tx2, _rx2) = peer();
    mgr.join("lobby", cid(1), Some(uid("u1")), "alice", tx1)
        .await
        .unwrap();
    mgr.join("lobby", cid(2), Some(uid("u2")), "bob", tx2)
        .await
        .unwrap();

    // "lobby" designates no host, so nobody can kick.
    let err = mgr.kick("lobby", cid(1), cid(2)).await.unwrap_err();
    assert!(matches!(err, RoomError::NotHost(..)));
}

#[tokio::test]
async fn test_chat_echoes_to_all_members_including_sender() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    drain(&mut rx1);
    drain(&mut rx2);

    let handle = mgr.get("room_u1").unwrap();
    handle.chat(cid(1), "alice", "hello").await.unwrap();
    handle.member_count().await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        let events = drain(rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ServerEvent::ReceiveMessage { username, text, .. }
                if username == "alice" && text == "hello"
        )));
    }
}

#[tokio::test]
async fn test_leave_all_purges_every_membership() {
    let mut mgr = manager();
    let (tx_a, _rx_a) = peer();
    let (tx_b, _rx_b) = peer();
    mgr.join("room_u1", cid(1), Some(uid("u1")), "alice", tx_a)
        .await
        .unwrap();
    mgr.join("lobby", cid(1), Some(uid("u1")), "alice", tx_b)
        .await
        .unwrap();

    let mut left = mgr.leave_all(cid(1)).await;
    left.sort();
    assert_eq!(left, vec!["lobby".to_string(), "room_u1".to_string()]);

    for room in ["room_u1", "lobby"] {
        let handle = mgr.get(room).unwrap();
        assert_eq!(handle.member_count().await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_sweep_reaps_only_empty_rooms() {
    let mut mgr = manager();
    let (tx1, _rx1) = peer();
    let (tx2, _rx2) = peer();
    mgr.join("room_u1", cid(1), Some(uid("u1")), "alice", tx1)
        .await
        .unwrap();
    mgr.join("room_u2", cid(2), Some(uid("u2")), "bob", tx2)
        .await
        .unwrap();
    mgr.leave("room_u2", cid(2)).await.unwrap();

    let reaped = mgr.sweep().await;
    assert_eq!(reaped, 1);
    assert_eq!(mgr.room_count(), 1);
    assert!(mgr.get("room_u1").is_some());
    assert!(mgr.get("room_u2").is_none());
}

#[tokio::test]
async fn test_disconnect_during_readiness_clears_count() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = join_pair(&mut mgr, "room_u1").await;
    drain(&mut rx1);
    drain(&mut rx2);

    let handle = mgr.get("room_u1").unwrap();
    handle.ready(cid(1)).await.unwrap();
    handle.member_count().await.unwrap();
    drain(&mut rx2);

    // The ready player vanishes; the remaining one sees count drop to 0.
    mgr.leave_all(cid(1)).await;
    let events = drain(&mut rx2);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::UpdateReadyCount { count: 0 })));
}
