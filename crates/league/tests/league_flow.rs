//! Full tournament lifecycle over the in-memory transport: real referees,
//! real player agents, real coordinator.

use async_trait::async_trait;
use parity_core::{wrap_request, unwrap_payload, Envelope, Handler, NoopAuditSink};
use parity_league::{IdGenerator, LeagueHandler, LeagueManager, LeagueState};
use parity_messages::{Body, ErrorCode, Message, Sender};
use parity_player::{Alternating, PlayerAgent, Random};
use parity_referee::{Referee, RefereeHandler};
use parity_test_helpers::{BroadcastRecorder, InMemoryNetwork, ScriptedPlayer};
use parity_types::{AuthToken, Endpoint, MatchResult, PlayerId, PlayerMeta, RefereeMeta};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Delegates to an inner handler while recording every inbound message.
struct Recording<H> {
    recorder: Arc<BroadcastRecorder>,
    inner: H,
}

#[async_trait]
impl<H: Handler> Handler for Recording<H> {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        self.recorder.handle(envelope.clone()).await;
        self.inner.handle(envelope).await
    }
}

fn league_endpoint() -> Endpoint {
    Endpoint::new("mem://league")
}

async fn wait_for_completion(manager: &LeagueManager) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !manager.is_completed().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("tournament did not complete in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_tournament_runs_to_completion() {
    let network = InMemoryNetwork::new();
    let manager = Arc::new(
        LeagueManager::new(network.clone(), Arc::new(NoopAuditSink))
            .with_state(LeagueState::with_ids(IdGenerator::seeded(11))),
    );
    network.register(league_endpoint(), Arc::new(LeagueHandler(manager.clone())));

    // Two referees.
    for i in 1..=2u32 {
        let referee = Arc::new(Referee::new(
            network.clone(),
            Arc::new(NoopAuditSink),
            league_endpoint(),
            Endpoint::new(format!("mem://ref{i}")),
            format!("Referee {i}"),
        ));
        network.register(
            Endpoint::new(format!("mem://ref{i}")),
            Arc::new(RefereeHandler(referee.clone())),
        );
        referee.register().await.unwrap();
    }

    // Three players; one wrapped in a broadcast recorder.
    let recorder = Arc::new(BroadcastRecorder::new());
    for i in 1..=3u32 {
        let endpoint = Endpoint::new(format!("mem://p{i}"));
        let agent = PlayerAgent::new(
            network.clone(),
            Arc::new(NoopAuditSink),
            league_endpoint(),
            endpoint.clone(),
            format!("Player {i}"),
            if i % 2 == 0 {
                Box::new(Alternating::seeded(i as u64))
            } else {
                Box::new(Random::seeded(i as u64))
            },
        );
        let agent = Arc::new(agent);
        agent.register().await.unwrap();
        if i == 1 {
            network.register(
                endpoint,
                Arc::new(Recording {
                    recorder: recorder.clone(),
                    inner: ArcHandler(agent),
                }),
            );
        } else {
            network.register(endpoint, agent);
        }
    }

    // 2 rounds × C(3,2) pairings = 6 matches, all assigned.
    let assigned = manager.start_league(2).await.unwrap();
    assert_eq!(assigned, 6);

    wait_for_completion(&manager).await;
    // The completion flag flips before the broadcasts go out, and cascades
    // from different ingestions interleave; wait for every expected
    // delivery before asserting exact counts.
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if recorder.received_of_type("LEAGUE_COMPLETED").len() == 1
                && recorder.received_of_type("LEAGUE_STANDINGS_UPDATE").len() == 6
                && recorder.received_of_type("ROUND_COMPLETED").len() == 2
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("broadcast cascade did not finish");

    // Every match completed with a stored result.
    let schedule = manager.schedule_data().await;
    assert_eq!(schedule.len(), 6);
    assert!(schedule
        .iter()
        .all(|entry| entry.status == parity_types::MatchStatus::Completed));

    // Points conservation: a decisive match adds 3, a draw adds 2.
    let standings = manager.standings().await;
    let total_points: u32 = standings.iter().map(|s| s.points).sum();
    let total_played: u32 = standings.iter().map(|s| s.played).sum();
    assert_eq!(total_played, 12, "each match counts for both players");
    assert!((12..=18).contains(&total_points));

    // Ranks are 1..=3 with no sharing.
    assert_eq!(
        standings.iter().map(|s| s.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    // The recorded player saw the announcement, standings updates, and
    // exactly one league-completed broadcast.
    assert_eq!(recorder.received_of_type("ROUND_ANNOUNCEMENT").len(), 1);
    assert_eq!(recorder.received_of_type("LEAGUE_COMPLETED").len(), 1);
    assert_eq!(recorder.received_of_type("LEAGUE_STANDINGS_UPDATE").len(), 6);
    // Both rounds announced their completion.
    assert_eq!(recorder.received_of_type("ROUND_COMPLETED").len(), 2);
}

/// Adapter so an `Arc<PlayerAgent>` can sit inside `Recording`.
struct ArcHandler(Arc<PlayerAgent>);

#[async_trait]
impl Handler for ArcHandler {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        self.0.handle(envelope).await
    }
}

/// Coordinator-only rig: a referee credential plus recorder players, no
/// real match execution.
struct Rig {
    manager: Arc<LeagueManager>,
    referee: (parity_types::RefereeId, AuthToken),
    players: Vec<PlayerId>,
    recorder: Arc<BroadcastRecorder>,
}

async fn make_rig(player_count: usize, rounds: u64) -> Rig {
    let network = InMemoryNetwork::new();
    let manager = Arc::new(
        LeagueManager::new(network.clone(), Arc::new(NoopAuditSink))
            .with_state(LeagueState::with_ids(IdGenerator::seeded(3))),
    );
    network.register(league_endpoint(), Arc::new(LeagueHandler(manager.clone())));

    let referee = manager
        .register_referee(RefereeMeta {
            display_name: "Referee".to_string(),
            version: None,
            endpoint: None,
        })
        .await;

    // One recorder per player endpoint; assertions use the first one so
    // broadcast counts are per-recipient, not summed across recipients.
    let recorder = Arc::new(BroadcastRecorder::new());
    let mut players = Vec::new();
    for i in 0..player_count {
        let endpoint = Endpoint::new(format!("mem://p{i}"));
        if i == 0 {
            network.register(endpoint.clone(), recorder.clone());
        } else {
            network.register(endpoint.clone(), Arc::new(BroadcastRecorder::new()));
        }
        let (id, _token) = manager
            .register_player(PlayerMeta {
                display_name: format!("Player {i}"),
                endpoint,
                strategy: None,
            })
            .await;
        players.push(id);
    }

    manager.create_schedule(rounds).await.unwrap();
    Rig {
        manager,
        referee,
        players,
        recorder,
    }
}

fn win(winner: &PlayerId, loser: &PlayerId) -> MatchResult {
    MatchResult {
        winner: Some(winner.clone()),
        score: BTreeMap::from([(winner.clone(), 3), (loser.clone(), 0)]),
        detail: Default::default(),
    }
}

#[tokio::test]
async fn test_concurrent_final_results_complete_exactly_once() {
    let rig = make_rig(2, 2).await;
    let schedule = rig.manager.schedule_data().await;
    assert_eq!(schedule.len(), 2);

    let (referee_id, token) = rig.referee.clone();
    let first = {
        let manager = rig.manager.clone();
        let match_id = schedule[0].match_id.clone();
        let result = win(&rig.players[0], &rig.players[1]);
        let (referee_id, token) = (referee_id.clone(), token.clone());
        tokio::spawn(
            async move { manager.record_match_result(&referee_id, &token, &match_id, result).await },
        )
    };
    let second = {
        let manager = rig.manager.clone();
        let match_id = schedule[1].match_id.clone();
        let result = win(&rig.players[1], &rig.players[0]);
        tokio::spawn(
            async move { manager.record_match_result(&referee_id, &token, &match_id, result).await },
        )
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert!(rig.manager.is_completed().await);
    assert_eq!(rig.recorder.received_of_type("LEAGUE_COMPLETED").len(), 1);

    // The champion carries the top rank of the final standings.
    let completed = rig.recorder.received_of_type("LEAGUE_COMPLETED");
    let Body::LeagueCompleted(body) = &completed[0].body else {
        panic!("wrong body");
    };
    assert_eq!(body.total_matches, 2);
    assert!(body.champion.is_some());
    assert_eq!(body.final_standings[0].rank, 1);
}

#[tokio::test]
async fn test_duplicate_result_submission_rejected() {
    let rig = make_rig(2, 1).await;
    let schedule = rig.manager.schedule_data().await;
    let match_id = schedule[0].match_id.clone();
    let (referee_id, token) = rig.referee.clone();

    rig.manager
        .record_match_result(&referee_id, &token, &match_id, win(&rig.players[0], &rig.players[1]))
        .await
        .unwrap();
    let err = rig
        .manager
        .record_match_result(&referee_id, &token, &match_id, win(&rig.players[0], &rig.players[1]))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::MatchAlreadyCompleted);

    let standings = rig.manager.standings().await;
    assert_eq!(standings[0].points, 3);
    assert_eq!(standings[0].wins, 1);
}

#[tokio::test]
async fn test_result_report_with_foreign_token_rejected() {
    let rig = make_rig(2, 1).await;
    let schedule = rig.manager.schedule_data().await;
    let match_id = schedule[0].match_id.clone();
    let (referee_id, _token) = rig.referee.clone();

    let err = rig
        .manager
        .record_match_result(
            &referee_id,
            &AuthToken::new("stolen"),
            &match_id,
            win(&rig.players[0], &rig.players[1]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::AuthFailed);

    // Nothing mutated, nothing broadcast.
    let standings = rig.manager.standings().await;
    assert!(standings.iter().all(|s| s.points == 0 && s.played == 0));
    assert!(rig
        .recorder
        .received_of_type("LEAGUE_STANDINGS_UPDATE")
        .is_empty());
}

#[tokio::test]
async fn test_void_match_completes_stuck_tournament() {
    let rig = make_rig(2, 1).await;
    let schedule = rig.manager.schedule_data().await;
    let match_id = schedule[0].match_id.clone();

    // The match never produces a result (abandoned at the join step).
    rig.manager.void_match(&match_id).await.unwrap();

    assert!(rig.manager.is_completed().await);
    assert_eq!(rig.recorder.received_of_type("LEAGUE_COMPLETED").len(), 1);
    let standings = rig.manager.standings().await;
    assert!(standings.iter().all(|s| s.points == 0 && s.draws == 1));
}

#[tokio::test]
async fn test_handler_rejects_unknown_message_and_query_types() {
    let rig = make_rig(2, 1).await;
    let handler = LeagueHandler(rig.manager.clone());

    // Unknown message type.
    let envelope = wrap_request(
        serde_json::json!({
            "protocol": "league.v2",
            "message_type": "TAKE_OVER_LEAGUE",
            "sender": "player:p",
            "timestamp": "2025-01-01T00:00:00Z",
            "conversation_id": "c1",
        }),
        1.into(),
    );
    let response = handler.handle(envelope).await;
    let reply = Message::from_value(unwrap_payload(&response)).unwrap();
    let error = match reply.body {
        Body::Error(error) => error,
        other => panic!("expected error, got {}", other.message_type()),
    };
    assert_eq!(error.error_code, ErrorCode::UnknownMessageType);

    // Unknown query subtype.
    let envelope = wrap_request(
        serde_json::json!({
            "protocol": "league.v2",
            "message_type": "LEAGUE_QUERY",
            "sender": "player:p",
            "timestamp": "2025-01-01T00:00:00Z",
            "conversation_id": "c2",
            "query_type": "GET_GOSSIP",
            "player_id": "p",
        }),
        2.into(),
    );
    let response = handler.handle(envelope).await;
    let reply = Message::from_value(unwrap_payload(&response)).unwrap();
    let error = match reply.body {
        Body::Error(error) => error,
        other => panic!("expected error, got {}", other.message_type()),
    };
    assert_eq!(error.error_code, ErrorCode::UnknownQuery);

    // The correlation id is echoed even on errors.
    assert_eq!(response.id, Some(2.into()));
}

#[tokio::test]
async fn test_handler_authenticates_queries() {
    let rig = make_rig(2, 1).await;
    let handler = LeagueHandler(rig.manager.clone());

    let query = Message::new(
        Sender::Player(rig.players[0].clone()),
        Body::LeagueQuery(parity_messages::LeagueQuery {
            query_type: parity_messages::QueryType::GetStandings,
            player_id: rig.players[0].clone(),
            target_player_id: None,
        }),
    )
    .with_auth(AuthToken::new("wrong"));

    let response = handler
        .handle(wrap_request(query.to_value().unwrap(), 3.into()))
        .await;
    let reply = Message::from_value(unwrap_payload(&response)).unwrap();
    let error = match reply.body {
        Body::Error(error) => error,
        other => panic!("expected error, got {}", other.message_type()),
    };
    assert_eq!(error.error_code, ErrorCode::AuthFailed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unresponsive_player_forfeits_in_real_run() {
    let network = InMemoryNetwork::new();
    let manager = Arc::new(
        LeagueManager::new(network.clone(), Arc::new(NoopAuditSink))
            .with_state(LeagueState::with_ids(IdGenerator::seeded(17))),
    );
    network.register(league_endpoint(), Arc::new(LeagueHandler(manager.clone())));

    let referee = Arc::new(
        Referee::new(
            network.clone(),
            Arc::new(NoopAuditSink),
            league_endpoint(),
            Endpoint::new("mem://ref"),
            "Referee",
        )
        .with_collector_config(parity_types::CollectorConfig {
            max_retries: 2,
            attempt_timeout: Duration::from_millis(50),
        }),
    );
    network.register(
        Endpoint::new("mem://ref"),
        Arc::new(RefereeHandler(referee.clone())),
    );
    referee.register().await.unwrap();

    // One real player, one that joins but never answers decision calls.
    let agent = Arc::new(PlayerAgent::new(
        network.clone(),
        Arc::new(NoopAuditSink),
        league_endpoint(),
        Endpoint::new("mem://good"),
        "Good Player",
        Box::new(Alternating::seeded(1)),
    ));
    network.register(Endpoint::new("mem://good"), agent.clone());
    let good_id = agent.register().await.unwrap();

    let (mute_id, _token) = manager
        .register_player(PlayerMeta {
            display_name: "Mute Player".to_string(),
            endpoint: Endpoint::new("mem://mute"),
            strategy: None,
        })
        .await;
    network.register(
        Endpoint::new("mem://mute"),
        Arc::new(ScriptedPlayer::scripted(
            mute_id.clone(),
            vec![
                parity_test_helpers::ChoiceReply::Silent,
                parity_test_helpers::ChoiceReply::Silent,
            ],
            "even",
        )),
    );

    manager.start_league(1).await.unwrap();
    wait_for_completion(&manager).await;

    let standings = manager.standings().await;
    let good = standings.iter().find(|s| s.player_id == good_id).unwrap();
    let mute = standings.iter().find(|s| s.player_id == mute_id).unwrap();
    assert_eq!(good.wins, 1);
    assert_eq!(good.points, 3);
    assert_eq!(mute.losses, 1);
    assert_eq!(mute.points, 0);
}
