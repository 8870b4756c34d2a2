//! End-to-end match execution against scripted players and a fake league.

use async_trait::async_trait;
use parity_core::{
    unwrap_payload, wrap_response, AuditDirection, Envelope, Handler, NoopAuditSink,
};
use parity_messages::{
    Ack, Body, MatchAssignment, MatchResultAcknowledged, MatchResultReport, Message,
    RefereeRegisterResponse, RegistrationStatus, Sender,
};
use parity_referee::{MatchCompletion, Referee, RefereeHandler};
use parity_test_helpers::{ChoiceReply, InMemoryNetwork, RecordingSink, ScriptedPlayer};
use parity_types::{AuthToken, Endpoint, MatchId, PlayerId, RefereeId, RoundId};
use std::sync::{Arc, Mutex};

/// Minimal league stand-in: accepts registrations, records result reports.
#[derive(Default)]
struct FakeLeague {
    reports: Mutex<Vec<MatchResultReport>>,
}

impl FakeLeague {
    fn reports(&self) -> Vec<MatchResultReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl Handler for FakeLeague {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        let correlation = envelope.echo_correlation();
        let inbound = Message::from_value(unwrap_payload(&envelope)).unwrap();

        let reply_body = match inbound.body {
            Body::RefereeRegisterRequest(_) => {
                Body::RefereeRegisterResponse(RefereeRegisterResponse {
                    status: RegistrationStatus::Accepted,
                    referee_id: RefereeId::new("ref_1"),
                    auth_token: AuthToken::new("ref_1_token"),
                    league_id: "league_test".to_string(),
                    reason: None,
                })
            }
            Body::MatchResultReport(report) => {
                let match_id = report.match_id.clone();
                self.reports.lock().unwrap().push(report);
                Body::MatchResultAcknowledged(MatchResultAcknowledged { match_id })
            }
            _ => Body::Ack(Ack::received()),
        };

        let reply = Message::new(Sender::LeagueManager, reply_body)
            .with_conversation(inbound.conversation_id);
        wrap_response(reply.to_value().unwrap(), correlation)
    }
}

fn make_assignment() -> MatchAssignment {
    MatchAssignment {
        match_id: MatchId::new("match_1"),
        league_id: "league_test".to_string(),
        round_id: RoundId(1),
        player_a_id: PlayerId::new("player_a"),
        player_b_id: PlayerId::new("player_b"),
        player_a_endpoint: Endpoint::new("mem://a"),
        player_b_endpoint: Endpoint::new("mem://b"),
    }
}

struct Rig {
    network: Arc<InMemoryNetwork>,
    league: Arc<FakeLeague>,
    referee: Arc<Referee>,
}

async fn make_rig(player_a: ScriptedPlayer, player_b: ScriptedPlayer) -> Rig {
    let network = InMemoryNetwork::new();
    let league = Arc::new(FakeLeague::default());
    network.register(Endpoint::new("mem://league"), league.clone());
    network.register(Endpoint::new("mem://a"), Arc::new(player_a));
    network.register(Endpoint::new("mem://b"), Arc::new(player_b));

    let referee = Arc::new(Referee::new(
        network.clone(),
        Arc::new(NoopAuditSink),
        Endpoint::new("mem://league"),
        Endpoint::new("mem://referee"),
        "Referee Alpha",
    ));
    referee.register().await.unwrap();

    Rig {
        network,
        league,
        referee,
    }
}

#[tokio::test]
async fn test_decisive_match_reports_three_zero() {
    let rig = make_rig(
        ScriptedPlayer::answering(PlayerId::new("player_a"), "even"),
        ScriptedPlayer::answering(PlayerId::new("player_b"), "odd"),
    )
    .await;

    let completion = rig.referee.run_match(make_assignment()).await;
    let result = match completion {
        MatchCompletion::Reported(result) => result,
        other => panic!("expected reported completion, got {other:?}"),
    };

    // Opposite declarations always produce a decisive outcome.
    let winner = result.winner.clone().expect("expected a winner");
    let loser = if winner == PlayerId::new("player_a") {
        PlayerId::new("player_b")
    } else {
        PlayerId::new("player_a")
    };
    assert_eq!(result.points_for(&winner), 3);
    assert_eq!(result.points_for(&loser), 0);
    assert!((1..=100).contains(&result.detail.drawn_value.unwrap()));

    let reports = rig.league.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].match_id, MatchId::new("match_1"));
    assert_eq!(reports[0].result, result);
}

#[tokio::test]
async fn test_same_declarations_always_draw() {
    let rig = make_rig(
        ScriptedPlayer::answering(PlayerId::new("player_a"), "even"),
        ScriptedPlayer::answering(PlayerId::new("player_b"), "even"),
    )
    .await;

    let completion = rig.referee.run_match(make_assignment()).await;
    let result = match completion {
        MatchCompletion::Reported(result) => result,
        other => panic!("expected reported completion, got {other:?}"),
    };

    assert_eq!(result.winner, None);
    assert_eq!(result.points_for(&PlayerId::new("player_a")), 1);
    assert_eq!(result.points_for(&PlayerId::new("player_b")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_player_loses_by_technical_loss() {
    let silent = vec![ChoiceReply::Silent, ChoiceReply::Silent, ChoiceReply::Silent];
    let rig = make_rig(
        ScriptedPlayer::answering(PlayerId::new("player_a"), "even"),
        ScriptedPlayer::scripted(PlayerId::new("player_b"), silent, "odd"),
    )
    .await;

    let completion = rig.referee.run_match(make_assignment()).await;
    let result = match completion {
        MatchCompletion::Reported(result) => result,
        other => panic!("expected reported completion, got {other:?}"),
    };

    assert_eq!(result.winner, Some(PlayerId::new("player_a")));
    assert_eq!(result.points_for(&PlayerId::new("player_a")), 3);
    assert_eq!(result.points_for(&PlayerId::new("player_b")), 0);
    assert_eq!(result.detail.note.as_deref(), Some("technical_loss"));
    // No draw happens on a technical loss.
    assert_eq!(result.detail.drawn_value, None);
}

#[tokio::test(start_paused = true)]
async fn test_both_unresponsive_is_scoreless_draw() {
    let silent = vec![ChoiceReply::Silent, ChoiceReply::Silent, ChoiceReply::Silent];
    let rig = make_rig(
        ScriptedPlayer::scripted(PlayerId::new("player_a"), silent.clone(), "even"),
        ScriptedPlayer::scripted(PlayerId::new("player_b"), silent, "odd"),
    )
    .await;

    let completion = rig.referee.run_match(make_assignment()).await;
    let result = match completion {
        MatchCompletion::Reported(result) => result,
        other => panic!("expected reported completion, got {other:?}"),
    };

    assert_eq!(result.winner, None);
    assert_eq!(result.points_for(&PlayerId::new("player_a")), 0);
    assert_eq!(result.points_for(&PlayerId::new("player_b")), 0);
    assert_eq!(result.detail.note.as_deref(), Some("double_timeout"));
}

#[tokio::test]
async fn test_refused_invitation_abandons_without_report() {
    let rig = make_rig(
        ScriptedPlayer::answering(PlayerId::new("player_a"), "even"),
        ScriptedPlayer::refusing(PlayerId::new("player_b")),
    )
    .await;

    let completion = rig.referee.run_match(make_assignment()).await;
    assert_eq!(
        completion,
        MatchCompletion::Abandoned {
            a_joined: true,
            b_joined: false,
        }
    );
    assert!(rig.league.reports().is_empty());
}

#[tokio::test]
async fn test_unreachable_player_abandons_without_report() {
    let rig = make_rig(
        ScriptedPlayer::answering(PlayerId::new("player_a"), "even"),
        ScriptedPlayer::answering(PlayerId::new("player_b"), "odd"),
    )
    .await;
    // Player B vanishes before the invitation goes out.
    rig.network.disconnect(&Endpoint::new("mem://b"));

    let completion = rig.referee.run_match(make_assignment()).await;
    assert_eq!(
        completion,
        MatchCompletion::Abandoned {
            a_joined: true,
            b_joined: false,
        }
    );
    assert!(rig.league.reports().is_empty());
}

#[tokio::test]
async fn test_referee_accepts_new_matches_after_abandonment() {
    let rig = make_rig(
        ScriptedPlayer::answering(PlayerId::new("player_a"), "even"),
        ScriptedPlayer::refusing(PlayerId::new("player_b")),
    )
    .await;

    let completion = rig.referee.run_match(make_assignment()).await;
    assert!(matches!(completion, MatchCompletion::Abandoned { .. }));

    // Replace the refusing player and run the same match shape again.
    rig.network.register(
        Endpoint::new("mem://b"),
        Arc::new(ScriptedPlayer::answering(PlayerId::new("player_b"), "odd")),
    );
    let mut assignment = make_assignment();
    assignment.match_id = MatchId::new("match_2");

    let completion = rig.referee.run_match(assignment).await;
    assert!(matches!(completion, MatchCompletion::Reported(_)));
    assert_eq!(rig.league.reports().len(), 1);
}

#[tokio::test]
async fn test_assignment_envelope_spawns_match_and_acks() {
    let rig = make_rig(
        ScriptedPlayer::answering(PlayerId::new("player_a"), "even"),
        ScriptedPlayer::answering(PlayerId::new("player_b"), "odd"),
    )
    .await;
    let handler = RefereeHandler(rig.referee.clone());

    let assignment = Message::new(
        Sender::LeagueManager,
        Body::MatchAssignment(make_assignment()),
    );
    let envelope = parity_core::wrap_request(assignment.to_value().unwrap(), 5.into());
    let response = handler.handle(envelope).await;

    let reply = Message::from_value(unwrap_payload(&response)).unwrap();
    let ack = match reply.body {
        Body::MatchAssignmentAck(ack) => ack,
        other => panic!("expected assignment ack, got {}", other.message_type()),
    };
    assert_eq!(ack.match_id, MatchId::new("match_1"));
    assert_eq!(ack.status, "accepted");
    assert_eq!(response.id, Some(5.into()));

    // The spawned match runs without timers; let it drain.
    for _ in 0..100 {
        if !rig.league.reports().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(rig.league.reports().len(), 1);
}

#[tokio::test]
async fn test_registration_stores_identity_and_audits_the_exchange() {
    let network = InMemoryNetwork::new();
    let league = Arc::new(FakeLeague::default());
    network.register(Endpoint::new("mem://league"), league);

    let audit = RecordingSink::new();
    let referee = Referee::new(
        network,
        audit.clone(),
        Endpoint::new("mem://league"),
        Endpoint::new("mem://referee"),
        "Referee Beta",
    );
    assert_eq!(referee.referee_id(), None);

    let id = referee.register().await.unwrap();
    assert_eq!(id, RefereeId::new("ref_1"));
    assert_eq!(referee.referee_id(), Some(RefereeId::new("ref_1")));

    // The audit hook fired for the outbound request and the inbound reply.
    let directions: Vec<AuditDirection> =
        audit.snapshot().iter().map(|(direction, _)| *direction).collect();
    assert_eq!(
        directions,
        vec![AuditDirection::Outbound, AuditDirection::Inbound]
    );
}
