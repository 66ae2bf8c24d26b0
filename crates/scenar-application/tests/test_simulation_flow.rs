mod common;

use common::{NEGOTIATION_SCENARIO, ReplayOracle, context, reply};
use scenar_application::MessageOutcome;
use scenar_core::error::ScenarError;
use scenar_core::oracle::OracleError;
use scenar_core::session::SimulationPhase;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_negotiation_flow_end_to_end() {
    let dir = TempDir::new().unwrap();
    let context = context(&dir).await;
    let oracle = ReplayOracle::new([
        NEGOTIATION_SCENARIO.to_string(),
        reply("Both delegations arrive."),
        reply("A draft is tabled."),
    ]);
    let service = context.simulation_service_with(oracle.clone());
    let id = service.open_session(None).await.unwrap();

    let routed = service
        .handle_message(&id, "/negotiation We need a ceasefire by Friday")
        .await
        .unwrap();
    let MessageOutcome::Routed(decision) = routed else {
        panic!("expected a routing decision");
    };
    assert_eq!(decision.heuristic, "negotiation");
    assert_eq!(
        decision.parsed_scenario.parameters["heuristic"],
        Value::from("negotiation")
    );
    assert!(
        decision
            .display_format
            .starts_with("=== Scenario Summary ===\n\nGoal: ")
    );
    assert_eq!(oracle.calls(), 1, "shortcode must skip the classifier");

    let first = service.confirm_and_initialize(&id).await.unwrap();
    assert_eq!(first.narrative, "Both delegations arrive.");
    assert_eq!(first.available_actions, vec!["evolve 1", "evolve 2"]);

    let next = service.handle_message(&id, "evolve 1").await.unwrap();
    assert!(matches!(next, MessageOutcome::Reply(r) if r.narrative == "A draft is tabled."));

    // Replayed context: seed pair plus the new turn.
    assert_eq!(oracle.request(2).len(), 3);
    assert_eq!(service.history(&id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_low_confidence_without_shortcode_is_rejected() {
    let dir = TempDir::new().unwrap();
    let context = context(&dir).await;
    let oracle = ReplayOracle::new([
        r#"{"heuristic": "negotiation", "confidence": 0.65, "reasoning": "maybe"}"#,
    ]);
    let service = context.simulation_service_with(oracle.clone());
    let id = service.open_session(None).await.unwrap();

    let err = service
        .route_scenario(&id, "Something about the weather")
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarError::NoHeuristicMatched));
    assert!(err.is_retryable_input());
    assert_eq!(oracle.calls(), 1);
    assert_eq!(service.phase(&id).await.unwrap(), SimulationPhase::AwaitingScenario);
}

#[tokio::test]
async fn test_cancel_then_next_message_is_a_fresh_scenario() {
    let dir = TempDir::new().unwrap();
    let context = context(&dir).await;
    let oracle = ReplayOracle::new([
        NEGOTIATION_SCENARIO.to_string(),
        NEGOTIATION_SCENARIO.to_string(),
        reply("Opening positions."),
    ]);
    let service = context.simulation_service_with(oracle.clone());
    let id = service.open_session(None).await.unwrap();

    service.route_scenario(&id, "/negotiation first try").await.unwrap();
    let cancelled = service.cancel(&id).await.unwrap().unwrap();
    assert_eq!(cancelled.original_prompt, "/negotiation first try");

    let stored = context.sessions.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.phase, SimulationPhase::AwaitingScenario);
    assert!(!stored.conversation.first_message_processed());

    let outcome = service
        .handle_message(&id, "/negotiation second try")
        .await
        .unwrap();
    assert!(matches!(outcome, MessageOutcome::Routed(_)));
    service.confirm_and_initialize(&id).await.unwrap();
    assert_eq!(service.history(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_session_resumes_active_from_disk() {
    let dir = TempDir::new().unwrap();
    let id = {
        let context = context(&dir).await;
        let oracle = ReplayOracle::new([
            NEGOTIATION_SCENARIO.to_string(),
            reply("Both delegations arrive."),
        ]);
        let service = context.simulation_service_with(oracle);
        let id = service.open_session(Some("resume-me".into())).await.unwrap();
        service.route_scenario(&id, "/negotiation ceasefire").await.unwrap();
        service.confirm_and_initialize(&id).await.unwrap();
        id
    };

    let context = context(&dir).await;
    let oracle = ReplayOracle::new([reply("Talks resume.")]);
    let service = context.simulation_service_with(oracle.clone());

    let phase = service.resume_session(&id).await.unwrap();
    assert_eq!(phase.name(), "active");
    assert_eq!(phase.decision().unwrap().heuristic, "negotiation");
    assert_eq!(service.history(&id).await.unwrap().len(), 2);

    let reply = service.send_turn(&id, "evolve 2").await.unwrap();
    assert_eq!(reply.narrative, "Talks resume.");
    assert_eq!(oracle.request(0).len(), 3);
    assert_eq!(
        context.sessions.find_by_id(&id).await.unwrap().unwrap().conversation.len(),
        4
    );
}

#[tokio::test]
async fn test_unknown_heuristic_in_stored_decision() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("config")).unwrap();
    std::fs::write(
        dir.path().join("config/heuristics.toml"),
        r#"
[[heuristic]]
id = "negotiation"
description = "Strategic negotiation"
prompt = "Find the zone of agreement."
"#,
    )
    .unwrap();

    let context = context(&dir).await;
    let oracle = ReplayOracle::new([NEGOTIATION_SCENARIO]);
    let service = context.simulation_service_with(oracle);
    let id = service.open_session(None).await.unwrap();
    service.route_scenario(&id, "/negotiation ceasefire").await.unwrap();

    std::fs::write(
        dir.path().join("config/heuristics.toml"),
        r#"
[[heuristic]]
id = "trade"
description = "Tariffs"
prompt = "Model the trade flows."
"#,
    )
    .unwrap();
    service.reload_catalog().await.unwrap();

    let err = service.confirm_and_initialize(&id).await.unwrap_err();
    assert!(matches!(err, ScenarError::UnknownHeuristic { ref id } if id == "negotiation"));
    assert_eq!(service.phase(&id).await.unwrap().name(), "awaiting_confirmation");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_turns_of_one_session_never_overlap() {
    let dir = TempDir::new().unwrap();
    let context = context(&dir).await;
    let oracle = ReplayOracle::delayed(
        [
            NEGOTIATION_SCENARIO.to_string(),
            reply("one"),
            reply("two"),
            reply("three"),
        ],
        Duration::from_millis(30),
    );
    let service = Arc::new(context.simulation_service_with(oracle.clone()));
    let id = service.open_session(None).await.unwrap();
    service.route_scenario(&id, "/negotiation ceasefire").await.unwrap();
    service.confirm_and_initialize(&id).await.unwrap();

    let a = tokio::spawn({
        let (service, id) = (service.clone(), id.clone());
        async move { service.send_turn(&id, "evolve 1").await }
    });
    let b = tokio::spawn({
        let (service, id) = (service.clone(), id.clone());
        async move { service.send_turn(&id, "evolve 2").await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(oracle.max_in_flight(), 1);
    assert_eq!(service.history(&id).await.unwrap().len(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_sessions_run_in_parallel() {
    let dir = TempDir::new().unwrap();
    let context = context(&dir).await;
    let oracle = ReplayOracle::delayed(
        [NEGOTIATION_SCENARIO, NEGOTIATION_SCENARIO],
        Duration::from_millis(100),
    );
    let service = Arc::new(context.simulation_service_with(oracle.clone()));
    let first = service.open_session(None).await.unwrap();
    let second = service.open_session(None).await.unwrap();

    let (a, b) = tokio::join!(
        service.route_scenario(&first, "/negotiation a"),
        service.route_scenario(&second, "/negotiation b"),
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(oracle.max_in_flight(), 2);
}

#[tokio::test]
async fn test_close_session_cancels_in_flight_call() {
    let dir = TempDir::new().unwrap();
    let context = context(&dir).await;
    let oracle = ReplayOracle::hanging();
    let service = Arc::new(context.simulation_service_with(oracle.clone()));
    let id = service.open_session(None).await.unwrap();

    let pending = tokio::spawn({
        let (service, id) = (service.clone(), id.clone());
        async move { service.route_scenario(&id, "/negotiation ceasefire").await }
    });
    oracle.started.notified().await;
    assert!(service.close_session(&id).await);

    let err = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("cancelled call must return")
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, ScenarError::Oracle(OracleError::Cancelled)));

    // Nothing was saved by the cancelled call.
    let phase = service.resume_session(&id).await.unwrap();
    assert_eq!(phase, SimulationPhase::AwaitingScenario);
}
