// View controller behavior: transitions, stale-reply discard, cancellation.
//
// All replies are released by hand through the scripted executor, so
// arrival order is controlled by each test rather than by timing.

mod common;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::{prediction_json, scripted, scripted_ignoring_cancel, top_body};
use meme_market::api::endpoints;
use meme_market::api::models::{MemeAnalysisRequest, Prediction};
use meme_market::api::request::RequestDescriptor;
use meme_market::api::traits::{FetchExecutor, FetchFailure, FetchOutcome};
use meme_market::view::controller::ViewController;
use meme_market::view::state::ViewState;

fn ids(state: &ViewState<Vec<Prediction>>) -> Vec<String> {
    state
        .data()
        .map(|ps| ps.iter().map(|p| p.id.clone()).collect())
        .unwrap_or_default()
}

// ============================================================
// Basic transitions
// ============================================================

#[tokio::test]
async fn starts_idle_with_generation_zero() {
    let (executor, _pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);
    assert!(controller.state().is_idle());
    assert_eq!(controller.generation(), 0);
}

#[tokio::test]
async fn trigger_moves_to_loading_immediately() {
    let (executor, _pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);
    let handle = controller.trigger(endpoints::top_predictions(10));
    assert_eq!(handle.generation(), 1);
    assert!(controller.state().is_loading());
}

#[tokio::test]
async fn top_predictions_success_holds_exact_list() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let handle = controller.trigger(endpoints::top_predictions(10));
    let req = pending.recv().await.unwrap();
    assert_eq!(req.request.to_string(), "GET /predictions/top?limit=10");
    req.respond_json(top_body(&["a1", "b2", "c3"]));

    assert!(handle.settled().await);
    assert_eq!(ids(&controller.state()), vec!["a1", "b2", "c3"]);
}

#[tokio::test]
async fn http_500_becomes_failure() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let handle = controller.trigger(endpoints::top_predictions(10));
    pending
        .recv()
        .await
        .unwrap()
        .fail(FetchFailure::NonSuccessStatus(500));

    assert!(handle.settled().await);
    assert_eq!(
        controller.state(),
        ViewState::Failure {
            reason: FetchFailure::NonSuccessStatus(500)
        }
    );
}

#[tokio::test]
async fn success_false_becomes_application_rejected() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_analysis);

    let descriptor = endpoints::analyze_meme(&MemeAnalysisRequest::new("cat vibing")).unwrap();
    let handle = controller.trigger(descriptor);
    pending
        .recv()
        .await
        .unwrap()
        .respond_json(json!({"success": false, "message": "API key missing"}));

    assert!(handle.settled().await);
    let state = controller.state();
    assert_eq!(
        state.failure(),
        Some(&FetchFailure::ApplicationRejected("API key missing".to_string()))
    );
    assert_eq!(state.message().as_deref(), Some("API key missing"));
}

#[tokio::test]
async fn schema_mismatch_becomes_malformed_body() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let handle = controller.trigger(endpoints::top_predictions(10));
    let mut broken = prediction_json("x", 50.0);
    broken.as_object_mut().unwrap().remove("virality_score");
    pending
        .recv()
        .await
        .unwrap()
        .respond_json(json!({"predictions": [broken]}));

    handle.settled().await;
    assert!(matches!(
        controller.state(),
        ViewState::Failure {
            reason: FetchFailure::MalformedBody(_)
        }
    ));
}

#[tokio::test]
async fn failure_is_recovered_by_triggering_again() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let first = controller.trigger(endpoints::top_predictions(10));
    pending
        .recv()
        .await
        .unwrap()
        .fail(FetchFailure::NetworkUnreachable("connection refused".to_string()));
    first.settled().await;
    assert!(controller.state().failure().is_some());

    let retry = controller.trigger(endpoints::top_predictions(10));
    assert!(controller.state().is_loading());
    pending.recv().await.unwrap().respond_json(top_body(&["ok"]));
    retry.settled().await;
    assert_eq!(ids(&controller.state()), vec!["ok"]);
}

// ============================================================
// Last trigger wins
// ============================================================

#[tokio::test]
async fn identical_triggers_later_reply_wins_even_when_it_arrives_first() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let first = controller.trigger(endpoints::top_predictions(10));
    let first_req = pending.recv().await.unwrap();
    let second = controller.trigger(endpoints::top_predictions(10));
    let second_req = pending.recv().await.unwrap();
    assert_eq!(first_req.request, second_req.request);

    second_req.respond_json(top_body(&["newer"]));
    assert!(second.settled().await);

    first_req.respond_json(top_body(&["older"]));
    assert!(!first.settled().await);

    assert_eq!(ids(&controller.state()), vec!["newer"]);
    assert_eq!(controller.generation(), 2);
}

#[tokio::test]
async fn stale_reply_arriving_first_does_not_leave_loading() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let first = controller.trigger(endpoints::top_predictions(5));
    let first_req = pending.recv().await.unwrap();
    let second = controller.trigger(endpoints::top_predictions(10));
    let second_req = pending.recv().await.unwrap();

    // Old reply lands while the newer request is still out
    first_req.respond_json(top_body(&["older"]));
    assert!(!first.settled().await);
    assert!(controller.state().is_loading());

    second_req.respond_json(top_body(&["newer"]));
    assert!(second.settled().await);
    assert_eq!(ids(&controller.state()), vec!["newer"]);
}

#[tokio::test]
async fn stale_failure_cannot_overwrite_newer_success() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let first = controller.trigger(endpoints::top_predictions(10));
    let first_req = pending.recv().await.unwrap();
    let second = controller.trigger(endpoints::top_predictions(10));
    let second_req = pending.recv().await.unwrap();

    second_req.respond_json(top_body(&["fresh"]));
    second.settled().await;
    first_req.fail(FetchFailure::NonSuccessStatus(502));
    first.settled().await;

    assert_eq!(ids(&controller.state()), vec!["fresh"]);
}

#[tokio::test]
async fn many_triggers_replied_in_reverse_order_end_on_last() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let mut handles = Vec::new();
    let mut requests = Vec::new();
    for limit in 1..=5 {
        handles.push(controller.trigger(endpoints::top_predictions(limit)));
        requests.push(pending.recv().await.unwrap());
    }

    for (i, req) in requests.into_iter().enumerate().rev() {
        let id = format!("gen{}", i + 1);
        req.respond_json(top_body(&[id.as_str()]));
    }

    let applied: Vec<bool> = {
        let mut out = Vec::new();
        for h in handles {
            out.push(h.settled().await);
        }
        out
    };
    assert_eq!(applied, vec![false, false, false, false, true]);
    assert_eq!(ids(&controller.state()), vec!["gen5"]);
}

// ============================================================
// Cancellation and teardown
// ============================================================

#[tokio::test]
async fn cancel_before_completion_leaves_state_unchanged() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let handle = controller.trigger(endpoints::top_predictions(10));
    let req = pending.recv().await.unwrap();
    let before = controller.snapshot();

    controller.cancel();
    assert!(!handle.settled().await);
    assert_eq!(controller.snapshot(), before);

    // Reply after the fact goes nowhere
    req.respond_json(top_body(&["late"]));
    assert!(controller.state().is_loading());
}

#[tokio::test]
async fn cancel_is_honored_even_if_executor_ignores_token() {
    let (executor, mut pending) = scripted_ignoring_cancel();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let handle = controller.trigger(endpoints::top_predictions(10));
    let req = pending.recv().await.unwrap();
    controller.cancel();
    req.respond_json(top_body(&["late"]));

    assert!(!handle.settled().await);
    assert!(controller.state().is_loading());
}

#[tokio::test]
async fn cancel_with_nothing_in_flight_is_harmless() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    let handle = controller.trigger(endpoints::top_predictions(10));
    pending.recv().await.unwrap().respond_json(top_body(&["done"]));
    handle.settled().await;

    controller.cancel();
    assert_eq!(ids(&controller.state()), vec!["done"]);
}

#[tokio::test]
async fn teardown_ignores_further_triggers() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);

    controller.teardown();
    let handle = controller.trigger(endpoints::top_predictions(10));

    assert!(!handle.settled().await);
    assert!(controller.state().is_idle());
    assert!(pending.try_recv().is_err());
}

// ============================================================
// Subscribers
// ============================================================

#[tokio::test]
async fn subscribers_observe_loading_then_success() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);
    let mut updates = controller.subscribe();

    let handle = controller.trigger(endpoints::top_predictions(3));
    updates.changed().await.unwrap();
    assert!(updates.borrow_and_update().state.is_loading());

    pending.recv().await.unwrap().respond_json(top_body(&["seen"]));
    handle.settled().await;
    updates.changed().await.unwrap();
    let snap = updates.borrow_and_update().clone();
    assert_eq!(snap.generation, 1);
    assert_eq!(ids(&snap.state), vec!["seen"]);
}

#[tokio::test]
async fn clones_share_state() {
    let (executor, mut pending) = scripted();
    let controller = ViewController::new(executor, endpoints::decode_predictions);
    let other = controller.clone();

    let handle = other.trigger(endpoints::top_predictions(1));
    pending.recv().await.unwrap().respond_json(top_body(&["shared"]));
    handle.settled().await;

    assert_eq!(ids(&controller.state()), vec!["shared"]);
    assert_eq!(controller.generation(), other.generation());
}

// ============================================================
// Executor panics
// ============================================================

struct PanickingExecutor;

#[async_trait::async_trait]
impl FetchExecutor for PanickingExecutor {
    async fn execute(
        &self,
        _request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> FetchOutcome {
        panic!("executor blew up");
    }
}

#[tokio::test]
async fn panicked_request_settles_false_and_leaves_loading() {
    let controller = ViewController::new(
        std::sync::Arc::new(PanickingExecutor),
        endpoints::decode_predictions,
    );

    let handle = controller.trigger(endpoints::top_predictions(10));
    assert!(!handle.settled().await);
    assert!(controller.state().is_loading());
    assert_eq!(controller.generation(), 1);
}
