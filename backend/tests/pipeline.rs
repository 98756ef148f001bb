mod common;

use common::*;
use fluidgas_backend::{
    extractor::ExtractionError,
    pipeline::{FailureKind, PipelineFault, PipelineOutcome, UNSUPPORTED_ROUTE_MESSAGE},
    BridgeParameters, DomainFailure,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::atomic::Ordering;

fn prepared(outcome: PipelineOutcome) -> BridgeParameters {
    match outcome {
        PipelineOutcome::Prepared(params) => params,
        PipelineOutcome::Rejected(failure) => panic!("unexpected rejection: {:?}", failure),
    }
}

fn rejected(outcome: PipelineOutcome) -> DomainFailure {
    match outcome {
        PipelineOutcome::Rejected(failure) => failure,
        PipelineOutcome::Prepared(params) => panic!("unexpected success: {:?}", params),
    }
}

#[tokio::test]
async fn test_bridges_test_token_without_gas() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "TestUSDC",
        "amount": 50,
        "destinationAddress": RECIPIENT,
        "requestDestinationGas": false,
        "sourceChain": "Sepolia",
        "destinationChain": "Solana"
    })));

    let params = prepared(
        h.pipeline
            .prepare("Send 50 TestUSDC to my Solana wallet", SENDER)
            .await
            .unwrap(),
    );

    assert_eq!(params.token_address, TEST_USDC);
    assert_eq!(params.normalized_amount, "50000000");
    assert_eq!(params.recipient_address, RECIPIENT);
    assert!(params.needs_approval);
    assert_eq!(params.approve_to_address.as_deref(), Some(SEPOLIA_TOKEN_BRIDGE));
    assert!(params.native_gas_amount_for_display.is_none());
    assert_eq!(h.connector.connects(), 1);
}

#[tokio::test]
async fn test_bridges_with_default_destination_gas() {
    // Gas requested without an amount; the model also spells the symbol in lowercase.
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "usdc",
        "amount": "0.1",
        "destinationAddress": RECIPIENT,
        "requestDestinationGas": "yes"
    })));

    let params = prepared(
        h.pipeline
            .prepare("bridge 0.1 usdc and give me some SOL for gas", SENDER)
            .await
            .unwrap(),
    );

    assert_eq!(params.token_address, USDC);
    assert_eq!(params.normalized_amount, "100000");
    assert_eq!(params.native_gas_amount_for_display, Some(Decimal::new(1, 2)));

    let fees = params.estimated_fees.as_ref().expect("relayer fee configured");
    assert_eq!(fees["sourceAmount"], "0.1");
    assert_eq!(fees["destinationAmount"], "0.09");
    assert_eq!(fees["destinationNativeGas"], "0.01");

    let body = serde_json::to_value(&params).unwrap();
    assert_eq!(body["nativeGasAmountForDisplay"], json!(0.01));
}

#[tokio::test]
async fn test_missing_destination_short_circuits() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "TestUSDC",
        "amount": 10,
        "destinationAddress": null,
        "requestDestinationGas": false,
        "error": "Missing destination address."
    })));

    let failure = rejected(h.pipeline.prepare("send 10 TestUSDC", SENDER).await.unwrap());

    assert_eq!(failure.kind, FailureKind::MissingInformation);
    assert_eq!(
        failure.error,
        "Missing critical information in your request (token, amount, or destination address)."
    );
    let details = failure.details.unwrap();
    assert_eq!(details["tokenSymbolOrAddress"], "TestUSDC");
    assert!(details["destinationAddress"].is_null());
    assert_eq!(details["error"], "Missing destination address.");
    assert_eq!(h.connector.connects(), 0);
}

#[tokio::test]
async fn test_unsupported_route_never_touches_sdk() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "DOGE",
        "amount": 5,
        "destinationAddress": RECIPIENT,
        "sourceChain": "Ethereum",
        "destinationChain": "Solana"
    })));

    let failure = rejected(h.pipeline.prepare("move 5 DOGE from mainnet", SENDER).await.unwrap());

    assert_eq!(failure.kind, FailureKind::UnsupportedRoute);
    assert_eq!(failure.error, UNSUPPORTED_ROUTE_MESSAGE);
    // DOGE is unknown too, but the route check runs first.
    assert_eq!(h.connector.connects(), 0);
    assert!(!h.pipeline.assembler().handle().is_initialized());
}

#[tokio::test]
async fn test_unreachable_model_is_a_fault() {
    let h = harness(ScriptedLlm::new(Script::Down));

    let fault = h.pipeline.prepare("send 1 USDC", SENDER).await.unwrap_err();

    assert!(matches!(
        fault,
        PipelineFault::Extraction(ExtractionError::Unreachable(_))
    ));
    assert_eq!(h.llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.connector.connects(), 0);
}

#[tokio::test]
async fn test_unintelligible_replies() {
    for script in [Script::Empty, Script::Reply("the user wants tokens".to_string())] {
        let h = harness(ScriptedLlm::new(script));
        let failure = rejected(h.pipeline.prepare("???", SENDER).await.unwrap());
        assert_eq!(failure.kind, FailureKind::Unintelligible);
        assert_eq!(failure.error, "Could not understand your request. Please try again.");
    }
}

#[tokio::test]
async fn test_unknown_token() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "DOGE",
        "amount": 5,
        "destinationAddress": RECIPIENT
    })));

    let failure = rejected(h.pipeline.prepare("send 5 DOGE", SENDER).await.unwrap());
    assert_eq!(failure.kind, FailureKind::UnknownToken);
    assert!(failure.error.starts_with("Token error: "));
    assert!(failure.error.contains("DOGE"));
}

#[tokio::test]
async fn test_unregistered_address_uses_fallback_decimals() {
    let token = "0x3333333333333333333333333333333333333333";
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": token,
        "amount": 2,
        "destinationAddress": RECIPIENT
    })));

    let params = prepared(h.pipeline.prepare("send 2 of 0x3333…", SENDER).await.unwrap());
    assert_eq!(params.token_address, token);
    assert_eq!(params.normalized_amount, "2000000");
}

#[tokio::test]
async fn test_invalid_amounts() {
    for amount in [json!(0), json!(-3), json!("0.0000001")] {
        let h = harness(ScriptedLlm::reply(json!({
            "tokenSymbolOrAddress": "TestUSDC",
            "amount": amount,
            "destinationAddress": RECIPIENT
        })));
        let failure = rejected(h.pipeline.prepare("send", SENDER).await.unwrap());
        assert_eq!(failure.kind, FailureKind::InvalidAmount, "{}", amount);
        assert_eq!(h.connector.connects(), 0);
    }
}

#[tokio::test]
async fn test_out_of_range_amount_is_invalid_amount() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "TestUSDC",
        "amount": 1e30,
        "destinationAddress": RECIPIENT
    })));

    let failure = rejected(h.pipeline.prepare("send a lot of TestUSDC", SENDER).await.unwrap());
    assert_eq!(failure.kind, FailureKind::InvalidAmount);
    assert!(failure.error.starts_with("Invalid amount: "));
    assert!(!failure.details.unwrap()["amount"].is_null());
    assert_eq!(h.connector.connects(), 0);
}

#[tokio::test]
async fn test_invalid_gas_amounts() {
    let cases = [json!("lots"), json!("0.0000000001"), json!(-1)];
    for gas in cases {
        let h = harness(ScriptedLlm::reply(json!({
            "tokenSymbolOrAddress": "TestUSDC",
            "amount": 1,
            "destinationAddress": RECIPIENT,
            "requestDestinationGas": true,
            "destinationGasAmount": gas
        })));
        let failure = rejected(h.pipeline.prepare("send with gas", SENDER).await.unwrap());
        assert_eq!(failure.kind, FailureKind::InvalidGasAmount, "{}", gas);
        assert!(failure.details.is_some());
    }
}

#[tokio::test]
async fn test_invalid_recipient_address() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "TestUSDC",
        "amount": 1,
        "destinationAddress": "0x2222222222222222222222222222222222222222"
    })));

    let failure = rejected(h.pipeline.prepare("send 1 TestUSDC", SENDER).await.unwrap());
    assert_eq!(failure.kind, FailureKind::InvalidAddress);
    assert!(failure.error.contains("recipient"));
}

#[tokio::test]
async fn test_model_diagnostic_with_complete_fields_proceeds() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "TestUSDC",
        "amount": 3,
        "destinationAddress": RECIPIENT,
        "error": "Assumed Sepolia as the source chain."
    })));

    let params = prepared(h.pipeline.prepare("send 3 TestUSDC", SENDER).await.unwrap());
    assert_eq!(params.normalized_amount, "3000000");
}

#[tokio::test]
async fn test_bridge_init_failure_is_retried_on_next_request() {
    let reply = json!({
        "tokenSymbolOrAddress": "TestUSDC",
        "amount": 1,
        "destinationAddress": RECIPIENT
    });
    let h = harness_with(
        ScriptedLlm::reply(reply),
        CountingConnector::new(bridge_config(None), 1),
    );

    let failure = rejected(h.pipeline.prepare("send 1 TestUSDC", SENDER).await.unwrap());
    assert_eq!(failure.kind, FailureKind::BridgeInitFailure);
    assert!(!h.pipeline.assembler().handle().is_initialized());

    let params = prepared(h.pipeline.prepare("send 1 TestUSDC", SENDER).await.unwrap());
    assert_eq!(params.normalized_amount, "1000000");
    // Quote unavailable without a relayer fee; the parameters still come back.
    assert!(params.estimated_fees.is_none());

    prepared(h.pipeline.prepare("send 1 TestUSDC", SENDER).await.unwrap());
    assert_eq!(h.connector.connects(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_sdk() {
    let h = harness(ScriptedLlm::reply(json!({
        "tokenSymbolOrAddress": "TestUSDC",
        "amount": 1,
        "destinationAddress": RECIPIENT
    })));

    let tasks: Vec<_> = (0..12)
        .map(|_| {
            let pipeline = h.pipeline.clone();
            tokio::spawn(async move { pipeline.prepare("send 1 TestUSDC", SENDER).await })
        })
        .collect();

    for task in tasks {
        prepared(task.await.unwrap().unwrap());
    }
    assert_eq!(h.connector.connects(), 1);
}
