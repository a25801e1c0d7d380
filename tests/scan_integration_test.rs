use serde_json::{Value, json};
use solana_amount_scanner::{RetryPolicy, ScannerConfigBuilder, TransactionScanner, logging};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const SOL: u64 = 1_000_000_000;
const TEST_SIGNATURE: &str =
    "5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7";
const SENDER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
const RECEIVER: &str = "HN7cABqLq46Es1jh92dQQisAq662SmxELLLsHHe4YWrH";
const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

fn envelope(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": 1
    }))
}

fn first_param(request: &Request) -> Option<u64> {
    request
        .body_json::<Value>()
        .ok()
        .and_then(|body| body["params"][0].as_u64())
}

fn transfer_tx(signature: &str, amount: u64, fee: u64) -> Value {
    json!({
        "transaction": {
            "signatures": [signature],
            "message": {
                "accountKeys": [SENDER, RECEIVER, SYSTEM_PROGRAM],
                "header": {
                    "numRequiredSignatures": 1,
                    "numReadonlySignedAccounts": 0,
                    "numReadonlyUnsignedAccounts": 1
                },
                "instructions": [],
                "recentBlockhash": "EETubP5AKHgjPAhzPAFcb8BAY1hMH639CWCFTqi3hq1k"
            }
        },
        "meta": {
            "err": null,
            "status": { "Ok": null },
            "fee": fee,
            "preBalances": [20 * SOL, SOL, 1],
            "postBalances": [20 * SOL - amount - fee, SOL + amount, 1],
            "innerInstructions": [],
            "logMessages": [],
            "preTokenBalances": [],
            "postTokenBalances": []
        },
        "version": "legacy"
    })
}

/// Latest slot 1000, window [998, 999, 1000], one 1.5 SOL transfer in 999.
async fn setup_chain(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getSlot" })))
        .respond_with(envelope(json!(1000)))
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getBlocks" })))
        .respond_with(envelope(json!([998, 999, 1000])))
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getBlockTime" })))
        .respond_with(|request: &Request| match first_param(request) {
            Some(slot) => envelope(json!(1_700_000_000 + slot)),
            None => envelope(Value::Null),
        })
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getBlock" })))
        .respond_with(|request: &Request| match first_param(request) {
            Some(999) => envelope(json!({
                "blockhash": "EETubP5AKHgjPAhzPAFcb8BAY1hMH639CWCFTqi3hq1k",
                "previousBlockhash": "11111111111111111111111111111111",
                "parentSlot": 998,
                "blockHeight": 900,
                "blockTime": 1_700_000_999,
                "transactions": [
                    transfer_tx(TEST_SIGNATURE, 1_500_000_000, 5000),
                    transfer_tx("SmallTransferSig", 300_000, 5000),
                ]
            })),
            Some(_) => envelope(json!({ "transactions": [] })),
            None => envelope(Value::Null),
        })
        .mount(mock_server)
        .await;
}

fn scanner_for(mock_server: &MockServer) -> TransactionScanner {
    let config = ScannerConfigBuilder::new()
        .with_rpc(mock_server.uri())
        .with_min_amount(0.001)
        .with_retry_policy(RetryPolicy::none())
        .build()
        .unwrap();
    TransactionScanner::new(config, logging::noop())
}

#[tokio::test]
async fn test_scan_finds_transfer_over_http() {
    let mock_server = MockServer::start().await;
    setup_chain(&mock_server).await;

    let scanner = scanner_for(&mock_server);
    assert_eq!(scanner.connect().await, Some(1000));

    let matches = scanner.scan(1.5, 3, 0.01).await.unwrap();

    assert_eq!(matches.len(), 1);
    let found = &matches[0];
    assert_eq!(found.tx_hash, TEST_SIGNATURE);
    assert_eq!(found.slot, 999);
    assert_eq!(found.block_time, 1_700_000_999);
    assert_eq!(found.sender.as_deref(), Some(SENDER));
    assert_eq!(found.receiver.as_deref(), Some(RECEIVER));
    assert!((found.amount - 1.500005).abs() < 1e-9);
    assert_eq!(found.fee, 0.000005);
    assert_eq!(found.balance_changes.len(), 2);
}

#[tokio::test]
async fn test_scan_detailed_counts_work_done() {
    let mock_server = MockServer::start().await;
    setup_chain(&mock_server).await;

    let report = scanner_for(&mock_server)
        .scan_detailed(1.5, 3, 0.01)
        .await
        .unwrap();

    assert_eq!(report.blocks_scanned, 3);
    assert_eq!(report.transactions_seen, 2);
    assert_eq!(report.matches.len(), 1);
    // The 0.0003 SOL transfer is under the minimum amount.
    assert_eq!(report.skipped.no_significant_change, 1);
}

#[tokio::test]
async fn test_no_match_outside_tolerance() {
    let mock_server = MockServer::start().await;
    setup_chain(&mock_server).await;

    let matches = scanner_for(&mock_server).scan(3.0, 3, 0.5).await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_empty_window_returns_no_matches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getSlot" })))
        .respond_with(envelope(json!(42)))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getBlocks" })))
        .respond_with(envelope(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getBlock" })))
        .respond_with(envelope(Value::Null))
        .expect(0)
        .mount(&mock_server)
        .await;

    let matches = scanner_for(&mock_server).scan(1.0, 10, 0.1).await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_server_errors_are_retried_then_given_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getSlot" })))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ScannerConfigBuilder::new()
        .with_rpc(mock_server.uri())
        .with_retry_policy(RetryPolicy::none())
        .build()
        .unwrap();
    let scanner = TransactionScanner::new(config, logging::noop());

    // getSlot never succeeds, so getBlocks is never asked.
    let matches = scanner.scan(1.0, 5, 0.1).await.unwrap();
    assert!(matches.is_empty());
}
