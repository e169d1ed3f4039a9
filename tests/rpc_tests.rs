use mockito::Matcher;
use serde_json::json;

use liquidity_watch::config::RpcConfig;
use liquidity_watch::error::RpcError;
use liquidity_watch::poller::fetch_balances;
use liquidity_watch::pool::{AccountReader, PoolAccountRef, PoolAccounts, RpcBalanceReader};
use liquidity_watch::PollError;

const YES: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
const NO: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const LP: &str = "So11111111111111111111111111111111111111112";

fn reader_for(server: &mockito::ServerGuard) -> RpcBalanceReader {
    RpcBalanceReader::new(&RpcConfig {
        url: server.url(),
        ..RpcConfig::default()
    })
    .unwrap()
}

fn balance_body(amount: &str, decimals: u8, ui: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "context": { "slot": 250_000_000u64 },
            "value": {
                "amount": amount,
                "decimals": decimals,
                "uiAmount": ui.parse::<f64>().unwrap(),
                "uiAmountString": ui
            }
        },
        "id": 1
    })
    .to_string()
}

fn balance_request(address: &str) -> Matcher {
    Matcher::PartialJson(json!({
        "jsonrpc": "2.0",
        "method": "getTokenAccountBalance",
        "params": [address, { "commitment": "confirmed" }]
    }))
}

#[tokio::test]
async fn test_rpc_reader_fetches_balance() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(balance_request(YES))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(balance_body("1500250000", 6, "1500.25"))
        .create_async()
        .await;

    let reader = reader_for(&server);
    let account: PoolAccountRef = YES.parse().unwrap();
    let amount = reader.get_token_account_balance(&account).await.unwrap();

    assert_eq!(amount.amount, "1500250000");
    assert_eq!(amount.ui_amount_string.as_deref(), Some("1500.25"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rpc_reader_builds_with_configured_timeout() {
    let reader = RpcBalanceReader::new(&RpcConfig {
        url: "http://127.0.0.1:8899".to_string(),
        timeout_ms: 250,
        ..RpcConfig::default()
    });
    assert_eq!(reader.unwrap().url(), "http://127.0.0.1:8899");
}

#[tokio::test]
async fn test_rpc_reader_surfaces_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(balance_request(YES))
        .with_status(200)
        .with_body(r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid param: not a Token account"},"id":1}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(balance_request(NO))
        .with_status(429)
        .with_body("Too many requests")
        .create_async()
        .await;

    let reader = reader_for(&server);

    match reader.fetch_balance(&YES.parse().unwrap()).await {
        Err(RpcError::Rpc { code, .. }) => assert_eq!(code, -32602),
        other => panic!("Expected RPC error, got {:?}", other),
    }
    match reader.fetch_balance(&NO.parse().unwrap()).await {
        Err(RpcError::Status(status)) => assert_eq!(status.as_u16(), 429),
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_balances_over_rpc() {
    let mut server = mockito::Server::new_async().await;
    for (address, amount, ui) in [
        (YES, "125000000000", "125000"),
        (NO, "98500500000", "98500.5"),
        (LP, "110250000000", "110250"),
    ] {
        server
            .mock("POST", "/")
            .match_body(balance_request(address))
            .with_status(200)
            .with_body(balance_body(amount, 6, ui))
            .create_async()
            .await;
    }

    let reader = reader_for(&server);
    let accounts = PoolAccounts::new(YES.parse().unwrap(), NO.parse().unwrap(), LP.parse().unwrap());
    let [a, b, lp] = fetch_balances(&reader, &accounts).await.unwrap();

    assert_eq!(a.ui_amount_string.as_deref(), Some("125000"));
    assert_eq!(b.ui_amount_string.as_deref(), Some("98500.5"));
    assert_eq!(lp.ui_amount_string.as_deref(), Some("110250"));
}

#[tokio::test]
async fn test_fetch_balances_fails_as_a_whole() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(balance_request(YES))
        .with_status(200)
        .with_body(balance_body("1", 0, "1"))
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(balance_request(LP))
        .with_status(200)
        .with_body(balance_body("1", 0, "1"))
        .create_async()
        .await;
    // NO account is down
    server
        .mock("POST", "/")
        .match_body(balance_request(NO))
        .with_status(502)
        .create_async()
        .await;

    let reader = reader_for(&server);
    let accounts = PoolAccounts::new(YES.parse().unwrap(), NO.parse().unwrap(), LP.parse().unwrap());

    match fetch_balances(&reader, &accounts).await {
        Err(PollError::LookupFailure { account, .. }) => assert_eq!(account.as_str(), NO),
        other => panic!("Expected lookup failure, got {:?}", other.map(|_| ())),
    }
}
