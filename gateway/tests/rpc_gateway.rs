//! End-to-end tests of the JSON-RPC gateway and provider against a mock node
//! served by axum on a loopback port.

use axum::{extract::State, routing::post, Json, Router};
use ballot_gateway::{
    ContractGateway, GatewayError, JsonRpcProvider, ProviderError, ReceiptPolicy, RpcClient,
    RpcGateway, WalletProvider,
};
use ballot_types::{Address, Candidate, ChainId, NetworkId};
use ethers_core::abi::{encode, Token};
use ethers_core::types::{H160, U256};
use ethers_core::utils::id;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Mock node
// ---------------------------------------------------------------------------

const ADMIN: &str = "0x00000000000000000000000000000000000000aa";
const VOTER: &str = "0x00000000000000000000000000000000000000bb";
const CONTRACT: &str = "0x8e7ab13e7703888fcd0953582bd633e66675f778";

fn tx_hash() -> String {
    format!("0x{}", "fe".repeat(32))
}

#[derive(Default)]
struct MockNode {
    /// Methods received, in order.
    calls: Mutex<Vec<String>>,
    /// Transaction objects passed to `eth_sendTransaction`.
    sent: Mutex<Vec<Value>>,
    /// Receipt status to report for sent transactions.
    revert: bool,
    /// Error message to return from `eth_sendTransaction`.
    send_error: Option<String>,
    /// Whether `eth_requestAccounts` is implemented.
    supports_request_accounts: bool,
}

fn returns(tokens: &[Token]) -> Value {
    json!(format!("0x{}", hex::encode(encode(tokens))))
}

fn eth_call_result(data: &str) -> Value {
    let data = data.trim_start_matches("0x");
    let (selector, args) = data.split_at(8);
    let is = |signature: &str| selector == hex::encode(id(signature));

    if is("admin()") {
        returns(&[Token::Address(H160::from_low_u64_be(0xaa))])
    } else if is("electionOpen()") {
        returns(&[Token::Bool(true)])
    } else if is("candidatesCount()") {
        returns(&[Token::Uint(U256::from(2))])
    } else if is("candidates(uint256)") {
        let id = U256::from_str_radix(args, 16).unwrap();
        let (name, votes) = if id == U256::one() { ("Alice", 3) } else { ("Bob", 0) };
        returns(&[
            Token::Uint(id),
            Token::String(name.into()),
            Token::Uint(U256::from(votes)),
        ])
    } else if is("authorizedVoters(address)") {
        returns(&[Token::Bool(true)])
    } else {
        returns(&[Token::Bool(false)])
    }
}

fn receipt(revert: bool) -> Value {
    json!({
        "transactionHash": tx_hash(),
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "ab".repeat(32)),
        "blockNumber": "0x2a",
        "from": VOTER,
        "to": CONTRACT,
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "status": if revert { "0x0" } else { "0x1" },
        "type": "0x0",
        "effectiveGasPrice": "0x1",
    })
}

async fn handle(State(node): State<Arc<MockNode>>, Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    let method = req["method"].as_str().unwrap_or_default().to_string();
    node.calls.lock().unwrap().push(method.clone());

    let outcome: Result<Value, (i64, String)> = match method.as_str() {
        "web3_clientVersion" => Ok(json!("MockNode/v1")),
        "eth_requestAccounts" if !node.supports_request_accounts => {
            Err((-32601, "the method eth_requestAccounts does not exist".into()))
        }
        "eth_requestAccounts" | "eth_accounts" => Ok(json!([VOTER.to_uppercase().replace("0X", "0x")])),
        "eth_chainId" => Ok(json!("0x539")),
        "net_version" => Ok(json!("5777")),
        "wallet_switchEthereumChain" => Err((4902, "Unrecognized chain ID".into())),
        "eth_call" => Ok(eth_call_result(req["params"][0]["data"].as_str().unwrap())),
        "eth_sendTransaction" => {
            node.sent.lock().unwrap().push(req["params"][0].clone());
            match &node.send_error {
                Some(message) => Err((-32000, message.clone())),
                None => Ok(json!(tx_hash())),
            }
        }
        "eth_getTransactionReceipt" => Ok(receipt(node.revert)),
        other => Err((-32601, format!("method {other} not found"))),
    };

    Json(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => {
            json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
        }
    })
}

async fn spawn_node(node: MockNode) -> (String, Arc<MockNode>) {
    let node = Arc::new(node);
    let app = Router::new().route("/", post(handle)).with_state(node.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), node)
}

fn gateway(url: &str) -> RpcGateway {
    RpcGateway::new(RpcClient::new(url).unwrap(), Address::parse(CONTRACT).unwrap())
        .with_receipt_policy(ReceiptPolicy {
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(2),
        })
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reads_decode_through_the_full_stack() {
    let (url, _node) = spawn_node(MockNode::default()).await;
    let gw = gateway(&url);
    let voter = Address::parse(VOTER).unwrap();

    assert_eq!(gw.admin().await.unwrap(), Address::parse(ADMIN).unwrap());
    assert!(gw.election_open().await.unwrap());
    assert_eq!(gw.candidates_count().await.unwrap(), 2);
    assert_eq!(gw.candidate(1).await.unwrap(), Candidate::new(1, "Alice", 3));
    assert_eq!(gw.candidate(2).await.unwrap(), Candidate::new(2, "Bob", 0));
    assert!(gw.is_authorized(&voter).await.unwrap());
    assert!(!gw.has_voted(&voter).await.unwrap());
}

#[tokio::test]
async fn write_waits_for_receipt() {
    let (url, node) = spawn_node(MockNode::default()).await;
    let gw = gateway(&url);

    let receipt = gw.vote(&Address::parse(VOTER).unwrap(), 2).await.unwrap();
    assert_eq!(receipt.transaction_hash, tx_hash());
    assert_eq!(receipt.block_number, Some(42));

    let calls = node.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["eth_sendTransaction", "eth_getTransactionReceipt"]);
}

#[tokio::test]
async fn sent_transaction_leaves_fees_and_nonce_to_the_wallet() {
    let (url, node) = spawn_node(MockNode::default()).await;
    gateway(&url)
        .add_candidate(&Address::parse(ADMIN).unwrap(), "Alice")
        .await
        .unwrap();

    let sent = node.sent.lock().unwrap()[0].clone();
    let mut fields: Vec<&str> = sent.as_object().unwrap().keys().map(String::as_str).collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["data", "from", "gas", "to"]);
    assert_eq!(sent["from"], ADMIN);
    assert_eq!(sent["to"], CONTRACT);
    assert_eq!(sent["gas"], "0x493e0");

    let data = sent["data"].as_str().unwrap().trim_start_matches("0x");
    assert_eq!(&data[..8], hex::encode(id("addCandidate(string)")));
}

#[tokio::test]
async fn reverted_receipt_is_reported() {
    let (url, _node) = spawn_node(MockNode {
        revert: true,
        ..Default::default()
    })
    .await;
    let err = gateway(&url)
        .toggle_election(&Address::parse(ADMIN).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Reverted { method: "toggleElection", .. }));
}

#[tokio::test]
async fn node_error_message_is_surfaced_verbatim() {
    let (url, _node) = spawn_node(MockNode {
        send_error: Some("execution reverted: Only admin can perform this action".into()),
        ..Default::default()
    })
    .await;
    let err = gateway(&url)
        .add_candidate(&Address::parse(VOTER).unwrap(), "Mallory")
        .await
        .unwrap_err();
    assert_eq!(
        err.message(),
        "execution reverted: Only admin can perform this action"
    );
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_falls_back_to_eth_accounts() {
    let (url, node) = spawn_node(MockNode::default()).await;
    let provider = JsonRpcProvider::detect(RpcClient::new(url).unwrap())
        .await
        .expect("mock node answers web3_clientVersion");

    let accounts = provider.request_accounts().await.unwrap();
    assert_eq!(accounts, vec![Address::parse(VOTER).unwrap()]);
    let calls = node.calls.lock().unwrap().clone();
    assert!(calls.ends_with(&["eth_requestAccounts".to_string(), "eth_accounts".to_string()]));
}

#[tokio::test]
async fn provider_reports_chain_network_and_switch_failure() {
    let (url, _node) = spawn_node(MockNode {
        supports_request_accounts: true,
        ..Default::default()
    })
    .await;
    let provider = JsonRpcProvider::new(RpcClient::new(url).unwrap());

    assert_eq!(provider.chain_id().await.unwrap(), ChainId(1337));
    assert_eq!(provider.network_id().await.unwrap(), NetworkId(5777));
    assert_eq!(
        provider.switch_chain(ChainId::SEPOLIA).await,
        Err(ProviderError::SwitchRejected("Unrecognized chain ID".into()))
    );
}

#[tokio::test]
async fn bound_contract_uses_provider_endpoint() {
    let (url, _node) = spawn_node(MockNode::default()).await;
    let provider = JsonRpcProvider::new(RpcClient::new(url).unwrap());
    let gw = provider.bind_contract(&Address::parse(CONTRACT).unwrap());
    assert_eq!(gw.contract_address().as_str(), CONTRACT);
    assert_eq!(gw.candidates_count().await.unwrap(), 2);
}
