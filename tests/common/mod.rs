//! Shared utilities for integration tests.
//!
//! A single raw-TCP mock plays both the Stacks chain API and the wallet
//! bridge; the real server is started on an ephemeral port in front of it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use timelock_vault::blockchain::contract_call::{AppDetails, ContractCall};
use timelock_vault::blockchain::wallet::StxAddresses;
use timelock_vault::blockchain::{
    BlockchainError, BlockchainResult, ChainReader, ConfirmationStatus, ContractPrincipal,
    StacksNetwork, TxId, TxSubmission, UserData, WalletProvider,
};
use timelock_vault::config::VaultConfig;
use timelock_vault::lifecycle::{build_state, Shutdown};
use timelock_vault::vault::repository::PlaceholderVaultRepository;
use timelock_vault::{AppState, HttpServer};

pub const OWNER_TESTNET: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
pub const OWNER_MAINNET: &str = "SP2PABAF9FTAJYNFZH93XENAJ8FVY99RRM50D2JG9";
pub const TX_ID: &str = "0x5a1e4b3c2d1f0e9d8c7b6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d";

/// Programmable state behind the mock chain API and wallet bridge.
pub struct MockBackend {
    pub height: AtomicU64,
    pub next_vault_id: AtomicU64,
    pub tx_status: Mutex<String>,
    /// Wallet prompts are declined when set.
    pub decline: AtomicBool,
    /// Delay before the wallet answers a contract-call prompt.
    pub wallet_delay_ms: AtomicU64,
    /// Contract-call payloads the wallet was asked to sign.
    pub calls: Mutex<Vec<Value>>,
    /// Every request path seen, in order.
    pub paths: Mutex<Vec<String>>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            height: AtomicU64::new(100_000),
            next_vault_id: AtomicU64::new(5),
            tx_status: Mutex::new("success".into()),
            decline: AtomicBool::new(false),
            wallet_delay_ms: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_path(&self, prefix: &str) -> usize {
        self.paths
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(prefix))
            .count()
    }

    async fn respond(&self, method: &str, path: &str, body: &str) -> (u16, String) {
        self.paths.lock().unwrap().push(path.to_string());

        if method == "GET" && path.starts_with("/extended/v1/block") {
            let height = self.height.load(Ordering::SeqCst);
            return (200, json!({ "results": [{ "height": height }] }).to_string());
        }
        if method == "GET" && path.starts_with("/extended/v1/tx/") {
            let status = self.tx_status.lock().unwrap().clone();
            if status == "missing" {
                return (404, json!({ "error": "not found" }).to_string());
            }
            let height = self.height.load(Ordering::SeqCst);
            return (
                200,
                json!({ "tx_status": status, "block_height": height }).to_string(),
            );
        }
        if method == "POST" && path.ends_with("/get-next-vault-id") {
            let next = self.next_vault_id.load(Ordering::SeqCst);
            return (
                200,
                json!({ "okay": true, "result": ok_uint_hex(next) }).to_string(),
            );
        }
        if method == "POST" && path == "/connect" {
            if self.decline.load(Ordering::SeqCst) {
                return (400, json!({ "error": "User declined sign-in" }).to_string());
            }
            return (
                200,
                json!({
                    "stxAddress": { "mainnet": OWNER_MAINNET, "testnet": OWNER_TESTNET },
                    "username": "owner.btc",
                })
                .to_string(),
            );
        }
        if method == "POST" && path == "/contract-call" {
            let delay = self.wallet_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.decline.load(Ordering::SeqCst) {
                return (400, json!({ "error": "User rejected transaction" }).to_string());
            }
            let payload: Value = serde_json::from_str(body).unwrap_or(Value::Null);
            self.calls.lock().unwrap().push(payload);
            return (200, json!({ "txId": TX_ID }).to_string());
        }
        if method == "POST" && path == "/disconnect" {
            return (200, "{}".to_string());
        }
        (404, json!({ "error": "unknown path" }).to_string())
    }
}

/// Hex of the Clarity value `(ok uN)`.
pub fn ok_uint_hex(n: u64) -> String {
    format!("0x0701{:032x}", n)
}

/// Start the mock on an ephemeral port.
pub async fn start_mock_backend() -> (SocketAddr, Arc<MockBackend>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend = Arc::new(MockBackend::new());
    let shared = backend.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let backend = shared.clone();
                    tokio::spawn(async move {
                        serve_one(socket, backend).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, backend)
}

async fn serve_one(mut socket: TcpStream, backend: Arc<MockBackend>) {
    let Some((method, path, body)) = read_request(&mut socket).await else {
        return;
    };
    let (status, body) = backend.respond(&method, &path, &body).await;
    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        _ => "500 Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<(String, String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();
    Some((method, path, body))
}

/// Config pointing every collaborator at the mock.
pub fn test_config(mock: SocketAddr) -> VaultConfig {
    let mut config = VaultConfig::default();
    let base = format!("http://{}", mock);
    config.server.bind_address = "127.0.0.1:0".into();
    config.network.testnet.api_url = base.clone();
    config.network.mainnet.api_url = base.clone();
    config.network.testnet.rpc_timeout_secs = 2;
    config.network.mainnet.rpc_timeout_secs = 2;
    config.wallet.bridge_url = base;
    config.wallet.timeout_secs = 5;
    config.tracking.confirmation_poll_secs = 1;
    config.tracking.confirmation_timeout_secs = 10;
    config.tracking.nft_refresh_delay_ms = 200;
    config
}

/// A running server and the mock behind it.
pub struct TestApp {
    pub base: String,
    pub state: AppState,
    pub backend: Arc<MockBackend>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.put(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn sign_in(&self) {
        let res = self.post("/session/connect", json!({})).await;
        assert_eq!(res.status(), 200, "sign-in should succeed");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut VaultConfig)) -> TestApp {
    let (mock, backend) = start_mock_backend().await;
    let mut config = test_config(mock);
    tweak(&mut config);

    let listener = TcpListener::bind(&config.server.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = build_state(config).await.unwrap();

    let shutdown = Shutdown::new();
    let stopped = shutdown.signalled();
    let server = HttpServer::new(state.clone());
    tokio::spawn(async move {
        let _ = server.run(listener, stopped).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    TestApp {
        base: format!("http://{}", addr),
        state,
        backend,
        client,
        shutdown,
    }
}

/// Poll `check` until it holds or `deadline` passes.
pub async fn eventually<F, Fut>(deadline: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// In-process wallet that approves every prompt and records the calls.
#[derive(Default)]
pub struct RecordingWallet {
    pub calls: Mutex<Vec<ContractCall>>,
    pub decline: AtomicBool,
    /// Contract-call prompts never return when set.
    pub hang: AtomicBool,
}

impl RecordingWallet {
    pub fn functions(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.function_name.clone())
            .collect()
    }
}

#[async_trait]
impl WalletProvider for RecordingWallet {
    async fn connect(&self, _app: &AppDetails) -> BlockchainResult<UserData> {
        Ok(UserData {
            stx_address: StxAddresses {
                mainnet: OWNER_MAINNET.into(),
                testnet: OWNER_TESTNET.into(),
            },
            username: None,
        })
    }

    async fn open_contract_call(&self, call: &ContractCall) -> BlockchainResult<TxSubmission> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.decline.load(Ordering::SeqCst) {
            return Err(BlockchainError::Wallet("User rejected transaction".into()));
        }
        self.calls.lock().unwrap().push(call.clone());
        Ok(TxSubmission {
            tx_id: TxId(TX_ID.into()),
        })
    }
}

/// Chain reader with a fixed tip; transactions never leave the mempool.
pub struct FixedChain {
    pub height: u64,
}

#[async_trait]
impl ChainReader for FixedChain {
    async fn current_block_height(&self, _network: StacksNetwork) -> BlockchainResult<u64> {
        Ok(self.height)
    }

    async fn transaction_status(
        &self,
        _network: StacksNetwork,
        _tx_id: &TxId,
    ) -> BlockchainResult<ConfirmationStatus> {
        Ok(ConfirmationStatus::Pending)
    }

    async fn next_vault_id(
        &self,
        _network: StacksNetwork,
        _contract: &ContractPrincipal,
    ) -> BlockchainResult<u64> {
        Ok(u64::MAX)
    }
}

/// Router wired to a recording wallet and a fixed chain, for `oneshot` tests.
pub fn router_app() -> (axum::Router, Arc<RecordingWallet>) {
    let wallet = Arc::new(RecordingWallet::default());
    let chain = Arc::new(FixedChain { height: 100_000 });
    let state = AppState::new(
        VaultConfig::default(),
        wallet.clone(),
        chain,
        Arc::new(PlaceholderVaultRepository::new()),
    )
    .unwrap();
    (HttpServer::build_router(state), wallet)
}
