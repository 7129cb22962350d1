use clap::{Parser, Subcommand};
use reqwest::{redirect::Policy, Method, StatusCode};
use serde_json::{json, Value};

use timelock_vault::units::{blocks_to_days, days_to_blocks, micro_to_stx_string, stx_to_micro};

#[derive(Parser)]
#[command(name = "vault-cli")]
#[command(about = "Command-line client for the TimeLock Vault server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show session and chain status
    Status,
    /// Connect the wallet
    Connect,
    /// Sign out
    Disconnect,
    /// Switch between testnet and mainnet
    Network { name: String },
    /// Create a vault in one go: set durations, review, submit
    Create {
        #[arg(long, default_value_t = 365)]
        unlock_days: u32,
        #[arg(long, default_value_t = 30)]
        inactivity_days: u32,
    },
    /// Show a vault's management screen
    Vault { id: u64 },
    /// Deposit STX into a vault
    Deposit { id: u64, amount: String },
    /// Register an heir
    AddHeir {
        id: u64,
        address: String,
        #[arg(long, default_value_t = 100)]
        percentage: u32,
    },
    /// Prove the owner is still active
    Ping { id: u64 },
    /// Hash notes and store the digest on-chain
    Notes { id: u64, text: String },
    /// Claim a vault as heir
    Claim { id: u64 },
    /// Deposit an NFT into a vault
    NftDeposit { id: u64, contract: String, token_id: String },
    /// Claim an NFT as heir
    NftClaim { id: u64, contract: String, token_id: String },
    /// List vaults created by the signed-in identity
    MyVaults,
    /// Show a tracked action
    Action { id: String },
    /// Drain pending notifications
    Notifications,
    /// Convert days to blocks (offline)
    Blocks {
        #[arg(long)]
        days: f64,
    },
    /// Convert an STX amount to micro-STX (offline)
    Micro { amount: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Guarded screens answer with a redirect; show it rather than follow it.
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
    let api = Api { client, base: cli.url.trim_end_matches('/').to_string() };

    let ok = match cli.command {
        Commands::Status => {
            api.call(Method::GET, "/session", None).await?
                && api.call(Method::GET, "/health", None).await?
        }
        Commands::Connect => api.call(Method::POST, "/session/connect", None).await?,
        Commands::Disconnect => api.call(Method::POST, "/session/disconnect", None).await?,
        Commands::Network { name } => {
            api.call(Method::PUT, "/network", Some(json!({ "network": name })))
                .await?
        }
        Commands::Create { unlock_days, inactivity_days } => {
            let durations = json!({ "unlock_days": unlock_days, "inactivity_days": inactivity_days });
            if api.call(Method::PUT, "/create-vault/durations", Some(durations)).await?
                && api.call(Method::POST, "/create-vault/next", None).await?
            {
                api.call(Method::POST, "/create-vault/submit", None).await?
            } else {
                false
            }
        }
        Commands::Vault { id } => api.call(Method::GET, &format!("/vault/{}", id), None).await?,
        Commands::Deposit { id, amount } => {
            api.call(
                Method::POST,
                &format!("/vault/{}/deposit", id),
                Some(json!({ "amount": amount })),
            )
            .await?
        }
        Commands::AddHeir { id, address, percentage } => {
            api.call(
                Method::POST,
                &format!("/vault/{}/heirs", id),
                Some(json!({ "address": address, "percentage": percentage })),
            )
            .await?
        }
        Commands::Ping { id } => api.call(Method::POST, &format!("/vault/{}/ping", id), None).await?,
        Commands::Notes { id, text } => {
            api.call(
                Method::POST,
                &format!("/vault/{}/notes", id),
                Some(json!({ "notes": text })),
            )
            .await?
        }
        Commands::Claim { id } => api.call(Method::POST, &format!("/vault/{}/claim", id), None).await?,
        Commands::NftDeposit { id, contract, token_id } => {
            api.call(
                Method::POST,
                &format!("/vault/{}/nft/deposit", id),
                Some(json!({ "contract": contract, "token_id": token_id })),
            )
            .await?
        }
        Commands::NftClaim { id, contract, token_id } => {
            api.call(
                Method::POST,
                &format!("/vault/{}/nft/claim", id),
                Some(json!({ "contract": contract, "token_id": token_id })),
            )
            .await?
        }
        Commands::MyVaults => api.call(Method::GET, "/my-vaults", None).await?,
        Commands::Action { id } => api.call(Method::GET, &format!("/actions/{}", id), None).await?,
        Commands::Notifications => api.call(Method::GET, "/notifications", None).await?,
        Commands::Blocks { days } => {
            let blocks = days_to_blocks(days);
            print_json(&json!({ "days": days, "blocks": blocks, "approx_days": blocks_to_days(blocks) }))?;
            true
        }
        Commands::Micro { amount } => {
            let micro = stx_to_micro(&amount)?;
            print_json(&json!({ "stx": micro_to_stx_string(micro), "micro_stx": micro }))?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

struct Api {
    client: reqwest::Client,
    base: String,
}

impl Api {
    /// Send a request and print the response. Returns whether it succeeded.
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let mut req = self.client.request(method, format!("{}{}", self.base, path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        print_response(res).await
    }
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_redirection() {
        let location = res
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("/");
        eprintln!("Not signed in: redirected to {}", location);
        return Ok(false);
    }
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(false);
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(true);
    }

    let json: Value = res.json().await?;
    print_json(&json)?;
    Ok(true)
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
