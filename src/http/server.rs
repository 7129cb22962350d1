//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble application state (session, facade, views, tracker)
//! - Create the Axum router with all handlers
//! - Wire up middleware (request id, trace, timeout, metrics, session guard)
//! - Bind to a listener and serve until shutdown

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::blockchain::client::ChainReader;
use crate::blockchain::contract_call::AppDetails;
use crate::blockchain::network::StacksNetwork;
use crate::blockchain::types::BlockchainResult;
use crate::blockchain::wallet::WalletProvider;
use crate::config::VaultConfig;
use crate::http::handlers;
use crate::http::middleware::session_guard;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, track_requests, RequestIdExt};
use crate::session::Session;
use crate::vault::action::ActionTracker;
use crate::vault::repository::VaultRepository;
use crate::vault::service::VaultService;
use crate::views::{CreateVaultView, ManageScreens, Notifier, ViewServices};

/// Shared state behind every handler.
pub struct AppInner {
    pub config: VaultConfig,
    pub session: Session,
    pub services: ViewServices,
    pub create_view: CreateVaultView,
    pub screens: ManageScreens,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppInner>,
}

impl AppState {
    /// Wire the application around its external collaborators.
    pub fn new(
        config: VaultConfig,
        wallet: Arc<dyn WalletProvider>,
        chain: Arc<dyn ChainReader>,
        repository: Arc<dyn VaultRepository>,
    ) -> BlockchainResult<Self> {
        let vaults = VaultService::new(wallet.clone(), &config.contract, &config.app)?;
        let network: StacksNetwork = config.network.default.parse().unwrap_or_default();
        let session = Session::new(
            wallet,
            AppDetails {
                name: config.app.name.clone(),
                icon: config.app.icon_url.clone(),
            },
            network,
        );
        let tracker = Arc::new(ActionTracker::new(&config.tracking, Some(chain.clone())));

        let services = ViewServices {
            vaults,
            repository,
            chain,
            tracker,
            notifier: Arc::new(Notifier::new()),
            nft_refresh_delay: Duration::from_millis(config.tracking.nft_refresh_delay_ms),
        };

        Ok(Self {
            inner: Arc::new(AppInner {
                config,
                session,
                services,
                create_view: CreateVaultView::new(),
                screens: ManageScreens::new(),
            }),
        })
    }
}

/// HTTP server hosting the vault screens.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.inner.config.server.request_timeout_secs);

        Router::new()
            .route("/", get(handlers::home))
            .route("/health", get(handlers::health))
            .route("/session", get(handlers::session_status))
            .route("/session/connect", post(handlers::connect))
            .route("/session/disconnect", post(handlers::disconnect))
            .route("/network", put(handlers::switch_network))
            .route("/create-vault", get(handlers::create_flow))
            .route("/create-vault/durations", put(handlers::set_durations))
            .route("/create-vault/next", post(handlers::create_next))
            .route("/create-vault/back", post(handlers::create_back))
            .route("/create-vault/submit", post(handlers::create_submit))
            .route("/vault/{id}", get(handlers::vault_screen))
            .route("/vault/{id}/tab", put(handlers::set_tab))
            .route("/vault/{id}/deposit", post(handlers::deposit_stx))
            .route("/vault/{id}/heirs", post(handlers::add_heir))
            .route("/vault/{id}/notes", post(handlers::save_notes))
            .route("/vault/{id}/ping", post(handlers::ping))
            .route("/vault/{id}/claim", post(handlers::claim))
            .route("/vault/{id}/nft/deposit", post(handlers::deposit_nft))
            .route("/vault/{id}/nft/claim", post(handlers::claim_nft))
            .route("/my-vaults", get(handlers::my_vaults))
            .route("/heir-claims", get(handlers::heir_claims))
            .route("/actions/{id}", get(handlers::action_status))
            .route("/notifications", get(handlers::notifications))
            .route_layer(middleware::from_fn_with_state(state.clone(), session_guard))
            .with_state(state)
            .layer(middleware::from_fn(track_requests))
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = req.request_id().unwrap_or("-"),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            network = %self.state.inner.session.network(),
            contract = %self.state.inner.services.vaults.vault_contract(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
