//! Sign-in state backed by the wallet.

use arc_swap::{ArcSwap, ArcSwapOption};
use std::sync::Arc;

use crate::blockchain::contract_call::AppDetails;
use crate::blockchain::network::StacksNetwork;
use crate::blockchain::types::BlockchainResult;
use crate::blockchain::wallet::{UserData, WalletProvider};
use crate::session::context::SessionContext;

/// The signed-in identity and the selected network.
///
/// Both are read by every form and written only by sign-in, sign-out and
/// the network switch.
pub struct Session {
    wallet: Arc<dyn WalletProvider>,
    app: AppDetails,
    user: ArcSwapOption<UserData>,
    network: ArcSwap<StacksNetwork>,
}

impl Session {
    pub fn new(wallet: Arc<dyn WalletProvider>, app: AppDetails, network: StacksNetwork) -> Self {
        Self {
            wallet,
            app,
            user: ArcSwapOption::empty(),
            network: ArcSwap::from_pointee(network),
        }
    }

    /// Ask the wallet to connect and remember the returned identity.
    pub async fn authenticate(&self) -> BlockchainResult<UserData> {
        let user = self.wallet.connect(&self.app).await?;
        self.user.store(Some(Arc::new(user.clone())));
        tracing::info!(
            address = %user.address_for(self.network()),
            "User signed in"
        );
        Ok(user)
    }

    pub fn is_user_signed_in(&self) -> bool {
        self.user.load().is_some()
    }

    pub fn get_user_data(&self) -> Option<UserData> {
        self.user.load_full().map(|u| (*u).clone())
    }

    /// Forget the identity. The local session is cleared even if the
    /// wallet cannot be reached.
    pub async fn log_user_out(&self) {
        self.user.store(None);
        if let Err(e) = self.wallet.disconnect().await {
            tracing::warn!(error = %e, "Wallet disconnect failed; local session cleared");
        }
        tracing::info!("User signed out");
    }

    pub fn network(&self) -> StacksNetwork {
        **self.network.load()
    }

    pub fn switch_network(&self, network: StacksNetwork) {
        let previous = self.network.swap(Arc::new(network));
        if *previous != network {
            tracing::info!(from = %previous, to = %network, "Network switched");
        }
    }

    /// Snapshot of identity and network for a single operation.
    pub fn context(&self) -> SessionContext {
        SessionContext {
            identity: self.get_user_data(),
            network: self.network(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("signed_in", &self.is_user_signed_in())
            .field("network", &self.network())
            .finish()
    }
}
