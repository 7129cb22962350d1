//! Per-operation identity and network context.

use serde::Serialize;

use crate::blockchain::network::StacksNetwork;
use crate::blockchain::wallet::UserData;

/// Identity and network captured when an operation starts.
///
/// Passed explicitly into every facade and view operation so none of them
/// reads global session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub identity: Option<UserData>,
    pub network: StacksNetwork,
}

impl SessionContext {
    pub fn signed_out(network: StacksNetwork) -> Self {
        Self {
            identity: None,
            network,
        }
    }

    pub fn signed_in(identity: UserData, network: StacksNetwork) -> Self {
        Self {
            identity: Some(identity),
            network,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// The identity's address on the selected network.
    pub fn address(&self) -> Option<&str> {
        self.identity.as_ref().map(|u| u.address_for(self.network))
    }
}

/// Shorten an address for display: `ST1PQH...PGZGM` style.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM"), "ST1PQH...GZGM");
        assert_eq!(short_address("ST1"), "ST1");
    }

    #[test]
    fn test_signed_out_context() {
        let ctx = SessionContext::signed_out(StacksNetwork::Mainnet);
        assert!(!ctx.is_signed_in());
        assert_eq!(ctx.address(), None);
    }
}
