//! Screen routes and the sign-in guard.

use serde::Serialize;

/// Where signed-out users are sent.
pub const HOME: &str = "/";

/// Paths reachable without an identity. Everything else is guarded.
const PUBLIC_PREFIXES: &[&str] = &["/health", "/session", "/network"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "vault_id", rename_all = "kebab-case")]
pub enum Route {
    Home,
    CreateVault,
    Vault(u64),
    MyVaults,
    HeirClaims,
}

impl Route {
    /// Match a screen path. Sub-resources such as `/vault/7/deposit`
    /// belong to their screen.
    pub fn parse(path: &str) -> Option<Route> {
        let mut segments = path.trim_end_matches('/').split('/').skip(1);
        match (segments.next(), segments.next()) {
            (None, _) | (Some(""), None) => Some(Route::Home),
            (Some("create-vault"), _) => Some(Route::CreateVault),
            (Some("vault"), Some(id)) => id.parse().ok().map(Route::Vault),
            (Some("my-vaults"), None) => Some(Route::MyVaults),
            (Some("heir-claims"), None) => Some(Route::HeirClaims),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => HOME.to_string(),
            Route::CreateVault => "/create-vault".to_string(),
            Route::Vault(id) => format!("/vault/{}", id),
            Route::MyVaults => "/my-vaults".to_string(),
            Route::HeirClaims => "/heir-claims".to_string(),
        }
    }

    pub fn requires_identity(&self) -> bool {
        !matches!(self, Route::Home)
    }
}

/// Whether `path` needs a signed-in identity.
pub fn requires_identity(path: &str) -> bool {
    if path == HOME || path.is_empty() {
        return false;
    }
    if PUBLIC_PREFIXES
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{}/", p)))
    {
        return false;
    }
    Route::parse(path).map_or(true, |r| r.requires_identity())
}

/// Redirect target for `path`, if the visitor may not see it.
pub fn guard(path: &str, signed_in: bool) -> Option<&'static str> {
    if !signed_in && requires_identity(path) {
        Some(HOME)
    } else {
        None
    }
}
