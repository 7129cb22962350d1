//! Session guard middleware.
//! Sends signed-out visitors of guarded screens back to `/` and hands
//! every request a `SessionContext` snapshot.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::views::routes;

pub async fn session_guard(State(state): State<AppState>, mut req: Request<Body>, next: Next) -> Response {
    let ctx = state.inner.session.context();
    let path = req.uri().path().to_string();

    if let Some(target) = routes::guard(&path, ctx.is_signed_in()) {
        tracing::debug!(
            request_id = req.request_id().unwrap_or("-"),
            path = %path,
            "Signed-out request redirected"
        );
        return Redirect::to(target).into_response();
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
