use std::collections::HashMap;

use auth::IdentityClaims;
use axum::extract::MatchedPath;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Extension;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Verified caller, stored in request extensions by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub IdentityClaims);

/// Middleware that validates the bearer token and attaches the caller's claims.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claims = state
        .authenticator
        .validate_bearer(authorization)
        .map_err(|e| {
            tracing::warn!(
                method = %req.method(),
                uri = %req.uri(),
                reason = %e,
                "Request rejected: unauthenticated"
            );
            ApiError::from(e).into_response()
        })?;

    req.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(req).await)
}

/// Middleware that applies the route's access policy to the authenticated caller.
///
/// Must run after [`authenticate`].
pub async fn authorize(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    matched_path: MatchedPath,
    params: Option<Path<HashMap<String, String>>>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let route = matched_path.as_str();
    let method = req.method().clone();

    let Some(policy) = state.policies.get(&method, route) else {
        tracing::error!(%method, route, "No access policy declared for route");
        return Err(ApiError::from(auth::AuthenticationError::Forbidden).into_response());
    };

    let path_subject = policy
        .self_access_param()
        .and_then(|name| params.as_ref().and_then(|Path(p)| p.get(name)))
        .map(String::as_str);

    if let Err(e) = state.authenticator.authorize(&claims, policy, path_subject) {
        tracing::warn!(
            subject = %claims.sub,
            %method,
            route,
            "Request rejected: access denied"
        );
        return Err(ApiError::from(e).into_response());
    }

    Ok(next.run(req).await)
}
