//! Bearer-token authentication and role checks as Axum middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use bookstore_db::{models::Role, Store};
use bookstore_http::AppError;

use crate::token::{Claims, TokenError, TokenService};

/// Shared state for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn Store>,
}

/// Required role for one route, resolved against the stored user record
#[derive(Clone)]
pub struct RoleGate {
    store: Arc<dyn Store>,
    role: Role,
}

impl AuthState {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn Store>) -> Self {
        Self { tokens, store }
    }

    /// Require a valid bearer token on `route`
    pub fn authenticated<S>(&self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        route.route_layer(middleware::from_fn_with_state(self.clone(), require_auth))
    }

    /// Require a valid bearer token whose user holds `role`
    pub fn with_role<S>(&self, role: Role, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let gate = RoleGate {
            store: self.store.clone(),
            role,
        };
        // The last layer added runs first: authenticate, then check the role.
        route
            .route_layer(middleware::from_fn_with_state(gate, require_role))
            .route_layer(middleware::from_fn_with_state(self.clone(), require_auth))
    }
}

/// Verify the bearer token and attach its [`Claims`] to the request
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(req.headers()) {
        Credentials::Bearer(token) => token,
        Credentials::Missing => return Err(AppError::unauthorized("unauthorized access")),
        Credentials::Malformed => {
            tracing::warn!("rejected malformed authorization header");
            return Err(AppError::forbidden("forbidden access"));
        }
    };

    let claims = auth.tokens.verify(token).map_err(|err| {
        tracing::warn!(error = %err, "rejected bearer token");
        match err {
            TokenError::Expired | TokenError::Invalid(_) => AppError::forbidden("forbidden access"),
            TokenError::Signing(_) => AppError::Internal(err.into()),
        }
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Compare the caller's stored role against the gate's role
pub async fn require_role(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let email = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.email.clone())
        .ok_or_else(|| AppError::unauthorized("unauthorized access"))?;

    let user = gate.store.find_user_by_email(&email).await?;
    match user {
        Some(user) if user.role == gate.role => Ok(next.run(req).await),
        other => {
            tracing::warn!(
                email = %email,
                required = %gate.role,
                actual = ?other.map(|u| u.role),
                "role check failed"
            );
            Err(AppError::forbidden("forbidden access"))
        }
    }
}

/// What the `Authorization` header carries
#[derive(Debug, PartialEq, Eq)]
enum Credentials<'a> {
    Missing,
    /// Present, but not a usable `Bearer <token>` value
    Malformed,
    Bearer(&'a str),
}

fn bearer_token(headers: &HeaderMap) -> Credentials<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Credentials::Missing;
    };
    let token = value.to_str().ok().and_then(|value| {
        value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
    });
    match token.map(str::trim) {
        Some(token) if !token.is_empty() => Credentials::Bearer(token),
        _ => Credentials::Malformed,
    }
}
