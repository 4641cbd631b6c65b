//! Authentication middleware.
//!
//! Axum middleware gating the protected routes: extracts the bearer
//! credential, verifies the token, resolves the subject against the user
//! directory and, on success, injects [`CurrentUser`] into the request
//! extensions for downstream handlers.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{
    directory::UserDirectory,
    models::CurrentUser,
    token::{AuthError, TokenService},
};

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// Scheme matching is case-insensitive and a single run of whitespace
/// between scheme and token is tolerated. Anything else, a missing header,
/// another scheme, an empty remainder, is `None`; this never fails.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, rest) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = rest.trim_start();
    if token.is_empty() { None } else { Some(token) }
}

/// Verifies inbound credentials end to end.
///
/// Composes the token service with the user directory: a cryptographically
/// valid token whose subject has since been deactivated still fails
/// authentication.
pub struct TokenAuthenticator {
    tokens: TokenService,
    directory: Arc<dyn UserDirectory>,
}

impl TokenAuthenticator {
    pub fn new(tokens: TokenService, directory: Arc<dyn UserDirectory>) -> Self {
        Self { tokens, directory }
    }

    /// The underlying token service, for issuing tokens at login.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Authenticate a request from its headers.
    ///
    /// Every failure mode comes back as a distinct [`AuthError`] so logs and
    /// tests can tell them apart; the HTTP boundary collapses them all to a
    /// single 401. A failed directory lookup degrades to an authentication
    /// failure rather than a server fault.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<CurrentUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingCredentials)?;
        let claims = self.tokens.verify(token)?;

        match self.directory.resolve_active(claims.user_id).await {
            Ok(Some(record)) => {
                if record.role_name != claims.role_name {
                    // Stale until re-login; authorization stays on the
                    // role the token was minted with.
                    tracing::debug!(
                        user_id = record.user_id,
                        token_role = %claims.role_name,
                        current_role = %record.role_name,
                        "directory role differs from token role"
                    );
                }
                Ok(CurrentUser::from(claims))
            }
            Ok(None) => Err(AuthError::InactiveIdentity),
            Err(e) => Err(AuthError::DirectoryUnavailable(e)),
        }
    }
}

/// Authentication middleware for protected routers.
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Reject the request with 401 unless it authenticates; otherwise pass it
    /// on with [`CurrentUser`] attached to the request extensions.
    pub async fn require_auth(
        State(auth): State<Arc<TokenAuthenticator>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, StatusCode> {
        match auth.authenticate(req.headers()).await {
            Ok(user) => {
                tracing::debug!(
                    user_id = user.user_id,
                    role = %user.role_name,
                    "request authenticated"
                );
                req.extensions_mut().insert(user);
                Ok(next.run(req).await)
            }
            Err(err) => {
                // The client only ever learns "401"; which check failed stays
                // in the logs.
                match &err {
                    AuthError::DirectoryUnavailable(_) => {
                        tracing::error!(error = %err, "authentication failed")
                    }
                    _ => tracing::warn!(error = %err, "authentication failed"),
                }
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::DirectoryRecord;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory directory double: a set of active subject ids plus an
    /// "offline" switch.
    #[derive(Default)]
    struct StubDirectory {
        active: Mutex<HashSet<i32>>,
        offline: AtomicBool,
    }

    impl StubDirectory {
        fn with_active(ids: &[i32]) -> Arc<Self> {
            let stub = Self::default();
            stub.active.lock().unwrap().extend(ids.iter().copied());
            Arc::new(stub)
        }

        fn deactivate(&self, id: i32) {
            self.active.lock().unwrap().remove(&id);
        }
    }

    #[async_trait]
    impl UserDirectory for StubDirectory {
        async fn resolve_active(&self, user_id: i32) -> Result<Option<DirectoryRecord>> {
            if self.offline.load(Ordering::SeqCst) {
                anyhow::bail!("directory offline");
            }
            let active = self.active.lock().unwrap().contains(&user_id);
            Ok(active.then(|| DirectoryRecord {
                user_id,
                role_name: "Employee".to_string(),
            }))
        }
    }

    fn authenticator(directory: Arc<StubDirectory>) -> TokenAuthenticator {
        TokenAuthenticator::new(TokenService::new("unit-test-secret"), directory)
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(
            bearer_token(&headers_with("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("BEARER abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Bearer    abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("Bearerabc")), None);
    }

    #[tokio::test]
    async fn authenticate_builds_request_context() {
        let auth = authenticator(StubDirectory::with_active(&[42]));
        let token = auth.tokens().issue(42, 17, "mreyes", 3, "HR Manager");

        let user = auth
            .authenticate(&headers_with(&format!("Bearer {}", token)))
            .await
            .expect("active subject authenticates");

        assert_eq!(user.user_id, 42);
        assert_eq!(user.employee_id, 17);
        assert_eq!(user.username, "mreyes");
        assert_eq!(user.role_name, "HR Manager");
        assert!(user.has_role("HR Manager"));
    }

    #[tokio::test]
    async fn context_role_comes_from_the_token_not_the_directory() {
        // The stub resolves every active subject as an "Employee"; the token
        // was minted while the subject was an HR Manager. The directory
        // proves the account is live, the claims decide the context.
        let auth = authenticator(StubDirectory::with_active(&[42]));
        let token = auth.tokens().issue(42, 17, "mreyes", 3, "HR Manager");

        let user = auth
            .authenticate(&headers_with(&format!("Bearer {}", token)))
            .await
            .expect("active subject authenticates");
        assert_eq!(user.role_name, "HR Manager");
        assert!(!user.has_role("Employee"));
    }

    #[tokio::test]
    async fn missing_or_foreign_credentials_are_rejected() {
        let auth = authenticator(StubDirectory::with_active(&[42]));

        assert!(matches!(
            auth.authenticate(&HeaderMap::new()).await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            auth.authenticate(&headers_with("Basic dXNlcjpwYXNz")).await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            auth.authenticate(&headers_with("Bearer not-a-token")).await,
            Err(AuthError::MalformedToken)
        ));
    }

    #[tokio::test]
    async fn valid_token_for_deactivated_subject_is_rejected() {
        // Revocation by deactivation: the token stays cryptographically
        // valid, the account behind it does not.
        let directory = StubDirectory::with_active(&[42]);
        let auth = authenticator(directory.clone());
        let token = auth.tokens().issue(42, 17, "mreyes", 3, "HR Manager");

        let claims = auth.tokens().verify(&token).expect("token itself is valid");
        assert_eq!(claims.role_name, "HR Manager");

        directory.deactivate(42);

        assert!(matches!(
            auth.authenticate(&headers_with(&format!("Bearer {}", token)))
                .await,
            Err(AuthError::InactiveIdentity)
        ));
    }

    #[tokio::test]
    async fn unknown_subject_is_rejected() {
        let auth = authenticator(StubDirectory::with_active(&[1]));
        let token = auth.tokens().issue(99, 99, "ghost", 1, "Employee");

        assert!(matches!(
            auth.authenticate(&headers_with(&format!("Bearer {}", token)))
                .await,
            Err(AuthError::InactiveIdentity)
        ));
    }

    #[tokio::test]
    async fn directory_outage_degrades_to_auth_failure() {
        let directory = StubDirectory::with_active(&[42]);
        let auth = authenticator(directory.clone());
        let token = auth.tokens().issue(42, 17, "mreyes", 3, "HR Manager");

        directory.offline.store(true, Ordering::SeqCst);

        assert!(matches!(
            auth.authenticate(&headers_with(&format!("Bearer {}", token)))
                .await,
            Err(AuthError::DirectoryUnavailable(_))
        ));
    }
}
