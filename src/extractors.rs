use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// The calling member, resolved from a session token.
#[derive(Debug, Clone)]
pub struct CurrentMember {
    pub id: String,
    /// Session token the member was resolved from
    pub token: String,
}

/// Extractor that requires a member session.
/// Returns 401 NOT_AUTHENTICATED if the token is missing, unknown or expired.
impl FromRequestParts<AppState> for CurrentMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, &state.config.auth.cookie_name)
            .ok_or(AppError::NotAuthenticated)?;

        let id = state
            .identity
            .resolve(token)
            .await?
            .ok_or(AppError::NotAuthenticated)?;

        Ok(CurrentMember {
            id,
            token: token.to_string(),
        })
    }
}

/// Optional member extractor: anonymous callers get `None` instead of 401.
pub struct MaybeMember(pub Option<CurrentMember>);

impl MaybeMember {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|m| m.id.as_str())
    }
}

impl FromRequestParts<AppState> for MaybeMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentMember::from_request_parts(parts, state).await {
            Ok(member) => Ok(MaybeMember(Some(member))),
            Err(AppError::NotAuthenticated) => Ok(MaybeMember(None)),
            // Store trouble is not the same as "anonymous"
            Err(e) => Err(e),
        }
    }
}

/// Session token from the session cookie, falling back to `Authorization: Bearer`.
fn session_token<'a>(parts: &'a Parts, cookie_name: &str) -> Option<&'a str> {
    let from_cookie = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            (key.trim() == cookie_name).then(|| val.trim())
        });

    from_cookie.or_else(|| {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
    })
    .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(header::HeaderName, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn token_from_cookie() {
        let p = parts(&[(header::COOKIE, "theme=dark; paddock_session=abc123; x=y")]);
        assert_eq!(session_token(&p, "paddock_session"), Some("abc123"));
    }

    #[test]
    fn token_from_bearer_header() {
        let p = parts(&[(header::AUTHORIZATION, "Bearer tok-9")]);
        assert_eq!(session_token(&p, "paddock_session"), Some("tok-9"));
    }

    #[test]
    fn cookie_wins_over_bearer() {
        let p = parts(&[
            (header::COOKIE, "paddock_session=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(session_token(&p, "paddock_session"), Some("from-cookie"));
    }

    #[test]
    fn missing_or_empty_token() {
        assert_eq!(session_token(&parts(&[]), "paddock_session"), None);
        let p = parts(&[(header::COOKIE, "paddock_session=")]);
        assert_eq!(session_token(&p, "paddock_session"), None);
        let p = parts(&[(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")]);
        assert_eq!(session_token(&p, "paddock_session"), None);
    }
}
