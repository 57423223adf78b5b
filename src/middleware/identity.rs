//! Caller identity forwarded by the authenticating gateway.
//!
//! Login and sessions happen upstream; by the time a request reaches this
//! service the gateway has attached the user's id, name and role as headers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

const ADMIN_ROLE: &str = "admin";

/// The authenticated user making the request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: Option<String>,
    pub is_admin: bool,
}

impl CurrentUser {
    fn from_parts(parts: &Parts) -> Result<Self, AppError> {
        let raw_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", USER_ID_HEADER)))?;
        let id = Uuid::parse_str(raw_id)
            .map_err(|_| AppError::Unauthorized(format!("Invalid {} header", USER_ID_HEADER)))?;

        Ok(Self {
            id,
            username: header(parts, USER_NAME_HEADER).map(str::to_string),
            is_admin: header(parts, USER_ROLE_HEADER)
                .map(|role| role.eq_ignore_ascii_case(ADMIN_ROLE))
                .unwrap_or(false),
        })
    }
}

/// Trimmed, non-empty header value
fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}

/// A `CurrentUser` holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_parts(parts)?;
        if !user.is_admin {
            tracing::warn!(user_id = %user.id, "Non-admin attempted admin access");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_current_user_from_headers() {
        let id = Uuid::new_v4();
        let raw_id = id.to_string();
        let mut parts = parts(&[(USER_ID_HEADER, raw_id.as_str()), (USER_NAME_HEADER, "alice")]);

        let user = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn test_missing_or_bad_id_is_unauthorized() {
        let mut missing = parts(&[]);
        assert!(matches!(
            CurrentUser::from_request_parts(&mut missing, &()).await,
            Err(AppError::Unauthorized(_))
        ));

        let mut bad = parts(&[(USER_ID_HEADER, "not-a-uuid")]);
        assert!(matches!(
            CurrentUser::from_request_parts(&mut bad, &()).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_role() {
        let id = Uuid::new_v4().to_string();
        let id = id.as_str();

        let mut admin = parts(&[(USER_ID_HEADER, id), (USER_ROLE_HEADER, "Admin")]);
        let AdminUser(user) = AdminUser::from_request_parts(&mut admin, &()).await.unwrap();
        assert!(user.is_admin);

        let mut regular = parts(&[(USER_ID_HEADER, id), (USER_ROLE_HEADER, "viewer")]);
        assert!(matches!(
            AdminUser::from_request_parts(&mut regular, &()).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
