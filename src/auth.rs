//! Caller identity. Authentication happens in the gateway in front of this
//! service, which forwards the verified user as request headers.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::user::UserIdentity;
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-Forwarded-User";
pub const USER_EMAIL_HEADER: &str = "X-Forwarded-Email";

/// Extractor that rejects the request with 401 unless the gateway identified
/// the caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserIdentity);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    fn from_headers(req: &HttpRequest) -> Option<Self> {
        let id = header(req, USER_ID_HEADER)?.parse::<Uuid>().ok()?;
        let email = header(req, USER_EMAIL_HEADER).unwrap_or_default().to_string();
        Some(Self(UserIdentity { id, email }))
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req).ok_or(AppError::Unauthorized))
    }
}
