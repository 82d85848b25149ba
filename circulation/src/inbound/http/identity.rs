//! Caller identity derivation for HTTP handlers.
//!
//! The upstream gateway authenticates callers and forwards their identity as
//! `X-User-Id` and `X-User-Role` headers. This extractor turns those headers
//! into a domain [`Actor`] so handlers never touch raw header values.

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::domain::{Actor, Error, Role, UserId};

/// Header carrying the authenticated user's identifier.
pub const USER_ID_HEADER: &str = "X-User-Id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Authenticated caller extracted from gateway headers.
#[derive(Debug, Clone)]
pub struct CallerIdentity(Actor);

impl CallerIdentity {
    /// Consume the extractor, yielding the domain actor.
    pub fn into_actor(self) -> Actor {
        self.0
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, Error> {
    let value = headers
        .get(name)
        .ok_or_else(|| Error::unauthorized(format!("missing {name} header")))?;
    value
        .to_str()
        .map_err(|_| Error::unauthorized(format!("{name} header is not valid UTF-8")))
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Error> {
    let raw_id = header_value(headers, USER_ID_HEADER)?;
    let user_id = UserId::new(raw_id)
        .map_err(|err| Error::unauthorized(format!("invalid {USER_ID_HEADER} header: {err}")))?;

    let raw_role = header_value(headers, USER_ROLE_HEADER)?;
    let role: Role = raw_role
        .parse()
        .map_err(|err| Error::unauthorized(format!("invalid {USER_ROLE_HEADER} header: {err}")))?;

    Ok(Actor::new(user_id, role))
}

impl FromRequest for CallerIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(actor_from_headers(req.headers()).map(CallerIdentity))
    }
}
