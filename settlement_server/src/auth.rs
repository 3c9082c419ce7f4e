//! Caller identity.
//!
//! The server does not authenticate users itself. The upstream session layer forwards the authenticated caller in two
//! headers:
//! * `x-mkt-user-id`: the user's id.
//! * `x-mkt-roles`: a comma-separated list of roles (`buyer`, `seller`, `admin`).
//!
//! When an identity secret is configured, `x-mkt-identity-signature` must carry
//! `base64(HMAC-SHA256(secret, "{user_id}:{roles}"))`, where `roles` is the header value exactly as sent.
//!
//! Handlers receive the identity through the [`Caller`] extractor and pass it explicitly to the settlement APIs.
use std::{
    fmt::Display,
    future::{ready, Ready},
    str::FromStr,
};

use actix_web::{dev::Payload, http::header::HeaderMap, web, FromRequest, HttpMessage, HttpRequest};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::IdentityConfig,
    errors::{AuthError, ServerError},
    helpers::verify_hmac,
};

pub const USER_ID_HEADER: &str = "x-mkt-user-id";
pub const ROLES_HEADER: &str = "x-mkt-roles";
pub const SIGNATURE_HEADER: &str = "x-mkt-identity-signature";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Seller => write!(f, "seller"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::InvalidRoles(format!("Unknown role '{other}'"))),
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub roles: Vec<Role>,
}

impl Caller {
    pub fn new<S: Into<String>>(user_id: S, roles: &[Role]) -> Self {
        Self { user_id: user_id.into(), roles: roles.to_vec() }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Reads the caller from the identity headers, checking the signature if `identity` requires one.
    pub fn from_headers(headers: &HeaderMap, identity: Option<&IdentityConfig>) -> Result<Self, AuthError> {
        let user_id = header_value(headers, USER_ID_HEADER)?
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::MissingIdentity(format!("The {USER_ID_HEADER} header is required")))?;
        let roles_header = header_value(headers, ROLES_HEADER)?.unwrap_or_default();
        if let Some(secret) = identity.and_then(|i| i.secret.as_ref()) {
            let signature = header_value(headers, SIGNATURE_HEADER)?.ok_or(AuthError::InvalidSignature)?;
            let message = format!("{user_id}:{roles_header}");
            if !verify_hmac(secret.reveal(), message.as_bytes(), signature) {
                warn!("🔐️ Identity signature for {user_id} did not verify");
                return Err(AuthError::InvalidSignature);
            }
            trace!("🔐️ Identity signature for {user_id} ✅️");
        }
        let roles = roles_header
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Role::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { user_id: user_id.to_string(), roles })
    }

    /// Checks that the caller holds every one of `required` roles.
    pub fn require(&self, required: &[Role]) -> Result<(), AuthError> {
        match required.iter().find(|r| !self.has_role(**r)) {
            None => Ok(()),
            Some(missing) => Err(AuthError::InsufficientPermissions(format!("The {missing} role is required"))),
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AuthError> {
    headers
        .get(name)
        .map(|v| v.to_str().map_err(|_| AuthError::MissingIdentity(format!("{name} is not valid text"))))
        .transpose()
}

impl FromRequest for Caller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The ACL middleware has already done the work on protected routes
        if let Some(caller) = req.extensions().get::<Caller>() {
            return ready(Ok(caller.clone()));
        }
        let identity = req.app_data::<web::Data<IdentityConfig>>().map(|d| d.get_ref());
        ready(Caller::from_headers(req.headers(), identity).map_err(ServerError::from))
    }
}
