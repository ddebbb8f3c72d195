use axum::http::HeaderMap;
use serde::Serialize;
use std::net::SocketAddr;
use uuid::Uuid;

use super::error::AuthError;
use super::role::{require_role, Role};
use crate::database::models::audit_log::AuditActor;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

/// Request-scoped caller identity, inserted by the identity middleware.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Anonymous,
    User(AuthenticatedUser),
}

impl Identity {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    /// Authentication first, then the role allow-list.
    pub fn require_role(&self, allowed: &[Role]) -> Result<&AuthenticatedUser, AuthError> {
        let user = self.user().ok_or(AuthError::AuthenticationRequired)?;
        if require_role(user.role, allowed) {
            Ok(user)
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    pub fn require_user(&self) -> Result<&AuthenticatedUser, AuthError> {
        self.user().ok_or(AuthError::AuthenticationRequired)
    }

    /// Label used in request logs.
    pub fn actor_label(&self) -> String {
        match self {
            Identity::User(user) => user.email.clone(),
            Identity::Anonymous => "anonymous".to_string(),
        }
    }
}

/// Network origin of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Proxy headers win over the socket address.
    pub fn from_parts(headers: &HeaderMap, remote: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            ip: forwarded.or(real_ip).or_else(|| remote.map(|addr| addr.ip().to_string())),
            user_agent,
        }
    }

    pub fn actor(&self, user: Option<&AuthenticatedUser>) -> AuditActor {
        AuditActor {
            user_id: user.map(|u| u.id),
            ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> Identity {
        Identity::User(AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "x@kmci.org".to_string(),
            display_name: "X".to_string(),
            role,
        })
    }

    #[test]
    fn authentication_is_checked_before_role() {
        let allowed = [Role::Editor, Role::SuperAdmin];
        assert!(matches!(
            Identity::Anonymous.require_role(&allowed),
            Err(AuthError::AuthenticationRequired)
        ));
        assert!(matches!(
            user(Role::Viewer).require_role(&allowed),
            Err(AuthError::InsufficientPermissions)
        ));
        assert!(user(Role::Editor).require_role(&allowed).is_ok());
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        let remote: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(ClientInfo::from_parts(&headers, Some(remote)).ip.as_deref(), Some("203.0.113.7"));

        let headers = HeaderMap::new();
        assert_eq!(ClientInfo::from_parts(&headers, Some(remote)).ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(ClientInfo::from_parts(&headers, None).ip, None);
    }
}
