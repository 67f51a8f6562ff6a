//! Acting user and client address resolution

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const TRUSTED_SERVICE_ROLE: &str = "TrustedService";

/// The authenticated principal behind the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            roles: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether this principal is another microservice rather than a person.
    pub fn is_trusted_service(&self) -> bool {
        self.is_in_role(TRUSTED_SERVICE_ROLE)
    }
}

pub type UserResolver = Arc<dyn Fn() -> anyhow::Result<Option<UserIdentity>> + Send + Sync>;
pub type IpResolver = Arc<dyn Fn() -> anyhow::Result<Option<String>> + Send + Sync>;

/// Wrap a closure as a [`UserResolver`].
pub fn user_resolver(
    resolver: impl Fn() -> anyhow::Result<Option<UserIdentity>> + Send + Sync + 'static,
) -> UserResolver {
    Arc::new(resolver)
}

/// Wrap a closure as an [`IpResolver`].
pub fn ip_resolver(
    resolver: impl Fn() -> anyhow::Result<Option<String>> + Send + Sync + 'static,
) -> IpResolver {
    Arc::new(resolver)
}

pub(crate) fn unconfigured_user_resolver() -> UserResolver {
    Arc::new(|| {
        debug!("Audit user resolver is not configured");
        Ok(None)
    })
}

pub(crate) fn unconfigured_ip_resolver() -> IpResolver {
    Arc::new(|| {
        debug!("Audit IP resolver is not configured");
        Ok(None)
    })
}

/// Outcome of a best-effort lookup.
///
/// `diagnostic` is set when the resolver failed and `value` fell back to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub diagnostic: Option<String>,
}

impl<T> Resolved<T> {
    pub fn is_degraded(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Run `resolver`, turning an error into an unknown value plus a diagnostic.
///
/// The caller decides how to report the diagnostic.
pub fn resolve_or_default<T>(
    what: &str,
    resolver: impl FnOnce() -> anyhow::Result<Option<T>>,
) -> Resolved<T> {
    match resolver() {
        Ok(value) => Resolved {
            value,
            diagnostic: None,
        },
        Err(err) => Resolved {
            value: None,
            diagnostic: Some(format!("Cannot get current {}: {:#}", what, err)),
        },
    }
}
