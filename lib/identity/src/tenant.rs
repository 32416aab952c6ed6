//! Request-scoped tenant binding.
//!
//! The tenant is bound with `TenantContext::scope`, which makes it visible
//! through `TenantContext::current()` only to the future it wraps. The
//! binding ends when that future completes, returns an error or panics,
//! so it can never leak into another request handled by the same worker.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;

tokio::task_local! {
    static CURRENT_TENANT: TenantContext;
}

/// The tenant a request executes on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    tenant_id: String,
}

impl TenantContext {
    #[must_use]
    pub fn new(tenant_id: String) -> Self {
        Self { tenant_id }
    }

    /// Derives the tenant from the profile's organization.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self::new(profile.organization().to_string())
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Runs `fut` with this tenant bound.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        tracing::debug!(tenant = %self.tenant_id, "binding tenant");
        CURRENT_TENANT.scope(self, fut).await
    }

    /// Returns the tenant bound to the running task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT_TENANT.try_with(Clone::clone).ok()
    }
}

impl fmt::Display for TenantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tenant_id)
    }
}
