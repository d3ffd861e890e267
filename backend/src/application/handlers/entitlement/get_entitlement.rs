//! GetEntitlementHandler - Query handler for the caller's own account info.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, EntitlementRecord};
use crate::domain::foundation::Identity;
use crate::ports::EntitlementRepository;

/// Query for the entitlement bound to an identity.
#[derive(Debug, Clone)]
pub struct GetEntitlementQuery {
    pub identity: Identity,
}

pub type GetEntitlementResult = EntitlementRecord;

/// Handler for account info lookups.
///
/// Read-only; a missing record is `NotFound` rather than `None` because the
/// only caller renders it as a 404.
pub struct GetEntitlementHandler {
    repository: Arc<dyn EntitlementRepository>,
}

impl GetEntitlementHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetEntitlementQuery,
    ) -> Result<GetEntitlementResult, EntitlementError> {
        self.repository
            .find_by_identity(&query.identity)
            .await?
            .ok_or(EntitlementError::NotFound)
    }
}
