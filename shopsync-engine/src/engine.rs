use shopsync_core::api::ApiError;
use shopsync_shared::Order;

use crate::director::Director;
use crate::outcome::{Blocker, ProcessError, RefreshOutcome, RunError};

/// Per-order state transition entry point: dispatches to the assigned
/// provider manager and classifies the result.
pub struct OrderEngine {
    director: Director,
}

impl OrderEngine {
    pub fn new(director: Director) -> Self {
        Self { director }
    }

    /// Refresh one order. Blocking conditions, retryable declaration
    /// failures and carrier escalations come back as classified outcomes;
    /// credential rejections and marketplace transport errors are fatal to
    /// the run and propagate as `Err`.
    pub async fn refresh_order(
        &self,
        order: Order,
        initial: bool,
    ) -> Result<RefreshOutcome, RunError> {
        tracing::info!(order = %order, initial, "refreshing order");

        let manager = self.director.assign(&order);
        let status_before = order.status;
        let snapshot = order.clone();

        match manager.process_order(order, initial).await {
            Ok(refreshed) => {
                // A fallback manager that made no progress on an order's
                // first sighting means the carrier is simply unsupported;
                // surface that instead of silently retrying forever.
                if manager.is_fallback() && initial && refreshed.status == status_before {
                    return Ok(RefreshOutcome::Blocked {
                        order: refreshed,
                        blocker: Blocker::DeliveryProviderNotAllowed,
                    });
                }
                Ok(RefreshOutcome::Refreshed(refreshed))
            }
            Err(ProcessError::Blocked(blocker)) => Ok(RefreshOutcome::Blocked {
                order: snapshot,
                blocker,
            }),
            Err(ProcessError::DeclarationFailed(detail)) => Ok(RefreshOutcome::RetryDeclaration {
                order: snapshot,
                detail,
            }),
            Err(ProcessError::ProviderRejected(detail)) => Ok(RefreshOutcome::Escalate {
                order: snapshot,
                detail,
            }),
            Err(ProcessError::CredentialsExpired) => Err(RunError::CredentialsExpired),
            Err(ProcessError::Api(ApiError::Unauthorized)) => Err(RunError::CredentialsExpired),
            Err(ProcessError::Api(err)) => Err(RunError::Api(err)),
        }
    }
}
