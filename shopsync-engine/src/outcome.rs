use shopsync_core::api::ApiError;
use shopsync_core::scrape::ScrapeError;
use shopsync_core::store::StoreError;
use shopsync_shared::Order;

/// Blocking-but-expected conditions: the order is not ready to progress and
/// is returned unchanged. Each maps to a one-time group notification gated
/// on the first observation, except the two log-only kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    NotAllowedStatus,
    DeliveryProviderNotAllowed,
    PaymentOptionDisabled,
    IncompletePayment,
    ReadyForDelivery,
    Stale,
    UnknownFinalization,
}

impl Blocker {
    pub fn reason(&self) -> &'static str {
        match self {
            Blocker::NotAllowedStatus => "order status cannot be processed",
            Blocker::DeliveryProviderNotAllowed => "delivery provider is not supported",
            Blocker::PaymentOptionDisabled => "payment option is not supported",
            Blocker::IncompletePayment => {
                "order awaits payment and will be processed once it arrives"
            }
            Blocker::ReadyForDelivery => "order already has a shipping declaration",
            Blocker::Stale => "order modification date is too old",
            Blocker::UnknownFinalization => "no known finalization path for the order",
        }
    }

    /// Stale and unknown-finalization orders stay in the logs; everything
    /// else is announced to the group chat once.
    pub fn notifies(&self) -> bool {
        !matches!(self, Blocker::Stale | Blocker::UnknownFinalization)
    }
}

/// Failure raised while a manager drives one order. Local control flow
/// between managers and the engine; the coordinator never sees this type.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("order cannot progress: {}", .0.reason())]
    Blocked(Blocker),

    #[error("declaration generation failed: {0}")]
    DeclarationFailed(String),

    #[error("carrier refused the shipment: {0}")]
    ProviderRejected(String),

    #[error("portal session credentials expired")]
    CredentialsExpired,

    #[error(transparent)]
    Api(ApiError),
}

impl From<ScrapeError> for ProcessError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::OutdatedCookies => ProcessError::CredentialsExpired,
            ScrapeError::MissingField(field) => {
                ProcessError::DeclarationFailed(format!("missing required field `{field}`"))
            }
            ScrapeError::WarehouseRejected(detail) => ProcessError::ProviderRejected(detail),
            ScrapeError::Transport(detail) => ProcessError::DeclarationFailed(detail),
        }
    }
}

impl From<ApiError> for ProcessError {
    fn from(err: ApiError) -> Self {
        ProcessError::Api(err)
    }
}

/// Classified result of refreshing one order. The coordinator pattern-matches
/// on this to decide notify/retry/ignore.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The order advanced, or legitimately had nothing to do yet.
    Refreshed(Order),
    /// Not ready to progress; returned unchanged.
    Blocked { order: Order, blocker: Blocker },
    /// Declaration generation failed; quarantine the id so the next run
    /// treats the order as fresh and retries.
    RetryDeclaration { order: Order, detail: String },
    /// Carrier rejected the fulfillment attempt for a structural reason;
    /// route to the on-call admins instead of the general channel.
    Escalate { order: Order, detail: String },
}

/// Failures fatal to the whole run. Nothing is persisted for the status
/// category that was in progress when one of these fires.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("authentication credentials expired; refresh the session cookies")]
    CredentialsExpired,

    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ApiError> for RunError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => RunError::CredentialsExpired,
            other => RunError::Api(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_errors_map_to_their_recovery_paths() {
        assert!(matches!(
            ProcessError::from(ScrapeError::OutdatedCookies),
            ProcessError::CredentialsExpired
        ));
        assert!(matches!(
            ProcessError::from(ScrapeError::MissingField("city_ref".into())),
            ProcessError::DeclarationFailed(_)
        ));
        assert!(matches!(
            ProcessError::from(ScrapeError::WarehouseRejected("branch closed".into())),
            ProcessError::ProviderRejected(_)
        ));
    }

    #[test]
    fn marketplace_auth_rejection_is_run_fatal() {
        assert!(matches!(
            RunError::from(ApiError::Unauthorized),
            RunError::CredentialsExpired
        ));
        assert!(matches!(
            RunError::from(ApiError::Transport("503".into())),
            RunError::Api(_)
        ));
    }

    #[test]
    fn silent_blockers_do_not_notify() {
        assert!(!Blocker::Stale.notifies());
        assert!(!Blocker::UnknownFinalization.notifies());
        assert!(Blocker::IncompletePayment.notifies());
        assert!(Blocker::ReadyForDelivery.notifies());
    }
}
