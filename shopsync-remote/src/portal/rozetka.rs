use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use shopsync_core::scrape::{DeclarationScraper, ScrapeError};
use shopsync_shared::{Declaration, Order};

use super::{check_declaration_errors, required_str, PortalSession};

/// Rozetka Delivery keeps all shipment data on its own side; creating a
/// declaration only takes the order id.
pub struct RozetkaScraper {
    session: Arc<PortalSession>,
}

impl RozetkaScraper {
    pub fn new(session: Arc<PortalSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DeclarationScraper for RozetkaScraper {
    async fn generate_declaration(&self, order: &Order) -> Result<Declaration, ScrapeError> {
        tracing::info!(order = order.id, "generating Rozetka declaration");
        let owner_id = self.session.owner_id().await?;

        let info = self
            .session
            .post_json(
                "remote/delivery/rozetka_delivery/create_declaration",
                &json!({ "order_id": order.id }),
                order.id,
                owner_id,
            )
            .await?;
        check_declaration_errors(&info)?;

        Ok(Declaration {
            id: None,
            number: required_str(&info, "declarationId")?,
            cost: info.get("deliveryCost").and_then(Value::as_f64),
        })
    }
}
