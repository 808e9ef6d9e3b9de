use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use shopsync_core::scrape::{DeclarationScraper, ScrapeError};
use shopsync_shared::{Declaration, Order};

use super::{check_declaration_errors, required, required_str, PortalSession};

pub struct UkrPoshtaScraper {
    session: Arc<PortalSession>,
}

impl UkrPoshtaScraper {
    pub fn new(session: Arc<PortalSession>) -> Self {
        Self { session }
    }

    async fn init_data(&self, order: &Order) -> Result<Value, ScrapeError> {
        let payload = self
            .session
            .get_json(
                "remote/delivery/ukrposhta/init_data_order",
                &[
                    ("order_id", order.id.to_string()),
                    ("delivery_option_id", order.delivery_option.id.to_string()),
                ],
            )
            .await?;
        required(&payload, "data").cloned()
    }
}

#[async_trait]
impl DeclarationScraper for UkrPoshtaScraper {
    async fn generate_declaration(&self, order: &Order) -> Result<Declaration, ScrapeError> {
        tracing::info!(order = order.id, "generating Ukrposhta declaration");
        let owner_id = self.session.owner_id().await?;
        let scraped = self.session.get_order(order).await?;
        let init = self.init_data(order).await?;

        let default_price = required(&scraped, "cartTotalPriceInDefaultCurrency")?.clone();
        let request = json!({
            "order_id": order.id,
            "delivery_option_id": order.delivery_option.id.to_string(),
            "cart_total_price": init.get("cod_amount").cloned().unwrap_or(default_price),
        });

        let info = self
            .session
            .post_json(
                "remote/new_delivery/ukrposhta/generate_declaration",
                &request,
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
