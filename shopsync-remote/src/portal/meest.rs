use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use shopsync_core::scrape::{DeclarationScraper, ScrapeError};
use shopsync_shared::{Declaration, Order};

use super::{check_declaration_errors, required, required_str, PortalSession};

pub struct MeestScraper {
    session: Arc<PortalSession>,
}

impl MeestScraper {
    pub fn new(session: Arc<PortalSession>) -> Self {
        Self { session }
    }

    async fn init_data(&self, order: &Order) -> Result<Value, ScrapeError> {
        let payload = self
            .session
            .get_json(
                "remote/new_delivery/meest_express/init_data_order",
                &[("order_id", order.id.to_string())],
            )
            .await?;
        required(&payload, "data").cloned()
    }
}

#[async_trait]
impl DeclarationScraper for MeestScraper {
    async fn generate_declaration(&self, order: &Order) -> Result<Declaration, ScrapeError> {
        tracing::info!(order = order.id, "generating Meest declaration");
        let owner_id = self.session.owner_id().await?;
        let init = self.init_data(order).await?;

        let order_data = required(&init, "orderData")?;
        let delivery_options = required(order_data, "delivery_options")?
            .as_array()
            .cloned()
            .unwrap_or_default();
        let sending_place = delivery_options
            .first()
            .and_then(|option| option.get("value"))
            .cloned()
            .ok_or_else(|| ScrapeError::MissingField("delivery_options".to_string()))?;

        let request = json!({
            "is_another_recipient": Value::Null,
            "payer": 1,
            "COD": 0,

            "order_id": order.id,
            "delivery_option_id": order.delivery_option.id.to_string(),

            "from_first_name": required(order_data, "firstName")?,
            "from_last_name": required(order_data, "lastName")?,
            "from_second_name": "",
            "phone": required(order_data, "phone")?,

            "city_ref": required(order_data, "cityRef")?,
            "city_name": required(order_data, "cityName")?,
            "city_doc_id": required(order_data, "cityDocId")?,

            "delivery_type": required(&init, "deliveryType")?,

            "branch_ref": required(order_data, "branchRef")?,
            "branch_name": required(order_data, "branchName")?,
            "warehouse_doc_id": required(order_data, "warehouseDocId")?,

            "places": required(order_data, "places")?,

            "sending_place": sending_place,
        });

        let info = self
            .session
            .post_json(
                "remote/new_delivery/meest_express/generate_declaration",
                &request,
                order.id,
                owner_id,
            )
            .await?;
        check_declaration_errors(&info)?;

        Ok(Declaration {
            id: None,
            number: required_str(&info, "declarationRef")?,
            cost: info.get("deliveryCost").and_then(Value::as_f64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_branch_field_maps_to_missing_field() {
        let order_data = serde_json::json!({"firstName": "A", "lastName": "B"});
        assert!(matches!(
            required(&order_data, "branchRef"),
            Err(ScrapeError::MissingField(field)) if field == "branchRef"
        ));
    }
}
