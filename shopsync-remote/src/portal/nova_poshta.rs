use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use shopsync_core::scrape::{DeclarationScraper, ScrapeError};
use shopsync_shared::{Declaration, Order};

use super::{check_declaration_errors, required, required_str, PortalSession};

/// Nova Poshta declaration generator. The heaviest of the four: the
/// delivery-info endpoint wants the whole form the cabinet frontend would
/// have filled in, so most of the init payload is echoed back.
pub struct NovaPoshtaScraper {
    session: Arc<PortalSession>,
}

impl NovaPoshtaScraper {
    pub fn new(session: Arc<PortalSession>) -> Self {
        Self { session }
    }

    async fn init_data(&self, scraped: &Value) -> Result<Value, ScrapeError> {
        let payload = self
            .session
            .get_json(
                "remote/delivery/nova_poshta/init_data_order",
                &[
                    ("order_id", required_str(scraped, "id")?),
                    (
                        "delivery_option_id",
                        required_str(scraped, "delivery_option_raw_id")?,
                    ),
                    ("is_np_pochtomat", "true".to_string()),
                    (
                        "cart_total_price",
                        required_str(scraped, "cartTotalPriceInDefaultCurrency")?,
                    ),
                ],
            )
            .await?;
        required(&payload, "data").cloned()
    }

    async fn delivery_info(&self, scraped: &Value, init: &Value) -> Result<Value, ScrapeError> {
        let default_price = required(scraped, "cartTotalPriceInDefaultCurrency")?.clone();
        let default_payer = required_str(init, "payerType")?;

        let mut request = json!({
            "addition_info": "",
            "is_another_recipient": Value::Null,

            "delivery_option_id": required(scraped, "delivery_option_raw_id")?,
            "order_id": required(scraped, "id")?,

            "warehouse_name": required(init, "warehouseName")?,
            "warehouse_doc_id": required(init, "warehouseDocId")?,
            "warehouse_ref": required(init, "warehouse")?,

            "city_doc_id": required(init, "cityDocId")?,
            "city_ref": required(init, "city")?,
            "city_name": required(init, "cityName")?,

            "service_type": required(init, "serviceType")?,
            "np_payer_type": default_payer,

            "from_first_name": required(init, "firstName")?,
            "from_last_name": required(init, "lastName")?,
            "from_second_name": "",
            "phone": required(init, "phone")?,

            "description": required(init, "description")?,
            "sender_warehouse_ref": required(init, "warehouseFrom")?,
            "box_items": required(init, "boxItems")?,

            "is_redelivery_set": required(init, "isRedelivery")?,
            "redelivery_amount": init.get("redeliveryAmount").cloned()
                .unwrap_or_else(|| default_price.clone()),
            "redelivery_payment_type": "cash",
            "redelivery_payer_type": init.get("redeliveryPayerType").cloned()
                .unwrap_or_else(|| json!(default_payer)),

            "document_weight": init.get("documentWeight").cloned()
                .unwrap_or_else(|| json!("0.1")),
            "cargo_type": init.get("cargoType").cloned().unwrap_or_else(|| json!("Cargo")),

            "order_cost": init.get("packageCost").cloned()
                .unwrap_or_else(|| default_price.clone()),
            "cod_amount": init.get("cod_amount").cloned()
                .unwrap_or_else(|| json!(default_price.to_string())),
            "cod_payer_type": init.get("cod_payer_type").cloned()
                .unwrap_or_else(|| json!(default_payer.to_lowercase())),

            "send_date": init.get("sendDate").cloned()
                .unwrap_or(required(init, "dateModified")?.clone()),
        });

        // Present only when the cabinet already holds a draft declaration;
        // resubmitting without them would fork a second shipment.
        if let Some(declaration_id) = init.get("declarationId").filter(|v| !v.is_null()) {
            request["declaration_id"] = declaration_id.clone();
        }
        if let Some(was_printed) = init.get("wasPrinted").filter(|v| !v.is_null()) {
            request["was_printed"] = was_printed.clone();
        }

        let order_id = required(scraped, "id")?
            .as_i64()
            .ok_or_else(|| ScrapeError::MissingField("id".to_string()))?;
        let owner_id = required(init, "ownerId")?
            .as_i64()
            .ok_or_else(|| ScrapeError::MissingField("ownerId".to_string()))?;

        self.session
            .post_json(
                "market/application/nova_poshta/delivery_info",
                &request,
                order_id,
                owner_id,
            )
            .await
    }
}

#[async_trait]
impl DeclarationScraper for NovaPoshtaScraper {
    async fn generate_declaration(&self, order: &Order) -> Result<Declaration, ScrapeError> {
        tracing::info!(order = order.id, "generating Nova Poshta declaration");
        let scraped = self.session.get_order(order).await?;
        let init = self.init_data(&scraped).await?;
        let info = self.delivery_info(&scraped, &init).await?;
        check_declaration_errors(&info)?;

        let fields = required(&info, "fields")?;
        Ok(Declaration {
            id: match fields.get("declaration_id").filter(|v| !v.is_null()) {
                Some(_) => Some(required_str(fields, "declaration_id")?),
                None => None,
            },
            number: required_str(fields, "int_doc_number")?,
            cost: fields.get("delivery_cost").and_then(Value::as_f64),
        })
    }
}
