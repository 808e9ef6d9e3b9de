//! Notification text rendering. Every per-order message carries the order
//! reference, status, delivery and payment method, and a console deep link.

use shopsync_core::api::order_console_url;
use shopsync_shared::{Declaration, Order};

use crate::outcome::Blocker;

const RULE: &str = "------------------------------";

fn payment_label(order: &Order) -> String {
    order
        .payment_option
        .as_ref()
        .map(|option| option.name.clone())
        .unwrap_or_else(|| "not specified".to_string())
}

/// Body for a blocking-but-expected condition, announced once per first
/// observation.
pub fn blocked(order: &Order, blocker: Blocker) -> String {
    format!(
        "Order {summary}\n{RULE}\n\
         Cannot be processed.\n\
         Reason: {reason}.\n\
         Order status: {status}.\n\
         Delivery provider: {provider}.\n\
         Payment option: {payment}.\n\
         {RULE}\n\
         Order details: {url}",
        summary = order.summary(),
        reason = blocker.reason(),
        status = order.status,
        provider = order.delivery_option,
        payment = payment_label(order),
        url = order_console_url(order.id),
    )
}

/// Body for a retryable declaration-generation failure.
pub fn declaration_failed(order: &Order) -> String {
    format!(
        "Order {summary}\n{RULE}\n\
         Declaration generation failed.\n\
         Wait for the next attempt or process the order manually.\n\
         Order status: {status}.\n\
         Delivery provider: {provider}.\n\
         Payment option: {payment}.\n\
         {RULE}\n\
         Order details: {url}",
        summary = order.summary(),
        status = order.status,
        provider = order.delivery_option,
        payment = payment_label(order),
        url = order_console_url(order.id),
    )
}

/// Body for an admin escalation: the carrier refused the shipment for a
/// structural reason an operator has to resolve.
pub fn escalation(order: &Order, detail: &str) -> String {
    format!(
        "Order {summary}\n{RULE}\n\
         Carrier refused the shipment: {detail}.\n\
         Order status: {status}.\n\
         Delivery provider: {provider}.\n\
         Payment option: {payment}.\n\
         {RULE}\n\
         Order details: {url}",
        summary = order.summary(),
        status = order.status,
        provider = order.delivery_option,
        payment = payment_label(order),
        url = order_console_url(order.id),
    )
}

/// Body for a successful transition (accepted, completed or canceled),
/// including the fresh declaration when one was just generated.
pub fn refreshed(order: &Order, declaration: Option<&Declaration>) -> String {
    let mut body = format!(
        "Order {summary} is now {status}\n{RULE}\n",
        summary = order.summary(),
        status = order.status,
    );

    if let Some(notes) = order.client_notes.as_deref().filter(|n| !n.is_empty()) {
        body.push_str(&format!("Comment: {notes}\n"));
    }

    body.push_str(&format!("Order status: {}\n", order.status));

    if let Some(status) = order.unified_status() {
        body.push_str(&format!("Delivery status: {status}\n"));
    }

    body.push_str(&format!("Payment option: {}\n", payment_label(order)));

    if let Some(status) = order.payment_status() {
        body.push_str(&format!("Payment status: {status}\n"));
    }

    body.push_str(&format!(
        "Delivery ({provider}): {address}\n",
        provider = order.delivery_option,
        address = order.delivery_address,
    ));

    if let Some(declaration) = declaration {
        let cost = declaration
            .cost
            .map(|cost| cost.to_string())
            .unwrap_or_else(|| "not specified".to_string());
        body.push_str(&format!(
            "Declaration {number}, cost: {cost}\n",
            number = declaration.number,
        ));
    }

    body.push_str(&format!(
        "{RULE}\nOrder details: {}",
        order_console_url(order.id)
    ));
    body
}

/// Single top-level message for the fatal credentials path, distinct from
/// every per-order failure.
pub fn credentials_expired() -> String {
    "Authentication credentials expired. The session cookies need to be refreshed.\n\
     Processing of new orders is currently not possible."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::OrderFixture;
    use shopsync_shared::OrderStatus;

    #[test]
    fn blocked_message_names_reason_and_link() {
        let order = OrderFixture::new(100).status(OrderStatus::Pending).build();
        let text = blocked(&order, Blocker::IncompletePayment);
        assert!(text.contains("awaits payment"));
        assert!(text.contains("my.prom.ua/cms/order/edit/100"));
        assert!(text.contains("Delivery provider:"));
    }

    #[test]
    fn refreshed_message_includes_declaration() {
        let order = OrderFixture::new(7).status(OrderStatus::Received).build();
        let declaration = Declaration {
            id: None,
            number: "204001".to_string(),
            cost: Some(85.0),
        };
        let text = refreshed(&order, Some(&declaration));
        assert!(text.contains("Declaration 204001, cost: 85"));
        assert!(text.contains("is now accepted"));
    }
}
