use std::fmt::Display;

use chrono::{DateTime, Utc};
use storefront_engine::db_types::{Membership, Order, OrderStatusType, Subscription};

const STYLE: &str = "body{margin:0;padding:0;background:#f4f4f5;font-family:Helvetica,Arial,sans-serif;color:#18181b}\
.wrapper{max-width:600px;margin:0 auto;padding:24px}\
.card{background:#ffffff;border-radius:8px;padding:32px}\
h1{font-size:22px;margin:0 0 16px 0}\
p{font-size:15px;line-height:1.5;margin:0 0 12px 0}\
table{width:100%;border-collapse:collapse;margin:16px 0}\
th,td{text-align:left;padding:8px;border-bottom:1px solid #e4e4e7;font-size:14px}\
td.amount,th.amount{text-align:right}\
.total td{font-weight:bold;border-bottom:none}\
.button{display:inline-block;background:#2563eb;color:#ffffff;text-decoration:none;padding:12px 20px;border-radius:6px}\
.footer{font-size:12px;color:#71717a;text-align:center;margin-top:16px}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    OrderConfirmation,
    PaymentReceipt,
    MembershipActivation,
    StatusUpdate,
}

impl Display for EmailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailTemplate::OrderConfirmation => f.write_str("order confirmation"),
            EmailTemplate::PaymentReceipt => f.write_str("payment receipt"),
            EmailTemplate::MembershipActivation => f.write_str("membership activation"),
            EmailTemplate::StatusUpdate => f.write_str("status update"),
        }
    }
}

/// The data each template is rendered from.
#[derive(Debug, Clone)]
pub enum EmailMessage {
    OrderConfirmation { order: Order },
    PaymentReceipt { order: Order },
    MembershipActivation { subscription: Subscription, membership: Membership },
    StatusUpdate { order: Order, old_status: OrderStatusType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Escapes the characters that are significant in HTML text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn german_status(status: OrderStatusType) -> &'static str {
    match status {
        OrderStatusType::Pending => "Ausstehend",
        OrderStatusType::Processing => "In Bearbeitung",
        OrderStatusType::OnHold => "Zurückgestellt",
        OrderStatusType::Completed => "Abgeschlossen",
        OrderStatusType::Cancelled => "Storniert",
        OrderStatusType::Refunded => "Erstattet",
        OrderStatusType::Failed => "Fehlgeschlagen",
    }
}

fn date(d: DateTime<Utc>) -> String {
    d.format("%d.%m.%Y").to_string()
}

fn layout(title: &str, body: &str, shop_url: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title><style>{STYLE}</style></head>\
         <body><div class=\"wrapper\"><div class=\"card\">{body}</div>\
         <div class=\"footer\"><a href=\"{url}\">{url}</a></div></div></body></html>",
        title = escape_html(title),
        url = escape_html(shop_url),
    )
}

fn items_table(order: &Order) -> String {
    let rows = order
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td class=\"amount\">{} {}</td></tr>",
                escape_html(&item.product_name),
                item.quantity,
                item.line_total,
                escape_html(&order.currency)
            )
        })
        .collect::<String>();
    format!(
        "<table><tr><th>Produkt</th><th>Menge</th><th class=\"amount\">Betrag</th></tr>{rows}\
         <tr class=\"total\"><td colspan=\"2\">Gesamt</td><td class=\"amount\">{} {}</td></tr></table>",
        order.total,
        escape_html(&order.currency)
    )
}

impl EmailMessage {
    pub fn template(&self) -> EmailTemplate {
        match self {
            EmailMessage::OrderConfirmation { .. } => EmailTemplate::OrderConfirmation,
            EmailMessage::PaymentReceipt { .. } => EmailTemplate::PaymentReceipt,
            EmailMessage::MembershipActivation { .. } => EmailTemplate::MembershipActivation,
            EmailMessage::StatusUpdate { .. } => EmailTemplate::StatusUpdate,
        }
    }

    /// The customer this message is meant for. Subscriptions are keyed by the customer's email address.
    pub fn recipient(&self) -> &str {
        match self {
            EmailMessage::OrderConfirmation { order } |
            EmailMessage::PaymentReceipt { order } |
            EmailMessage::StatusUpdate { order, .. } => &order.customer_email,
            EmailMessage::MembershipActivation { subscription, .. } => &subscription.user_id,
        }
    }

    pub fn render(&self, shop_url: &str) -> RenderedEmail {
        match self {
            EmailMessage::OrderConfirmation { order } => {
                let subject = format!("Bestellbestätigung {}", order.order_number);
                let body = format!(
                    "<h1>Vielen Dank für Ihre Bestellung!</h1><p>Hallo {},</p>\
                     <p>wir haben Ihre Bestellung <strong>{}</strong> vom {} erhalten.</p>{}\
                     <p>Sobald Ihre Zahlung eingegangen ist, erhalten Sie eine Zahlungsbestätigung.</p>",
                    escape_html(&order.customer_name),
                    escape_html(&order.order_number),
                    date(order.created_at),
                    items_table(order)
                );
                RenderedEmail { html: layout(&subject, &body, shop_url), subject }
            },
            EmailMessage::PaymentReceipt { order } => {
                let subject = format!("Zahlungsbestätigung für Bestellung {}", order.order_number);
                let paid = order.date_paid.unwrap_or(order.updated_at);
                let method = order.payment_method.map(|m| m.to_string()).unwrap_or_else(|| "manuell".to_string());
                let body = format!(
                    "<h1>Zahlung erhalten</h1><p>Hallo {},</p>\
                     <p>Ihre Zahlung für die Bestellung <strong>{}</strong> ist am {} eingegangen \
                     (Zahlungsart: {}).</p>{}",
                    escape_html(&order.customer_name),
                    escape_html(&order.order_number),
                    date(paid),
                    escape_html(&method),
                    items_table(order)
                );
                RenderedEmail { html: layout(&subject, &body, shop_url), subject }
            },
            EmailMessage::MembershipActivation { subscription, membership } => {
                let subject = format!("Ihre Mitgliedschaft {} ist aktiv", membership.name);
                let features = if membership.features.is_empty() {
                    String::new()
                } else {
                    let items = membership
                        .features
                        .iter()
                        .map(|f| format!("<li>{}</li>", escape_html(f)))
                        .collect::<String>();
                    format!("<p>Ihre Vorteile:</p><ul>{items}</ul>")
                };
                let body = format!(
                    "<h1>Willkommen!</h1><p>Ihre Mitgliedschaft <strong>{}</strong> ist vom {} bis zum {} gültig.</p>\
                     {features}<p><a class=\"button\" href=\"{}\">Zum Mitgliederbereich</a></p>",
                    escape_html(&membership.name),
                    date(subscription.start_date),
                    date(subscription.end_date),
                    escape_html(shop_url)
                );
                RenderedEmail { html: layout(&subject, &body, shop_url), subject }
            },
            EmailMessage::StatusUpdate { order, old_status } => {
                let subject = format!("Statusänderung Ihrer Bestellung {}", order.order_number);
                let body = format!(
                    "<h1>Ihre Bestellung wurde aktualisiert</h1><p>Hallo {},</p>\
                     <p>der Status Ihrer Bestellung <strong>{}</strong> hat sich von <em>{}</em> auf \
                     <strong>{}</strong> geändert.</p>",
                    escape_html(&order.customer_name),
                    escape_html(&order.order_number),
                    german_status(*old_status),
                    german_status(order.status)
                );
                RenderedEmail { html: layout(&subject, &body, shop_url), subject }
            },
        }
    }
}
