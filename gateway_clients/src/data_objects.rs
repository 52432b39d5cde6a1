use std::collections::HashMap;

use serde::{Deserialize, Serialize};

//--------------------------------------        Stripe         -------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    /// `payment` or `subscription`
    #[serde(default)]
    pub mode: String,
    /// `paid`, `unpaid` or `no_payment_required`
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeCheckoutSession {
    pub fn is_paid(&self) -> bool {
        matches!(self.payment_status.as_str(), "paid" | "no_payment_required")
    }

    pub fn is_subscription(&self) -> bool {
        self.mode == "subscription"
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeRefund {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

//--------------------------------------        PayPal         -------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaypalToken {
    pub access_token: String,
    /// Lifetime of the token in seconds
    pub expires_in: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaypalLink {
    pub href: String,
    pub rel: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaypalCapture {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaypalPayments {
    #[serde(default)]
    pub captures: Vec<PaypalCapture>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaypalPurchaseUnit {
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub payments: Option<PaypalPayments>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaypalOrder {
    pub id: String,
    /// `CREATED`, `APPROVED`, `COMPLETED`, ...
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub links: Vec<PaypalLink>,
    #[serde(default)]
    pub purchase_units: Vec<PaypalPurchaseUnit>,
}

impl PaypalOrder {
    /// The link the buyer follows to approve the payment.
    pub fn approval_url(&self) -> Option<&str> {
        self.links.iter().find(|l| l.rel == "approve" || l.rel == "payer-action").map(|l| l.href.as_str())
    }

    pub fn custom_id(&self) -> Option<String> {
        self.purchase_units.iter().find_map(|u| u.custom_id.clone())
    }

    /// The first completed capture in the order.
    pub fn completed_capture(&self) -> Option<&PaypalCapture> {
        self.purchase_units
            .iter()
            .filter_map(|u| u.payments.as_ref())
            .flat_map(|p| p.captures.iter())
            .find(|c| c.status == "COMPLETED")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaypalRefund {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stripe_session_status() {
        let json = r#"{"id":"cs_1","mode":"payment","payment_status":"paid","payment_intent":"pi_1",
            "metadata":{"product_id":"course-1"}}"#;
        let session: StripeCheckoutSession = serde_json::from_str(json).unwrap();
        assert!(session.is_paid());
        assert!(!session.is_subscription());
        assert_eq!(session.metadata.get("product_id").map(String::as_str), Some("course-1"));
        let unpaid = StripeCheckoutSession { payment_status: "unpaid".into(), ..session };
        assert!(!unpaid.is_paid());
    }

    #[test]
    fn paypal_order_links_and_captures() {
        let json = r#"{
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "links": [
                {"href": "https://api.paypal.com/v2/checkout/orders/5O1", "rel": "self"},
                {"href": "https://www.paypal.com/checkoutnow?token=5O1", "rel": "approve"}
            ],
            "purchase_units": [{
                "reference_id": "SF-1",
                "custom_id": "product-9",
                "payments": {"captures": [{"id": "3C679366HH908993F", "status": "COMPLETED"}]}
            }]
        }"#;
        let order: PaypalOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.approval_url(), Some("https://www.paypal.com/checkoutnow?token=5O1"));
        assert_eq!(order.custom_id().as_deref(), Some("product-9"));
        assert_eq!(order.completed_capture().map(|c| c.id.as_str()), Some("3C679366HH908993F"));
    }
}
