use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use serde_json::json;
use storefront_engine::{
    processors::PaymentProcessorError,
    CheckoutError,
    CourseError,
    FunnelError,
    MembershipError,
    OrderError,
    ProductError,
    StoreError,
};
use thiserror::Error;

use crate::email::EmailError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("The offer is not available at this time")]
    OfferClosed { redirect_url: Option<String> },
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
    #[error("Could not send email. {0}")]
    EmailError(#[from] EmailError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::OfferClosed { .. } => StatusCode::CONFLICT,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::EmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::OfferClosed { redirect_url } => json!({ "error": self.to_string(), "redirect_url": redirect_url }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(_) => Self::Conflict(e.to_string()),
            _ => {
                error!("💻️ Database error: {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<PaymentProcessorError> for ServerError {
    fn from(e: PaymentProcessorError) -> Self {
        match e {
            PaymentProcessorError::UnsupportedMethod(_) => Self::ValidationError(e.to_string()),
            PaymentProcessorError::Configuration(_) => Self::ConfigurationError(e.to_string()),
            PaymentProcessorError::GatewayError(_) |
            PaymentProcessorError::NetworkError(_) |
            PaymentProcessorError::InvalidResponse(_) => Self::GatewayError(e.to_string()),
        }
    }
}

impl From<OrderError> for ServerError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderError::Validation(_) | OrderError::NoOp => Self::ValidationError(e.to_string()),
            OrderError::TransitionForbidden { .. } |
            OrderError::AlreadyRefunded(_) |
            OrderError::NotArchived(_) |
            OrderError::CompletedOrderMustStayArchived(_) => Self::Conflict(e.to_string()),
            OrderError::PaymentProcessor(e) => e.into(),
            OrderError::StoreError(e) => e.into(),
        }
    }
}

impl From<FunnelError> for ServerError {
    fn from(e: FunnelError) -> Self {
        match e {
            FunnelError::Invalid(..) => Self::ValidationError(e.to_string()),
            FunnelError::SlugTaken(_) => Self::Conflict(e.to_string()),
            FunnelError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            FunnelError::StoreError(e) => e.into(),
        }
    }
}

impl From<MembershipError> for ServerError {
    fn from(e: MembershipError) -> Self {
        match e {
            MembershipError::Validation(_) => Self::ValidationError(e.to_string()),
            MembershipError::MembershipNotFound(_) |
            MembershipError::SubscriptionNotFound(_) |
            MembershipError::PageNotFound(_) => Self::NoRecordFound(e.to_string()),
            MembershipError::MembershipInactive(_) |
            MembershipError::SubscriptionEnded(_) |
            MembershipError::DuplicateSlug(_) => Self::Conflict(e.to_string()),
            MembershipError::StoreError(e) => e.into(),
        }
    }
}

impl From<CourseError> for ServerError {
    fn from(e: CourseError) -> Self {
        match e {
            CourseError::Validation(_) | CourseError::NotAQuiz(_) => Self::ValidationError(e.to_string()),
            CourseError::CourseNotFound(_) | CourseError::UnknownItem { .. } => Self::NoRecordFound(e.to_string()),
            CourseError::StoreError(e) => e.into(),
        }
    }
}

impl From<ProductError> for ServerError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::Validation(_) => Self::ValidationError(e.to_string()),
            ProductError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            ProductError::StoreError(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation(_) => Self::ValidationError(e.to_string()),
            CheckoutError::FunnelNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::FunnelInactive(_) => Self::OfferClosed { redirect_url: None },
            CheckoutError::WindowClosed { redirect_url } => Self::OfferClosed { redirect_url },
            CheckoutError::UnknownProduct(_) => Self::ValidationError(e.to_string()),
            CheckoutError::NoSession(_) | CheckoutError::AlreadyCompleted(_) | CheckoutError::NotPayable { .. } => {
                Self::Conflict(e.to_string())
            },
            CheckoutError::Order(e) => e.into(),
            CheckoutError::Funnel(e) => e.into(),
            CheckoutError::Membership(e) => e.into(),
            CheckoutError::Product(e) => e.into(),
            CheckoutError::PaymentProcessor(e) => e.into(),
            CheckoutError::StoreError(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use storefront_engine::{db_types::OrderStatusType, FunnelAction};

    use super::*;

    #[test]
    fn status_codes() {
        let e: ServerError = OrderError::NotArchived("SF-1".into()).into();
        assert_eq!(e.status_code(), StatusCode::CONFLICT);
        let e: ServerError =
            OrderError::TransitionForbidden { from: OrderStatusType::Refunded, to: OrderStatusType::Pending }.into();
        assert_eq!(e.status_code(), StatusCode::CONFLICT);
        let e: ServerError = FunnelError::Invalid(FunnelAction::Create, "Name ist erforderlich".into()).into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "Fehler beim Erstellen des Funnels: Name ist erforderlich");
        let e: ServerError = CheckoutError::PaymentProcessor(PaymentProcessorError::NetworkError("timeout".into())).into();
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
        let e: ServerError = MembershipError::PageNotFound("vip".into()).into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        let e: ServerError =
            CheckoutError::NotPayable { order_number: "SF-1".into(), status: OrderStatusType::Refunded }.into();
        assert_eq!(e.status_code(), StatusCode::CONFLICT);
        assert_eq!(e.to_string(), "Order SF-1 is refunded and can no longer be paid");
        let e: ServerError = CheckoutError::UnknownProduct("mystery-box".into()).into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn closed_offers_carry_the_redirect() {
        let e: ServerError = CheckoutError::WindowClosed { redirect_url: Some("https://shop.example/late".into()) }.into();
        let res = e.error_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
