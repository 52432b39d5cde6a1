use storefront_engine::processors::PaymentProcessorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the gateway: {0}")]
    RequestFailed(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The gateway response is missing {0}")]
    MissingField(&'static str),
}

impl From<GatewayApiError> for PaymentProcessorError {
    fn from(e: GatewayApiError) -> Self {
        match e {
            GatewayApiError::Initialization(s) => PaymentProcessorError::Configuration(s),
            GatewayApiError::RequestFailed(s) => PaymentProcessorError::NetworkError(s),
            GatewayApiError::QueryError { status, message } => {
                PaymentProcessorError::GatewayError(format!("{status}: {message}"))
            },
            e @ (GatewayApiError::JsonError(_) | GatewayApiError::MissingField(_)) => {
                PaymentProcessorError::InvalidResponse(e.to_string())
            },
        }
    }
}
