use std::time::Duration;

use log::*;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::GatewayApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client() -> Result<Client, GatewayApiError> {
    Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| GatewayApiError::Initialization(e.to_string()))
}

/// Sends `req` and deserializes a successful response body into `T`. Non-2xx responses are returned as
/// [`GatewayApiError::QueryError`] carrying the response body.
pub(crate) async fn rest_query<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GatewayApiError> {
    let response = req.send().await.map_err(|e| GatewayApiError::RequestFailed(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        trace!("💳️ Gateway query successful. {status}");
        response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
    } else {
        let message = response.text().await.unwrap_or_default();
        debug!("💳️ Gateway query failed. {status}. {message}");
        Err(GatewayApiError::QueryError { status: status.as_u16(), message })
    }
}

/// Joins a base URL and a path without doubling the slash between them.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoints_join_cleanly() {
        assert_eq!(endpoint("https://api.stripe.com/", "/v1/refunds"), "https://api.stripe.com/v1/refunds");
        assert_eq!(endpoint("https://api.stripe.com", "v1/refunds"), "https://api.stripe.com/v1/refunds");
    }
}
