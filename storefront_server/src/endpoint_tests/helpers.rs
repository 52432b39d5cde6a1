use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App, ResponseError};
use log::debug;

use crate::{errors::ServerError, middleware::ADMIN_KEY_HEADER};

pub const ADMIN_KEY: &str = "letmein";

/// Sends `req` to an app set up by `configure` and returns the status and body. Errors raised by middleware are
/// turned into responses, as the HTTP server would do.
pub async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub fn admin_get(path: &str) -> TestRequest {
    TestRequest::get().uri(path).insert_header((ADMIN_KEY_HEADER, ADMIN_KEY))
}

pub fn admin_post(path: &str) -> TestRequest {
    TestRequest::post().uri(path).insert_header((ADMIN_KEY_HEADER, ADMIN_KEY))
}

pub fn error_message(err: ServerError) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

#[::core::prelude::v1::test]
fn error_bodies_match_the_server_format() {
    let err = ServerError::Conflict("nope".into());
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert_eq!(error_message(err), r#"{"error":"nope"}"#);
}
