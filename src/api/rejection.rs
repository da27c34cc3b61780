use std::convert::Infallible;

use serde_json::{json, Value};
use warp::{
    filters::body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, Rejection,
        UnsupportedMediaType,
    },
    reply::{self, Reply},
};

use crate::error::ApiError;

fn json_error(body: Value, status: StatusCode) -> reply::Response {
    reply::with_status(reply::json(&body), status).into_response()
}

fn detail(message: &str, status: StatusCode) -> reply::Response {
    json_error(json!({ "detail": message }), status)
}

/// Turns every rejection into a JSON error body.
pub async fn handle_rejection(err: Rejection) -> Result<reply::Response, Infallible> {
    if let Some(e) = err.find::<ApiError>() {
        return Ok(json_error(e.body(), e.status()));
    }
    if err.is_not_found() {
        return Ok(detail("Not found.", StatusCode::NOT_FOUND));
    }
    if let Some(e) = err.find::<BodyDeserializeError>() {
        log::debug!("Rejected body: {e}");
        return Ok(detail(
            &format!("JSON parse error - {e}"),
            StatusCode::BAD_REQUEST,
        ));
    }
    if let Some(e) = err.find::<InvalidQuery>() {
        return Ok(json_error(
            json!({ "errors": e.to_string() }),
            StatusCode::BAD_REQUEST,
        ));
    }
    if err.find::<PayloadTooLarge>().is_some() {
        return Ok(detail(
            "Request body is too large.",
            StatusCode::PAYLOAD_TOO_LARGE,
        ));
    }
    if err.find::<LengthRequired>().is_some() {
        return Ok(detail(
            "Content-Length header is required.",
            StatusCode::LENGTH_REQUIRED,
        ));
    }
    if err.find::<UnsupportedMediaType>().is_some() {
        return Ok(detail(
            "Unsupported media type in request.",
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ));
    }
    if err.find::<MethodNotAllowed>().is_some() {
        return Ok(detail(
            "Method not allowed.",
            StatusCode::METHOD_NOT_ALLOWED,
        ));
    }

    log::error!("Unhandled rejection: {err:?}");
    Ok(detail(
        "Internal server error.",
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}

#[cfg(test)]
mod tests {
    use warp::hyper::body::to_bytes;

    use super::*;

    async fn render(err: Rejection) -> (StatusCode, Value) {
        let response = handle_rejection(err).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body()).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn api_errors_keep_their_shape() {
        let (status, body) = render(ApiError::invalid("tags", "This list may not be empty.").into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "tags": ["This list may not be empty."] }));
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let (status, body) = render(warp::reject::not_found()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Not found." }));
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = render(ApiError::Internal(String::from("pool closed")).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": "Internal server error." }));
    }
}
