//! actix-web glue for relays that serve the adaptor directly.

use crate::{error::RelayError, models::GenerationResult};
use actix_web::{http::StatusCode, HttpResponse};

pub fn image_response(result: &GenerationResult) -> HttpResponse {
    match result.to_json_bytes() {
        Ok(body) => HttpResponse::Ok()
            .content_type("application/json")
            .body(body),
        Err(e) => error_response(&e),
    }
}

pub fn error_response(err: &RelayError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(err.to_envelope())
}
