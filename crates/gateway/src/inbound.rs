//! `POST /whatsapp` — the inbound webhook.
//!
//! Twilio posts a form-encoded payload; only `From` and `Body` are read.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chatrelay_core::exchange::InboundMessage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct InboundForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body", default)]
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundResponse {
    pub message_sent: String,
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

fn error_response(status: StatusCode, kind: &str, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            kind: kind.to_string(),
        }),
    )
        .into_response()
}

pub async fn whatsapp_handler(
    State(state): State<SharedState>,
    form: Result<Form<InboundForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed inbound form");
            return error_response(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text());
        }
    };

    let Some(sender) = form.from.filter(|f| !f.trim().is_empty()) else {
        warn!("Inbound message without a sender");
        return error_response(StatusCode::BAD_REQUEST, "invalid_request", "missing 'From' field");
    };

    let msg = InboundMessage::new(sender, form.body.trim());
    info!(sender = %msg.sender, body_len = msg.body.len(), "WhatsApp message received");

    match state.pipeline.process_exchange(msg).await {
        Ok(outcome) => Json(InboundResponse {
            message_sent: outcome.message_sent,
            reply: outcome.reply,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e.kind(), e.to_string()),
    }
}
