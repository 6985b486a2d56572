//! Twilio WhatsApp gateway.
//!
//! Replies are sent through the Twilio Messages REST API:
//! `POST {api_url}/2010-04-01/Accounts/{sid}/Messages.json` with a
//! form-encoded `From`, `To` and `Body`, authenticated with HTTP basic
//! auth (account SID / auth token).

use async_trait::async_trait;
use chatrelay_core::channel::MessagingGateway;
use chatrelay_core::error::DeliveryError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Twilio gateway credentials and endpoint.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Base URL, normally `https://api.twilio.com`.
    pub api_url: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Error body returned by Twilio on a rejected request.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Sends WhatsApp replies through Twilio.
pub struct TwilioGateway {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioGateway {
    pub fn new(config: TwilioConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        if config.account_sid.is_empty() || config.auth_token.is_empty() {
            return Err(DeliveryError::NotConfigured(
                "Twilio account SID and auth token are required".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl MessagingGateway for TwilioGateway {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, from: &str, to: &str, body: &str) -> Result<(), DeliveryError> {
        debug!(to = %to, body_len = body.len(), "Sending Twilio message");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("From", from), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|e| DeliveryError::DeliveryFailed {
                destination: to.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            info!(to = %to, "Reply delivered via Twilio");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<TwilioErrorBody>(&text) {
            Ok(TwilioErrorBody {
                code: Some(code),
                message: Some(message),
            }) => format!("{message} (code {code})"),
            Ok(TwilioErrorBody {
                message: Some(message),
                ..
            }) => message,
            _ => text,
        };

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn health_check(&self) -> Result<bool, DeliveryError> {
        Ok(!self.config.account_sid.is_empty() && !self.config.auth_token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Form, Router, http::StatusCode, routing::post};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

    /// Serve a fake Messages endpoint that answers with `status`.
    async fn fake_twilio(status: StatusCode, body: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();
        let app = Router::new().route(
            "/2010-04-01/Accounts/AC123/Messages.json",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(form);
                    (status, body)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    fn gateway(api_url: String) -> TwilioGateway {
        TwilioGateway::new(
            TwilioConfig {
                account_sid: "AC123".into(),
                auth_token: "secret".into(),
                api_url,
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let result = TwilioGateway::new(
            TwilioConfig {
                account_sid: String::new(),
                auth_token: "x".into(),
                api_url: "https://api.twilio.com".into(),
            },
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(DeliveryError::NotConfigured(_))));
    }

    #[test]
    fn messages_url_shape() {
        let gw = gateway("https://api.twilio.com/".into());
        assert_eq!(
            gw.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let gw = gateway("https://api.twilio.com".into());
        let dbg = format!("{:?}", gw.config);
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[tokio::test]
    async fn send_posts_form_fields() {
        let (url, captured) = fake_twilio(StatusCode::CREATED, r#"{"sid":"SM1"}"#).await;
        let gw = gateway(url);

        gw.send("whatsapp:+14155238886", "whatsapp:+15550001111", "hi there")
            .await
            .unwrap();

        let forms = captured.lock().unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0]["From"], "whatsapp:+14155238886");
        assert_eq!(forms[0]["To"], "whatsapp:+15550001111");
        assert_eq!(forms[0]["Body"], "hi there");
    }

    #[tokio::test]
    async fn rejection_surfaces_twilio_message() {
        let (url, _) = fake_twilio(
            StatusCode::BAD_REQUEST,
            r#"{"code":21211,"message":"Invalid 'To' Phone Number","status":400}"#,
        )
        .await;
        let gw = gateway(url);

        let err = gw.send("whatsapp:+1", "bogus", "x").await.unwrap_err();
        match err {
            DeliveryError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("Invalid 'To' Phone Number"));
                assert!(message.contains("21211"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_delivery_failure() {
        let gw = gateway("http://127.0.0.1:1".into());
        let err = gw.send("a", "b", "c").await.unwrap_err();
        assert!(matches!(err, DeliveryError::DeliveryFailed { .. }));
    }
}
