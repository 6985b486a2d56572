//! Outbound messaging gateways for ChatRelay.
//!
//! - **Twilio** — WhatsApp delivery through the Twilio REST API
//! - **Log** — development gateway that only logs replies

pub mod log;
pub mod twilio;

use std::sync::Arc;
use std::time::Duration;

use chatrelay_config::MessagingConfig;
use chatrelay_core::channel::MessagingGateway;
use chatrelay_core::error::DeliveryError;
use tracing::warn;

pub use log::{LogGateway, SentMessage};
pub use twilio::{TwilioConfig, TwilioGateway};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the gateway described by `config`.
///
/// Falls back to [`LogGateway`] when Twilio credentials are absent.
pub fn build_from_config(config: &MessagingConfig) -> Result<Arc<dyn MessagingGateway>, DeliveryError> {
    if !config.has_credentials() {
        warn!("No Twilio credentials configured; replies will only be logged");
        return Ok(Arc::new(LogGateway::new()));
    }

    let twilio = TwilioGateway::new(
        TwilioConfig {
            account_sid: config.account_sid.clone().unwrap_or_default(),
            auth_token: config.auth_token.clone().unwrap_or_default(),
            api_url: config.api_url.clone(),
        },
        DELIVERY_TIMEOUT,
    )?;
    Ok(Arc::new(twilio))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_credentials_gives_log_gateway() {
        let gw = build_from_config(&MessagingConfig::default()).unwrap();
        assert_eq!(gw.name(), "log");
    }

    #[test]
    fn credentials_give_twilio_gateway() {
        let config = MessagingConfig {
            account_sid: Some("AC1".into()),
            auth_token: Some("tok".into()),
            from: "whatsapp:+1".into(),
            ..MessagingConfig::default()
        };
        let gw = build_from_config(&config).unwrap();
        assert_eq!(gw.name(), "twilio");
    }
}
