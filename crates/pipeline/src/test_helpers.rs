//! Shared test doubles for pipeline tests.

use async_trait::async_trait;
use chatrelay_core::channel::MessagingGateway;
use chatrelay_core::error::{BroadcastError, DeliveryError, ProviderError, StoreError};
use chatrelay_core::event::Broadcaster;
use chatrelay_core::exchange::{BroadcastEvent, ExchangeRecord};
use chatrelay_core::message::{Message, MessageToolCall};
use chatrelay_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use chatrelay_core::store::AuditStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A provider that replays scripted results and records every request.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(vec![Ok(text_response(text))])
    }

    pub fn tool_call(name: &str, arguments: &str) -> Self {
        Self::new(vec![Ok(tool_call_response(vec![call(name, arguments)], ""))])
    }

    pub fn failing(err: ProviderError) -> Self {
        Self::new(vec![Err(err)])
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "ScriptedProvider: no more responses");
        responses.remove(0)
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "scripted-model".into(),
    }
}

pub fn call(name: &str, arguments: &str) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.into(),
        arguments: arguments.into(),
    }
}

pub fn tool_call_response(calls: Vec<MessageToolCall>, content: &str) -> ProviderResponse {
    let mut message = Message::assistant(content);
    message.tool_calls = calls;
    ProviderResponse {
        message,
        usage: None,
        model: "scripted-model".into(),
    }
}

/// A store that always fails.
pub struct FailingStore;

#[async_trait]
impl AuditStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn append(&self, _record: ExchangeRecord) -> Result<(), StoreError> {
        Err(StoreError::Storage("disk on fire".into()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(0)
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<ExchangeRecord>, StoreError> {
        Ok(vec![])
    }
}

/// A gateway that counts attempts and always fails.
#[derive(Default)]
pub struct FailingGateway {
    pub attempts: Mutex<usize>,
}

#[async_trait]
impl MessagingGateway for FailingGateway {
    fn name(&self) -> &str {
        "failing"
    }

    async fn send(&self, _from: &str, to: &str, _body: &str) -> Result<(), DeliveryError> {
        *self.attempts.lock().unwrap() += 1;
        Err(DeliveryError::Rejected {
            status: 400,
            message: format!("cannot reach {to}"),
        })
    }
}

/// A broadcaster that records events, or fails when told to.
#[derive(Default)]
pub struct RecordingBroadcaster {
    pub events: Mutex<Vec<(String, BroadcastEvent)>>,
    pub fail: bool,
}

impl RecordingBroadcaster {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<(String, BroadcastEvent)> {
        self.events.lock().unwrap().clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, channel: &str, event: &BroadcastEvent) -> Result<usize, BroadcastError> {
        if self.fail {
            return Err(BroadcastError::Closed);
        }
        self.events
            .lock()
            .unwrap()
            .push((channel.to_string(), event.clone()));
        Ok(1)
    }
}

/// Shared log of side-effect stages, in the order they happened.
pub type Journal = Arc<Mutex<Vec<&'static str>>>;

fn note(journal: &Journal, stage: &'static str) {
    journal.lock().unwrap().push(stage);
}

/// A store that only notes each append in the journal.
pub struct JournalingStore(pub Journal);

#[async_trait]
impl AuditStore for JournalingStore {
    fn name(&self) -> &str {
        "journaling"
    }

    async fn append(&self, _record: ExchangeRecord) -> Result<(), StoreError> {
        note(&self.0, "persist");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(0)
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<ExchangeRecord>, StoreError> {
        Ok(vec![])
    }
}

/// A gateway that takes `delay` to deliver, then notes it in the journal.
pub struct JournalingGateway {
    pub journal: Journal,
    pub delay: Duration,
}

#[async_trait]
impl MessagingGateway for JournalingGateway {
    fn name(&self) -> &str {
        "journaling"
    }

    async fn send(&self, _from: &str, _to: &str, _body: &str) -> Result<(), DeliveryError> {
        tokio::time::sleep(self.delay).await;
        note(&self.journal, "deliver");
        Ok(())
    }
}

/// A broadcaster that only notes each publish in the journal.
pub struct JournalingBroadcaster(pub Journal);

impl Broadcaster for JournalingBroadcaster {
    fn publish(&self, _channel: &str, _event: &BroadcastEvent) -> Result<usize, BroadcastError> {
        note(&self.0, "broadcast");
        Ok(0)
    }
}
