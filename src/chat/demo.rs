use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use super::backend::ChatBackend;
use super::responses::select_reply;
use super::ChatError;
use crate::client::{IdGenerator, TimestampIdGenerator, MESSAGE_ID_PREFIX};
use crate::config::ChatLimits;
use crate::models::{ChatReply, ChatRequest, Usage};

pub const DEMO_MODEL: &str = "demo-mode";

/// Random extra thinking time, as a multiple of the base delay.
const JITTER_FACTOR: u32 = 2;

/// Offline bot answering from the canned reply table after a simulated
/// "thinking" delay of `base_delay + rand(0..jitter)`.
#[derive(Clone)]
pub struct DemoBackend {
    ids: Arc<dyn IdGenerator>,
    base_delay: Duration,
    jitter: Duration,
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoBackend {
    /// Thinks for 1000 + rand(0..2000) ms.
    pub fn new() -> Self {
        Self::from_limits(&ChatLimits::default())
    }

    /// Thinks for `typing_delay` plus up to twice that again.
    pub fn from_limits(limits: &ChatLimits) -> Self {
        let jitter = limits
            .typing_delay
            .checked_mul(JITTER_FACTOR)
            .unwrap_or(Duration::MAX);
        Self::with_delay(limits.typing_delay, jitter)
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    pub fn with_delay(base_delay: Duration, jitter: Duration) -> Self {
        Self {
            ids: Arc::new(TimestampIdGenerator),
            base_delay,
            jitter,
        }
    }

    /// No delay at all.
    pub fn instant() -> Self {
        Self::with_delay(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Build the reply for `request` without waiting.
    pub fn reply_to(&self, request: &ChatRequest) -> ChatReply {
        let reply = select_reply(&request.message, &mut rand::thread_rng()).to_string();
        let prompt_tokens = request.message.chars().count() as u64;
        let completion_tokens = reply.chars().count() as u64;

        ChatReply {
            reply,
            message_id: Some(self.ids.generate(MESSAGE_ID_PREFIX)),
            conversation_id: Some(request.conversation_id.clone()),
            timestamp: Some(Utc::now().to_rfc3339()),
            model: Some(DEMO_MODEL.to_string()),
            usage: Some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        }
    }

    fn thinking_time(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base_delay;
        }
        self.base_delay
            .saturating_add(Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms)))
    }
}

#[async_trait]
impl ChatBackend for DemoBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let delay = self.thinking_time();
        tracing::debug!(
            conversation_id = %request.conversation_id,
            delay_ms = delay.as_millis() as u64,
            "Demo reply"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply_to(request))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn is_demo(&self) -> bool {
        true
    }
}
