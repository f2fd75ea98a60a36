//! Scripted text generators for pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{Completion, GatewayError, TextGenerator};

/// Returns the same outcome for every call and counts calls.
pub struct ScriptedGenerator {
    outcome: Result<String, GatewayError>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn ok(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(error: GatewayError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<Completion, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map(|text| Completion { text })
    }
}

/// Never answers and ignores its timeout, like a hung upstream connection.
pub struct HangingGenerator;

#[async_trait]
impl TextGenerator for HangingGenerator {
    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<Completion, GatewayError> {
        std::future::pending().await
    }
}

/// Panics on every call.
pub struct PanickingGenerator;

#[async_trait]
impl TextGenerator for PanickingGenerator {
    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<Completion, GatewayError> {
        panic!("generator blew up");
    }
}

/// Answers after `delay` and counts the calls that got that far.
pub struct SlowGenerator {
    delay: Duration,
    text: String,
    pub completed: AtomicUsize,
}

impl SlowGenerator {
    pub fn new(delay: Duration, text: &str) -> Self {
        Self {
            delay,
            text: text.to_string(),
            completed: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<Completion, GatewayError> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(Completion {
            text: self.text.clone(),
        })
    }
}
