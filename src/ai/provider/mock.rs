//! Scripted provider for tests

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{LlmProvider, LlmResponse};
use crate::types::Result;

type Script = Box<dyn Fn(&str, &str) -> Result<String> + Send + Sync>;

/// Provider whose output is computed by a closure over (system, user)
pub(crate) struct ScriptedProvider {
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub(crate) fn from_fn<F>(script: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(move |_, _| Ok(text.clone()))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.script)(system, user).map(LlmResponse::content_only)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
