//! The end-to-end message flow.
//!
//! One incoming message runs: qualify → FAQ shortcut → context window →
//! quota-guarded completion → chunked delivery → persist → cache. Every
//! failure path funnels into the fallback policy; nothing here ever
//! propagates an error to the channel surface.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use guildmind_core::channel::{Channel, ChannelMessage};
use guildmind_core::error::Error;
use guildmind_core::event::{DomainEvent, EventBus};
use guildmind_core::persona::Persona;
use guildmind_core::provider::{ChatMessage, CompletionRequest};
use guildmind_core::store::{qa_history, CachedAnswer, ContextStore, EphemeralCache};
use guildmind_core::turn::{ScopeId, Turn};
use guildmind_providers::RetryingClient;

use crate::faq;
use crate::format::{chunk, MAX_MESSAGE_LEN};

/// How many Q/A pairs to keep per user session.
const QA_HISTORY_CAP: usize = 20;

/// Orchestrates the handling of one incoming message end to end.
///
/// All collaborators are injected; the composition root owns their
/// lifecycles. Appends within one scope are serialized by a per-scope mutex
/// so two in-flight messages from the same guild cannot interleave their
/// turn-log writes.
pub struct Orchestrator {
    store: Arc<dyn ContextStore>,
    cache: Arc<dyn EphemeralCache>,
    client: RetryingClient,
    channel: Arc<dyn Channel>,
    events: Arc<EventBus>,
    persona: RwLock<Persona>,

    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    window_size: usize,
    message_limit: usize,
    qa_ttl: chrono::Duration,

    /// Only handle messages arriving in this chat, if set.
    listen_chat_id: Option<String>,

    scope_locks: Mutex<HashMap<ScopeId, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ContextStore>,
        cache: Arc<dyn EphemeralCache>,
        client: RetryingClient,
        channel: Arc<dyn Channel>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            cache,
            client,
            channel,
            events,
            persona: RwLock::new(Persona::default()),
            model: "gpt-4o-mini".into(),
            temperature: 1.0,
            max_tokens: Some(2000),
            window_size: 6,
            message_limit: MAX_MESSAGE_LEN,
            qa_ttl: chrono::Duration::hours(24),
            listen_chat_id: None,
            scope_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the bounded context window size (turns read per prompt).
    pub fn with_window_size(mut self, n: usize) -> Self {
        self.window_size = n;
        self
    }

    /// Set the transport's maximum message size.
    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.message_limit = limit;
        self
    }

    /// Set how long a cached Q/A pair stays answerable.
    pub fn with_qa_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.qa_ttl = ttl;
        self
    }

    /// Only respond to messages arriving in the given chat.
    pub fn with_listen_chat(mut self, chat_id: impl Into<String>) -> Self {
        self.listen_chat_id = Some(chat_id.into());
        self
    }

    pub fn with_persona(self, persona: Persona) -> Self {
        Self {
            persona: RwLock::new(persona),
            ..self
        }
    }

    /// Handle one incoming message. Never fails: every error resolves to a
    /// persona-consistent fallback line on the chat surface and full detail
    /// in the operational log.
    pub async fn handle_message(&self, msg: &ChannelMessage) {
        if msg.is_self {
            return;
        }
        if let Some(listen) = &self.listen_chat_id {
            if listen != &msg.chat_id {
                return;
            }
        }

        self.events.publish(DomainEvent::MessageReceived {
            scope_id: msg.scope_id.0,
            sender_id: msg.sender_id.clone(),
            content_preview: msg.content.chars().take(80).collect(),
            timestamp: Utc::now(),
        });

        // Serialize handling per scope so turn appends land in order.
        let lock = self.scope_lock(msg.scope_id).await;
        let _guard = lock.lock().await;

        if let Err(e) = self.respond(msg).await {
            error!(scope = %msg.scope_id, error = %e, "Message handling failed");
            self.send_fallback(msg, &e.to_string()).await;
        }
    }

    /// The happy-path flow; any error bubbles to `handle_message`'s fallback.
    async fn respond(&self, msg: &ChannelMessage) -> Result<(), Error> {
        let question = msg.content.clone();

        // ── FAQ shortcut ──
        let history = self.qa_history(&msg.sender_id).await;
        if let Some(answer) = faq::match_cached(&question, &history) {
            let answer = answer.to_string();
            info!(scope = %msg.scope_id, "Answering from session cache");
            self.events.publish(DomainEvent::CacheHit {
                scope_id: msg.scope_id.0,
                timestamp: Utc::now(),
            });

            self.deliver(msg, &answer).await?;
            // The question still feeds future windows; no new provider turn
            // exists to persist.
            self.append_best_effort(msg.scope_id, &Turn::user(&question)).await;
            return Ok(());
        }

        // ── Build the prompt: persona + window + new question ──
        let window = self.window_or_empty(msg.scope_id).await;
        let system_prompt = self.persona.read().await.system_prompt.clone();

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(window.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(&question));

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        // ── Completion ──
        let Some(response) = self.client.complete_or_none(request).await else {
            self.send_fallback(msg, "completion unavailable").await;
            return Ok(());
        };

        if response.text.is_empty() {
            self.send_fallback(msg, "provider returned an empty reply").await;
            return Ok(());
        }

        self.events.publish(DomainEvent::ResponseGenerated {
            scope_id: msg.scope_id.0,
            model: response.model.clone(),
            tokens_used: response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            timestamp: Utc::now(),
        });

        // ── Deliver, persist, cache ──
        self.deliver(msg, &response.text).await?;

        self.append_best_effort(msg.scope_id, &Turn::user(&question)).await;
        self.append_best_effort(msg.scope_id, &Turn::assistant(&response.text)).await;

        self.remember(&msg.sender_id, &question, &response.text, history).await;

        Ok(())
    }

    /// One-shot, context-free question (the `ask` command).
    pub async fn ask_once(&self, question: &str) -> Option<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(question)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        self.client.complete_or_none(request).await.map(|r| r.text)
    }

    /// Wipe a scope's turn log (the `clear` command).
    pub async fn clear_context(&self, scope: ScopeId) -> Result<(), Error> {
        self.store.clear(scope).await?;
        self.events.publish(DomainEvent::ContextCleared {
            scope_id: scope.0,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Swap the persona's system prompt at runtime (the `set-persona` command).
    pub async fn set_persona_prompt(&self, prompt: impl Into<String>) {
        let mut persona = self.persona.write().await;
        persona.system_prompt = prompt.into();
        info!("Persona system prompt updated");
    }

    /// Snapshot of the current persona.
    pub async fn persona(&self) -> Persona {
        self.persona.read().await.clone()
    }

    /// Send `text` as ordered chunks; the first chunk replies to the
    /// triggering message.
    async fn deliver(&self, msg: &ChannelMessage, text: &str) -> Result<(), Error> {
        let chunks = chunk(text, self.message_limit);
        debug!(scope = %msg.scope_id, chunks = chunks.len(), "Delivering reply");

        for (i, part) in chunks.iter().enumerate() {
            let reply_to = if i == 0 { msg.message_id.as_deref() } else { None };
            self.channel.send(&msg.chat_id, part, reply_to).await?;
        }
        Ok(())
    }

    /// Emit one uniformly random persona fallback line. Never propagates:
    /// if even this send fails there is nothing sensible left to do but log.
    async fn send_fallback(&self, msg: &ChannelMessage, reason: &str) {
        let line = {
            let persona = self.persona.read().await;
            persona
                .fallback_lines
                .choose(&mut rand::rng())
                .cloned()
                .unwrap_or_else(|| "Something broke on my end, sorry!".into())
        };

        warn!(scope = %msg.scope_id, reason, "Serving fallback line");
        self.events.publish(DomainEvent::FallbackServed {
            scope_id: msg.scope_id.0,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });

        if let Err(e) = self.channel.send(&msg.chat_id, &line, None).await {
            error!(scope = %msg.scope_id, error = %e, "Failed to deliver fallback line");
        }
    }

    /// Read the sender's Q/A history; a cache outage degrades the FAQ
    /// shortcut only.
    async fn qa_history(&self, sender_id: &str) -> Vec<CachedAnswer> {
        match self.cache.get(&qa_history::key(sender_id)).await {
            Ok(Some(raw)) => qa_history::decode(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Session cache unavailable, skipping FAQ shortcut");
                Vec::new()
            }
        }
    }

    /// Record a fresh Q/A pair, capping the per-user history.
    async fn remember(
        &self,
        sender_id: &str,
        question: &str,
        response: &str,
        mut history: Vec<CachedAnswer>,
    ) {
        history.push(CachedAnswer::new(question, response));
        if history.len() > QA_HISTORY_CAP {
            let excess = history.len() - QA_HISTORY_CAP;
            history.drain(..excess);
        }

        let encoded = qa_history::encode(&history);
        if let Err(e) = self
            .cache
            .put(&qa_history::key(sender_id), &encoded, self.qa_ttl)
            .await
        {
            warn!(error = %e, "Failed to cache Q/A pair");
        }
    }

    /// Read the context window, degrading to empty on a store outage: a
    /// persistence hiccup must never block a (context-free) reply.
    async fn window_or_empty(&self, scope: ScopeId) -> Vec<Turn> {
        match self.store.read_window(scope, self.window_size).await {
            Ok(window) => window,
            Err(e) => {
                warn!(scope = %scope, error = %e, "Context read failed, replying without history");
                Vec::new()
            }
        }
    }

    /// Append a turn, logging instead of failing on a store outage.
    async fn append_best_effort(&self, scope: ScopeId, turn: &Turn) {
        if let Err(e) = self.store.append(scope, turn).await {
            warn!(scope = %scope, error = %e, "Failed to persist turn");
        }
    }

    async fn scope_lock(&self, scope: ScopeId) -> Arc<Mutex<()>> {
        self.scope_locks
            .lock()
            .await
            .entry(scope)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
