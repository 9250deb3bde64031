use std::sync::Arc;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::error::StreamError;
use crate::init::StreamConfig;
use crate::models::SearchRequest;
use crate::stream::events::decode;
use crate::stream::gate::AnimationGate;
use crate::stream::progress::{LogEntry, ProgressSettings, ProgressState};

// ============================================================================
// Hooks
// ============================================================================

/// Callbacks into the rendering layer.
///
/// The orchestrator only supplies data and timing; the implementor owns the
/// progress surface and the final page swap.
pub trait ProgressHooks: Send + Sync {
    /// One non-terminal event was folded into the session state. Fired
    /// synchronously per event, in arrival order.
    fn on_progress(&self, step: &str, percent: u8, entry: &LogEntry);

    /// The stream completed and the animation floor has passed. Fired at
    /// most once per session.
    fn on_complete(&self, payload: String);

    /// The transport failed. The session is over and will not retry. Fired
    /// at most once per session, never together with `on_complete`.
    fn on_error(&self, reason: String);
}

// ============================================================================
// Cancellation
// ============================================================================

/// Cooperative cancellation flag shared between a session task and its
/// owner.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<RwLock<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cancel(&self) {
        let mut cancelled = self.cancelled.write().await;
        *cancelled = true;
    }

    pub async fn is_cancelled(&self) -> bool {
        *self.cancelled.read().await
    }
}

// ============================================================================
// Session
// ============================================================================

pub type SessionId = Uuid;

/// Handle to one live stream session. Owns the consuming task; `cancel`
/// tears it down without firing any hook.
pub struct SessionHandle {
    id: SessionId,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn cancel(&self) {
        self.token.cancel().await;
        self.task.abort();
    }
}

/// Everything one spawned session task owns: the connection-to-be, the
/// gate, and the hook surface. Nothing here outlives the task.
struct StreamSession {
    http: reqwest::Client,
    url: Url,
    gate: AnimationGate,
    settings: ProgressSettings,
    hooks: Arc<dyn ProgressHooks>,
    token: CancellationToken,
}

impl StreamSession {
    async fn run(self) {
        let mut state = ProgressState::new();
        state.connect();

        let payload = match self.consume(&mut state).await {
            Ok(payload) => payload,
            Err(reason) => {
                state.fail(&reason);
                if !self.token.is_cancelled().await {
                    self.hooks.on_error(reason);
                }
                return;
            }
        };

        // The connection is already closed; all that is left is to honor
        // the animation floor before handing the payload off.
        let remaining = self.gate.remaining();
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
        if !self.token.is_cancelled().await {
            self.hooks.on_complete(payload);
        }
    }

    /// Drive the SSE connection until the terminal event. Returns the
    /// completion payload; any transport failure comes back as the reason
    /// handed to `on_error`.
    async fn consume(&self, state: &mut ProgressState) -> Result<String, String> {
        let response = self
            .http
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| format!("connection failed: {e}"))?;

        let response = response
            .error_for_status()
            .map_err(|e| format!("server rejected the stream: {e}"))?;

        let mut frames = response.bytes_stream().eventsource();

        while let Some(frame) = frames.next().await {
            if self.token.is_cancelled().await {
                return Err("session cancelled".to_string());
            }

            let frame = frame.map_err(|e| format!("stream dropped: {e}"))?;
            if frame.data.is_empty() {
                continue;
            }

            let event = match decode(&frame.data) {
                Ok(event) => event,
                Err(e) => {
                    // A bad frame is a server hiccup, not a reason to tear
                    // the stream down.
                    log::warn!("skipping frame: {e}");
                    continue;
                }
            };

            if event.is_terminal() {
                state.apply(event, &self.settings);
                // Close the connection right away; nothing after the
                // terminal event is processed even if it arrives.
                drop(frames);
                return state
                    .take_payload()
                    .ok_or_else(|| "completion payload missing".to_string());
            }

            state.apply(event, &self.settings);
            if let Some(entry) = state.last_entry() {
                self.hooks.on_progress(state.current_step(), state.percent(), entry);
            }
        }

        Err("stream ended before completion".to_string())
    }
}

// ============================================================================
// Search Client
// ============================================================================

/// Client-side orchestrator for the search progress stream.
///
/// At most one session is live per client: starting a new search first
/// cancels the previous session, and a preempted session fires no hooks.
pub struct SearchClient {
    http: reqwest::Client,
    config: StreamConfig,
    hooks: Arc<dyn ProgressHooks>,
    active: Mutex<Option<SessionHandle>>,
}

impl SearchClient {
    pub fn new(config: StreamConfig, hooks: Arc<dyn ProgressHooks>) -> Result<Self, StreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            config,
            hooks,
            active: Mutex::new(None),
        })
    }

    /// Open a new session, preempting any live one.
    pub async fn start(&self, request: SearchRequest) -> Result<SessionId, StreamError> {
        let url = self.stream_url(&request)?;

        let mut active = self.active.lock().await;
        if let Some(old) = active.take() {
            old.cancel().await;
        }

        let id = Uuid::now_v7();
        let token = CancellationToken::new();
        let session = StreamSession {
            http: self.http.clone(),
            url,
            gate: AnimationGate::start(self.config.minimum_animation),
            settings: self.config.progress.clone(),
            hooks: self.hooks.clone(),
            token: token.clone(),
        };
        let task = tokio::spawn(session.run());
        *active = Some(SessionHandle { id, token, task });

        log::debug!("stream session {id} started");
        Ok(id)
    }

    /// Cancel the live session, if any. No hook fires.
    pub async fn cancel(&self) {
        if let Some(session) = self.active.lock().await.take() {
            log::debug!("stream session {} cancelled", session.id());
            session.cancel().await;
        }
    }

    pub async fn has_active_session(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| !session.is_finished())
    }

    /// URL for one search: the endpoint path joined onto the base, the
    /// request flattened into query pairs.
    fn stream_url(&self, request: &SearchRequest) -> Result<Url, StreamError> {
        let mut url = Url::parse(&self.config.base_url)?.join(&self.config.endpoint_path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
