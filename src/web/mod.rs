mod error;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{debug, info, warn};

pub use error::WebError;

use crate::{
    config::GameConfig,
    game::{reduce, Effect, Event, GameState},
    identify::{GeminiIdentifier, Identification, IdentifyError},
    snapshot::{CodexEntry, GameSnapshot, TimeOfDay},
};

/// Owns the live game state and runs the timers the reducer asks for
pub struct GameRuntime {
    state: Mutex<GameState>,
    broadcaster: broadcast::Sender<String>,
}

impl GameRuntime {
    pub fn new(state: GameState) -> Arc<Self> {
        let (broadcaster, _) = broadcast::channel::<String>(256);
        Arc::new(Self {
            state: Mutex::new(state),
            broadcaster,
        })
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let guard = self.state.lock().expect("game state lock poisoned");
        GameSnapshot::capture(&guard, TimeOfDay::now())
    }

    pub fn state(&self) -> GameState {
        self.state.lock().expect("game state lock poisoned").clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    /// Apply one event, publish the resulting snapshot and start any timers.
    /// Snapshots go out while the state lock is held, so subscribers see them
    /// in the order the events were applied. Must run inside a tokio runtime.
    pub fn dispatch(self: &Arc<Self>, event: Event) -> GameSnapshot {
        let (snapshot, effects) = {
            let mut guard = self.state.lock().expect("game state lock poisoned");
            let transition = reduce(guard.clone(), event);
            *guard = transition.state;
            let snapshot = GameSnapshot::capture(&guard, TimeOfDay::now());
            match serde_json::to_string(&snapshot) {
                Ok(payload) => {
                    let _ = self.broadcaster.send(payload);
                }
                Err(err) => warn!("failed to encode snapshot: {err}"),
            }
            (snapshot, transition.effects)
        };

        for effect in effects {
            self.schedule(effect);
        }
        snapshot
    }

    fn schedule(self: &Arc<Self>, effect: Effect) {
        match effect {
            Effect::Schedule { ticket, delay } => {
                debug!(ticket = ticket.0, delay_ms = delay.as_millis() as u64, "timer started");
                let runtime = Arc::clone(self);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    runtime.dispatch(Event::TimerFired { ticket });
                });
            }
        }
    }
}

pub struct AppState {
    pub runtime: Arc<GameRuntime>,
    pub identifier: Option<Arc<GeminiIdentifier>>,
    pub api_key_env: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/events", post(apply_event))
        .route("/api/stream", get(stream_events))
        .route("/api/codex", get(codex))
        .route("/api/identify", post(identify))
        .with_state(state)
}

pub struct WebServerConfig {
    pub config: GameConfig,
    pub host: String,
    pub port: u16,
}

pub async fn run(server: WebServerConfig) -> Result<()> {
    let WebServerConfig { config, host, port } = server;

    let runtime = GameRuntime::new(
        GameState::from_config(&config).context("Invalid game config")?,
    );
    let identifier = match GeminiIdentifier::from_config(&config.identification) {
        Ok(identifier) => Some(Arc::new(identifier)),
        Err(IdentifyError::MissingApiKey(var)) => {
            warn!("{var} not set, /api/identify will answer 503");
            None
        }
        Err(err) => return Err(err).context("Failed to build identification client"),
    };

    let state = Arc::new(AppState {
        runtime,
        identifier,
        api_key_env: config.identification.api_key_env.clone(),
    });
    let router = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("PlantGo! live at http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<GameSnapshot> {
    Json(state.runtime.snapshot())
}

async fn apply_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<Event>,
) -> Json<GameSnapshot> {
    Json(state.runtime.dispatch(event))
}

async fn codex(State(state): State<Arc<AppState>>) -> Json<Vec<CodexEntry>> {
    Json(state.runtime.snapshot().codex)
}

#[derive(Deserialize)]
struct IdentifyRequest {
    image: String,
}

async fn identify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<Identification>, WebError> {
    let identifier = state
        .identifier
        .as_ref()
        .ok_or_else(|| IdentifyError::MissingApiKey(state.api_key_env.clone()))?;
    let identification = identifier.identify(&request.image).await?;
    Ok(Json(identification))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.runtime.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(SseEvent::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
