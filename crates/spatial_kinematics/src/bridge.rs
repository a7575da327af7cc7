//! # Engine Bridge
//!
//! Producer-side handle to a [`KinematicsEngine`] running on its own OS
//! thread. The bridge lets any number of async tasks talk to the engine
//! concurrently while the engine itself stays strictly single-threaded.
//!
//! ## Architecture
//!
//! ```text
//!  producers ──dispatch──▶ pending table (token → oneshot)
//!      │                          ▲
//!      ▼                          │ remove on receipt
//!  crossbeam inbox ──▶ engine thread ──▶ mpsc outbox ──▶ response router
//! ```
//!
//! * Each request is routed by a fresh [`RequestToken`] generated here. The
//!   routing token, the caller's token and a oneshot sender are inserted
//!   into the pending table before the request leaves. Caller-supplied
//!   tokens on raw requests are swapped out for the routing token.
//! * The engine thread services requests in arrival order and emits one
//!   response envelope per request.
//! * The response router looks the routing token up, removes the entry,
//!   restores the caller's token and completes the oneshot. Responses whose
//!   routing token is no longer pending (the caller timed out) are logged
//!   and dropped, so they can never reach a later request that reuses the
//!   caller's token.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use spatial_kinematics::{EngineBridge, EngineConfig, KinematicEntity, Vec3};
//!
//! # async fn example() -> Result<(), spatial_kinematics::BridgeError> {
//! let bridge = EngineBridge::spawn(EngineConfig::default())?;
//! bridge.init(Some(50.0)).await?;
//! bridge
//!     .process_entities(vec![KinematicEntity::new("ship-1", Vec3::ZERO)])
//!     .await?;
//!
//! let nearby = bridge.spatial_query(Vec3::ZERO, 25.0).await?;
//! assert_eq!(nearby.len(), 1);
//!
//! bridge.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::EngineConfig;
use crate::engine::{EngineStats, KinematicsEngine};
use crate::error::BridgeError;
use crate::protocol::{EngineRequest, EngineResponse, RequestEnvelope, RequestToken, ResponseEnvelope};
use crate::types::{CollisionCandidate, EntityId, KinematicEntity, Vec3};
use crossbeam::channel::{self, Receiver, Sender};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Timeout applied by [`EngineBridge::request`] and the typed helpers.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the OS thread hosting the engine.
const WORKER_THREAD_NAME: &str = "kinematics-engine";

type PendingTable = DashMap<RequestToken, PendingEntry>;

/// Caller waiting on a routed request.
#[derive(Debug)]
struct PendingEntry {
    /// Token the caller knows the request by
    token: RequestToken,
    sender: oneshot::Sender<ResponseEnvelope>,
}

/// Message delivered to the engine thread.
#[derive(Debug)]
enum WorkerMessage {
    /// Already-decoded request
    Typed(RequestEnvelope),
    /// Raw JSON from a transport; decoded and validated by the engine
    Raw(Value),
}

/// An in-flight request awaiting its response.
///
/// Returned by [`EngineBridge::dispatch`]. Awaiting is optional: dropping
/// the handle abandons the response, which the router then discards.
#[derive(Debug)]
pub struct PendingResponse {
    token: RequestToken,
    route: RequestToken,
    receiver: oneshot::Receiver<ResponseEnvelope>,
    pending: Arc<PendingTable>,
}

impl PendingResponse {
    /// The token correlating this request with its response.
    pub fn token(&self) -> &RequestToken {
        &self.token
    }

    /// Waits for the response without a time limit.
    pub async fn wait(self) -> Result<ResponseEnvelope, BridgeError> {
        self.receiver.await.map_err(|_| BridgeError::Disconnected)
    }

    /// Waits for the response for at most `timeout`.
    ///
    /// On expiry the token is removed from the pending table so the late
    /// response is discarded. The engine still completes the request.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<ResponseEnvelope, BridgeError> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_)) => Err(BridgeError::Disconnected),
            Err(_) => {
                self.pending.remove(&self.route);
                warn!("⏱️ Request {} timed out after {:?}", self.token, timeout);
                Err(BridgeError::Timeout {
                    token: self.token,
                    timeout,
                })
            }
        }
    }
}

/// Async front end for a [`KinematicsEngine`] hosted on a dedicated thread.
#[derive(Debug)]
pub struct EngineBridge {
    /// `None` once shutdown has begun
    inbox: Option<Sender<WorkerMessage>>,
    pending: Arc<PendingTable>,
    worker: Option<thread::JoinHandle<()>>,
    router: Option<tokio::task::JoinHandle<()>>,
    default_timeout: Duration,
}

impl EngineBridge {
    /// Starts the engine thread with [`DEFAULT_REQUEST_TIMEOUT`].
    ///
    /// Must be called from within a Tokio runtime, which hosts the
    /// response router.
    pub fn spawn(config: EngineConfig) -> Result<Self, BridgeError> {
        Self::spawn_with_timeout(config, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Starts the engine thread with a custom default request timeout.
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration, validated before anything starts
    /// * `default_timeout` - Bound used by [`request`](Self::request) and the typed helpers
    ///
    /// # Returns
    ///
    /// The running bridge, or an error if the configuration is invalid, no
    /// runtime is available or the thread cannot be spawned.
    pub fn spawn_with_timeout(config: EngineConfig, default_timeout: Duration) -> Result<Self, BridgeError> {
        config.validate().map_err(BridgeError::InvalidConfig)?;
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;

        let (inbox, requests) = channel::unbounded::<WorkerMessage>();
        let (outbox, responses) = mpsc::unbounded_channel::<ResponseEnvelope>();
        let pending: Arc<PendingTable> = Arc::new(DashMap::new());

        let engine = KinematicsEngine::new(config);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(engine, requests, outbox))?;

        let router = runtime.spawn(route_responses(responses, Arc::clone(&pending)));

        info!("🚀 Engine bridge started (default timeout {:?})", default_timeout);
        Ok(Self {
            inbox: Some(inbox),
            pending,
            worker: Some(worker),
            router: Some(router),
            default_timeout,
        })
    }

    /// Timeout applied by [`request`](Self::request) and the typed helpers.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Number of requests dispatched but not yet answered or abandoned.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Sends a request and returns a handle to await its response.
    pub fn dispatch(&self, request: EngineRequest) -> Result<PendingResponse, BridgeError> {
        let route = RequestToken::generate();
        let receiver = self.register(route.clone(), route.clone())?;
        self.submit(&route, WorkerMessage::Typed(RequestEnvelope::new(route.clone(), request)))?;

        Ok(PendingResponse {
            token: route.clone(),
            route,
            receiver,
            pending: Arc::clone(&self.pending),
        })
    }

    /// Sends a request and waits for its response using the default timeout.
    ///
    /// `error` responses are returned as [`BridgeError::Engine`].
    pub async fn request(&self, request: EngineRequest) -> Result<EngineResponse, BridgeError> {
        self.request_with_timeout(request, self.default_timeout).await
    }

    /// Sends a request and waits at most `timeout` for its response.
    pub async fn request_with_timeout(
        &self,
        request: EngineRequest,
        timeout: Duration,
    ) -> Result<EngineResponse, BridgeError> {
        let envelope = self.dispatch(request)?.wait_timeout(timeout).await?;
        match envelope.response {
            EngineResponse::Error { error } => Err(BridgeError::Engine(error)),
            response => Ok(response),
        }
    }

    /// Submits a raw JSON request and waits for it using the default timeout.
    ///
    /// The full response envelope is returned, including `error` responses,
    /// so a transport can relay it verbatim.
    pub async fn request_value(&self, value: Value) -> Result<ResponseEnvelope, BridgeError> {
        self.dispatch_value(value)?.wait_timeout(self.default_timeout).await
    }

    /// Submits a raw JSON request, as read by a transport.
    ///
    /// A token is generated when the message has none. The caller's token is
    /// echoed on the response but never used for routing, so it may repeat.
    /// Requests reach the engine in the order they are dispatched.
    pub fn dispatch_value(&self, mut value: Value) -> Result<PendingResponse, BridgeError> {
        let object = value
            .as_object_mut()
            .ok_or_else(|| BridgeError::InvalidPayload("request must be a JSON object".to_string()))?;

        let route = RequestToken::generate();
        let token = match object.get("token") {
            None | Some(Value::Null) => route.clone(),
            Some(Value::String(token)) => RequestToken::from(token.as_str()),
            Some(other) => {
                return Err(BridgeError::InvalidPayload(format!("token must be a string, got {other}")))
            }
        };
        object.insert("token".to_string(), Value::String(route.0.clone()));

        let receiver = self.register(route.clone(), token.clone())?;
        self.submit(&route, WorkerMessage::Raw(value))?;

        Ok(PendingResponse {
            token,
            route,
            receiver,
            pending: Arc::clone(&self.pending),
        })
    }

    // ========================================================================
    // Typed helpers
    // ========================================================================

    /// (Re)initializes the grid; `None` uses the configured default cell size.
    pub async fn init(&self, cell_size: Option<f64>) -> Result<(), BridgeError> {
        match self.request(EngineRequest::Init { cell_size }).await? {
            EngineResponse::ProcessedAck { .. } => Ok(()),
            other => Err(unexpected("processed-ack", &other)),
        }
    }

    /// Inserts or replaces entities, returning how many were ingested.
    pub async fn process_entities(&self, entities: Vec<KinematicEntity>) -> Result<usize, BridgeError> {
        match self.request(EngineRequest::ProcessEntities { entities }).await? {
            EngineResponse::ProcessedAck { count, .. } => Ok(count),
            other => Err(unexpected("processed-ack", &other)),
        }
    }

    /// Stops tracking entities, returning how many were actually tracked.
    pub async fn remove_entities(&self, entity_ids: Vec<EntityId>) -> Result<usize, BridgeError> {
        match self.request(EngineRequest::RemoveEntities { entity_ids }).await? {
            EngineResponse::ProcessedAck { count, .. } => Ok(count),
            other => Err(unexpected("processed-ack", &other)),
        }
    }

    pub async fn calculate_trajectories(
        &self,
        entity_ids: Vec<EntityId>,
        steps: usize,
        dt: f64,
    ) -> Result<HashMap<EntityId, Vec<Vec3>>, BridgeError> {
        let request = EngineRequest::CalculateTrajectories { entity_ids, steps, dt };
        match self.request(request).await? {
            EngineResponse::TrajectoriesResult { trajectories } => Ok(trajectories),
            other => Err(unexpected("trajectories-result", &other)),
        }
    }

    pub async fn spatial_query(&self, center: Vec3, radius: f64) -> Result<Vec<EntityId>, BridgeError> {
        match self.request(EngineRequest::SpatialQuery { center, radius }).await? {
            EngineResponse::QueryResult { results } => Ok(results),
            other => Err(unexpected("query-result", &other)),
        }
    }

    pub async fn predict_collisions(
        &self,
        time_window: f64,
        time_step: f64,
    ) -> Result<Vec<CollisionCandidate>, BridgeError> {
        let request = EngineRequest::PredictCollisions { time_window, time_step };
        match self.request(request).await? {
            EngineResponse::CollisionResult { collisions } => Ok(collisions),
            other => Err(unexpected("collision-result", &other)),
        }
    }

    pub async fn calculate_path(
        &self,
        start: Vec3,
        end: Vec3,
        obstacle_ids: Vec<EntityId>,
        clearance: Option<f64>,
    ) -> Result<Vec<Vec3>, BridgeError> {
        let request = EngineRequest::CalculatePath {
            start,
            end,
            obstacle_ids,
            clearance,
        };
        match self.request(request).await? {
            EngineResponse::PathResult { path } => Ok(path),
            other => Err(unexpected("path-result", &other)),
        }
    }

    pub async fn calculate_efficiency(
        &self,
        entity_ids: Vec<EntityId>,
        targets: HashMap<EntityId, Vec3>,
    ) -> Result<HashMap<EntityId, f64>, BridgeError> {
        let request = EngineRequest::CalculateEfficiency { entity_ids, targets };
        match self.request(request).await? {
            EngineResponse::EfficiencyResult { scores } => Ok(scores),
            other => Err(unexpected("efficiency-result", &other)),
        }
    }

    pub async fn stats(&self) -> Result<EngineStats, BridgeError> {
        match self.request(EngineRequest::GetStats).await? {
            EngineResponse::StatsResult { stats } => Ok(stats),
            other => Err(unexpected("stats-result", &other)),
        }
    }

    /// Stops the engine thread and waits for it to exit.
    ///
    /// Requests already queued are still serviced. Anything left pending
    /// afterwards fails with [`BridgeError::Disconnected`].
    pub async fn shutdown(mut self) -> Result<(), BridgeError> {
        info!("🛑 Shutting down engine bridge");
        self.inbox.take();

        let mut outcome = Ok(());
        if let Some(worker) = self.worker.take() {
            match tokio::task::spawn_blocking(move || worker.join()).await {
                Ok(Ok(())) => {}
                _ => {
                    error!("❌ Engine worker terminated abnormally");
                    outcome = Err(BridgeError::WorkerPanicked);
                }
            }
        }

        // The router drains once the worker has dropped its outbox.
        if let Some(router) = self.router.take() {
            if let Err(e) = router.await {
                warn!("response router ended abnormally: {}", e);
            }
        }

        let abandoned = self.pending.len();
        self.pending.clear();
        if abandoned > 0 {
            warn!("⚠️ {} requests were still pending at shutdown", abandoned);
        }

        info!("✅ Engine bridge stopped");
        outcome
    }

    fn register(
        &self,
        route: RequestToken,
        token: RequestToken,
    ) -> Result<oneshot::Receiver<ResponseEnvelope>, BridgeError> {
        if self.inbox.is_none() {
            return Err(BridgeError::Disconnected);
        }
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(route, PendingEntry { token, sender });
        Ok(receiver)
    }

    fn submit(&self, route: &RequestToken, message: WorkerMessage) -> Result<(), BridgeError> {
        let sent = match &self.inbox {
            Some(inbox) => inbox.send(message).is_ok(),
            None => false,
        };
        if sent {
            Ok(())
        } else {
            self.pending.remove(route);
            Err(BridgeError::Disconnected)
        }
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        // Closing the inbox lets the worker exit on its own; it is not joined here.
        if self.inbox.take().is_some() {
            debug!("engine bridge dropped without shutdown");
        }
    }
}

fn unexpected(expected: &'static str, actual: &EngineResponse) -> BridgeError {
    BridgeError::UnexpectedResponse {
        expected,
        actual: actual.kind(),
    }
}

/// Engine thread body: service requests until the inbox closes.
fn run_worker(
    mut engine: KinematicsEngine,
    requests: Receiver<WorkerMessage>,
    outbox: mpsc::UnboundedSender<ResponseEnvelope>,
) {
    info!("⚙️ Kinematics engine worker started");

    for message in requests.iter() {
        let envelope = match message {
            WorkerMessage::Typed(envelope) => engine.handle(envelope),
            WorkerMessage::Raw(value) => engine.handle_value(value),
        };
        if outbox.send(envelope).is_err() {
            warn!("response router is gone, stopping engine worker");
            break;
        }
    }

    info!(
        "Kinematics engine worker stopped after {} requests",
        engine.stats().requests_handled
    );
}

/// Completes pending requests as their responses arrive.
async fn route_responses(mut responses: mpsc::UnboundedReceiver<ResponseEnvelope>, pending: Arc<PendingTable>) {
    while let Some(mut envelope) = responses.recv().await {
        let Some(route) = envelope.token.take() else {
            debug!("discarding {} response without a token", envelope.response.kind());
            continue;
        };

        match pending.remove(&route) {
            Some((_, entry)) => {
                envelope.token = Some(entry.token.clone());
                if entry.sender.send(envelope).is_err() {
                    debug!("caller for {} went away before its response arrived", entry.token);
                }
            }
            None => debug!("discarding late response for abandoned route {}", route),
        }
    }
}
