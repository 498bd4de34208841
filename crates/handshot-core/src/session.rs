//! Sensor-session capability: lifecycle, authorization and the three
//! anchor/event streams the pipeline consumes.

use std::fmt;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::anchor::{AnchorUpdate, HandAnchor, MeshAnchor};

/// Data providers the session can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataProviderKind {
    HandTracking,
    SceneReconstruction,
}

impl fmt::Display for DataProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandTracking => write!(f, "hand-tracking"),
            Self::SceneReconstruction => write!(f, "scene-reconstruction"),
        }
    }
}

/// Lifecycle state of a data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProviderState {
    Initialized,
    Running,
    Paused,
    Stopped,
}

/// Which sensor permission an authorization event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationType {
    HandTracking,
    WorldSensing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Allowed,
    Denied,
}

/// Session-level event
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AuthorizationChanged {
        authorization: AuthorizationType,
        status: AuthorizationStatus,
    },
    DataProviderStateChanged {
        providers: Vec<DataProviderKind>,
        new_state: DataProviderState,
        error: Option<String>,
    },
    /// An event kind this build does not know how to handle
    Unrecognized { kind: String },
}

/// Failures starting or driving a sensor session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Data provider not supported on this device: {0}")]
    Unsupported(DataProviderKind),

    #[error("Data provider not ready: {0}")]
    NotReady(DataProviderKind),

    #[error("Authorization denied for {0}")]
    AuthorizationDenied(DataProviderKind),

    #[error("Session is already running")]
    AlreadyRunning,

    #[error("Session streams were already taken")]
    StreamsTaken,

    #[error("Session failure: {0}")]
    Runtime(String),
}

pub type HandUpdates = BoxStream<'static, AnchorUpdate<HandAnchor>>;
pub type MeshUpdates = BoxStream<'static, AnchorUpdate<MeshAnchor>>;
pub type SessionEvents = BoxStream<'static, SessionEvent>;

/// The three independent, non-restartable streams of a running session
pub struct SessionStreams {
    pub hand_updates: HandUpdates,
    pub mesh_updates: MeshUpdates,
    pub events: SessionEvents,
}

/// The sensor platform as seen by the pipeline
#[async_trait]
pub trait SensorSession: Send {
    /// Whether the device supports every provider the pipeline needs
    fn providers_supported(&self) -> bool;

    /// Whether every provider is initialized and ready to run
    fn providers_ready(&self) -> bool;

    /// Start the given providers
    async fn run(&mut self, providers: &[DataProviderKind]) -> Result<(), SessionError>;

    /// Hand out the update streams; succeeds exactly once
    fn take_streams(&mut self) -> Result<SessionStreams, SessionError>;
}

/// In-process session whose streams are fed through a [`SessionFeed`]
pub struct ChannelSession {
    supported: bool,
    ready: bool,
    running: bool,
    run_error: Option<SessionError>,
    streams: Option<SessionStreams>,
}

/// Producer side of a [`ChannelSession`]; dropping it ends all three streams
#[derive(Clone)]
pub struct SessionFeed {
    hands: UnboundedSender<AnchorUpdate<HandAnchor>>,
    meshes: UnboundedSender<AnchorUpdate<MeshAnchor>>,
    events: UnboundedSender<SessionEvent>,
}

impl ChannelSession {
    pub fn new() -> (Self, SessionFeed) {
        let (hands_tx, hands_rx) = unbounded_channel();
        let (meshes_tx, meshes_rx) = unbounded_channel();
        let (events_tx, events_rx) = unbounded_channel();

        let session = Self {
            supported: true,
            ready: true,
            running: false,
            run_error: None,
            streams: Some(SessionStreams {
                hand_updates: receiver_stream(hands_rx),
                mesh_updates: receiver_stream(meshes_rx),
                events: receiver_stream(events_rx),
            }),
        };
        let feed = SessionFeed {
            hands: hands_tx,
            meshes: meshes_tx,
            events: events_tx,
        };

        (session, feed)
    }

    pub fn with_supported(mut self, supported: bool) -> Self {
        self.supported = supported;
        self
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    /// Make the next `run` call fail with `error`
    pub fn failing_with(mut self, error: SessionError) -> Self {
        self.run_error = Some(error);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[async_trait]
impl SensorSession for ChannelSession {
    fn providers_supported(&self) -> bool {
        self.supported
    }

    fn providers_ready(&self) -> bool {
        self.ready
    }

    async fn run(&mut self, providers: &[DataProviderKind]) -> Result<(), SessionError> {
        if let Some(err) = self.run_error.take() {
            return Err(err);
        }
        if self.running {
            return Err(SessionError::AlreadyRunning);
        }

        self.running = true;
        info!("Channel session running with providers {:?}", providers);
        Ok(())
    }

    fn take_streams(&mut self) -> Result<SessionStreams, SessionError> {
        self.streams.take().ok_or(SessionError::StreamsTaken)
    }
}

impl SessionFeed {
    /// Returns false once the consuming side is gone
    pub fn send_hand(&self, update: AnchorUpdate<HandAnchor>) -> bool {
        self.hands.send(update).is_ok()
    }

    pub fn send_mesh(&self, update: AnchorUpdate<MeshAnchor>) -> bool {
        self.meshes.send(update).is_ok()
    }

    pub fn send_event(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

fn receiver_stream<T: Send + 'static>(mut rx: UnboundedReceiver<T>) -> BoxStream<'static, T> {
    async_stream::stream! {
        while let Some(item) = rx.recv().await {
            yield item;
        }
        debug!("Session stream closed");
    }
    .boxed()
}
