//! Immersive-session runtime
//!
//! Owns every piece of reconciliation state in one [`SessionContext`] and
//! drives the hand, mesh and session-event streams from a single task. Each
//! stream is consumed strictly in arrival order; the three are interleaved
//! with no ordering between them.

use std::sync::Arc;

use futures::StreamExt;
use handshot_config::AppConfig;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::hands::HandTrackingReconciler;
use crate::mesh::{prepare_mesh_updates, MeshReconciler};
use crate::monitor::{ErrorState, SessionEventMonitor};
use crate::projectile::ProjectileSpawner;
use crate::scene::{SceneBackend, SceneGraph};
use crate::session::{DataProviderKind, SensorSession, SessionError, SessionStreams};
use crate::shape::ShapeGenerator;

/// Requests to the presentation shell hosting the immersive view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellSignal {
    DismissImmersiveSpace,
    OpenErrorWindow,
}

/// Reasons the immersive experience could not be entered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartupError {
    #[error("Required data providers are not supported on this device")]
    Unsupported,

    #[error("Data providers are not ready to run")]
    NotReady,

    #[error("Failed to start session: {0}")]
    Session(#[from] SessionError),
}

/// All mutable reconciliation state, owned by the runtime loop
pub struct SessionContext {
    pub scene: Box<dyn SceneBackend>,
    pub meshes: MeshReconciler,
    pub hands: HandTrackingReconciler,
    pub spawner: ProjectileSpawner,
    pub monitor: SessionEventMonitor,
    pub error_state: ErrorState,
}

impl SessionContext {
    pub fn new(config: &AppConfig, scene: Box<dyn SceneBackend>) -> Self {
        Self {
            scene,
            meshes: MeshReconciler::new(),
            hands: HandTrackingReconciler::new(),
            spawner: ProjectileSpawner::from_config(config),
            monitor: SessionEventMonitor::new(),
            error_state: ErrorState::new(),
        }
    }

    pub fn scene(&self) -> &dyn SceneBackend {
        self.scene.as_ref()
    }
}

pub struct ImmersiveSession {
    context: SessionContext,
    shape_generator: Arc<dyn ShapeGenerator>,
    shell: UnboundedSender<ShellSignal>,
}

impl ImmersiveSession {
    /// Providers started for the experience
    pub const PROVIDERS: [DataProviderKind; 2] = [
        DataProviderKind::SceneReconstruction,
        DataProviderKind::HandTracking,
    ];

    pub fn new(
        config: &AppConfig,
        shape_generator: Arc<dyn ShapeGenerator>,
        shell: UnboundedSender<ShellSignal>,
    ) -> Self {
        Self {
            context: SessionContext::new(config, Box::new(SceneGraph::new())),
            shape_generator,
            shell,
        }
    }

    /// Replace the default in-memory scene with another engine backend
    pub fn with_scene(mut self, scene: Box<dyn SceneBackend>) -> Self {
        self.context.scene = scene;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn error_state(&self) -> ErrorState {
        self.context.error_state.clone()
    }

    /// Check provider support and readiness, then run the session.
    ///
    /// Unsupported or unready providers only dismiss the immersive space; a
    /// failing run additionally raises the error state and asks for the error
    /// window.
    pub async fn start<S>(&mut self, session: &mut S) -> Result<SessionStreams, StartupError>
    where
        S: SensorSession + ?Sized,
    {
        if !session.providers_supported() {
            warn!("Data providers not supported, dismissing immersive space");
            self.signal(ShellSignal::DismissImmersiveSpace);
            return Err(StartupError::Unsupported);
        }
        if !session.providers_ready() {
            warn!("Data providers not ready, dismissing immersive space");
            self.signal(ShellSignal::DismissImmersiveSpace);
            return Err(StartupError::NotReady);
        }

        let started = match session.run(&Self::PROVIDERS).await {
            Ok(()) => session.take_streams(),
            Err(e) => Err(e),
        };

        started.map_err(|e| {
            error!("Failed to start session: {}", e);
            self.context.error_state.raise();
            self.signal(ShellSignal::DismissImmersiveSpace);
            self.signal(ShellSignal::OpenErrorWindow);
            StartupError::Session(e)
        })
    }

    /// `start` followed by `run`
    pub async fn launch<S>(mut self, session: &mut S) -> Result<SessionContext, StartupError>
    where
        S: SensorSession + ?Sized,
    {
        let streams = self.start(session).await?;
        Ok(self.run(streams).await)
    }

    /// Consume all three streams until each has ended.
    ///
    /// Mesh shapes are generated while the mesh stream is polled, so a slow
    /// build never holds up hand or session events. The shell gets
    /// `OpenErrorWindow` once, when the error state is first seen raised,
    /// including raises through an [`ErrorState`] clone obtained from
    /// [`ImmersiveSession::error_state`].
    pub async fn run(self, streams: SessionStreams) -> SessionContext {
        let ImmersiveSession {
            mut context,
            shape_generator,
            shell,
        } = self;
        let SessionStreams {
            mut hand_updates,
            mesh_updates,
            mut events,
        } = streams;
        let mut mesh_updates = prepare_mesh_updates(mesh_updates, shape_generator);
        let mut error_rx = context.error_state.subscribe();

        let (mut hands_open, mut meshes_open, mut events_open) = (true, true, true);
        let mut watching_errors = true;
        let mut error_signalled = false;

        info!("Immersive session running");
        loop {
            if !error_signalled && context.error_state.is_raised() {
                error_signalled = true;
                warn!("Session entered error state");
                send_signal(&shell, ShellSignal::OpenErrorWindow);
            }
            if !(hands_open || meshes_open || events_open) {
                break;
            }

            tokio::select! {
                update = hand_updates.next(), if hands_open => match update {
                    Some(update) => {
                        context
                            .hands
                            .apply(update, &mut context.spawner, context.scene.as_mut());
                    }
                    None => {
                        debug!("Hand update stream ended");
                        hands_open = false;
                    }
                },
                prepared = mesh_updates.next(), if meshes_open => match prepared {
                    Some((update, shape)) => {
                        context.meshes.apply(update, shape, context.scene.as_mut());
                    }
                    None => {
                        debug!("Mesh update stream ended");
                        meshes_open = false;
                    }
                },
                event = events.next(), if events_open => match event {
                    Some(event) => context.monitor.handle(event, &context.error_state),
                    None => {
                        debug!("Session event stream ended");
                        events_open = false;
                    }
                },
                // Wakes the loop when a clone of the error state held outside
                // the session is raised while all streams are idle
                changed = error_rx.changed(), if watching_errors && !error_signalled => {
                    if changed.is_err() {
                        watching_errors = false;
                    }
                }
            }
        }

        info!(
            "Immersive session ended with {} mesh entities and {} projectiles",
            context.meshes.len(),
            context.spawner.live_count()
        );
        context
    }

    fn signal(&self, signal: ShellSignal) {
        send_signal(&self.shell, signal);
    }
}

fn send_signal(shell: &UnboundedSender<ShellSignal>, signal: ShellSignal) {
    if shell.send(signal).is_err() {
        debug!("Presentation shell gone, dropped {:?}", signal);
    }
}
