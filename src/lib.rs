//! Handshot: hand-tracked projectile play over a reconstructed room
//!
//! Facade over the workspace crates.

pub use handshot_config as config;
pub use handshot_spatial as spatial;

pub use handshot_config::AppConfig;
pub use handshot_core::{
    ChannelSession, ErrorState, ImmersiveSession, SceneBackend, SceneGraph, SensorSession,
    SessionContext, SessionFeed, ShellSignal, StartupError, TriangleMeshGenerator,
};
