//! Handshot core
//!
//! Reconciles a sensor session's hand-tracking and scene-reconstruction
//! streams into a physics scene:
//!
//! - Scene meshes become static, collidable entities, one per mesh anchor
//! - A "gun" hand pose launches a dynamic sphere along the index finger
//! - Authorization loss or provider failure raises a shared error flag
//!
//! [`runtime::ImmersiveSession`] ties these together over a single task.

pub mod anchor;
pub mod gesture;
pub mod hands;
pub mod mesh;
pub mod monitor;
pub mod projectile;
pub mod runtime;
pub mod scene;
pub mod session;
pub mod shape;

pub use anchor::{
    AnchorEvent, AnchorId, AnchorUpdate, Chirality, HandAnchor, HandJoint, HandSkeleton,
    MeshAnchor, MeshGeometry, SkeletonJoint,
};
pub use gesture::{detect_gun_gesture_transform, GestureDetector};
pub use hands::{HandTrackingReconciler, HandsUpdates};
pub use mesh::{prepare_mesh_updates, MeshReconciler, PreparedMeshUpdate};
pub use monitor::{ErrorState, SessionEventMonitor};
pub use projectile::ProjectileSpawner;
pub use runtime::{ImmersiveSession, SessionContext, ShellSignal, StartupError};
pub use scene::{EntityId, SceneBackend, SceneEntity, SceneError, SceneGraph};
pub use session::{
    AuthorizationStatus, AuthorizationType, ChannelSession, DataProviderKind, DataProviderState,
    SensorSession, SessionError, SessionEvent, SessionFeed, SessionStreams,
};
pub use shape::{GeometryError, Shape, ShapeGenerator, TriangleMeshGenerator};
