use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use handshot_config::AppConfig;
use handshot_core::anchor::{
    AnchorId, AnchorUpdate, Chirality, HandAnchor, HandJoint, HandSkeleton, MeshAnchor,
    MeshGeometry, SkeletonJoint,
};
use handshot_core::scene::{
    self, AppliedForce, CollisionComponent, EntityId, ModelComponent, PhysicsBody, SceneBackend,
    SceneEntity, SceneGraph,
};
use handshot_core::session::{AuthorizationStatus, AuthorizationType, ChannelSession, SessionEvent};
use handshot_core::shape::{GeometryError, Shape, ShapeGenerator, TriangleMeshGenerator};
use handshot_core::ImmersiveSession;
use handshot_spatial::{Matrix4, Vector3D};
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::Notify;
use tokio::time::timeout;

/// Holds every shape build until the gate opens
struct GatedGenerator {
    gate: Arc<Notify>,
    inner: TriangleMeshGenerator,
}

#[async_trait]
impl ShapeGenerator for GatedGenerator {
    async fn generate_static_mesh(&self, geometry: &MeshGeometry) -> Result<Shape, GeometryError> {
        self.gate.notified().await;
        self.inner.generate_static_mesh(geometry).await
    }
}

/// Opens the gate once a force has been applied
struct ForceSignallingScene {
    gate: Arc<Notify>,
    inner: SceneGraph,
}

impl SceneBackend for ForceSignallingScene {
    fn root(&self) -> EntityId {
        self.inner.root()
    }

    fn spawn(&mut self) -> EntityId {
        self.inner.spawn()
    }

    fn set_transform(&mut self, id: EntityId, transform: Matrix4) -> scene::Result<()> {
        self.inner.set_transform(id, transform)
    }

    fn set_collision(&mut self, id: EntityId, collision: CollisionComponent) -> scene::Result<()> {
        self.inner.set_collision(id, collision)
    }

    fn replace_collision_shapes(&mut self, id: EntityId, shapes: Vec<Shape>) -> scene::Result<()> {
        self.inner.replace_collision_shapes(id, shapes)
    }

    fn set_physics_body(&mut self, id: EntityId, body: PhysicsBody) -> scene::Result<()> {
        self.inner.set_physics_body(id, body)
    }

    fn set_input_target(&mut self, id: EntityId, enabled: bool) -> scene::Result<()> {
        self.inner.set_input_target(id, enabled)
    }

    fn set_model(&mut self, id: EntityId, model: ModelComponent) -> scene::Result<()> {
        self.inner.set_model(id, model)
    }

    fn add_child(&mut self, parent: EntityId, child: EntityId) -> scene::Result<()> {
        self.inner.add_child(parent, child)
    }

    fn remove_from_parent(&mut self, id: EntityId) -> scene::Result<()> {
        self.inner.remove_from_parent(id)
    }

    fn add_force(&mut self, id: EntityId, force: AppliedForce) -> scene::Result<()> {
        self.inner.add_force(id, force)?;
        self.gate.notify_one();
        Ok(())
    }

    fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.inner.entity(id)
    }

    fn children(&self, id: EntityId) -> &[EntityId] {
        self.inner.children(id)
    }
}

fn floor() -> MeshAnchor {
    MeshAnchor {
        id: AnchorId::new(),
        origin_from_anchor: Matrix4::IDENTITY,
        geometry: MeshGeometry {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            faces: vec![[0, 1, 2]],
        },
    }
}

fn trigger_hand() -> HandAnchor {
    HandAnchor {
        id: AnchorId::new(),
        chirality: Chirality::Right,
        is_tracked: true,
        origin_from_anchor: Matrix4::IDENTITY,
        skeleton: Some(
            HandSkeleton::new()
                .with_joint(HandJoint::ThumbTip, SkeletonJoint::tracked(Matrix4::IDENTITY))
                .with_joint(
                    HandJoint::IndexFingerKnuckle,
                    SkeletonJoint::tracked(Matrix4::from_translation(Vector3D::new(
                        0.0, 0.0, 0.01,
                    ))),
                ),
        ),
    }
}

#[tokio::test]
async fn test_slow_shape_generation_does_not_block_hands() {
    let gate = Arc::new(Notify::new());
    let (shell_tx, _shell_rx) = unbounded_channel();
    let immersive = ImmersiveSession::new(
        &AppConfig::default(),
        Arc::new(GatedGenerator {
            gate: Arc::clone(&gate),
            inner: TriangleMeshGenerator::new(),
        }),
        shell_tx,
    )
    .with_scene(Box::new(ForceSignallingScene {
        gate,
        inner: SceneGraph::new(),
    }));
    let (mut sensor, feed) = ChannelSession::new();

    // The mesh arrives first but can only finish after a projectile launches
    feed.send_mesh(AnchorUpdate::added(floor()));
    feed.send_event(SessionEvent::AuthorizationChanged {
        authorization: AuthorizationType::HandTracking,
        status: AuthorizationStatus::Allowed,
    });
    feed.send_hand(AnchorUpdate::updated(trigger_hand()));
    drop(feed);

    let context = timeout(Duration::from_secs(5), immersive.launch(&mut sensor))
        .await
        .expect("hand updates were blocked behind mesh shape generation")
        .unwrap();

    assert_eq!(context.meshes.len(), 1);
    assert_eq!(context.spawner.live_count(), 1);
    let scene = context.scene();
    assert_eq!(scene.children(scene.root()).len(), 2);
}
