use std::sync::Arc;

use handshot_config::AppConfig;
use handshot_core::anchor::{
    AnchorId, AnchorUpdate, Chirality, HandAnchor, HandJoint, HandSkeleton, MeshAnchor,
    MeshGeometry, SkeletonJoint,
};
use handshot_core::scene::{PhysicsBodyMode, ReferenceFrame};
use handshot_core::session::{
    AuthorizationStatus, AuthorizationType, ChannelSession, DataProviderKind, DataProviderState,
    SessionEvent,
};
use handshot_core::{ImmersiveSession, ShellSignal, TriangleMeshGenerator};
use handshot_spatial::{translation, Matrix4, Vector3D};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

fn immersive(config: &AppConfig) -> (ImmersiveSession, UnboundedReceiver<ShellSignal>) {
    let (tx, rx) = unbounded_channel();
    let session = ImmersiveSession::new(config, Arc::new(TriangleMeshGenerator::new()), tx);
    (session, rx)
}

fn drain(rx: &mut UnboundedReceiver<ShellSignal>) -> Vec<ShellSignal> {
    let mut out = Vec::new();
    while let Ok(signal) = rx.try_recv() {
        out.push(signal);
    }
    out
}

fn floor(id: AnchorId, x: f32) -> MeshAnchor {
    MeshAnchor {
        id,
        origin_from_anchor: Matrix4::from_translation(Vector3D::new(x, 0.0, 0.0)),
        geometry: MeshGeometry {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
            ],
            faces: vec![[0, 1, 2], [0, 2, 3]],
        },
    }
}

fn hand(chirality: Chirality, pinch_gap: f32) -> HandAnchor {
    HandAnchor {
        id: AnchorId::new(),
        chirality,
        is_tracked: true,
        origin_from_anchor: Matrix4::from_translation(Vector3D::new(0.0, 1.0, 0.0)),
        skeleton: Some(
            HandSkeleton::new()
                .with_joint(HandJoint::ThumbTip, SkeletonJoint::tracked(Matrix4::IDENTITY))
                .with_joint(
                    HandJoint::IndexFingerKnuckle,
                    SkeletonJoint::tracked(Matrix4::from_translation(Vector3D::new(
                        0.0, 0.0, pinch_gap,
                    ))),
                ),
        ),
    }
}

fn provider_error(message: &str) -> SessionEvent {
    SessionEvent::DataProviderStateChanged {
        providers: vec![DataProviderKind::SceneReconstruction],
        new_state: DataProviderState::Stopped,
        error: Some(message.to_string()),
    }
}

#[tokio::test]
async fn test_meshes_track_anchor_lifecycle() {
    let (immersive, mut shell) = immersive(&AppConfig::default());
    let (mut sensor, feed) = ChannelSession::new();

    let kept = AnchorId::new();
    let dropped = AnchorId::new();
    feed.send_mesh(AnchorUpdate::added(floor(kept, 0.0)));
    feed.send_mesh(AnchorUpdate::added(floor(dropped, 2.0)));
    feed.send_mesh(AnchorUpdate::updated(floor(kept, 5.0)));
    feed.send_mesh(AnchorUpdate::removed(floor(dropped, 2.0)));
    // Never added: must not create an entity
    feed.send_mesh(AnchorUpdate::updated(floor(AnchorId::new(), 9.0)));
    drop(feed);

    let context = immersive.launch(&mut sensor).await.unwrap();
    assert_eq!(context.meshes.len(), 1);
    assert!(context.meshes.entity_for(&dropped).is_none());

    let scene = context.scene();
    let entity_id = context.meshes.entity_for(&kept).unwrap();
    assert_eq!(scene.children(scene.root()), &[entity_id]);

    let entity = scene.entity(entity_id).unwrap();
    assert_eq!(translation(&entity.transform).x, 5.0);
    assert!(entity.input_target);
    assert!(entity.collision.as_ref().unwrap().is_static);
    assert_eq!(
        entity.physics_body.unwrap().mode,
        PhysicsBodyMode::Static
    );
    assert!(drain(&mut shell).is_empty());
}

#[tokio::test]
async fn test_invalid_geometry_is_skipped() {
    let (immersive, _shell) = immersive(&AppConfig::default());
    let (mut sensor, feed) = ChannelSession::new();

    let broken = MeshAnchor {
        id: AnchorId::new(),
        origin_from_anchor: Matrix4::IDENTITY,
        geometry: MeshGeometry {
            vertices: vec![[0.0, 0.0, 0.0]],
            faces: vec![[0, 1, 2]],
        },
    };
    feed.send_mesh(AnchorUpdate::added(broken));
    feed.send_mesh(AnchorUpdate::added(floor(AnchorId::new(), 1.0)));
    drop(feed);

    let context = immersive.launch(&mut sensor).await.unwrap();
    assert_eq!(context.meshes.len(), 1);
}

#[tokio::test]
async fn test_trigger_pose_launches_projectile() {
    let (immersive, _shell) = immersive(&AppConfig::default());
    let (mut sensor, feed) = ChannelSession::new();

    feed.send_hand(AnchorUpdate::updated(hand(Chirality::Right, 0.03)));
    // Open hand and non-update events never fire
    feed.send_hand(AnchorUpdate::updated(hand(Chirality::Left, 0.2)));
    feed.send_hand(AnchorUpdate::added(hand(Chirality::Left, 0.03)));
    drop(feed);

    let context = immersive.launch(&mut sensor).await.unwrap();
    assert_eq!(context.spawner.live_count(), 1);
    assert!(context.hands.latest().get(Chirality::Right).is_some());
    assert!(context.hands.latest().left.as_ref().unwrap().skeleton.is_some());

    let scene = context.scene();
    let projectile_id = context.spawner.live().next().unwrap();
    let projectile = scene.entity(projectile_id).unwrap();

    let position = translation(&projectile.transform);
    assert!((position.x + 0.25).abs() < 1e-5);
    assert!((position.y - 1.0).abs() < 1e-5);

    let body = projectile.physics_body.unwrap();
    assert_eq!(body.mode, PhysicsBodyMode::Dynamic);
    assert_eq!(body.mass, 1.0);

    assert_eq!(projectile.forces.len(), 1);
    assert_eq!(projectile.forces[0].frame, ReferenceFrame::World);
    assert!((projectile.forces[0].force.x + 300.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_projectile_budget_from_config() {
    let mut config = AppConfig::default();
    config.projectile.max_live = Some(2);
    let (immersive, _shell) = immersive(&config);
    let (mut sensor, feed) = ChannelSession::new();

    for _ in 0..5 {
        feed.send_hand(AnchorUpdate::updated(hand(Chirality::Left, 0.01)));
    }
    drop(feed);

    let context = immersive.launch(&mut sensor).await.unwrap();
    assert_eq!(context.spawner.live_count(), 2);
    let scene = context.scene();
    assert_eq!(scene.children(scene.root()).len(), 2);
}

#[tokio::test]
async fn test_provider_error_opens_error_window_once() {
    let (immersive, mut shell) = immersive(&AppConfig::default());
    let error_state = immersive.error_state();
    let (mut sensor, feed) = ChannelSession::new();

    feed.send_event(SessionEvent::AuthorizationChanged {
        authorization: AuthorizationType::HandTracking,
        status: AuthorizationStatus::Allowed,
    });
    feed.send_event(provider_error("sensor fault"));
    feed.send_event(provider_error("sensor fault again"));
    drop(feed);

    let context = immersive.launch(&mut sensor).await.unwrap();
    assert!(error_state.is_raised());
    assert_eq!(
        context
            .monitor
            .provider_state(DataProviderKind::SceneReconstruction),
        Some(DataProviderState::Stopped)
    );
    assert_eq!(drain(&mut shell), vec![ShellSignal::OpenErrorWindow]);
}

#[tokio::test]
async fn test_denied_authorization_raises_error_state() {
    let (immersive, mut shell) = immersive(&AppConfig::default());
    let (mut sensor, feed) = ChannelSession::new();

    feed.send_event(SessionEvent::AuthorizationChanged {
        authorization: AuthorizationType::WorldSensing,
        status: AuthorizationStatus::Denied,
    });
    drop(feed);

    let context = immersive.launch(&mut sensor).await.unwrap();
    assert!(context.error_state.is_raised());
    assert_eq!(drain(&mut shell), vec![ShellSignal::OpenErrorWindow]);
}

#[tokio::test]
async fn test_state_changes_without_error_are_benign() {
    let (immersive, mut shell) = immersive(&AppConfig::default());
    let (mut sensor, feed) = ChannelSession::new();

    feed.send_event(SessionEvent::DataProviderStateChanged {
        providers: vec![DataProviderKind::HandTracking],
        new_state: DataProviderState::Paused,
        error: None,
    });
    drop(feed);

    let context = immersive.launch(&mut sensor).await.unwrap();
    assert!(!context.error_state.is_raised());
    assert!(drain(&mut shell).is_empty());
}

#[tokio::test]
#[should_panic(expected = "Unhandled session event kind")]
async fn test_unrecognized_event_is_fatal() {
    let (immersive, _shell) = immersive(&AppConfig::default());
    let (mut sensor, feed) = ChannelSession::new();

    feed.send_event(SessionEvent::Unrecognized {
        kind: "worldTrackingLimited".to_string(),
    });
    drop(feed);

    let _ = immersive.launch(&mut sensor).await;
}
