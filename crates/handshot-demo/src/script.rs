//! Canned sensor traffic for a headless run

use handshot_core::anchor::{
    AnchorId, AnchorUpdate, Chirality, HandAnchor, HandJoint, HandSkeleton, MeshAnchor,
    MeshGeometry, SkeletonJoint,
};
use handshot_core::session::{
    AuthorizationStatus, AuthorizationType, DataProviderKind, DataProviderState, SessionEvent,
    SessionFeed,
};
use handshot_spatial::{Matrix4, Quaternion, Vector3D};
use tracing::debug;

/// Axis-aligned quad in the anchor's local XZ plane
fn quad(width: f32, depth: f32) -> MeshGeometry {
    MeshGeometry {
        vertices: vec![
            [0.0, 0.0, 0.0],
            [width, 0.0, 0.0],
            [width, 0.0, depth],
            [0.0, 0.0, depth],
        ],
        faces: vec![[0, 1, 2], [0, 2, 3]],
    }
}

fn surface(id: AnchorId, pose: Matrix4, width: f32, depth: f32) -> MeshAnchor {
    MeshAnchor {
        id,
        origin_from_anchor: pose,
        geometry: quad(width, depth),
    }
}

/// A hand at `pose` whose thumb tip sits `gap` metres from the index knuckle
fn hand(chirality: Chirality, pose: Matrix4, gap: f32) -> HandAnchor {
    let skeleton = HandJoint::ALL
        .iter()
        .fold(HandSkeleton::new(), |skeleton, joint| {
            skeleton.with_joint(*joint, SkeletonJoint::tracked(Matrix4::IDENTITY))
        })
        .with_joint(
            HandJoint::IndexFingerKnuckle,
            SkeletonJoint::tracked(Matrix4::from_translation(Vector3D::new(0.0, 0.0, gap))),
        );

    HandAnchor {
        id: AnchorId::new(),
        chirality,
        is_tracked: true,
        origin_from_anchor: pose,
        skeleton: Some(skeleton),
    }
}

pub struct ScriptOptions {
    pub shots: usize,
    pub provider_failure: bool,
}

/// Push a short session through `feed`: a room appears, both hands move,
/// a few shots fire and part of the room goes away again.
pub fn play(feed: &SessionFeed, options: &ScriptOptions) {
    feed.send_event(SessionEvent::AuthorizationChanged {
        authorization: AuthorizationType::HandTracking,
        status: AuthorizationStatus::Allowed,
    });
    feed.send_event(SessionEvent::AuthorizationChanged {
        authorization: AuthorizationType::WorldSensing,
        status: AuthorizationStatus::Allowed,
    });

    let floor = AnchorId::new();
    let wall = AnchorId::new();
    let table = AnchorId::new();
    let upright = Quaternion::from_axis_angle(Vector3D::X, std::f32::consts::FRAC_PI_2);

    feed.send_mesh(AnchorUpdate::added(surface(
        floor,
        Matrix4::IDENTITY,
        4.0,
        4.0,
    )));
    feed.send_mesh(AnchorUpdate::added(surface(
        wall,
        Matrix4::from_rotation_translation(upright, Vector3D::new(0.0, 0.0, -2.0)),
        4.0,
        2.5,
    )));
    feed.send_mesh(AnchorUpdate::added(surface(
        table,
        Matrix4::from_translation(Vector3D::new(1.0, 0.75, -1.0)),
        1.2,
        0.8,
    )));
    feed.send_mesh(AnchorUpdate::updated(surface(
        floor,
        Matrix4::from_translation(Vector3D::new(0.0, -0.01, 0.0)),
        4.5,
        4.5,
    )));

    let left_pose = Matrix4::from_translation(Vector3D::new(-0.2, 1.2, -0.3));
    let right_pose = Matrix4::from_translation(Vector3D::new(0.2, 1.2, -0.3));

    // Open hands first: tracked but never triggering
    feed.send_hand(AnchorUpdate::added(hand(Chirality::Left, left_pose, 0.1)));
    feed.send_hand(AnchorUpdate::updated(hand(Chirality::Left, left_pose, 0.1)));
    feed.send_hand(AnchorUpdate::updated(hand(Chirality::Right, right_pose, 0.1)));

    for shot in 0..options.shots {
        let chirality = if shot % 2 == 0 {
            Chirality::Right
        } else {
            Chirality::Left
        };
        let pose = match chirality {
            Chirality::Left => left_pose,
            Chirality::Right => right_pose,
        };
        feed.send_hand(AnchorUpdate::updated(hand(chirality, pose, 0.02)));
    }

    feed.send_mesh(AnchorUpdate::removed(surface(
        table,
        Matrix4::IDENTITY,
        1.2,
        0.8,
    )));

    if options.provider_failure {
        feed.send_event(SessionEvent::DataProviderStateChanged {
            providers: vec![DataProviderKind::SceneReconstruction],
            new_state: DataProviderState::Stopped,
            error: Some("scene reconstruction stopped unexpectedly".to_string()),
        });
    } else {
        feed.send_event(SessionEvent::DataProviderStateChanged {
            providers: vec![
                DataProviderKind::HandTracking,
                DataProviderKind::SceneReconstruction,
            ],
            new_state: DataProviderState::Stopped,
            error: None,
        });
    }

    debug!("Script queued {} shots", options.shots);
}
