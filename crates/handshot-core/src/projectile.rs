//! Projectile spawning on a recognised trigger pose

use std::collections::VecDeque;

use handshot_config::{AppConfig, ProjectileConfig};
use handshot_spatial::{rotation, translation, Matrix4, Vector3D};
use tracing::{debug, info, warn};

use crate::anchor::HandAnchor;
use crate::gesture::GestureDetector;
use crate::scene::{
    discard, AppliedForce, CollisionComponent, EntityId, Material, ModelComponent, PhysicsBody,
    ReferenceFrame, SceneBackend, SceneError,
};
use crate::shape::Shape;

/// Spawn offset from the hand: `finger_length` along the hand's local X axis,
/// mirrored for the right hand, expressed in world space
pub fn translation_offset(hand: &HandAnchor, finger_length: f32) -> Vector3D {
    rotation(&hand.origin_from_anchor)
        .rotate_vector(Vector3D::X * (finger_length * hand.chirality.sign()))
}

/// Unit launch direction: the hand's local X axis (mirrored for the right
/// hand) in world space
pub fn force_direction(hand: &HandAnchor) -> Vector3D {
    rotation(&hand.origin_from_anchor).rotate_vector(Vector3D::X * hand.chirality.sign())
}

/// Creates launched spheres and tracks the ones still alive
#[derive(Debug)]
pub struct ProjectileSpawner {
    detector: GestureDetector,
    config: ProjectileConfig,
    live: VecDeque<EntityId>,
}

impl ProjectileSpawner {
    pub fn new(detector: GestureDetector, config: ProjectileConfig) -> Self {
        Self {
            detector,
            config,
            live: VecDeque::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            GestureDetector::from_config(&config.gesture),
            config.projectile.clone(),
        )
    }

    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    /// Projectiles spawned and not yet despawned, oldest first
    pub fn live(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.live.iter().copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Spawn a projectile if `hand` holds the trigger pose
    pub fn spawn(
        &mut self,
        hand: Option<&HandAnchor>,
        scene: &mut dyn SceneBackend,
    ) -> Option<EntityId> {
        let hand = hand?;
        let hand_location = self.detector.detect_gun_gesture_transform(Some(hand))?;

        let entity = scene.spawn();
        match self.build_sphere(entity, hand, &hand_location, scene) {
            Ok(()) => {
                info!(
                    "Spawned projectile {} from {} hand",
                    entity,
                    hand.chirality.as_str()
                );
                self.live.push_back(entity);
                self.enforce_budget(scene);
                Some(entity)
            }
            Err(e) => {
                warn!("Failed to spawn projectile: {}", e);
                discard(scene, entity);
                None
            }
        }
    }

    fn build_sphere(
        &self,
        entity: EntityId,
        hand: &HandAnchor,
        hand_location: &Matrix4,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), SceneError> {
        let cfg = &self.config;

        scene.set_model(
            entity,
            ModelComponent {
                mesh: Shape::sphere(cfg.radius),
                material: Material {
                    color: cfg.color,
                    metallic: cfg.metallic,
                },
            },
        )?;
        scene.set_collision(
            entity,
            CollisionComponent {
                shapes: vec![Shape::sphere(cfg.radius)],
                is_static: false,
            },
        )?;
        scene.set_physics_body(entity, PhysicsBody::dynamic(cfg.mass))?;

        let position = translation(hand_location) + translation_offset(hand, cfg.finger_length);
        scene.set_transform(entity, Matrix4::from_translation(position.to_vector()))?;

        scene.add_force(
            entity,
            AppliedForce {
                force: force_direction(hand) * cfg.launch_force,
                frame: ReferenceFrame::World,
            },
        )?;

        let root = scene.root();
        scene.add_child(root, entity)
    }

    fn enforce_budget(&mut self, scene: &mut dyn SceneBackend) {
        let Some(max_live) = self.config.max_live else {
            return;
        };

        while self.live.len() > max_live {
            let Some(&oldest) = self.live.front() else {
                break;
            };
            match scene.remove_from_parent(oldest) {
                Ok(()) => debug!("Despawned projectile {} over budget", oldest),
                Err(SceneError::UnknownEntity(_)) => {}
                Err(e) => {
                    // Still in the scene; retried on the next spawn
                    warn!("Failed to despawn projectile {}: {}", oldest, e);
                    break;
                }
            }
            self.live.pop_front();
        }
    }
}
