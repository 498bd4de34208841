//! Scene-reconstruction reconciliation
//!
//! Keeps exactly one collidable scene entity per known mesh anchor. Entities
//! are created only on `added`, removed only on `removed`; `updated` never
//! changes which anchors are known.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, warn};

use crate::anchor::{AnchorEvent, AnchorId, AnchorUpdate, MeshAnchor};
use crate::scene::{
    discard, CollisionComponent, EntityId, PhysicsBody, SceneBackend, SceneError,
};
use crate::session::MeshUpdates;
use crate::shape::{GeometryError, Shape, ShapeGenerator};

/// A mesh update paired with the outcome of its shape generation
pub type PreparedMeshUpdate = (AnchorUpdate<MeshAnchor>, Result<Shape, GeometryError>);

/// Generate each update's collision shape in arrival order.
///
/// Shape generation runs while the returned stream is polled, so a slow build
/// delays later mesh updates but nothing else sharing the consumer's loop.
pub fn prepare_mesh_updates(
    updates: MeshUpdates,
    generator: Arc<dyn ShapeGenerator>,
) -> BoxStream<'static, PreparedMeshUpdate> {
    updates
        .then(move |update| {
            let generator = Arc::clone(&generator);
            async move {
                let shape = generator
                    .generate_static_mesh(&update.anchor.geometry)
                    .await;
                (update, shape)
            }
        })
        .boxed()
}

#[derive(Debug, Default)]
pub struct MeshReconciler {
    entities: HashMap<AnchorId, EntityId>,
}

impl MeshReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_for(&self, id: &AnchorId) -> Option<EntityId> {
        self.entities.get(id).copied()
    }

    /// Generate the shape inline and apply the update
    pub async fn process(
        &mut self,
        update: AnchorUpdate<MeshAnchor>,
        generator: &dyn ShapeGenerator,
        scene: &mut dyn SceneBackend,
    ) {
        let shape = generator
            .generate_static_mesh(&update.anchor.geometry)
            .await;
        self.apply(update, shape, scene);
    }

    /// Apply one update whose shape has already been generated.
    ///
    /// A failed shape skips the whole update, whatever its kind.
    pub fn apply(
        &mut self,
        update: AnchorUpdate<MeshAnchor>,
        shape: Result<Shape, GeometryError>,
        scene: &mut dyn SceneBackend,
    ) {
        let anchor = update.anchor;
        let shape = match shape {
            Ok(shape) => shape,
            Err(e) => {
                debug!(
                    "Skipping mesh {} event for {}: {}",
                    update.event.as_str(),
                    anchor.id,
                    e
                );
                return;
            }
        };

        let result = match update.event {
            AnchorEvent::Added => self.add(&anchor, shape, scene),
            AnchorEvent::Updated => self.update(&anchor, shape, scene),
            AnchorEvent::Removed => self.remove(&anchor.id, scene),
        };

        if let Err(e) = result {
            warn!(
                "Scene rejected mesh {} for {}: {}",
                update.event.as_str(),
                anchor.id,
                e
            );
        }
    }

    fn add(
        &mut self,
        anchor: &MeshAnchor,
        shape: Shape,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), SceneError> {
        // A repeated `added` replaces the entity rather than orphaning it
        if self.entities.contains_key(&anchor.id) {
            debug!("Mesh {} added again, replacing its entity", anchor.id);
            self.remove(&anchor.id, scene)?;
        }

        let entity = scene.spawn();
        if let Err(e) = build_static_mesh(entity, anchor, shape, scene) {
            discard(scene, entity);
            return Err(e);
        }
        self.entities.insert(anchor.id, entity);
        debug!("Mesh {} added as {}", anchor.id, entity);
        Ok(())
    }

    fn update(
        &mut self,
        anchor: &MeshAnchor,
        shape: Shape,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), SceneError> {
        let Some(entity) = self.entities.get(&anchor.id).copied() else {
            debug!("Update for unknown mesh {}, ignoring", anchor.id);
            return Ok(());
        };

        scene.set_transform(entity, anchor.origin_from_anchor)?;
        scene.replace_collision_shapes(entity, vec![shape])?;
        Ok(())
    }

    fn remove(&mut self, id: &AnchorId, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        let Some(entity) = self.entities.get(id).copied() else {
            debug!("Removal of unknown mesh {}, ignoring", id);
            return Ok(());
        };

        match scene.remove_from_parent(entity) {
            Ok(()) | Err(SceneError::UnknownEntity(_)) => {
                self.entities.remove(id);
                debug!("Mesh {} removed", id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn build_static_mesh(
    entity: EntityId,
    anchor: &MeshAnchor,
    shape: Shape,
    scene: &mut dyn SceneBackend,
) -> Result<(), SceneError> {
    scene.set_transform(entity, anchor.origin_from_anchor)?;
    scene.set_collision(
        entity,
        CollisionComponent {
            shapes: vec![shape],
            is_static: true,
        },
    )?;
    scene.set_input_target(entity, true)?;
    scene.set_physics_body(entity, PhysicsBody::static_body())?;

    let root = scene.root();
    scene.add_child(root, entity)
}
