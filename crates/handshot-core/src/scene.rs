//! Scene capability: the entity graph the reconcilers mutate
//!
//! [`SceneBackend`] is the seam to the rendering/physics engine. [`SceneGraph`]
//! is an in-memory implementation that records components and applied forces
//! without simulating them.

use std::collections::HashMap;
use std::fmt;

use handshot_spatial::{Matrix4, Vector3D};
use tracing::warn;

use crate::shape::Shape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionComponent {
    pub shapes: Vec<Shape>,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsBodyMode {
    /// Collides but never moves
    Static,
    /// Fully simulated rigid body
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    pub mode: PhysicsBodyMode,
    pub mass: f32,
}

impl PhysicsBody {
    pub fn static_body() -> Self {
        Self {
            mode: PhysicsBodyMode::Static,
            mass: 0.0,
        }
    }

    pub fn dynamic(mass: f32) -> Self {
        Self {
            mode: PhysicsBodyMode::Dynamic,
            mass,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// RGB in 0.0..=1.0
    pub color: [f32; 3],
    pub metallic: bool,
}

/// Visible geometry of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct ModelComponent {
    pub mesh: Shape,
    pub material: Material,
}

/// Frame a force is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceFrame {
    World,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce {
    pub force: Vector3D,
    pub frame: ReferenceFrame,
}

/// A node of the scene graph and its components
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    pub id: EntityId,
    pub transform: Matrix4,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub collision: Option<CollisionComponent>,
    pub physics_body: Option<PhysicsBody>,
    pub model: Option<ModelComponent>,
    pub input_target: bool,
    pub forces: Vec<AppliedForce>,
}

impl SceneEntity {
    fn new(id: EntityId) -> Self {
        Self {
            id,
            transform: Matrix4::IDENTITY,
            parent: None,
            children: Vec::new(),
            collision: None,
            physics_body: None,
            model: None,
            input_target: false,
            forces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("The scene root cannot be reparented or removed")]
    RootIsFixed,

    #[error("Attaching {child} under {parent} would create a cycle")]
    Cycle { parent: EntityId, child: EntityId },
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Engine-side operations the pipeline relies on
pub trait SceneBackend: Send {
    /// The single container every dynamic entity attaches to
    fn root(&self) -> EntityId;

    /// Create a detached entity with identity transform and no components
    fn spawn(&mut self) -> EntityId;

    fn set_transform(&mut self, id: EntityId, transform: Matrix4) -> Result<()>;

    fn set_collision(&mut self, id: EntityId, collision: CollisionComponent) -> Result<()>;

    /// Swap the shapes of an existing collision component; no-op without one
    fn replace_collision_shapes(&mut self, id: EntityId, shapes: Vec<Shape>) -> Result<()>;

    fn set_physics_body(&mut self, id: EntityId, body: PhysicsBody) -> Result<()>;

    fn set_input_target(&mut self, id: EntityId, enabled: bool) -> Result<()>;

    fn set_model(&mut self, id: EntityId, model: ModelComponent) -> Result<()>;

    /// Attach `child` under `parent`, detaching it from any previous parent
    fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()>;

    /// Detach an entity; detached entities and their subtrees are dropped
    fn remove_from_parent(&mut self, id: EntityId) -> Result<()>;

    fn add_force(&mut self, id: EntityId, force: AppliedForce) -> Result<()>;

    fn entity(&self, id: EntityId) -> Option<&SceneEntity>;

    fn children(&self, id: EntityId) -> &[EntityId];
}

/// Drop an entity that failed to build; a refusal is only logged
pub(crate) fn discard(scene: &mut dyn SceneBackend, id: EntityId) {
    if let Err(e) = scene.remove_from_parent(id) {
        warn!("Failed to discard half-built {}: {}", id, e);
    }
}

/// Arena-backed scene graph
#[derive(Debug, Clone)]
pub struct SceneGraph {
    entities: HashMap<EntityId, SceneEntity>,
    root: EntityId,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = EntityId(0);
        let mut entities = HashMap::new();
        entities.insert(root, SceneEntity::new(root));
        Self {
            entities,
            root,
            next_id: 1,
        }
    }

    /// Number of live entities, root included
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    fn get_mut(&mut self, id: EntityId) -> Result<&mut SceneEntity> {
        self.entities
            .get_mut(&id)
            .ok_or(SceneError::UnknownEntity(id))
    }

    fn detach(&mut self, id: EntityId) -> Result<()> {
        let parent = self.get_mut(id)?.parent.take();
        if let Some(parent) = parent {
            if let Some(p) = self.entities.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        Ok(())
    }

    fn is_ancestor(&self, candidate: EntityId, of: EntityId) -> bool {
        let mut cursor = Some(of);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.entities.get(&id).and_then(|e| e.parent);
        }
        false
    }

    fn despawn_subtree(&mut self, id: EntityId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(entity) = self.entities.remove(&next) {
                pending.extend(entity.children);
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBackend for SceneGraph {
    fn root(&self) -> EntityId {
        self.root
    }

    fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, SceneEntity::new(id));
        id
    }

    fn set_transform(&mut self, id: EntityId, transform: Matrix4) -> Result<()> {
        self.get_mut(id)?.transform = transform;
        Ok(())
    }

    fn set_collision(&mut self, id: EntityId, collision: CollisionComponent) -> Result<()> {
        self.get_mut(id)?.collision = Some(collision);
        Ok(())
    }

    fn replace_collision_shapes(&mut self, id: EntityId, shapes: Vec<Shape>) -> Result<()> {
        if let Some(collision) = self.get_mut(id)?.collision.as_mut() {
            collision.shapes = shapes;
        }
        Ok(())
    }

    fn set_physics_body(&mut self, id: EntityId, body: PhysicsBody) -> Result<()> {
        self.get_mut(id)?.physics_body = Some(body);
        Ok(())
    }

    fn set_input_target(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.get_mut(id)?.input_target = enabled;
        Ok(())
    }

    fn set_model(&mut self, id: EntityId, model: ModelComponent) -> Result<()> {
        self.get_mut(id)?.model = Some(model);
        Ok(())
    }

    fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        if child == self.root {
            return Err(SceneError::RootIsFixed);
        }
        if !self.contains(parent) {
            return Err(SceneError::UnknownEntity(parent));
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }

        self.detach(child)?;
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    fn remove_from_parent(&mut self, id: EntityId) -> Result<()> {
        if id == self.root {
            return Err(SceneError::RootIsFixed);
        }
        self.detach(id)?;
        self.despawn_subtree(id);
        Ok(())
    }

    fn add_force(&mut self, id: EntityId, force: AppliedForce) -> Result<()> {
        self.get_mut(id)?.forces.push(force);
        Ok(())
    }

    fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.entities.get(&id)
    }

    fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities
            .get(&id)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }
}

/// [`SceneGraph`] wrapper that refuses selected operations
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RefusingScene {
    pub inner: SceneGraph,
    pub refuse_attach: bool,
    pub refuse_remove: bool,
    pub refuse_force: bool,
}

#[cfg(test)]
impl SceneBackend for RefusingScene {
    fn root(&self) -> EntityId {
        self.inner.root()
    }

    fn spawn(&mut self) -> EntityId {
        self.inner.spawn()
    }

    fn set_transform(&mut self, id: EntityId, transform: Matrix4) -> Result<()> {
        self.inner.set_transform(id, transform)
    }

    fn set_collision(&mut self, id: EntityId, collision: CollisionComponent) -> Result<()> {
        self.inner.set_collision(id, collision)
    }

    fn replace_collision_shapes(&mut self, id: EntityId, shapes: Vec<Shape>) -> Result<()> {
        self.inner.replace_collision_shapes(id, shapes)
    }

    fn set_physics_body(&mut self, id: EntityId, body: PhysicsBody) -> Result<()> {
        self.inner.set_physics_body(id, body)
    }

    fn set_input_target(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.inner.set_input_target(id, enabled)
    }

    fn set_model(&mut self, id: EntityId, model: ModelComponent) -> Result<()> {
        self.inner.set_model(id, model)
    }

    fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        if self.refuse_attach {
            return Err(SceneError::UnknownEntity(parent));
        }
        self.inner.add_child(parent, child)
    }

    fn remove_from_parent(&mut self, id: EntityId) -> Result<()> {
        if self.refuse_remove {
            return Err(SceneError::RootIsFixed);
        }
        self.inner.remove_from_parent(id)
    }

    fn add_force(&mut self, id: EntityId, force: AppliedForce) -> Result<()> {
        if self.refuse_force {
            return Err(SceneError::UnknownEntity(id));
        }
        self.inner.add_force(id, force)
    }

    fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.inner.entity(id)
    }

    fn children(&self, id: EntityId) -> &[EntityId] {
        self.inner.children(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_graph_has_only_root() {
        let scene = SceneGraph::new();
        assert_eq!(scene.len(), 1);
        assert!(scene.children(scene.root()).is_empty());
    }

    #[test]
    fn test_attach_and_remove() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.spawn();
        let b = scene.spawn();
        scene.add_child(root, a).unwrap();
        scene.add_child(a, b).unwrap();

        assert_eq!(scene.children(root), &[a]);
        assert_eq!(scene.entity(b).unwrap().parent, Some(a));

        scene.remove_from_parent(a).unwrap();
        assert!(scene.children(root).is_empty());
        assert!(!scene.contains(a));
        assert!(!scene.contains(b));
        assert_eq!(
            scene.remove_from_parent(a),
            Err(SceneError::UnknownEntity(a))
        );
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.spawn();
        let b = scene.spawn();
        scene.add_child(root, a).unwrap();
        scene.add_child(root, b).unwrap();
        scene.add_child(a, b).unwrap();

        assert_eq!(scene.children(root), &[a]);
        assert_eq!(scene.children(a), &[b]);
    }

    #[test]
    fn test_root_and_cycles_rejected() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.spawn();
        let b = scene.spawn();
        scene.add_child(a, b).unwrap();

        assert_eq!(scene.add_child(a, root), Err(SceneError::RootIsFixed));
        assert_eq!(scene.remove_from_parent(root), Err(SceneError::RootIsFixed));
        assert_eq!(
            scene.add_child(b, a),
            Err(SceneError::Cycle { parent: b, child: a })
        );
    }

    #[test]
    fn test_replace_shapes_requires_collision() {
        let mut scene = SceneGraph::new();
        let a = scene.spawn();
        scene
            .replace_collision_shapes(a, vec![Shape::sphere(1.0)])
            .unwrap();
        assert!(scene.entity(a).unwrap().collision.is_none());

        scene
            .set_collision(
                a,
                CollisionComponent {
                    shapes: vec![Shape::sphere(1.0)],
                    is_static: true,
                },
            )
            .unwrap();
        scene
            .replace_collision_shapes(a, vec![Shape::sphere(2.0)])
            .unwrap();
        assert_eq!(
            scene.entity(a).unwrap().collision.as_ref().unwrap().shapes,
            vec![Shape::sphere(2.0)]
        );
    }
}
