//! Last-known hand state and the per-update gesture trigger

use tracing::{debug, trace};

use crate::anchor::{AnchorEvent, AnchorUpdate, Chirality, HandAnchor};
use crate::projectile::ProjectileSpawner;
use crate::scene::{EntityId, SceneBackend};

/// Most recent tracked snapshot per hand; overwritten, never appended
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandsUpdates {
    pub left: Option<HandAnchor>,
    pub right: Option<HandAnchor>,
}

impl HandsUpdates {
    pub fn get(&self, chirality: Chirality) -> Option<&HandAnchor> {
        match chirality {
            Chirality::Left => self.left.as_ref(),
            Chirality::Right => self.right.as_ref(),
        }
    }

    fn slot_mut(&mut self, chirality: Chirality) -> &mut Option<HandAnchor> {
        match chirality {
            Chirality::Left => &mut self.left,
            Chirality::Right => &mut self.right,
        }
    }
}

#[derive(Debug, Default)]
pub struct HandTrackingReconciler {
    latest: HandsUpdates,
}

impl HandTrackingReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> &HandsUpdates {
        &self.latest
    }

    /// Record a tracked update and fire the spawner for that hand.
    ///
    /// Only `updated` events on tracked anchors are acted on. Returns the
    /// projectile spawned by this update, if any.
    pub fn apply(
        &mut self,
        update: AnchorUpdate<HandAnchor>,
        spawner: &mut ProjectileSpawner,
        scene: &mut dyn SceneBackend,
    ) -> Option<EntityId> {
        if update.event != AnchorEvent::Updated {
            trace!("Ignoring hand {} event", update.event.as_str());
            return None;
        }
        if !update.anchor.is_tracked {
            trace!("Ignoring untracked {} hand", update.anchor.chirality.as_str());
            return None;
        }

        let chirality = update.anchor.chirality;
        *self.latest.slot_mut(chirality) = Some(update.anchor);

        let spawned = spawner.spawn(self.latest.get(chirality), scene);
        if spawned.is_some() {
            debug!("Trigger pose on {} hand", chirality.as_str());
        }
        spawned
    }
}
