//! Trigger-pose ("finger gun") detection from skeletal joints
//!
//! The pose is recognised when the thumb tip rests against the index-finger
//! knuckle: both joints tracked and closer than the trigger distance in world
//! space.

use handshot_config::{GestureConfig, DEFAULT_TRIGGER_DISTANCE};
use handshot_spatial::Matrix4;

use crate::anchor::{HandAnchor, HandJoint};

/// Stateless detector holding the configured trigger distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureDetector {
    trigger_distance: f32,
}

impl GestureDetector {
    pub fn new(trigger_distance: f32) -> Self {
        Self { trigger_distance }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(config.trigger_distance)
    }

    pub fn trigger_distance(&self) -> f32 {
        self.trigger_distance
    }

    /// The hand's world transform if it is holding the trigger pose
    pub fn detect_gun_gesture_transform(&self, hand: Option<&HandAnchor>) -> Option<Matrix4> {
        detect_gun_gesture_transform(hand, self.trigger_distance)
    }
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_DISTANCE)
    }
}

/// Returns `hand.origin_from_anchor` when the thumb tip and index knuckle are
/// both tracked and strictly closer than `trigger_distance` meters
pub fn detect_gun_gesture_transform(
    hand: Option<&HandAnchor>,
    trigger_distance: f32,
) -> Option<Matrix4> {
    let hand = hand?;
    let thumb_tip = hand.joint_world_position(HandJoint::ThumbTip)?;
    let index_knuckle = hand.joint_world_position(HandJoint::IndexFingerKnuckle)?;

    if thumb_tip.distance(&index_knuckle) < trigger_distance {
        Some(hand.origin_from_anchor)
    } else {
        None
    }
}
