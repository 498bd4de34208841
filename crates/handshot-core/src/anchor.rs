//! Anchor types reported by the sensor platform
//!
//! Anchors are platform-owned: this crate only ever reads the latest snapshot
//! delivered with each update event.

use std::collections::HashMap;
use std::fmt;

use handshot_spatial::{compose, translation, Matrix4, Point3D};
use uuid::Uuid;

/// Stable identity of a tracked hand or surface patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub Uuid);

impl AnchorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnchorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handedness of a tracked hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chirality {
    Left,
    Right,
}

impl Chirality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// +1 for the left hand, -1 for the right; mirrors local-X quantities
    pub fn sign(&self) -> f32 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// The joints of the platform hand skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    ThumbKnuckle,
    ThumbIntermediateBase,
    ThumbIntermediateTip,
    ThumbTip,
    IndexFingerMetacarpal,
    IndexFingerKnuckle,
    IndexFingerIntermediateBase,
    IndexFingerIntermediateTip,
    IndexFingerTip,
    MiddleFingerMetacarpal,
    MiddleFingerKnuckle,
    MiddleFingerIntermediateBase,
    MiddleFingerIntermediateTip,
    MiddleFingerTip,
    RingFingerMetacarpal,
    RingFingerKnuckle,
    RingFingerIntermediateBase,
    RingFingerIntermediateTip,
    RingFingerTip,
    LittleFingerMetacarpal,
    LittleFingerKnuckle,
    LittleFingerIntermediateBase,
    LittleFingerIntermediateTip,
    LittleFingerTip,
    ForearmWrist,
    ForearmArm,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 27;

impl HandJoint {
    pub const ALL: [HandJoint; JOINT_COUNT] = [
        Self::Wrist,
        Self::ThumbKnuckle,
        Self::ThumbIntermediateBase,
        Self::ThumbIntermediateTip,
        Self::ThumbTip,
        Self::IndexFingerMetacarpal,
        Self::IndexFingerKnuckle,
        Self::IndexFingerIntermediateBase,
        Self::IndexFingerIntermediateTip,
        Self::IndexFingerTip,
        Self::MiddleFingerMetacarpal,
        Self::MiddleFingerKnuckle,
        Self::MiddleFingerIntermediateBase,
        Self::MiddleFingerIntermediateTip,
        Self::MiddleFingerTip,
        Self::RingFingerMetacarpal,
        Self::RingFingerKnuckle,
        Self::RingFingerIntermediateBase,
        Self::RingFingerIntermediateTip,
        Self::RingFingerTip,
        Self::LittleFingerMetacarpal,
        Self::LittleFingerKnuckle,
        Self::LittleFingerIntermediateBase,
        Self::LittleFingerIntermediateTip,
        Self::LittleFingerTip,
        Self::ForearmWrist,
        Self::ForearmArm,
    ];
}

/// Pose of one joint relative to its hand anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonJoint {
    pub anchor_from_joint: Matrix4,
    pub is_tracked: bool,
}

impl SkeletonJoint {
    pub fn tracked(anchor_from_joint: Matrix4) -> Self {
        Self {
            anchor_from_joint,
            is_tracked: true,
        }
    }

    pub fn untracked(anchor_from_joint: Matrix4) -> Self {
        Self {
            anchor_from_joint,
            is_tracked: false,
        }
    }
}

/// Joint set of one hand; joints the platform did not report are absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandSkeleton {
    joints: HashMap<HandJoint, SkeletonJoint>,
}

impl HandSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joint(mut self, name: HandJoint, joint: SkeletonJoint) -> Self {
        self.joints.insert(name, joint);
        self
    }

    pub fn set_joint(&mut self, name: HandJoint, joint: SkeletonJoint) {
        self.joints.insert(name, joint);
    }

    pub fn joint(&self, name: HandJoint) -> Option<&SkeletonJoint> {
        self.joints.get(&name)
    }

    /// The joint only if present and currently tracked
    pub fn tracked_joint(&self, name: HandJoint) -> Option<&SkeletonJoint> {
        self.joint(name).filter(|j| j.is_tracked)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Latest snapshot of a tracked hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandAnchor {
    pub id: AnchorId,
    pub chirality: Chirality,
    pub is_tracked: bool,
    pub origin_from_anchor: Matrix4,
    pub skeleton: Option<HandSkeleton>,
}

impl HandAnchor {
    /// World-space position of a tracked joint
    pub fn joint_world_position(&self, name: HandJoint) -> Option<Point3D> {
        let joint = self.skeleton.as_ref()?.tracked_joint(name)?;
        Some(translation(&compose(
            &self.origin_from_anchor,
            &joint.anchor_from_joint,
        )))
    }
}

/// Raw reconstructed surface: vertex positions and triangle indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
}

/// Latest snapshot of a reconstructed surface patch
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAnchor {
    pub id: AnchorId,
    pub origin_from_anchor: Matrix4,
    pub geometry: MeshGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorEvent {
    Added,
    Updated,
    Removed,
}

impl AnchorEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Removed => "removed",
        }
    }
}

/// One item of an anchor update stream
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorUpdate<A> {
    pub event: AnchorEvent,
    pub anchor: A,
}

impl<A> AnchorUpdate<A> {
    pub fn new(event: AnchorEvent, anchor: A) -> Self {
        Self { event, anchor }
    }

    pub fn added(anchor: A) -> Self {
        Self::new(AnchorEvent::Added, anchor)
    }

    pub fn updated(anchor: A) -> Self {
        Self::new(AnchorEvent::Updated, anchor)
    }

    pub fn removed(anchor: A) -> Self {
        Self::new(AnchorEvent::Removed, anchor)
    }
}
