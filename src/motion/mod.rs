//! Movement scheduling for batch transfers into a slot.
//!
//! Each block of a batch starts `i * delay` after the first, where the per-block
//! delay shrinks when needed so that the whole batch spreads over at most
//! `max_cumulative_delay`. Blocks travel to `(0, index * gap, 0)` in the
//! destination and either flip over or snap their yaw on the way.

pub mod ease;
pub mod tween;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::types::Coordinate;

pub use ease::Ease;
pub use tween::{MotionEvent, MotionPhase, TweenHandle, TweenRequest, TweenTimeline, Tweener};

pub const DEFAULT_MOVEMENT: &str = "default";

/// Below this margin a move is never treated as horizontal when choosing the flip axis.
const FLIP_AXIS_DEADBAND: f32 = 0.05;
const JUMP_POWER: f32 = 1.0;

/// Timing and geometry shared by every block of a batch transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSpec {
    pub name: String,
    /// Seconds each block spends travelling.
    pub duration: f32,
    pub ease: Ease,
    /// Stagger between consecutive blocks, in seconds.
    pub delay_per_block: f32,
    pub flip: bool,
    pub jump: bool,
    /// Upper bound on the total stagger of one batch, in seconds.
    pub max_cumulative_delay: f32,
}

impl Default for MovementSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_MOVEMENT.to_string(),
            duration: 0.3,
            ease: Ease::OutQuad,
            delay_per_block: 0.05,
            flip: false,
            jump: false,
            max_cumulative_delay: 2.0,
        }
    }
}

impl MovementSpec {
    pub fn effective_delay(&self, batch_len: usize) -> f32 {
        effective_delay(batch_len, self.delay_per_block, self.max_cumulative_delay)
    }

    pub fn start_delay(&self, batch_index: usize, batch_len: usize) -> f32 {
        batch_index as f32 * self.effective_delay(batch_len)
    }

    /// Start delays for a whole batch, in batch order.
    pub fn start_delays(&self, batch_len: usize) -> Vec<f32> {
        let delay = self.effective_delay(batch_len);
        (0..batch_len).map(|i| i as f32 * delay).collect()
    }

    fn path(&self) -> MotionPath {
        if self.jump {
            MotionPath::Jump {
                power: JUMP_POWER,
                jumps: 1,
            }
        } else {
            MotionPath::Linear
        }
    }
}

/// Per-block stagger after applying the cumulative cap.
pub fn effective_delay(batch_len: usize, delay_per_block: f32, max_cumulative_delay: f32) -> f32 {
    if batch_len == 0 {
        return 0.0;
    }
    let total = batch_len as f32 * delay_per_block;
    if total > max_cumulative_delay {
        max_cumulative_delay / batch_len as f32
    } else {
        delay_per_block
    }
}

/// Resting offset of the block at `index` inside a slot.
pub fn target_offset(index: usize, gap: f32) -> Vec3 {
    Vec3::new(0.0, index as f32 * gap, 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPath {
    Linear,
    Jump { power: f32, jumps: u32 },
}

/// How a block turns while it travels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPlan {
    /// Add 180 degrees about `axis`, then reset to identity on arrival.
    Flip { axis: Vec3 },
    /// Turn to an absolute yaw in degrees.
    Snap { yaw: f32 },
}

impl RotationPlan {
    pub fn for_move(flip: bool, displacement: Vec3, current_rotation: Vec3) -> Self {
        if flip {
            Self::Flip {
                axis: flip_axis(displacement),
            }
        } else {
            Self::Snap {
                yaw: settle_yaw(current_rotation.y),
            }
        }
    }

    /// Euler rotation the block holds once the move has completed.
    pub fn final_rotation(&self) -> Vec3 {
        match *self {
            Self::Flip { .. } => Vec3::ZERO,
            Self::Snap { yaw } => Vec3::new(0.0, yaw, 0.0),
        }
    }

    /// Euler rotation at eased progress `t`, starting from `from`.
    pub fn sample(&self, from: Vec3, t: f32) -> Vec3 {
        match *self {
            Self::Flip { axis } => from + axis * (180.0 * t),
            Self::Snap { yaw } => from.lerp(Vec3::new(0.0, yaw, 0.0), t),
        }
    }
}

/// Screen-plane axis for a flip, chosen from the dominant displacement component.
pub fn flip_axis(displacement: Vec3) -> Vec3 {
    let horizontal = displacement.x.abs() - displacement.z.abs() >= FLIP_AXIS_DEADBAND;
    if horizontal {
        if displacement.x < 0.0 { Vec3::Z } else { Vec3::NEG_Z }
    } else if displacement.z > 0.0 {
        Vec3::X
    } else {
        Vec3::NEG_X
    }
}

/// Yaw a non-flipping block settles at: 180 when the current yaw lies in
/// `[45, 225)`, otherwise 0.
pub fn settle_yaw(yaw: f32) -> f32 {
    let yaw = yaw.rem_euclid(360.0);
    if (45.0..225.0).contains(&yaw) { 180.0 } else { 0.0 }
}

/// Builds the tween request for one block of a batch.
///
/// `block.local_offset` must already be expressed in the destination slot's space.
pub fn plan_move(
    block: &Block,
    owner: Coordinate,
    batch_index: usize,
    batch_len: usize,
    destination_index: usize,
    gap: f32,
    spec: &MovementSpec,
) -> TweenRequest {
    let to = target_offset(destination_index, gap);
    let from = block.local_offset;
    TweenRequest {
        block: block.id(),
        owner,
        batch_index,
        from,
        to,
        from_rotation: block.rotation,
        rotation: RotationPlan::for_move(spec.flip, to - from, block.rotation),
        path: spec.path(),
        duration: spec.duration.max(0.0),
        ease: spec.ease,
        start_delay: spec.start_delay(batch_index, batch_len),
    }
}
