//! The tween seam and a deterministic, tick-driven timeline behind it.

use std::f32::consts::PI;

use glam::Vec3;
use serde::Serialize;

use super::{Ease, MotionPath, RotationPlan};
use crate::types::{BlockId, Coordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TweenHandle(pub u64);

/// Everything an animation host needs to move one block.
#[derive(Debug, Clone, PartialEq)]
pub struct TweenRequest {
    pub block: BlockId,
    /// Coordinate of the slot the block now belongs to.
    pub owner: Coordinate,
    pub batch_index: usize,
    pub from: Vec3,
    pub to: Vec3,
    pub from_rotation: Vec3,
    pub rotation: RotationPlan,
    pub path: MotionPath,
    pub duration: f32,
    pub ease: Ease,
    pub start_delay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    Started,
    Completed,
}

/// Notification raised by a tweener. Each handle reports `Started` once and then
/// `Completed` once, unless cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotionEvent {
    pub handle: TweenHandle,
    pub block: BlockId,
    pub owner: Coordinate,
    pub batch_index: usize,
    pub phase: MotionPhase,
}

/// Animation host.
pub trait Tweener {
    fn animate(&mut self, request: TweenRequest) -> TweenHandle;

    /// Drops a pending or running tween. No further events are raised for it.
    fn cancel(&mut self, handle: TweenHandle);

    /// Current local offset and rotation of a live tween, when the host can
    /// report them. Hosts that cannot leave blocks to snap from their last
    /// settled pose.
    fn sample(&self, _handle: TweenHandle) -> Option<(Vec3, Vec3)> {
        None
    }
}

#[derive(Debug, Clone)]
struct ActiveTween {
    handle: TweenHandle,
    request: TweenRequest,
    elapsed: f32,
    started: bool,
}

impl ActiveTween {
    fn end_time(&self) -> f32 {
        self.request.start_delay + self.request.duration
    }

    fn eased_progress(&self) -> f32 {
        let request = &self.request;
        if request.duration <= 0.0 {
            return if self.elapsed >= request.start_delay { 1.0 } else { 0.0 };
        }
        let t = (self.elapsed - request.start_delay) / request.duration;
        request.ease.apply(t)
    }

    fn raw_progress(&self) -> f32 {
        let request = &self.request;
        if request.duration <= 0.0 {
            return 1.0;
        }
        ((self.elapsed - request.start_delay) / request.duration).clamp(0.0, 1.0)
    }

    fn event(&self, phase: MotionPhase) -> MotionEvent {
        MotionEvent {
            handle: self.handle,
            block: self.request.block,
            owner: self.request.owner,
            batch_index: self.request.batch_index,
            phase,
        }
    }
}

/// Deterministic tweener advanced by explicit time steps.
///
/// Events raised within one [`advance`](Self::advance) call are ordered by the
/// instant they occur; ties keep the order the tweens were requested in.
#[derive(Debug, Clone, Default)]
pub struct TweenTimeline {
    next_handle: u64,
    active: Vec<ActiveTween>,
}

impl TweenTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, handle: TweenHandle) -> bool {
        self.find(handle).is_some()
    }

    /// Eased progress in `[0, 1]` (can overshoot for back easing).
    pub fn progress(&self, handle: TweenHandle) -> Option<f32> {
        self.find(handle).map(ActiveTween::eased_progress)
    }

    /// Current local offset and rotation of a running tween.
    pub fn sample(&self, handle: TweenHandle) -> Option<(Vec3, Vec3)> {
        let tween = self.find(handle)?;
        let request = &tween.request;
        let t = tween.eased_progress();
        let mut position = request.from.lerp(request.to, t);
        if let MotionPath::Jump { power, jumps } = request.path {
            let arc = (tween.raw_progress() * jumps as f32 * PI).sin().abs();
            position.y += arc * power;
        }
        let rotation = request.rotation.sample(request.from_rotation, t);
        Some((position, rotation))
    }

    /// Moves every tween forward by `dt` seconds and returns the events raised.
    pub fn advance(&mut self, dt: f32) -> Vec<MotionEvent> {
        let dt = dt.max(0.0);
        let mut raised: Vec<(f32, TweenHandle, MotionPhase, MotionEvent)> = Vec::new();

        for tween in &mut self.active {
            let before = tween.elapsed;
            tween.elapsed += dt;
            if !tween.started && tween.elapsed >= tween.request.start_delay {
                tween.started = true;
                let at = tween.request.start_delay - before;
                raised.push((at, tween.handle, MotionPhase::Started, tween.event(MotionPhase::Started)));
            }
            if tween.started && tween.elapsed >= tween.end_time() {
                let at = tween.end_time() - before;
                raised.push((
                    at,
                    tween.handle,
                    MotionPhase::Completed,
                    tween.event(MotionPhase::Completed),
                ));
            }
        }

        self.active.retain(|tween| tween.elapsed < tween.end_time() || !tween.started);

        raised.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| phase_rank(a.2).cmp(&phase_rank(b.2)))
                .then_with(|| a.1.cmp(&b.1))
        });
        raised.into_iter().map(|(_, _, _, event)| event).collect()
    }

    /// Advances until idle, in steps of `step` seconds.
    pub fn run_to_completion(&mut self, step: f32) -> Vec<MotionEvent> {
        let step = if step > 0.0 { step } else { 1.0 / 60.0 };
        let mut events = Vec::new();
        while !self.is_idle() {
            events.extend(self.advance(step));
        }
        events
    }

    fn find(&self, handle: TweenHandle) -> Option<&ActiveTween> {
        self.active.iter().find(|tween| tween.handle == handle)
    }
}

fn phase_rank(phase: MotionPhase) -> u8 {
    match phase {
        MotionPhase::Started => 0,
        MotionPhase::Completed => 1,
    }
}

impl Tweener for TweenTimeline {
    fn animate(&mut self, request: TweenRequest) -> TweenHandle {
        self.next_handle += 1;
        let handle = TweenHandle(self.next_handle);
        self.active.push(ActiveTween {
            handle,
            request,
            elapsed: 0.0,
            started: false,
        });
        handle
    }

    fn cancel(&mut self, handle: TweenHandle) {
        self.active.retain(|tween| tween.handle != handle);
    }

    fn sample(&self, handle: TweenHandle) -> Option<(Vec3, Vec3)> {
        TweenTimeline::sample(self, handle)
    }
}
