use std::collections::HashSet;

use tracing::{debug, error, trace};

use crate::block::{Block, BlockFactory, PendingMotion};
use crate::codec::{self, StackData, SubStack};
use crate::error::BoardError;
use crate::motion::{self, MotionEvent, MotionPhase, MovementSpec, TweenHandle, Tweener};
use crate::types::{BlockId, BlockType, Coordinate};

/// Notifications a slot raises for its host. Drained with [`Slot::take_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    CountChanged(usize),
    TransferStarted(usize),
    TransferEnded(usize),
    Cleared,
}

/// Ordered stack of blocks. Index 0 is the bottom.
#[derive(Debug, Clone)]
pub struct Slot {
    owner: Coordinate,
    gap: f32,
    blocks: Vec<Block>,
    locked: bool,
    events: Vec<SlotEvent>,
}

impl Slot {
    pub fn new(owner: Coordinate, gap: f32) -> Self {
        Self {
            owner,
            gap,
            blocks: Vec::new(),
            locked: false,
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> Coordinate {
        self.owner
    }

    pub fn gap(&self) -> f32 {
        self.gap
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn height(&self) -> f32 {
        self.blocks.len() as f32 * self.gap
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn take_events(&mut self) -> Vec<SlotEvent> {
        std::mem::take(&mut self.events)
    }

    /// Appends a block at the top without animating it.
    ///
    /// Any motion still attached to the block is detached; use
    /// [`transfer_in`](Self::transfer_in) for blocks that are mid-flight.
    pub fn add_direct(&mut self, mut block: Block) {
        if let Some(handle) = block.take_motion() {
            trace!(slot = %self.owner, block = %block.id(), ?handle, "detached motion on direct add");
        }
        block.local_offset = motion::target_offset(self.blocks.len(), self.gap);
        block.fix_rotation();
        self.blocks.push(block);
        self.events.push(SlotEvent::CountChanged(self.blocks.len()));
    }

    /// Spawns the blocks described by `data`, bottom to top.
    ///
    /// Every run's type is resolved before anything is created, so an unknown
    /// type leaves the slot exactly as it was.
    pub fn spawn_from_data(
        &mut self,
        data: &StackData,
        factory: &mut dyn BlockFactory,
    ) -> Result<(), BoardError> {
        let mut runs = Vec::with_capacity(data.sub_stacks.len());
        for run in &data.sub_stacks {
            let Some(block_type) = factory.resolve(run.block_type.name()) else {
                error!(slot = %self.owner, block_type = %run.block_type, "block type not found");
                return Err(BoardError::UnknownBlockType(run.block_type.name().to_string()));
            };
            runs.push((block_type, run.count));
        }

        for (block_type, count) in runs {
            for _ in 0..count {
                let mut block = factory.create(block_type.clone());
                block.local_offset = motion::target_offset(self.blocks.len(), self.gap);
                self.blocks.push(block);
            }
        }
        trace!(slot = %self.owner, count = self.blocks.len(), "spawned stack");
        Ok(())
    }

    /// Takes ownership of `batch` and schedules its movement into place.
    ///
    /// Blocks belong to this slot as soon as the call returns; the animation only
    /// catches the visuals up. Offsets must already be in this slot's space.
    pub fn transfer_in(
        &mut self,
        batch: Vec<Block>,
        movement: &MovementSpec,
        tweener: &mut dyn Tweener,
    ) -> Vec<TweenHandle> {
        let batch_len = batch.len();
        let mut handles = Vec::with_capacity(batch_len);

        for (batch_index, mut block) in batch.into_iter().enumerate() {
            if let Some(previous) = block.take_motion() {
                tweener.cancel(previous);
            }
            let destination_index = self.blocks.len();
            let request = motion::plan_move(
                &block,
                self.owner,
                batch_index,
                batch_len,
                destination_index,
                self.gap,
                movement,
            );
            let target = request.to;
            let final_rotation = request.rotation.final_rotation();
            let handle = tweener.animate(request);
            block.begin_motion(PendingMotion {
                handle,
                target,
                final_rotation,
            });
            handles.push(handle);
            self.blocks.push(block);
            self.events.push(SlotEvent::CountChanged(self.blocks.len()));
        }

        debug!(
            slot = %self.owner,
            batch = batch_len,
            movement = %movement.name,
            delay = movement.effective_delay(batch_len),
            "transfer scheduled"
        );
        handles
    }

    /// Removes every block in `ids` in one pass, keeping the rest in order.
    ///
    /// Removed blocks are returned in the order requested. If any id is not held
    /// by this slot nothing is removed.
    pub fn remove_set(&mut self, ids: &[BlockId]) -> Result<Vec<Block>, BoardError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(&missing) = ids.iter().find(|id| self.index_of(**id).is_none()) {
            error!(slot = %self.owner, block = %missing, "block is not in the slot");
            return Err(BoardError::NotOwned { block: missing });
        }

        let wanted: HashSet<BlockId> = ids.iter().copied().collect();
        let (mut removed, kept): (Vec<Block>, Vec<Block>) = std::mem::take(&mut self.blocks)
            .into_iter()
            .partition(|block| wanted.contains(&block.id()));
        self.blocks = kept;

        let mut ordered = Vec::with_capacity(removed.len());
        for id in ids {
            if let Some(pos) = removed.iter().position(|block| block.id() == *id) {
                ordered.push(removed.swap_remove(pos));
            }
        }

        self.events.push(SlotEvent::CountChanged(self.blocks.len()));
        if self.blocks.is_empty() {
            self.events.push(SlotEvent::Cleared);
        }
        Ok(ordered)
    }

    /// Destroys every block, cancelling any movement still pending.
    pub fn destroy_all(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        for mut block in self.blocks.drain(..) {
            if let Some(handle) = block.take_motion() {
                tweener.cancel(handle);
            }
            factory.recycle(block);
        }
        self.events.push(SlotEvent::CountChanged(0));
        self.events.push(SlotEvent::Cleared);
    }

    /// Applies a tweener notification addressed to this slot.
    ///
    /// Returns false when the event refers to a block or motion this slot no
    /// longer tracks.
    pub fn apply_motion_event(&mut self, event: &MotionEvent) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|block| block.id() == event.block) else {
            trace!(slot = %self.owner, block = %event.block, "motion event for foreign block");
            return false;
        };
        match event.phase {
            MotionPhase::Started => {
                let tracked = block
                    .pending_motion()
                    .is_some_and(|motion| motion.handle == event.handle);
                if tracked {
                    self.events.push(SlotEvent::TransferStarted(event.batch_index));
                }
                tracked
            }
            MotionPhase::Completed => {
                let settled = block.complete_motion(event.handle);
                if settled {
                    self.events.push(SlotEvent::TransferEnded(event.batch_index));
                }
                settled
            }
        }
    }

    pub fn top_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Maximal trailing run of same-typed blocks, bottom to top.
    pub fn top_run(&self) -> &[Block] {
        let Some(top) = self.blocks.last() else {
            return &[];
        };
        let start = self
            .blocks
            .iter()
            .rposition(|block| block.block_type() != top.block_type())
            .map_or(0, |pos| pos + 1);
        &self.blocks[start..]
    }

    pub fn top_run_summary(&self) -> Option<SubStack> {
        let run = self.top_run();
        run.first().map(|block| SubStack {
            block_type: block.block_type().clone(),
            count: run.len() as u32,
        })
    }

    pub fn to_stack_data(&self) -> StackData {
        codec::encode(self.blocks.iter().map(Block::block_type))
    }

    pub fn count_of_type(&self, block_type: &BlockType) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.block_type() == block_type)
            .count()
    }

    pub fn distinct_type_count(&self) -> usize {
        self.blocks
            .iter()
            .map(Block::block_type)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Types of each run from the top of the stack down.
    pub fn layer_types(&self) -> Vec<BlockType> {
        let mut types: Vec<BlockType> = Vec::new();
        for block in self.blocks.iter().rev() {
            if types.last() != Some(block.block_type()) {
                types.push(block.block_type().clone());
            }
        }
        types
    }

    pub fn is_any_moving(&self) -> bool {
        self.blocks.iter().any(Block::is_moving)
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id() == id)
    }

    pub fn is_top(&self, id: BlockId) -> bool {
        self.blocks.last().is_some_and(|block| block.id() == id)
    }
}
