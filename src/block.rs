use std::collections::HashMap;

use glam::Vec3;

use crate::motion::tween::TweenHandle;
use crate::types::{BlockId, BlockType};

/// A move that has been handed to the tweener but not yet completed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMotion {
    pub handle: TweenHandle,
    pub target: Vec3,
    pub final_rotation: Vec3,
}

/// One typed unit inside a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: BlockId,
    block_type: BlockType,
    /// Offset inside the owning slot. Lags behind the stack index while moving.
    pub local_offset: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pending: Option<PendingMotion>,
}

impl Block {
    pub fn new(id: BlockId, block_type: BlockType) -> Self {
        Self {
            id,
            block_type,
            local_offset: Vec3::ZERO,
            rotation: Vec3::ZERO,
            pending: None,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn block_type(&self) -> &BlockType {
        &self.block_type
    }

    pub fn is_moving(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_motion(&self) -> Option<&PendingMotion> {
        self.pending.as_ref()
    }

    pub fn fix_rotation(&mut self) {
        self.rotation = Vec3::ZERO;
    }

    pub(crate) fn begin_motion(&mut self, motion: PendingMotion) {
        self.pending = Some(motion);
    }

    /// Detaches the pending motion without settling, returning its handle.
    pub(crate) fn take_motion(&mut self) -> Option<TweenHandle> {
        self.pending.take().map(|motion| motion.handle)
    }

    /// Settles the block if `handle` is the motion it is waiting on.
    pub(crate) fn complete_motion(&mut self, handle: TweenHandle) -> bool {
        match self.pending {
            Some(motion) if motion.handle == handle => {
                self.local_offset = motion.target;
                self.rotation = motion.final_rotation;
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

/// Resolves block type names coming from level data.
pub trait TypeRegistry {
    fn resolve(&self, name: &str) -> Option<BlockType>;
}

/// Creates and disposes of blocks.
///
/// A pooling host can keep recycled blocks around; the default simply drops them.
pub trait BlockFactory {
    fn resolve(&self, name: &str) -> Option<BlockType>;

    fn create(&mut self, block_type: BlockType) -> Block;

    fn recycle(&mut self, block: Block) {
        drop(block);
    }
}

/// Registry backed by a fixed set of names.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, BlockType>,
}

impl TypeCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let types = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                (name.to_string(), BlockType::new(name))
            })
            .collect();
        Self { types }
    }

    pub fn register(&mut self, name: &str) -> BlockType {
        self.types
            .entry(name.to_string())
            .or_insert_with(|| BlockType::new(name))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeRegistry for TypeCatalog {
    fn resolve(&self, name: &str) -> Option<BlockType> {
        self.types.get(name).cloned()
    }
}

/// Factory that mints sequential block ids and checks names against a registry.
#[derive(Debug, Clone)]
pub struct BlockSpawner<R> {
    registry: R,
    next_id: u64,
    live: usize,
}

impl<R: TypeRegistry> BlockSpawner<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            next_id: 1,
            live: 0,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Blocks created and not yet recycled.
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl<R: TypeRegistry> BlockFactory for BlockSpawner<R> {
    fn resolve(&self, name: &str) -> Option<BlockType> {
        self.registry.resolve(name)
    }

    fn create(&mut self, block_type: BlockType) -> Block {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.live += 1;
        Block::new(id, block_type)
    }

    fn recycle(&mut self, block: Block) {
        self.live = self.live.saturating_sub(1);
        drop(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawner_mints_unique_ids_and_tracks_live_blocks() {
        let mut spawner = BlockSpawner::new(TypeCatalog::new(["red", "blue"]));
        let red = spawner.resolve("red").unwrap();

        let a = spawner.create(red.clone());
        let b = spawner.create(red);

        assert_ne!(a.id(), b.id());
        assert_eq!(spawner.live_count(), 2);

        spawner.recycle(a);
        assert_eq!(spawner.live_count(), 1);
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        let catalog = TypeCatalog::new(["red"]);

        assert_eq!(catalog.resolve("red"), Some(BlockType::new("red")));
        assert_eq!(catalog.resolve("green"), None);
    }

    #[test]
    fn completion_with_stale_handle_leaves_block_moving() {
        let mut block = Block::new(BlockId(1), BlockType::new("red"));
        block.begin_motion(PendingMotion {
            handle: TweenHandle(7),
            target: Vec3::new(0.0, 0.1, 0.0),
            final_rotation: Vec3::ZERO,
        });

        assert!(!block.complete_motion(TweenHandle(3)));
        assert!(block.is_moving());

        assert!(block.complete_motion(TweenHandle(7)));
        assert!(!block.is_moving());
        assert_eq!(block.local_offset, Vec3::new(0.0, 0.1, 0.0));
    }
}
