use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::block::BlockFactory;
use crate::codec::StackData;
use crate::error::BoardError;
use crate::motion::Tweener;
use crate::slot::Slot;
use crate::types::Coordinate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    #[default]
    Empty,
    Slot,
    Obstacle,
}

impl CellKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Slot => "slot",
            Self::Obstacle => "obstacle",
        }
    }
}

/// Authored contents of one cell.
///
/// `stack` and `covered` only carry meaning for [`CellKind::Slot`]; equality
/// ignores them for every other kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellData {
    pub kind: CellKind,
    #[serde(default)]
    pub stack: StackData,
    #[serde(default)]
    pub covered: bool,
}

impl CellData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn obstacle() -> Self {
        Self {
            kind: CellKind::Obstacle,
            ..Self::default()
        }
    }

    pub fn slot(stack: StackData) -> Self {
        Self {
            kind: CellKind::Slot,
            stack,
            covered: false,
        }
    }

    pub fn covered(mut self, covered: bool) -> Self {
        self.covered = covered;
        self
    }

    /// Copy with the slot payload dropped for non-slot kinds.
    pub fn canonical(&self) -> Self {
        if self.kind == CellKind::Slot {
            self.clone()
        } else {
            Self {
                kind: self.kind,
                ..Self::default()
            }
        }
    }
}

impl PartialEq for CellData {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if self.kind == CellKind::Slot {
            return self.stack.compare(&other.stack) && self.covered == other.covered;
        }
        true
    }
}

#[derive(Debug, Clone)]
enum Content {
    Empty,
    Slot(Slot),
    Obstacle,
}

/// One board position.
#[derive(Debug, Clone)]
pub struct Cell {
    coordinate: Coordinate,
    gap: f32,
    content: Content,
    covered: bool,
    /// World position assigned by the board.
    pub position: Vec3,
}

impl Cell {
    pub fn new(coordinate: Coordinate, gap: f32) -> Self {
        Self {
            coordinate,
            gap,
            content: Content::Empty,
            covered: false,
            position: Vec3::ZERO,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn kind(&self) -> CellKind {
        match self.content {
            Content::Empty => CellKind::Empty,
            Content::Slot(_) => CellKind::Slot,
            Content::Obstacle => CellKind::Obstacle,
        }
    }

    pub fn is_covered(&self) -> bool {
        self.covered
    }

    pub fn slot(&self) -> Option<&Slot> {
        match &self.content {
            Content::Slot(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn slot_mut(&mut self) -> Option<&mut Slot> {
        match &mut self.content {
            Content::Slot(slot) => Some(slot),
            _ => None,
        }
    }

    /// Number of blocks held, zero for non-slot cells.
    pub fn unit_count(&self) -> usize {
        self.slot().map_or(0, Slot::count)
    }

    /// Empty cells and slots without blocks. Obstacles are never empty.
    pub fn is_empty(&self) -> bool {
        match &self.content {
            Content::Empty => true,
            Content::Slot(slot) => slot.is_empty(),
            Content::Obstacle => false,
        }
    }

    /// Replaces the cell's contents with `data`.
    ///
    /// Existing blocks are destroyed first whatever the new kind is. When the
    /// new stack cannot be spawned the cell keeps its new kind with an empty slot.
    pub fn set_cell(
        &mut self,
        data: &CellData,
        factory: &mut dyn BlockFactory,
        tweener: &mut dyn Tweener,
    ) -> Result<(), BoardError> {
        self.clear_blocks(factory, tweener);
        self.covered = data.kind == CellKind::Slot && data.covered;
        match data.kind {
            CellKind::Empty => self.content = Content::Empty,
            CellKind::Obstacle => self.content = Content::Obstacle,
            CellKind::Slot => {
                let mut slot = Slot::new(self.coordinate, self.gap);
                let spawned = slot.spawn_from_data(&data.stack, factory);
                self.content = Content::Slot(slot);
                spawned?;
                trace!(cell = %self.coordinate, units = self.unit_count(), "slot populated");
            }
        }
        Ok(())
    }

    /// Forces the cell back to empty, destroying any blocks. Idempotent.
    pub fn reset(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        self.clear_blocks(factory, tweener);
        self.content = Content::Empty;
        self.covered = false;
    }

    /// Authored data matching the live state.
    pub fn to_cell_data(&self) -> CellData {
        match &self.content {
            Content::Empty => CellData::empty(),
            Content::Obstacle => CellData::obstacle(),
            Content::Slot(slot) => CellData::slot(slot.to_stack_data()).covered(self.covered),
        }
    }

    fn clear_blocks(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        if let Content::Slot(slot) = &mut self.content
            && !slot.is_empty()
        {
            slot.destroy_all(factory, tweener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockSpawner, TypeCatalog};
    use crate::codec::SubStack;
    use crate::motion::TweenTimeline;

    struct Fixture {
        factory: BlockSpawner<TypeCatalog>,
        timeline: TweenTimeline,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                factory: BlockSpawner::new(TypeCatalog::new(["red", "blue"])),
                timeline: TweenTimeline::new(),
            }
        }

        fn set(&mut self, cell: &mut Cell, data: &CellData) -> Result<(), BoardError> {
            cell.set_cell(data, &mut self.factory, &mut self.timeline)
        }
    }

    fn red_blue() -> StackData {
        StackData::new(vec![SubStack::new("red", 2), SubStack::new("blue", 1)])
    }

    #[test]
    fn slot_cell_spawns_its_stack() {
        let mut fx = Fixture::new();
        let mut cell = Cell::new(Coordinate::new(1, 1), 0.05);

        fx.set(&mut cell, &CellData::slot(red_blue()).covered(true)).unwrap();

        assert_eq!(cell.kind(), CellKind::Slot);
        assert_eq!(cell.unit_count(), 3);
        assert!(cell.is_covered());
        assert!(!cell.is_empty());
        assert_eq!(cell.to_cell_data(), CellData::slot(red_blue()).covered(true));
    }

    #[test]
    fn changing_kind_destroys_existing_blocks() {
        let mut fx = Fixture::new();
        let mut cell = Cell::new(Coordinate::new(0, 0), 0.05);
        fx.set(&mut cell, &CellData::slot(red_blue())).unwrap();

        fx.set(&mut cell, &CellData::obstacle()).unwrap();

        assert_eq!(cell.kind(), CellKind::Obstacle);
        assert!(cell.slot().is_none());
        assert!(!cell.is_empty());
        assert_eq!(fx.factory.live_count(), 0);
    }

    #[test]
    fn empty_slot_counts_as_empty() {
        let mut fx = Fixture::new();
        let mut cell = Cell::new(Coordinate::new(0, 0), 0.05);

        fx.set(&mut cell, &CellData::slot(StackData::default())).unwrap();

        assert_eq!(cell.kind(), CellKind::Slot);
        assert!(cell.is_empty());
    }

    #[test]
    fn reset_twice_leaves_cell_empty() {
        let mut fx = Fixture::new();
        let mut cell = Cell::new(Coordinate::new(0, 0), 0.05);
        fx.set(&mut cell, &CellData::slot(red_blue())).unwrap();

        for _ in 0..2 {
            cell.reset(&mut fx.factory, &mut fx.timeline);
            assert_eq!(cell.kind(), CellKind::Empty);
            assert_eq!(cell.unit_count(), 0);
            assert!(cell.is_empty());
        }
        assert_eq!(fx.factory.live_count(), 0);
    }

    #[test]
    fn unknown_block_type_leaves_empty_slot() {
        let mut fx = Fixture::new();
        let mut cell = Cell::new(Coordinate::new(0, 0), 0.05);
        let data = CellData::slot(StackData::new(vec![SubStack::new("gold", 1)]));

        let err = fx.set(&mut cell, &data).unwrap_err();

        assert!(err.is_data_integrity());
        assert_eq!(cell.kind(), CellKind::Slot);
        assert_eq!(cell.unit_count(), 0);
    }

    #[test]
    fn cell_data_equality_ignores_payload_outside_slots() {
        let with_payload = CellData {
            kind: CellKind::Obstacle,
            stack: red_blue(),
            covered: true,
        };

        assert_eq!(with_payload, CellData::obstacle());
        assert_ne!(CellData::slot(red_blue()), CellData::slot(red_blue()).covered(true));
        assert!(with_payload.canonical().stack.is_empty());
    }
}
