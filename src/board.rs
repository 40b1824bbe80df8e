use std::collections::HashMap;

use glam::Vec3;
use tracing::{debug, info, warn};

use crate::block::{Block, BlockFactory};
use crate::cell::{Cell, CellData, CellKind};
use crate::coordinate::{self, CoordinateLayout};
use crate::error::BoardError;
use crate::level::LevelLayout;
use crate::motion::{MotionEvent, MovementSpec, TweenHandle, Tweener};
use crate::types::{BlockId, Coordinate};

/// Rectangular grid of cells keyed by coordinate.
#[derive(Debug, Clone)]
pub struct Board {
    rows: i32,
    columns: i32,
    gap: f32,
    layout: CoordinateLayout,
    x_offset: f32,
    cells: HashMap<Coordinate, Cell>,
}

impl Board {
    /// Creates a board with no cells. Call [`rebuild`](Self::rebuild) or
    /// [`load_level`](Self::load_level) to populate it.
    pub fn new(layout: CoordinateLayout, gap: f32) -> Self {
        Self {
            rows: 0,
            columns: 0,
            gap,
            layout,
            x_offset: 0.0,
            cells: HashMap::new(),
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn x_offset(&self) -> f32 {
        self.x_offset
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_valid_coordinate(&self, coordinate: Coordinate) -> bool {
        coordinate::in_bounds(coordinate, self.rows, self.columns)
    }

    pub fn cell(&self, coordinate: Coordinate) -> Option<&Cell> {
        self.cells.get(&coordinate)
    }

    pub fn cell_mut(&mut self, coordinate: Coordinate) -> Option<&mut Cell> {
        self.cells.get_mut(&coordinate)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.columns).map(move |column| Coordinate::new(row, column)))
            .filter_map(move |coordinate| self.cells.get(&coordinate))
    }

    /// Coordinate of a row-major index, `None` past the last cell.
    pub fn index_to_coordinate(&self, index: usize) -> Option<Coordinate> {
        coordinate::index_to_coordinate(index, self.rows, self.columns)
    }

    pub fn coordinate_to_index(&self, coordinate: Coordinate) -> Option<usize> {
        coordinate::coordinate_to_index(coordinate, self.rows, self.columns)
    }

    pub fn coordinate_to_position(&self, coordinate: Coordinate) -> Vec3 {
        self.origin_shift() + self.layout.to_position(coordinate)
    }

    pub fn position_to_coordinate(&self, position: Vec3) -> Coordinate {
        self.layout.to_coordinate(position - self.origin_shift())
    }

    /// Total blocks across every slot cell.
    pub fn count_occupied_units(&self) -> usize {
        self.cells
            .values()
            .filter(|cell| cell.kind() == CellKind::Slot)
            .map(Cell::unit_count)
            .sum()
    }

    /// True when no block on the board is mid-animation.
    pub fn is_settled(&self) -> bool {
        self.cells
            .values()
            .filter_map(Cell::slot)
            .all(|slot| !slot.is_any_moving())
    }

    /// Destroys every cell and builds a fresh `rows` x `columns` grid, running
    /// `init` on each new cell in row-major order.
    pub fn rebuild<F>(
        &mut self,
        rows: i32,
        columns: i32,
        factory: &mut dyn BlockFactory,
        tweener: &mut dyn Tweener,
        mut init: F,
    ) where
        F: FnMut(&mut Cell),
    {
        self.teardown(factory, tweener);
        self.rows = rows.max(0);
        self.columns = columns.max(0);
        self.cells.reserve(coordinate::area(self.rows, self.columns));
        for row in 0..self.rows {
            for column in 0..self.columns {
                let coordinate = Coordinate::new(row, column);
                let mut cell = self.new_cell(coordinate);
                init(&mut cell);
                self.cells.insert(coordinate, cell);
            }
        }
        info!(rows = self.rows, columns = self.columns, "board rebuilt");
    }

    /// Resets and removes every cell, leaving a 0 x 0 board.
    pub fn clear(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        self.teardown(factory, tweener);
        self.rows = 0;
        self.columns = 0;
    }

    pub fn add_row(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        self.resize_partial(self.rows + 1, self.columns, factory, tweener);
    }

    pub fn add_column(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        self.resize_partial(self.rows, self.columns + 1, factory, tweener);
    }

    pub fn remove_row(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        self.resize_partial(self.rows - 1, self.columns, factory, tweener);
    }

    pub fn remove_column(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        self.resize_partial(self.rows, self.columns - 1, factory, tweener);
    }

    /// Changes dimensions while keeping every cell that stays in range untouched.
    pub fn resize_partial(
        &mut self,
        rows: i32,
        columns: i32,
        factory: &mut dyn BlockFactory,
        tweener: &mut dyn Tweener,
    ) {
        self.rows = rows.max(0);
        self.columns = columns.max(0);

        let (rows, columns) = (self.rows, self.columns);
        let dropped: Vec<Coordinate> = self
            .cells
            .keys()
            .copied()
            .filter(|c| !coordinate::in_bounds(*c, rows, columns))
            .collect();
        for coordinate in &dropped {
            if let Some(mut cell) = self.cells.remove(coordinate) {
                cell.reset(factory, tweener);
            }
        }

        let mut created = 0usize;
        for row in 0..rows {
            for column in 0..columns {
                let coordinate = Coordinate::new(row, column);
                if !self.cells.contains_key(&coordinate) {
                    let cell = self.new_cell(coordinate);
                    self.cells.insert(coordinate, cell);
                    created += 1;
                }
            }
        }
        debug!(rows, columns, created, removed = dropped.len(), "board resized");
    }

    /// Rebuilds the board from an authored layout.
    ///
    /// The layout is validated before anything changes. Cells are then filled
    /// in row-major order. A cell that fails to spawn is left as an empty slot,
    /// the remaining cells still load, and the first failure is returned.
    pub fn load_level(
        &mut self,
        level: &LevelLayout,
        factory: &mut dyn BlockFactory,
        tweener: &mut dyn Tweener,
    ) -> Result<(), BoardError> {
        if let Err(err) = level.validate() {
            warn!(%err, "level rejected");
            return Err(err);
        }

        self.x_offset = level.x_offset;
        self.rebuild(level.rows, level.columns, factory, tweener, |_| {});
        let mut first_error = None;
        for (index, data) in level.cells.iter().enumerate() {
            let Some(coordinate) = self.index_to_coordinate(index) else {
                continue;
            };
            let Some(cell) = self.cells.get_mut(&coordinate) else {
                continue;
            };
            if let Err(err) = cell.set_cell(data, factory, tweener) {
                warn!(cell = %coordinate, %err, "level cell failed to load");
                first_error.get_or_insert(err);
            }
        }
        info!(
            rows = self.rows,
            columns = self.columns,
            units = self.count_occupied_units(),
            failed = first_error.is_some(),
            "level loaded"
        );
        first_error.map_or(Ok(()), Err)
    }

    /// Captures the current board as an authored layout.
    pub fn to_level_layout(&self) -> LevelLayout {
        LevelLayout {
            rows: self.rows,
            columns: self.columns,
            x_offset: self.x_offset,
            cells: self.cells().map(Cell::to_cell_data).collect(),
        }
    }

    /// True when the live board matches `level` cell for cell.
    pub fn matches_layout(&self, level: &LevelLayout) -> bool {
        level.rows == self.rows
            && level.columns == self.columns
            && level.cells.len() == self.cells.len()
            && self
                .cells()
                .zip(&level.cells)
                .all(|(cell, data): (&Cell, &CellData)| cell.to_cell_data() == *data)
    }

    /// Moves the top run of `from` onto `to`.
    ///
    /// Blocks leave from the top down, so the topmost block lands first.
    pub fn transfer_top_run(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        movement: &MovementSpec,
        tweener: &mut dyn Tweener,
    ) -> Result<Vec<TweenHandle>, BoardError> {
        let source = self.slot_cell(from)?;
        let ids: Vec<BlockId> = source
            .slot()
            .map(|slot| slot.top_run().iter().rev().map(Block::id).collect())
            .unwrap_or_default();
        self.transfer(from, to, &ids, movement, tweener)
    }

    /// Moves the blocks `ids` from `from` onto `to`, in the order given.
    pub fn transfer(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        ids: &[BlockId],
        movement: &MovementSpec,
        tweener: &mut dyn Tweener,
    ) -> Result<Vec<TweenHandle>, BoardError> {
        if from == to {
            return Err(BoardError::SameCell(from));
        }
        let destination_position = self.slot_cell(to)?.position;
        let source = self.slot_cell_mut(from)?;
        let source_position = source.position;
        let Some(slot) = source.slot_mut() else {
            return Err(BoardError::NotASlot(from));
        };
        let mut batch = slot.remove_set(ids)?;

        // Re-express offsets in the destination slot's space so the flight starts
        // where the block was. Blocks still in flight start from their sampled pose.
        let shift = source_position - destination_position;
        for block in &mut batch {
            if let Some(motion) = block.pending_motion()
                && let Some((offset, rotation)) = tweener.sample(motion.handle)
            {
                block.local_offset = offset;
                block.rotation = rotation;
            }
            block.local_offset += shift;
        }

        debug!(%from, %to, count = batch.len(), "transferring blocks");
        let Some(destination) = self.slot_cell_mut(to)?.slot_mut() else {
            return Err(BoardError::NotASlot(to));
        };
        Ok(destination.transfer_in(batch, movement, tweener))
    }

    /// Routes a tweener notification to the slot that owns the block.
    pub fn dispatch_motion(&mut self, event: &MotionEvent) -> bool {
        self.cells
            .get_mut(&event.owner)
            .and_then(Cell::slot_mut)
            .is_some_and(|slot| slot.apply_motion_event(event))
    }

    fn slot_cell(&self, coordinate: Coordinate) -> Result<&Cell, BoardError> {
        let cell = self
            .cells
            .get(&coordinate)
            .ok_or(BoardError::OutOfRange(coordinate))?;
        if cell.kind() != CellKind::Slot {
            return Err(BoardError::NotASlot(coordinate));
        }
        Ok(cell)
    }

    fn slot_cell_mut(&mut self, coordinate: Coordinate) -> Result<&mut Cell, BoardError> {
        let cell = self
            .cells
            .get_mut(&coordinate)
            .ok_or(BoardError::OutOfRange(coordinate))?;
        if cell.kind() != CellKind::Slot {
            return Err(BoardError::NotASlot(coordinate));
        }
        Ok(cell)
    }

    fn teardown(&mut self, factory: &mut dyn BlockFactory, tweener: &mut dyn Tweener) {
        for cell in self.cells.values_mut() {
            cell.reset(factory, tweener);
        }
        self.cells.clear();
    }

    fn new_cell(&self, coordinate: Coordinate) -> Cell {
        let mut cell = Cell::new(coordinate, self.gap);
        cell.position = self.coordinate_to_position(coordinate);
        cell
    }

    fn origin_shift(&self) -> Vec3 {
        Vec3::new(self.x_offset, 0.0, 0.0)
    }
}
