use tracing::debug;

use crate::block::{BlockSpawner, TypeCatalog};
use crate::board::Board;
use crate::cell::{Cell, CellData};
use crate::config::BlockParameters;
use crate::error::BoardError;
use crate::level::LevelLayout;
use crate::motion::{MotionEvent, TweenTimeline};
use crate::types::{BoardState, CellState, Coordinate, TransferResult};

/// Step used when fast-forwarding every running animation.
const SETTLE_STEP: f32 = 1.0 / 60.0;

/// Owns one board together with the factory, timeline and parameters it runs on.
pub struct GameSession {
    board: Board,
    spawner: BlockSpawner<TypeCatalog>,
    timeline: TweenTimeline,
    parameters: BlockParameters,
    level: Option<LevelLayout>,
}

impl GameSession {
    pub fn new(parameters: BlockParameters) -> Self {
        let board = Board::new(parameters.layout, parameters.gap_between_blocks);
        let spawner = BlockSpawner::new(parameters.type_catalog());
        Self {
            board,
            spawner,
            timeline: TweenTimeline::new(),
            parameters,
            level: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn parameters(&self) -> &BlockParameters {
        &self.parameters
    }

    pub fn timeline(&self) -> &TweenTimeline {
        &self.timeline
    }

    pub fn load_level(&mut self, level: LevelLayout) -> Result<(), BoardError> {
        self.board
            .load_level(&level, &mut self.spawner, &mut self.timeline)?;
        self.level = Some(level);
        Ok(())
    }

    /// Reloads the last level that loaded successfully.
    pub fn restart(&mut self) -> Result<(), BoardError> {
        let Some(level) = self.level.take() else {
            return Ok(());
        };
        let result = self
            .board
            .load_level(&level, &mut self.spawner, &mut self.timeline);
        self.level = Some(level);
        result
    }

    /// True when the board no longer matches the loaded level.
    pub fn is_modified(&self) -> bool {
        self.level
            .as_ref()
            .is_none_or(|level| !self.board.matches_layout(level))
    }

    pub fn set_cell(&mut self, coordinate: Coordinate, data: &CellData) -> Result<(), BoardError> {
        let cell = self
            .board
            .cell_mut(coordinate)
            .ok_or(BoardError::OutOfRange(coordinate))?;
        cell.set_cell(data, &mut self.spawner, &mut self.timeline)
    }

    pub fn resize(&mut self, rows: i32, columns: i32) {
        self.board
            .resize_partial(rows, columns, &mut self.spawner, &mut self.timeline);
    }

    /// Moves the top run of `from` onto `to` using the named movement.
    pub fn transfer(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        movement: &str,
    ) -> Result<TransferResult, BoardError> {
        let spec = self.parameters.movement(movement);
        let handles = self
            .board
            .transfer_top_run(from, to, &spec, &mut self.timeline)?;

        let result = TransferResult {
            moved: handles.len(),
            source_remaining: self.unit_count_at(from),
            destination_count: self.unit_count_at(to),
        };
        debug!(%from, %to, moved = result.moved, "transfer accepted");
        Ok(result)
    }

    /// Advances animations by `dt` seconds and applies the resulting events.
    pub fn tick(&mut self, dt: f32) -> Vec<MotionEvent> {
        let events = self.timeline.advance(dt);
        for event in &events {
            self.board.dispatch_motion(event);
        }
        events
    }

    /// Runs every pending animation to completion.
    pub fn settle(&mut self) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        while !self.timeline.is_idle() {
            events.extend(self.tick(SETTLE_STEP));
        }
        events
    }

    pub fn to_board_state(&self) -> BoardState {
        BoardState {
            rows: self.board.rows(),
            columns: self.board.columns(),
            cells: self.board.cells().map(cell_state).collect(),
            unit_count: self.board.count_occupied_units(),
            is_settled: self.board.is_settled(),
        }
    }

    fn unit_count_at(&self, coordinate: Coordinate) -> usize {
        self.board.cell(coordinate).map_or(0, Cell::unit_count)
    }
}

fn cell_state(cell: &Cell) -> CellState {
    let slot = cell.slot();
    CellState {
        row: cell.coordinate().row,
        column: cell.coordinate().column,
        kind: cell.kind().as_str().to_string(),
        covered: cell.is_covered(),
        blocks: slot
            .map(|slot| {
                slot.blocks()
                    .iter()
                    .map(|block| block.block_type().name().to_string())
                    .collect()
            })
            .unwrap_or_default(),
        moving: slot.is_some_and(|slot| slot.is_any_moving()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{StackData, SubStack};
    use crate::motion::{MotionPhase, MovementSpec};

    fn parameters() -> BlockParameters {
        BlockParameters::default()
            .with_block_types(["red", "blue", "green"])
            .with_movement(MovementSpec {
                name: "pour".to_string(),
                duration: 0.5,
                delay_per_block: 1.0,
                max_cumulative_delay: 2.0,
                ..MovementSpec::default()
            })
    }

    fn level() -> LevelLayout {
        let mut level = LevelLayout::empty(2, 2);
        level.cells[0] = CellData::slot(StackData::new(vec![
            SubStack::new("green", 1),
            SubStack::new("red", 5),
        ]));
        level.cells[1] = CellData::slot(StackData::default());
        level.cells[3] = CellData::obstacle();
        level
    }

    #[test]
    fn initial_state_reflects_level() {
        let mut session = GameSession::new(parameters());
        session.load_level(level()).unwrap();
        let state = session.to_board_state();

        assert_eq!(state.rows, 2);
        assert_eq!(state.cells.len(), 4);
        assert_eq!(state.unit_count, 6);
        assert!(state.is_settled);
        assert_eq!(state.cells[0].blocks, vec!["green", "red", "red", "red", "red", "red"]);
        assert_eq!(state.cells[3].kind, "obstacle");
        assert!(!session.is_modified());
    }

    #[test]
    fn transfer_reports_counts_and_staggers_starts() {
        let mut session = GameSession::new(parameters());
        session.load_level(level()).unwrap();

        let result = session
            .transfer(Coordinate::new(0, 0), Coordinate::new(0, 1), "pour")
            .unwrap();

        assert_eq!(
            result,
            TransferResult {
                moved: 5,
                source_remaining: 1,
                destination_count: 5,
            }
        );
        assert!(session.is_modified());
        assert!(!session.to_board_state().is_settled);

        let mut started = Vec::new();
        let mut clock = 0.0f32;
        while !session.timeline().is_idle() {
            for event in session.tick(0.1) {
                if event.phase == MotionPhase::Started {
                    started.push((event.batch_index, clock));
                }
            }
            clock += 0.1;
        }
        let order: Vec<usize> = started.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert!(session.to_board_state().is_settled);
    }

    #[test]
    fn unknown_movement_falls_back_to_default() {
        let mut session = GameSession::new(parameters());
        session.load_level(level()).unwrap();

        let result = session
            .transfer(Coordinate::new(0, 0), Coordinate::new(0, 1), "nope")
            .unwrap();
        session.settle();

        assert_eq!(result.moved, 5);
        assert!(session.to_board_state().is_settled);
    }

    #[test]
    fn restart_restores_loaded_level() {
        let mut session = GameSession::new(parameters());
        session.load_level(level()).unwrap();
        session
            .transfer(Coordinate::new(0, 0), Coordinate::new(0, 1), "pour")
            .unwrap();

        session.restart().unwrap();

        assert!(!session.is_modified());
        assert!(session.timeline().is_idle());
        assert_eq!(session.to_board_state().cells[1].blocks.len(), 0);
    }

    #[test]
    fn set_cell_off_board_is_out_of_range() {
        let mut session = GameSession::new(parameters());
        session.load_level(level()).unwrap();

        let err = session
            .set_cell(Coordinate::new(5, 5), &CellData::obstacle())
            .unwrap_err();

        assert_eq!(err, BoardError::OutOfRange(Coordinate::new(5, 5)));
    }

    #[test]
    fn resize_keeps_stacks() {
        let mut session = GameSession::new(parameters());
        session.load_level(level()).unwrap();

        session.resize(3, 3);

        assert_eq!(session.board().cell_count(), 9);
        assert_eq!(session.to_board_state().unit_count, 6);
    }
}
