// tests/board_scenarios.rs
#![forbid(unsafe_code)]

/**
 * End-to-end board scenarios through the public API.
 *
 * Purpose:
 * - Exercise board, cell, slot and scheduler together the way a host would.
 * - Pin the observable numbers: unit counts, top runs and start delays.
 */
use block_stack_grid::motion::{MotionPhase, TweenTimeline};
use block_stack_grid::{
    Block, BlockId, BlockParameters, BlockSpawner, Board, BoardError, CellData, CellKind,
    Coordinate, GameSession, LevelLayout, MovementSpec, Slot, StackData, SubStack, TypeCatalog,
};

struct World {
    board: Board,
    spawner: BlockSpawner<TypeCatalog>,
    timeline: TweenTimeline,
}

impl World {
    fn new(rows: i32, columns: i32) -> Self {
        let params = BlockParameters::defaults();
        let mut world = Self {
            board: Board::new(params.layout, params.gap_between_blocks),
            spawner: BlockSpawner::new(TypeCatalog::new(["red", "blue", "green"])),
            timeline: TweenTimeline::new(),
        };
        world
            .board
            .rebuild(rows, columns, &mut world.spawner, &mut world.timeline, |_| {});
        world
    }

    fn set(&mut self, coordinate: Coordinate, data: &CellData) -> Result<(), BoardError> {
        self.board
            .cell_mut(coordinate)
            .expect("coordinate on board")
            .set_cell(data, &mut self.spawner, &mut self.timeline)
    }

    fn slot(&self, coordinate: Coordinate) -> &Slot {
        self.board
            .cell(coordinate)
            .and_then(|cell| cell.slot())
            .expect("slot cell")
    }
}

fn stack(runs: &[(&str, u32)]) -> StackData {
    StackData::new(
        runs.iter()
            .map(|(name, count)| SubStack::new(*name, *count))
            .collect(),
    )
}

#[test]
fn slot_in_centre_of_empty_board_counts_three_units() {
    let mut world = World::new(3, 3);

    world
        .set(
            Coordinate::new(1, 1),
            &CellData::slot(stack(&[("red", 2), ("blue", 1)])),
        )
        .unwrap();

    let slot = world.slot(Coordinate::new(1, 1));
    assert_eq!(slot.count(), 3);
    assert_eq!(slot.top_run_summary(), Some(SubStack::new("blue", 1)));
    assert_eq!(world.board.count_occupied_units(), 3);
    assert_eq!(
        world
            .board
            .cells()
            .filter(|cell| cell.kind() == CellKind::Empty)
            .count(),
        8
    );
}

#[test]
fn five_unit_batch_is_capped_to_two_seconds() {
    let mut world = World::new(1, 2);
    world
        .set(Coordinate::new(0, 0), &CellData::slot(stack(&[("red", 5)])))
        .unwrap();
    world
        .set(Coordinate::new(0, 1), &CellData::slot(StackData::default()))
        .unwrap();
    let spec = MovementSpec {
        duration: 0.25,
        delay_per_block: 1.0,
        max_cumulative_delay: 2.0,
        ..MovementSpec::default()
    };

    world
        .board
        .transfer_top_run(
            Coordinate::new(0, 0),
            Coordinate::new(0, 1),
            &spec,
            &mut world.timeline,
        )
        .unwrap();

    // Step in 0.1s increments and note when each block starts moving.
    let mut starts: Vec<(usize, f32)> = Vec::new();
    let mut clock = 0.0f32;
    while !world.timeline.is_idle() {
        let step = 0.1;
        for event in world.timeline.advance(step) {
            if event.phase == MotionPhase::Started {
                starts.push((event.batch_index, clock + step));
            }
            world.board.dispatch_motion(&event);
        }
        clock += step;
    }

    let expected = [0.0f32, 0.4, 0.8, 1.2, 1.6];
    let order: Vec<usize> = starts.iter().map(|(index, _)| *index).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    for ((_, seen_by), want) in starts.iter().zip(expected) {
        assert!(*seen_by >= want - 1e-4 && *seen_by < want + 0.1 + 1e-4);
    }
    for (delay, want) in spec.start_delays(5).into_iter().zip(expected) {
        assert!((delay - want).abs() < 1e-5);
    }
    assert!(world.board.is_settled());
    assert_eq!(world.slot(Coordinate::new(0, 1)).count(), 5);
}

#[test]
fn remove_set_with_missing_unit_reports_ownership_violation() {
    let mut world = World::new(1, 1);
    world
        .set(Coordinate::new(0, 0), &CellData::slot(stack(&[("red", 3)])))
        .unwrap();
    let mut ids: Vec<BlockId> = world
        .slot(Coordinate::new(0, 0))
        .blocks()
        .iter()
        .map(Block::id)
        .collect();
    ids.push(BlockId(10_000));

    let slot = world
        .board
        .cell_mut(Coordinate::new(0, 0))
        .and_then(|cell| cell.slot_mut())
        .unwrap();
    let err = slot.remove_set(&ids).unwrap_err();

    assert_eq!(err, BoardError::NotOwned { block: BlockId(10_000) });
    assert!(err.is_ownership_violation());
    assert_eq!(world.slot(Coordinate::new(0, 0)).count(), 3);
}

#[test]
fn clearing_a_cell_mid_flight_cancels_its_timers() {
    let mut world = World::new(1, 2);
    world
        .set(Coordinate::new(0, 0), &CellData::slot(stack(&[("green", 4)])))
        .unwrap();
    world
        .set(Coordinate::new(0, 1), &CellData::slot(StackData::default()))
        .unwrap();
    world
        .board
        .transfer_top_run(
            Coordinate::new(0, 0),
            Coordinate::new(0, 1),
            &MovementSpec::default(),
            &mut world.timeline,
        )
        .unwrap();
    assert_eq!(world.timeline.active_count(), 4);

    world.timeline.advance(0.06);
    world
        .board
        .cell_mut(Coordinate::new(0, 1))
        .unwrap()
        .reset(&mut world.spawner, &mut world.timeline);

    assert!(world.timeline.is_idle());
    assert!(world.timeline.advance(10.0).is_empty());
    assert_eq!(world.spawner.live_count(), 0);
}

#[test]
fn session_round_trips_level_and_reports_mismatch() {
    let params = BlockParameters::default().with_block_types(["red", "blue"]);
    let mut session = GameSession::new(params);
    let mut level = LevelLayout::empty(2, 2);
    level.cells[0] = CellData::slot(stack(&[("red", 1), ("blue", 2)])).covered(true);
    level.cells[3] = CellData::obstacle();

    session.load_level(level.clone()).unwrap();
    assert_eq!(session.board().to_level_layout(), level);
    assert_eq!(
        session.board().to_level_layout().fingerprint(),
        level.fingerprint()
    );

    let mut broken = level.clone();
    broken.cells.push(CellData::empty());
    let err = session.load_level(broken).unwrap_err();
    assert!(err.is_data_integrity());
    assert_eq!(session.board().count_occupied_units(), 3);
}

#[test]
fn level_with_unknown_type_still_loads_the_other_cells() {
    let mut session = GameSession::new(BlockParameters::default().with_block_types(["red"]));
    let mut level = LevelLayout::empty(1, 3);
    level.cells[0] = CellData::slot(stack(&[("red", 2)]));
    level.cells[1] = CellData::slot(stack(&[("violet", 1)]));
    level.cells[2] = CellData::slot(stack(&[("red", 1)]));

    let err = session.load_level(level).unwrap_err();

    assert_eq!(err, BoardError::UnknownBlockType("violet".to_string()));
    let board = session.board();
    assert_eq!(board.cell(Coordinate::new(0, 0)).unwrap().unit_count(), 2);
    assert_eq!(board.cell(Coordinate::new(0, 1)).unwrap().unit_count(), 0);
    assert_eq!(board.cell(Coordinate::new(0, 2)).unwrap().unit_count(), 1);
    assert_eq!(board.count_occupied_units(), 3);
}
