use wasm_bindgen::prelude::*;
use web_time::Instant;

use crate::config::BlockParameters;
use crate::game::GameSession;
use crate::level::LevelLayout;
use crate::types::Coordinate;

/// Longest frame the clock will report, so a backgrounded tab does not skip
/// whole animations in one step.
const MAX_FRAME_DELTA: f32 = 0.1;

/// Wall-clock frame timer.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    /// Seconds since the previous call, zero on the first call.
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last = Some(now);
        dt.min(MAX_FRAME_DELTA)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WasmGame {
    /// Builds a session from TOML parameters; an empty string uses the defaults.
    ///
    /// The defaults register no block types, so a level whose stacks hold any
    /// blocks is rejected with an unknown-type error. Empty slots and obstacles
    /// still load. Pass `block_types = [...]` to load stacked levels.
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: &str) -> Result<WasmGame, JsError> {
        let parameters = if config_toml.trim().is_empty() {
            BlockParameters::defaults().clone()
        } else {
            BlockParameters::from_toml_str(config_toml)?
        };
        Ok(Self {
            session: GameSession::new(parameters),
            clock: FrameClock::default(),
        })
    }

    #[wasm_bindgen(js_name = loadLevel)]
    pub fn load_level(&mut self, level: JsValue) -> Result<(), JsError> {
        let level: LevelLayout = serde_wasm_bindgen::from_value(level)?;
        self.session.load_level(level)?;
        self.clock.reset();
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from_row: i32,
        from_column: i32,
        to_row: i32,
        to_column: i32,
        movement: &str,
    ) -> Result<JsValue, JsError> {
        let result = self.session.transfer(
            Coordinate::new(from_row, from_column),
            Coordinate::new(to_row, to_column),
            movement,
        )?;
        Ok(serde_wasm_bindgen::to_value(&result)?)
    }

    /// Advances animations by the wall-clock time since the previous tick.
    pub fn tick(&mut self) -> Result<JsValue, JsError> {
        let dt = self.clock.delta();
        self.tick_by(dt)
    }

    #[wasm_bindgen(js_name = tickBy)]
    pub fn tick_by(&mut self, dt: f32) -> Result<JsValue, JsError> {
        let events = self.session.tick(dt);
        Ok(serde_wasm_bindgen::to_value(&events)?)
    }

    #[wasm_bindgen(js_name = boardState)]
    pub fn board_state(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.session.to_board_state())?)
    }

    #[wasm_bindgen(js_name = countUnits)]
    pub fn count_units(&self) -> usize {
        self.session.board().count_occupied_units()
    }

    #[wasm_bindgen(js_name = layoutFingerprint)]
    pub fn layout_fingerprint(&self) -> u32 {
        self.session.board().to_level_layout().fingerprint()
    }

    #[wasm_bindgen(js_name = isModified)]
    pub fn is_modified(&self) -> bool {
        self.session.is_modified()
    }
}
