use wasm_bindgen::prelude::*;

pub mod block;
pub mod board;
pub mod cell;
pub mod codec;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod game;
pub mod level;
pub mod motion;
pub mod slot;
pub mod types;
pub mod wasm;

pub use block::{Block, BlockFactory, BlockSpawner, TypeCatalog, TypeRegistry};
pub use board::Board;
pub use cell::{Cell, CellData, CellKind};
pub use codec::{StackData, SubStack};
pub use config::{BlockParameters, ConfigError};
pub use error::BoardError;
pub use game::GameSession;
pub use level::LevelLayout;
pub use motion::{MotionEvent, MovementSpec, TweenTimeline, Tweener};
pub use slot::{Slot, SlotEvent};
pub use types::{BlockId, BlockType, Coordinate};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
