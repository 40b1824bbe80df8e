//! Block parameters loaded from TOML.
//!
//! ```
//! use block_stack_grid::config::BlockParameters;
//!
//! let params = BlockParameters::from_toml_str(r#"
//!     gap_between_blocks = 0.1
//!     block_types = ["red", "blue"]
//!
//!     [[movements]]
//!     name = "sort"
//!     duration = 0.25
//!     delay_per_block = 0.04
//!     flip = true
//! "#).unwrap();
//!
//! assert_eq!(params.movement("sort").duration, 0.25);
//! assert_eq!(params.movement("missing").name, "default");
//! ```

use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::block::TypeCatalog;
use crate::coordinate::CoordinateLayout;
use crate::motion::MovementSpec;

static DEFAULT_PARAMETERS: Lazy<BlockParameters> = Lazy::new(BlockParameters::default);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockParameters {
    /// Vertical distance between stacked blocks.
    pub gap_between_blocks: f32,
    /// Cap applied to movements that do not set their own.
    pub max_cumulative_delay: f32,
    pub layout: CoordinateLayout,
    pub block_types: Vec<String>,
    pub movements: Vec<MovementSpec>,
}

impl Default for BlockParameters {
    fn default() -> Self {
        Self {
            gap_between_blocks: 0.05,
            max_cumulative_delay: 2.0,
            layout: CoordinateLayout::default(),
            block_types: Vec::new(),
            movements: Vec::new(),
        }
    }
}

impl BlockParameters {
    /// Shared default parameters.
    pub fn defaults() -> &'static BlockParameters {
        &DEFAULT_PARAMETERS
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut params: Self = toml::from_str(s)?;
        params.fill_movement_caps(s)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gap_between_blocks > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "gap_between_blocks must be positive, got {}",
                self.gap_between_blocks
            )));
        }
        if !(self.max_cumulative_delay >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_cumulative_delay must not be negative, got {}",
                self.max_cumulative_delay
            )));
        }
        if !(self.layout.cell_width > 0.0 && self.layout.cell_depth > 0.0) {
            return Err(ConfigError::Invalid("cell size must be positive".to_string()));
        }
        for spec in &self.movements {
            if spec.duration < 0.0 || spec.delay_per_block < 0.0 || spec.max_cumulative_delay < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "movement `{}` has a negative timing value",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    /// Movement spec registered under `name`, or the default spec when there is none.
    pub fn movement(&self, name: &str) -> MovementSpec {
        if let Some(spec) = self.movements.iter().find(|spec| spec.name == name) {
            return spec.clone();
        }
        if name != crate::motion::DEFAULT_MOVEMENT {
            warn!(movement = name, "movement not configured, using default");
        }
        MovementSpec {
            max_cumulative_delay: self.max_cumulative_delay,
            ..MovementSpec::default()
        }
    }

    pub fn type_catalog(&self) -> TypeCatalog {
        TypeCatalog::new(&self.block_types)
    }

    pub fn with_block_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.block_types.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_movement(mut self, spec: MovementSpec) -> Self {
        self.movements.push(spec);
        self
    }

    /// Movements that leave `max_cumulative_delay` unset inherit the global cap.
    fn fill_movement_caps(&mut self, source: &str) -> Result<(), ConfigError> {
        #[derive(Deserialize, Default)]
        struct RawMovement {
            max_cumulative_delay: Option<f32>,
        }
        #[derive(Deserialize, Default)]
        struct RawParameters {
            #[serde(default)]
            movements: Vec<RawMovement>,
        }

        let raw: RawParameters = toml::from_str(source)?;
        for (spec, raw) in self.movements.iter_mut().zip(raw.movements) {
            if raw.max_cumulative_delay.is_none() {
                spec.max_cumulative_delay = self.max_cumulative_delay;
            }
        }
        Ok(())
    }
}
