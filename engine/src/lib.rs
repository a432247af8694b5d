pub mod combat;
pub mod config;
pub mod data;
pub mod effects;
pub mod error;
pub mod game;

pub use config::{CompletionPolicy, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use game::engine::{MatchEngine, Rules};
