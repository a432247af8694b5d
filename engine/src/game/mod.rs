pub mod actions;
pub mod coin;
pub mod engine;
pub mod machine;
pub mod rng;
pub mod state;
pub mod status;
