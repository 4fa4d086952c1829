pub mod clock;
pub mod config;
pub mod error;
pub mod feature_store;
pub mod features;
pub mod game_state;
pub mod interactions;
pub mod logging;
pub mod pbp_dataset;
pub mod persist;
pub mod pipeline;
pub mod play;
pub mod sequencer;
pub mod synthetic;
pub mod tendency;
pub mod weather;
