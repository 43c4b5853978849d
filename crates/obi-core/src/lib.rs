pub mod actions;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod reducer;
pub mod state;

pub use actions::*;
pub use domain::*;
pub use persistence::*;
pub use reducer::*;
pub use state::*;
