pub mod collector;
pub mod registry;
pub mod state;
