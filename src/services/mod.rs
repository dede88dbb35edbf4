pub mod events;
pub mod filter;
pub mod html;
pub mod parser;
pub mod sensors;
pub mod state_tracker;
pub mod status;
pub mod time;
pub mod tracking;
