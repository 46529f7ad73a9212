pub mod config;
mod ue_data;

pub use config::*;
pub use ue_data::*;
