pub mod monitor;
pub mod status;
pub mod trigger;
