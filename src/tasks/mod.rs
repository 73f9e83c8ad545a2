//! Background Tasks Module
//!
//! # Tasks
//! - Sweep: removes expired shared store records at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
