pub mod arena;
pub mod batch;
pub mod memory;
pub mod state;
