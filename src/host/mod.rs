//! In-process implementations of every collaborator contract.
//!
//! Used by the dry-run binary and the test suites; nothing here talks to hardware.

pub mod batch;
pub mod buffers;
pub mod memory;
pub mod surfaces;

pub use batch::RecordingBatch;
pub use buffers::BufferTable;
pub use memory::HostMemory;
pub use surfaces::SurfaceTable;

use crate::driver::DriverContext;

/// All host collaborators in one place.
#[derive(Debug, Default)]
pub struct HostDriver {
    pub surfaces: SurfaceTable,
    pub buffers: BufferTable,
    pub memory: HostMemory,
    pub batch: RecordingBatch,
}

impl HostDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow every collaborator for one call.
    pub fn context(&mut self) -> DriverContext<'_> {
        DriverContext::new(
            &mut self.surfaces,
            &self.buffers,
            &mut self.memory,
            &mut self.batch,
        )
    }
}
