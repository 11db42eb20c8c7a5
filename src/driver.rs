use crate::gpu::batch::BatchEmitter;
use crate::gpu::memory::GpuMemory;
use crate::surface::registry::{BufferRegistry, SurfaceRegistry};

/// Borrowed bundle of every collaborator one call needs.
///
/// Fields are disjoint so a stage can hold the batch and memory mutably at the same time.
pub struct DriverContext<'a> {
    pub surfaces: &'a mut dyn SurfaceRegistry,
    pub buffers: &'a dyn BufferRegistry,
    pub memory: &'a mut dyn GpuMemory,
    pub batch: &'a mut dyn BatchEmitter,
}

impl<'a> DriverContext<'a> {
    pub fn new(
        surfaces: &'a mut dyn SurfaceRegistry,
        buffers: &'a dyn BufferRegistry,
        memory: &'a mut dyn GpuMemory,
        batch: &'a mut dyn BatchEmitter,
    ) -> Self {
        Self {
            surfaces,
            buffers,
            memory,
            batch,
        }
    }
}
