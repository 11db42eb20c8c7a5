use std::collections::HashMap;

use crate::foundation::error::{VppError, VppResult};
use crate::gpu::memory::{BufferHandle, GpuMemory};
use crate::surface::descriptor::Tiling;

#[derive(Debug)]
struct HostBuffer {
    name: String,
    data: Vec<u8>,
    tiling: Tiling,
    mapped: bool,
}

/// `Vec`-backed GPU memory with map/unmap bookkeeping.
#[derive(Debug, Default)]
pub struct HostMemory {
    buffers: HashMap<BufferHandle, HostBuffer>,
    next: u64,
    allocs: usize,
    releases: usize,
    fail_alloc: Option<String>,
}

impl HostMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every later allocation whose name contains `name`.
    pub fn fail_alloc_named(&mut self, name: impl Into<String>) {
        self.fail_alloc = Some(name.into());
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_live(&self, handle: BufferHandle) -> bool {
        self.buffers.contains_key(&handle)
    }

    pub fn bytes(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(|b| b.data.as_slice())
    }

    pub fn name(&self, handle: BufferHandle) -> Option<&str> {
        self.buffers.get(&handle).map(|b| b.name.as_str())
    }

    /// Handles of live buffers carrying `name`.
    pub fn find(&self, name: &str) -> Vec<BufferHandle> {
        let mut out: Vec<BufferHandle> = self
            .buffers
            .iter()
            .filter(|(_, b)| b.name == name)
            .map(|(h, _)| *h)
            .collect();
        out.sort_by_key(|h| h.0);
        out
    }

    pub fn mapped_count(&self) -> usize {
        self.buffers.values().filter(|b| b.mapped).count()
    }

    pub fn allocs(&self) -> usize {
        self.allocs
    }

    pub fn releases(&self) -> usize {
        self.releases
    }
}

impl GpuMemory for HostMemory {
    fn alloc(&mut self, name: &str, size: usize, alignment: usize) -> VppResult<BufferHandle> {
        if self.fail_alloc.as_deref().is_some_and(|f| name.contains(f)) {
            return Err(VppError::allocation_failed(format!("buffer '{name}'")));
        }
        if size == 0 || !alignment.is_power_of_two() {
            return Err(VppError::invalid_value(format!(
                "buffer '{name}': size {size}, alignment {alignment}"
            )));
        }
        self.next += 1;
        let handle = BufferHandle(self.next);
        self.buffers.insert(
            handle,
            HostBuffer {
                name: name.to_owned(),
                data: vec![0; size],
                tiling: Tiling::None,
                mapped: false,
            },
        );
        self.allocs += 1;
        Ok(handle)
    }

    fn map(&mut self, handle: BufferHandle, _writable: bool) -> VppResult<&mut [u8]> {
        let buf = self
            .buffers
            .get_mut(&handle)
            .ok_or_else(|| VppError::invalid_value(format!("map of unknown buffer {handle:?}")))?;
        if buf.mapped {
            return Err(VppError::invalid_value(format!(
                "buffer '{}' is already mapped",
                buf.name
            )));
        }
        buf.mapped = true;
        Ok(buf.data.as_mut_slice())
    }

    fn unmap(&mut self, handle: BufferHandle) {
        if let Some(b) = self.buffers.get_mut(&handle) {
            b.mapped = false;
        }
    }

    fn get_tiling(&self, handle: BufferHandle) -> Option<Tiling> {
        self.buffers.get(&handle).map(|b| b.tiling)
    }

    fn release(&mut self, handle: BufferHandle) {
        if self.buffers.remove(&handle).is_some() {
            self.releases += 1;
        }
    }
}
