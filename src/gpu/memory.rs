use crate::foundation::error::{VppError, VppResult};
use crate::surface::descriptor::Tiling;

/// Handle to a GPU buffer object owned by a [`GpuMemory`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BufferHandle(pub u64);

/// GPU memory allocator/mapper consumed by the pipeline.
///
/// Implementations own the backing storage; the pipeline only ever holds handles. A mapping is
/// valid until the matching [`GpuMemory::unmap`].
pub trait GpuMemory {
    /// Allocate `size` bytes aligned to `alignment`.
    fn alloc(&mut self, name: &str, size: usize, alignment: usize) -> VppResult<BufferHandle>;

    /// Map a buffer for CPU access.
    fn map(&mut self, handle: BufferHandle, writable: bool) -> VppResult<&mut [u8]>;

    /// End CPU access started by [`GpuMemory::map`].
    fn unmap(&mut self, handle: BufferHandle);

    /// Tiling mode of a buffer, `None` when the handle is unknown to this allocator.
    fn get_tiling(&self, handle: BufferHandle) -> Option<Tiling>;

    /// Drop the pipeline's reference to a buffer.
    fn release(&mut self, handle: BufferHandle);
}

/// Copy `bytes` into `handle` at `offset` inside one map/unmap pair.
pub(crate) fn write_bytes(
    mem: &mut dyn GpuMemory,
    handle: BufferHandle,
    offset: usize,
    bytes: &[u8],
) -> VppResult<()> {
    with_mapped(mem, handle, |buf| {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= buf.len())
            .ok_or_else(|| {
                VppError::invalid_value(format!(
                    "write of {} bytes at {offset} overruns buffer of {} bytes",
                    bytes.len(),
                    buf.len()
                ))
            })?;
        buf[offset..end].copy_from_slice(bytes);
        Ok(())
    })
}

/// Zero `len` bytes of `handle` starting at `offset`.
pub(crate) fn zero_bytes(
    mem: &mut dyn GpuMemory,
    handle: BufferHandle,
    offset: usize,
    len: usize,
) -> VppResult<()> {
    with_mapped(mem, handle, |buf| {
        let end = offset.saturating_add(len).min(buf.len());
        if offset < end {
            buf[offset..end].fill(0);
        }
        Ok(())
    })
}

/// Run `f` with the buffer mapped writable; the buffer is unmapped whatever `f` returns.
pub(crate) fn with_mapped<T>(
    mem: &mut dyn GpuMemory,
    handle: BufferHandle,
    f: impl FnOnce(&mut [u8]) -> VppResult<T>,
) -> VppResult<T> {
    let out = {
        let buf = mem.map(handle, true)?;
        f(buf)
    };
    mem.unmap(handle);
    out
}
