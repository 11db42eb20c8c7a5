use std::collections::BTreeMap;

use crate::foundation::core::{Fourcc, RtFormat, Subsampling, SurfaceId};
use crate::foundation::error::{VppError, VppResult};
use crate::gpu::memory::BufferHandle;
use crate::surface::descriptor::{SurfaceDescriptor, Tiling, compute_plane_layout};
use crate::surface::registry::SurfaceRegistry;

/// Surface backing handles live far above anything [`crate::host::HostMemory`] hands out.
const SURFACE_BUFFER_BASE: u64 = 0x1_0000_0000;

/// In-process surface registry.
#[derive(Debug, Default)]
pub struct SurfaceTable {
    surfaces: BTreeMap<SurfaceId, SurfaceDescriptor>,
    next_id: u32,
    next_buffer: u64,
    fail_create_after: Option<usize>,
    created: usize,
    destroyed: usize,
}

impl SurfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a caller surface without backing storage.
    pub fn add_unallocated(&mut self, width: u32, height: u32, format: RtFormat) -> SurfaceId {
        let id = self.alloc_id();
        self.surfaces
            .insert(id, SurfaceDescriptor::unallocated(id, width, height, format));
        id
    }

    /// Register a caller surface already backed as `fourcc`.
    pub fn add_allocated(
        &mut self,
        fourcc: Fourcc,
        width: u32,
        height: u32,
        tiled: bool,
    ) -> VppResult<SurfaceId> {
        let format = match fourcc {
            Fourcc::P010 | Fourcc::I010 => RtFormat::Yuv420_10bpp,
            f if f.is_rgb() => RtFormat::Rgb32,
            _ => RtFormat::Yuv420,
        };
        let id = self.add_unallocated(width, height, format);
        let subsampling = fourcc
            .info()
            .map(|i| i.subsampling)
            .unwrap_or(Subsampling::Yuv420);
        if let Err(e) = self.ensure_backing(id, tiled, fourcc, subsampling) {
            self.surfaces.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    /// Register an externally built descriptor (e.g. a derived image) under a fresh id.
    pub fn add_descriptor(&mut self, mut desc: SurfaceDescriptor) -> SurfaceId {
        let id = self.alloc_id();
        desc.id = id;
        self.surfaces.insert(id, desc);
        id
    }

    /// Let `n` more [`SurfaceRegistry::create`] calls succeed, then fail every later one.
    pub fn fail_create_after(&mut self, n: usize) {
        self.fail_create_after = Some(n);
    }

    pub fn get(&self, id: SurfaceId) -> Option<&SurfaceDescriptor> {
        self.surfaces.get(&id)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    /// Surfaces made through [`SurfaceRegistry::create`].
    pub fn created(&self) -> usize {
        self.created
    }

    /// Surfaces removed through [`SurfaceRegistry::destroy`].
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl SurfaceRegistry for SurfaceTable {
    fn resolve(&self, id: SurfaceId) -> Option<SurfaceDescriptor> {
        if id.is_invalid() {
            return None;
        }
        self.surfaces.get(&id).cloned()
    }

    fn create(
        &mut self,
        width: u32,
        height: u32,
        format: RtFormat,
        count: usize,
    ) -> VppResult<Vec<SurfaceId>> {
        if let Some(left) = self.fail_create_after.as_mut() {
            if *left == 0 {
                return Err(VppError::allocation_failed(format!(
                    "surface creation refused ({width}x{height})"
                )));
            }
            *left -= 1;
        }
        let ids: Vec<SurfaceId> = (0..count)
            .map(|_| self.add_unallocated(width, height, format))
            .collect();
        self.created += ids.len();
        Ok(ids)
    }

    fn destroy(&mut self, ids: &[SurfaceId]) {
        for id in ids {
            if self.surfaces.remove(id).is_some() {
                self.destroyed += 1;
            }
        }
    }

    fn ensure_backing(
        &mut self,
        id: SurfaceId,
        tiled: bool,
        fourcc: Fourcc,
        subsampling: Subsampling,
    ) -> VppResult<()> {
        let next_buffer = self.next_buffer;
        let desc = self
            .surfaces
            .get_mut(&id)
            .ok_or_else(|| VppError::invalid_surface(format!("unknown surface {id:?}")))?;
        if desc.has_backing() {
            return Ok(());
        }
        let tiling = if tiled { Tiling::Y } else { Tiling::None };
        let layout = compute_plane_layout(fourcc, desc.orig_width, desc.orig_height, tiling)?;
        desc.fourcc = Some(fourcc);
        desc.subsampling = Some(subsampling);
        desc.tiling = tiling;
        desc.width = layout.width;
        desc.height = layout.height;
        desc.planes = layout.planes;
        desc.buffer = Some(BufferHandle(SURFACE_BUFFER_BASE + next_buffer));
        self.next_buffer += 1;
        tracing::trace!(surface = ?id, %fourcc, size = layout.size, "surface backing attached");
        Ok(())
    }
}
