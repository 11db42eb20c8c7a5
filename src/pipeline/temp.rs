use crate::foundation::core::{Fourcc, RtFormat, Subsampling, SurfaceId};
use crate::foundation::error::{VppError, VppResult};
use crate::surface::descriptor::SurfaceDescriptor;
use crate::surface::registry::SurfaceRegistry;

/// Intermediate surfaces of one call, destroyed together whatever the outcome.
#[derive(Debug, Default)]
pub struct TempSurfaces {
    ids: Vec<SurfaceId>,
}

impl TempSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tiled NV12 intermediate of `width x height`.
    pub fn create_nv12(
        &mut self,
        surfaces: &mut dyn SurfaceRegistry,
        width: u32,
        height: u32,
    ) -> VppResult<SurfaceDescriptor> {
        let id = surfaces
            .create(width, height, RtFormat::Yuv420, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| VppError::allocation_failed("intermediate surface"))?;
        self.ids.push(id);
        surfaces.ensure_backing(id, true, Fourcc::NV12, Subsampling::Yuv420)?;
        surfaces
            .resolve(id)
            .ok_or_else(|| VppError::allocation_failed(format!("intermediate {id:?} vanished")))
    }

    pub fn ids(&self) -> &[SurfaceId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Hand `id` over to the caller so [`TempSurfaces::destroy_all`] leaves it alone.
    pub fn keep(&mut self, id: SurfaceId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&i| i != id);
        self.ids.len() != before
    }

    pub fn destroy_all(&mut self, surfaces: &mut dyn SurfaceRegistry) {
        if !self.ids.is_empty() {
            tracing::trace!(count = self.ids.len(), "destroying intermediate surfaces");
            surfaces.destroy(&self.ids);
            self.ids.clear();
        }
    }
}
