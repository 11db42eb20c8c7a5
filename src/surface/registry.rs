use crate::filter::FilterParameter;
use crate::foundation::core::{BufferId, Fourcc, RtFormat, Subsampling, SurfaceId};
use crate::foundation::error::VppResult;
use crate::surface::descriptor::SurfaceDescriptor;

/// Surface management collaborator.
///
/// Descriptors are returned by value; the registry stays the owner of the underlying storage.
pub trait SurfaceRegistry {
    fn resolve(&self, id: SurfaceId) -> Option<SurfaceDescriptor>;

    /// Create `count` unallocated surfaces of the given visible size.
    fn create(
        &mut self,
        width: u32,
        height: u32,
        format: RtFormat,
        count: usize,
    ) -> VppResult<Vec<SurfaceId>>;

    /// Destroy surfaces and their backing storage. Unknown ids are ignored.
    fn destroy(&mut self, ids: &[SurfaceId]);

    /// Attach backing storage laid out as `fourcc` if the surface has none yet.
    fn ensure_backing(
        &mut self,
        id: SurfaceId,
        tiled: bool,
        fourcc: Fourcc,
        subsampling: Subsampling,
    ) -> VppResult<()>;
}

/// Content of a parameter buffer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BufferPayload {
    Filter(FilterParameter),
    Raw { type_id: u32, bytes: Vec<u8> },
}

/// Parameter-buffer collaborator.
pub trait BufferRegistry {
    fn resolve(&self, id: BufferId) -> Option<BufferPayload>;
}
