//! Temporal state of the denoise/deinterlace modules.
//!
//! The frame store is a fixed ring of six named slots. A slot either owns an internally created
//! scratch surface or borrows a caller surface; only owned surfaces are ever destroyed.

use crate::filter::{DeinterlaceAlgorithm, DeinterlaceFlags};
use crate::foundation::core::{Fourcc, RtFormat, Subsampling, SurfaceId};
use crate::foundation::error::{VppError, VppResult};
use crate::gpu::memory::{BufferHandle, GpuMemory};
use crate::surface::registry::SurfaceRegistry;

/// Ownership-tagged content of one frame-store slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub enum Slot {
    #[default]
    Empty,
    /// Scratch surface created by the frame store.
    Owned(SurfaceId),
    /// Caller surface; never destroyed here.
    Borrowed(SurfaceId),
}

impl Slot {
    pub fn id(self) -> Option<SurfaceId> {
        match self {
            Slot::Empty => None,
            Slot::Owned(id) | Slot::Borrowed(id) => Some(id),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Slot::Empty
    }
}

/// Named frame-store positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum FrameSlot {
    InCurrent,
    InPrevious,
    InStmm,
    OutStmm,
    OutCurrent,
    OutPrevious,
}

impl FrameSlot {
    pub const ALL: [FrameSlot; 6] = [
        FrameSlot::InCurrent,
        FrameSlot::InPrevious,
        FrameSlot::InStmm,
        FrameSlot::OutStmm,
        FrameSlot::OutCurrent,
        FrameSlot::OutPrevious,
    ];
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FrameStore {
    slots: [Slot; 6],
}

impl FrameStore {
    pub fn get(&self, slot: FrameSlot) -> Slot {
        self.slots[slot as usize]
    }

    /// Empty `slot`, destroying its surface only when the store owns it.
    pub fn clear(&mut self, slot: FrameSlot, surfaces: &mut dyn SurfaceRegistry) {
        if let Slot::Owned(id) = std::mem::take(&mut self.slots[slot as usize]) {
            surfaces.destroy(&[id]);
        }
    }

    /// Borrow a caller surface into `slot` after clearing it.
    pub fn borrow_into(
        &mut self,
        slot: FrameSlot,
        id: SurfaceId,
        surfaces: &mut dyn SurfaceRegistry,
    ) {
        self.clear(slot, surfaces);
        self.slots[slot as usize] = Slot::Borrowed(id);
    }

    /// Move the content of `from` into `to`, leaving `from` empty. `to` must be empty.
    fn relocate(&mut self, from: FrameSlot, to: FrameSlot) {
        debug_assert!(self.get(to).is_empty());
        self.slots[to as usize] = std::mem::take(&mut self.slots[from as usize]);
    }

    pub fn swap(&mut self, a: FrameSlot, b: FrameSlot) {
        self.slots.swap(a as usize, b as usize);
    }

    /// Create a scratch surface in `slot` if it is empty.
    fn ensure_scratch(
        &mut self,
        slot: FrameSlot,
        surfaces: &mut dyn SurfaceRegistry,
        width: u32,
        height: u32,
    ) -> VppResult<()> {
        if !self.get(slot).is_empty() {
            return Ok(());
        }
        let id = surfaces
            .create(width, height, RtFormat::Yuv420, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| VppError::allocation_failed("frame-store scratch surface"))?;
        self.slots[slot as usize] = Slot::Owned(id);
        surfaces.ensure_backing(id, true, Fourcc::NV12, Subsampling::Yuv420)
    }

    /// Empty every slot, destroying owned scratch surfaces.
    pub fn reset(&mut self, surfaces: &mut dyn SurfaceRegistry) {
        for slot in FrameSlot::ALL {
            self.clear(slot, surfaces);
        }
    }

    pub fn owned_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Owned(_)))
            .count()
    }
}

/// Deinterlace bookkeeping for one field or frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DndiState {
    pub frame_store: FrameStore,
    pub is_di_enabled: bool,
    pub is_di_adv_enabled: bool,
    pub is_first_frame: bool,
    pub is_second_field: bool,
    pub top_field_first: bool,
}

impl DndiState {
    /// Classify the incoming picture: second field or not, first frame or not.
    pub fn init_surface_params(
        &mut self,
        src: SurfaceId,
        algorithm: DeinterlaceAlgorithm,
        flags: u32,
        forward_references: &[SurfaceId],
    ) -> VppResult<()> {
        self.is_di_enabled = true;
        self.is_di_adv_enabled = false;
        self.is_first_frame = false;
        self.is_second_field = false;

        let tff = flags & DeinterlaceFlags::BOTTOM_FIELD_FIRST == 0;
        let is_top_field = flags & DeinterlaceFlags::BOTTOM_FIELD == 0;
        self.top_field_first = tff;

        if tff != is_top_field {
            if self.frame_store.get(FrameSlot::InCurrent).id() != Some(src) {
                tracing::warn!(surface = ?src, "invalid surface provided for second field");
                return Err(VppError::invalid_parameter(format!(
                    "second field of {src:?} does not follow its first field"
                )));
            }
            self.is_second_field = true;
        }

        match algorithm {
            DeinterlaceAlgorithm::Bob => self.is_first_frame = true,
            DeinterlaceAlgorithm::MotionAdaptive | DeinterlaceAlgorithm::MotionCompensated => {
                let first_field_alone = self.is_second_field
                    && self.frame_store.get(FrameSlot::InPrevious).is_empty();
                if self.frame_store.get(FrameSlot::InCurrent).is_empty() || first_field_alone {
                    // Nothing to compare against yet: plain DI for this picture.
                    self.is_first_frame = true;
                    return Ok(());
                }
                let has_reference = forward_references.first().is_some_and(|r| !r.is_invalid());
                if !self.is_second_field && !has_reference {
                    tracing::warn!(
                        ?algorithm,
                        "a forward temporal reference is needed for motion adaptive/compensated deinterlacing"
                    );
                    return Err(VppError::invalid_parameter(
                        "motion adaptive/compensated deinterlacing needs a forward reference",
                    ));
                }
                self.is_di_adv_enabled = true;
            }
            DeinterlaceAlgorithm::Weave => {
                tracing::warn!(?algorithm, "unsupported deinterlacing algorithm");
                return Err(VppError::unsupported_filter(format!(
                    "deinterlacing algorithm {algorithm:?}"
                )));
            }
        }
        Ok(())
    }

    /// Allocate scratch surfaces the current mode needs and does not have yet.
    pub fn ensure_surfaces_storage(
        &mut self,
        surfaces: &mut dyn SurfaceRegistry,
        width: u32,
        height: u32,
    ) -> VppResult<()> {
        self.frame_store
            .ensure_scratch(FrameSlot::InStmm, surfaces, width, height)?;
        self.frame_store
            .ensure_scratch(FrameSlot::OutStmm, surfaces, width, height)?;
        if self.is_di_adv_enabled && !self.is_first_frame {
            self.frame_store
                .ensure_scratch(FrameSlot::OutCurrent, surfaces, width, height)?;
            self.frame_store
                .ensure_scratch(FrameSlot::OutPrevious, surfaces, width, height)?;
        }
        Ok(())
    }

    /// Rotate the ring for this call and bind `src`/`dst`. Returns the slot `dst` landed in.
    pub fn ensure_surfaces(
        &mut self,
        surfaces: &mut dyn SurfaceRegistry,
        src: SurfaceId,
        dst: SurfaceId,
        forward_references: &[SurfaceId],
    ) -> FrameSlot {
        let fs = &mut self.frame_store;
        let is_new_frame = fs.get(FrameSlot::InCurrent).id() != Some(src);

        if is_new_frame
            && let Some(&fwd) = forward_references.first()
            && !fwd.is_invalid()
            && surfaces.resolve(fwd).is_some()
            && fs.get(FrameSlot::InPrevious).id() != Some(fwd)
        {
            fs.clear(FrameSlot::InPrevious, surfaces);
            if fs.get(FrameSlot::InCurrent).id() == Some(fwd) {
                fs.relocate(FrameSlot::InCurrent, FrameSlot::InPrevious);
            } else {
                fs.borrow_into(FrameSlot::InPrevious, fwd, surfaces);
            }
        }

        fs.borrow_into(FrameSlot::InCurrent, src, surfaces);

        if is_new_frame {
            fs.swap(FrameSlot::InStmm, FrameSlot::OutStmm);
        }

        let mut target = FrameSlot::OutCurrent;
        if self.is_di_adv_enabled && !self.is_first_frame {
            fs.swap(FrameSlot::OutCurrent, FrameSlot::OutPrevious);
            if !self.is_second_field {
                target = FrameSlot::OutPrevious;
            }
        }
        fs.borrow_into(target, dst, surfaces);
        target
    }

    /// Drop every slot; owned scratch surfaces are destroyed.
    pub fn reset(&mut self, surfaces: &mut dyn SurfaceRegistry) {
        self.frame_store.reset(surfaces);
        self.is_di_enabled = false;
        self.is_di_adv_enabled = false;
        self.is_first_frame = false;
        self.is_second_field = false;
    }
}

/// Denoise strength range the kernel accepts.
pub const DN_MAX_STRENGTH: u32 = 31;

/// Denoise module state: the spatial-temporal motion buffer persists across calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DnState {
    pub stmm: Option<BufferHandle>,
    pub strength: u32,
}

impl DnState {
    /// Map a `[0, 1]` filter value onto the kernel range.
    pub fn strength_from_value(value: f32) -> u32 {
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        (v * DN_MAX_STRENGTH as f32) as u32
    }

    /// Allocate the motion buffer on first use; later calls reuse it.
    pub fn ensure_stmm(
        &mut self,
        mem: &mut dyn GpuMemory,
        width: u32,
        height: u32,
    ) -> VppResult<BufferHandle> {
        if let Some(h) = self.stmm {
            return Ok(h);
        }
        let size = (width as usize) * (height as usize);
        let h = mem.alloc("dn stmm", size.max(4096), 4096)?;
        self.stmm = Some(h);
        Ok(h)
    }

    pub fn release(&mut self, mem: &mut dyn GpuMemory) {
        if let Some(h) = self.stmm.take() {
            mem.release(h);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pp/dndi.rs"]
mod tests;
