//! VEBOX fixed-function path: denoise, deinterlace, IECP and format conversion without kernels.

use crate::driver::DriverContext;
use crate::filter::{FilterParameter, validate_vebox_chain};
use crate::foundation::core::{Fourcc, Generation, Rect, SurfaceId};
use crate::foundation::error::{VppError, VppResult};
use crate::gpu::batch::{GpuCommand, Reloc, VeboxFeatures, VeboxLayout};
use crate::pp::dndi::{DnState, DndiState, FrameSlot};
use crate::surface::descriptor::SurfaceDescriptor;
use crate::surface::registry::SurfaceRegistry;

/// One VEBOX invocation. The region applies to source and destination alike.
#[derive(Clone, Copy, Debug)]
pub struct VeboxRequest<'r> {
    pub src: &'r SurfaceDescriptor,
    pub dst: &'r SurfaceDescriptor,
    pub rect: Rect,
    pub filters: &'r [FilterParameter],
    pub forward_references: &'r [SurfaceId],
}

/// Lazily built VEBOX state; lives as long as the engine.
#[derive(Debug)]
pub struct VeboxContext {
    generation: Generation,
    layout: VeboxLayout,
    batch_size_hint: usize,
    dndi: DndiState,
    features: VeboxFeatures,
    dn_strength: u32,
    invocations: u64,
}

impl VeboxContext {
    pub fn new(generation: Generation, batch_size_hint: usize) -> VppResult<Self> {
        let layout = match generation {
            Generation::Gen75 => VeboxLayout::Haswell,
            Generation::Gen8 => VeboxLayout::Gen8,
            Generation::Gen9 => VeboxLayout::Gen9,
            other => {
                return Err(VppError::unimplemented(format!("{other:?} has no VEBOX")));
            }
        };
        Ok(Self {
            generation,
            layout,
            batch_size_hint,
            dndi: DndiState::default(),
            features: VeboxFeatures::default(),
            dn_strength: 0,
            invocations: 0,
        })
    }

    pub fn layout(&self) -> VeboxLayout {
        self.layout
    }

    pub fn dndi_state(&self) -> &DndiState {
        &self.dndi
    }

    /// Features programmed by the last call.
    pub fn features(&self) -> VeboxFeatures {
        self.features
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    fn check_format(&self, fourcc: Fourcc, what: &str) -> VppResult<()> {
        if fourcc.info().is_none() {
            return Err(VppError::unsupported_rt_format(format!(
                "VEBOX {what} format {fourcc}"
            )));
        }
        if fourcc == Fourcc::P010 && self.layout != VeboxLayout::Gen9 {
            return Err(VppError::unsupported_rt_format(format!(
                "VEBOX {what} P010 needs Gen9, running on {:?}",
                self.generation
            )));
        }
        Ok(())
    }

    fn parse_filters(&mut self, req: &VeboxRequest<'_>) -> VppResult<()> {
        self.features = VeboxFeatures::default();
        self.dn_strength = 0;
        self.dndi.is_di_enabled = false;
        self.dndi.is_di_adv_enabled = false;
        self.dndi.is_first_frame = false;
        self.dndi.is_second_field = false;

        for filter in req.filters {
            match filter {
                FilterParameter::NoiseReduction { value } => {
                    self.features.denoise = true;
                    self.dn_strength = DnState::strength_from_value(*value);
                }
                FilterParameter::Deinterlacing { algorithm, flags } => {
                    self.dndi.init_surface_params(
                        req.src.id,
                        *algorithm,
                        *flags,
                        req.forward_references,
                    )?;
                    self.features.deinterlace = true;
                }
                FilterParameter::SkinToneEnhancement { .. } => self.features.skin_tone = true,
                FilterParameter::ColorBalance { .. } => self.features.proc_amp = true,
                FilterParameter::Sharpening { .. } => self.features.sharpen = true,
            }
        }
        Ok(())
    }

    fn slot_reloc(&self, surfaces: &dyn SurfaceRegistry, slot: FrameSlot) -> Option<Reloc> {
        let id = self.dndi.frame_store.get(slot).id()?;
        let desc = surfaces.resolve(id)?;
        desc.buffer.map(|b| Reloc::new(b, 0))
    }

    /// Program and submit one VEBOX pass.
    pub fn process(&mut self, drv: &mut DriverContext<'_>, req: &VeboxRequest<'_>) -> VppResult<()> {
        if req.filters.len() > 1 {
            validate_vebox_chain(req.filters)?;
        }
        let src_fourcc = req.src.format()?;
        let dst_fourcc = req.dst.format()?;
        self.check_format(src_fourcc, "input")?;
        self.check_format(dst_fourcc, "output")?;
        let src_buffer = req.src.backing()?;
        let dst_buffer = req.dst.backing()?;

        self.parse_filters(req)?;
        self.features.csc = src_fourcc != dst_fourcc;

        let temporal = self.features.denoise || self.features.deinterlace;
        let mut target = FrameSlot::OutCurrent;
        if temporal {
            self.dndi.ensure_surfaces_storage(
                drv.surfaces,
                req.src.orig_width,
                req.src.orig_height,
            )?;
            target = self.dndi.ensure_surfaces(
                drv.surfaces,
                req.src.id,
                req.dst.id,
                req.forward_references,
            );
        }

        let surfaces = &*drv.surfaces;
        let (previous_input, stmm_input, stmm_output, previous_output) = if temporal {
            let other_out = if target == FrameSlot::OutPrevious {
                FrameSlot::OutCurrent
            } else {
                FrameSlot::OutPrevious
            };
            (
                self.slot_reloc(surfaces, FrameSlot::InPrevious),
                self.slot_reloc(surfaces, FrameSlot::InStmm),
                self.slot_reloc(surfaces, FrameSlot::OutStmm),
                (self.dndi.is_di_adv_enabled && !self.dndi.is_first_frame)
                    .then(|| self.slot_reloc(surfaces, other_out))
                    .flatten(),
            )
        } else {
            (None, None, None, None)
        };

        tracing::debug!(
            layout = ?self.layout,
            src = %src_fourcc,
            dst = %dst_fourcc,
            features = ?self.features,
            first_frame = self.dndi.is_first_frame,
            "VEBOX pass"
        );

        let mut surface_states = Vec::with_capacity(2);
        for (desc, fourcc, buffer, is_output) in [
            (req.src, src_fourcc, src_buffer, false),
            (req.dst, dst_fourcc, dst_buffer, true),
        ] {
            let luma = desc.plane(0)?;
            surface_states.push(GpuCommand::VeboxSurfaceState {
                is_output,
                fourcc,
                at: Reloc::new(buffer, luma.offset),
                width: desc.orig_width,
                height: desc.orig_height,
                pitch: luma.pitch,
                uv_offset: desc.planes.get(1).map_or(0, |p| p.offset),
            });
        }

        let batch = &mut *drv.batch;
        batch.begin_atomic(self.batch_size_hint);
        batch.emit(GpuCommand::VeboxState {
            layout: self.layout,
            features: self.features,
            dn_strength: self.dn_strength,
            first_frame: self.dndi.is_first_frame,
            second_field: self.dndi.is_second_field,
            top_field_first: self.dndi.top_field_first,
        });
        for cmd in surface_states {
            batch.emit(cmd);
        }
        batch.emit(GpuCommand::VeboxDiIecp {
            rect: req.rect,
            current_input: Reloc::new(src_buffer, 0),
            previous_input,
            stmm_input,
            stmm_output,
            denoised_output: None,
            current_output: Reloc::new(dst_buffer, 0),
            previous_output,
        });
        batch.end_atomic();
        batch.flush()?;
        self.invocations += 1;
        Ok(())
    }

    /// Drop the frame store, destroying only scratch surfaces.
    pub fn destroy(&mut self, surfaces: &mut dyn SurfaceRegistry) {
        self.dndi.reset(surfaces);
    }
}

#[cfg(test)]
#[path = "../tests/unit/vebox.rs"]
mod tests;
