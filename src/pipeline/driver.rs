//! Stage selection and sequencing for one processing call.
//!
//! Two top-level drivers exist. Parts with a VEBOX run the staged driver (at most three passes
//! around the VEBOX unit); older parts run the general converter, which chains post-processing
//! modules through NV12 intermediates. Both try the single-dispatch fast paths first when no
//! filters are given, and treat `Unimplemented` from a fast path as "try the next one".

use crate::avs::avs_is_needed;
use crate::config::{KernelStore, VppConfig};
use crate::driver::DriverContext;
use crate::filter::{
    DeinterlaceAlgorithm, DeinterlaceFlags, FilterList, FilterParameter, FilterType,
    resolve_filters, validate_vebox_chain,
};
use crate::foundation::core::{
    FieldFlag, FilterFlags, Fourcc, Rect, RtFormat, Subsampling, SurfaceId,
};
use crate::foundation::error::{VppError, VppResult};
use crate::gpe::clear::clear_surface;
use crate::gpe::scaling::ScalingKernel;
use crate::gpu::memory::GpuMemory;
use crate::pipeline::params::PipelineParameters;
use crate::pipeline::plan::{
    FormatClass, ScaleRoute, StagePlan, align_dst_rect, derive_scale_flag, plan_stages, route,
};
use crate::pipeline::temp::TempSurfaces;
use crate::pp::context::PostProcessingContext;
use crate::pp::index::PpIndex;
use crate::pp::kernel_index::{PpOps, pp_get_kernel_index};
use crate::pp::module::ModuleCall;
use crate::surface::descriptor::SurfaceDescriptor;
use crate::vebox::{VeboxContext, VeboxRequest};

/// What one call ended up doing.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ProcReport {
    /// Scale flag of the top-level conversion, when one was derived.
    pub scale_flag: Option<u32>,
    pub route: Option<ScaleRoute>,
    pub plan: Option<StagePlan>,
    pub gpe_kernels: Vec<ScalingKernel>,
    pub pp_modules: Vec<PpIndex>,
    pub vebox_passes: u32,
    pub clears: u32,
    /// Intermediate surfaces created (and destroyed) by the call.
    pub intermediates: usize,
}

/// Validated inputs of one call.
#[derive(Debug)]
struct ProcInputs {
    src: SurfaceDescriptor,
    src_rect: Rect,
    dst: SurfaceDescriptor,
    dst_rect: Rect,
    filters: FilterList,
    flags: FilterFlags,
    background: u32,
    forward_references: Vec<SurfaceId>,
}

/// One conversion between two surfaces.
#[derive(Clone, Copy, Debug)]
struct Hop<'h> {
    src: &'h SurfaceDescriptor,
    src_rect: Rect,
    dst: &'h SurfaceDescriptor,
    dst_rect: Rect,
}

fn fall_through<T>(result: VppResult<T>, path: &str) -> Option<VppResult<T>> {
    match result {
        Err(e) if e.is_unimplemented() => {
            tracing::trace!(path, reason = %e, "path does not apply, falling back");
            None
        }
        other => Some(other),
    }
}

fn check_rect(rect: Rect, desc: &SurfaceDescriptor, what: &str) -> VppResult<Rect> {
    let rect = rect.validate(what)?;
    if rect.right() > desc.orig_width || rect.bottom() > desc.orig_height {
        return Err(VppError::invalid_parameter(format!(
            "{what} {rect:?} exceeds {}x{} surface",
            desc.orig_width, desc.orig_height
        )));
    }
    Ok(rect)
}

/// Everything the engine keeps between calls, guarded by the engine lock.
#[derive(Debug)]
pub struct EngineState {
    config: VppConfig,
    pp: PostProcessingContext,
    vebox: Option<VeboxContext>,
}

impl EngineState {
    pub fn new(
        config: VppConfig,
        kernels: &KernelStore,
        mem: &mut dyn GpuMemory,
    ) -> VppResult<Self> {
        config.validate()?;
        let pp = PostProcessingContext::new(&config, kernels, mem)?;
        Ok(Self {
            config,
            pp,
            vebox: None,
        })
    }

    pub fn config(&self) -> &VppConfig {
        &self.config
    }

    pub fn pp(&self) -> &PostProcessingContext {
        &self.pp
    }

    /// The VEBOX context, once a call has needed it.
    pub fn vebox(&self) -> Option<&VeboxContext> {
        self.vebox.as_ref()
    }

    fn vebox_mut(&mut self) -> VppResult<&mut VeboxContext> {
        if !self.config.vebox_enabled() {
            return Err(VppError::unimplemented(format!(
                "VEBOX disabled on {:?}",
                self.config.generation
            )));
        }
        if self.vebox.is_none() {
            self.vebox = Some(VeboxContext::new(
                self.config.generation,
                self.config.batch_size_hint,
            )?);
        }
        self.vebox
            .as_mut()
            .ok_or_else(|| VppError::unimplemented("VEBOX context unavailable"))
    }

    fn validate(
        drv: &mut DriverContext<'_>,
        params: &PipelineParameters,
        target: SurfaceId,
    ) -> VppResult<ProcInputs> {
        if target.is_invalid() {
            return Err(VppError::invalid_surface("no render target"));
        }
        if params.surface.is_invalid() {
            return Err(VppError::invalid_surface("no source surface"));
        }
        let src = drv.surfaces.resolve(params.surface).ok_or_else(|| {
            VppError::invalid_surface(format!("unknown source surface {:?}", params.surface))
        })?;
        if !src.has_backing() {
            return Err(VppError::invalid_surface(format!(
                "source surface {:?} has no backing buffer",
                src.id
            )));
        }
        let mut dst = drv.surfaces.resolve(target).ok_or_else(|| {
            VppError::invalid_surface(format!("unknown render target {target:?}"))
        })?;

        let filters = resolve_filters(drv.buffers, params.filter_ids()?)?;
        let src_rect = check_rect(
            params.surface_region.unwrap_or(src.full_rect()),
            &src,
            "surface region",
        )?;
        let dst_rect = check_rect(
            params.output_region.unwrap_or(dst.full_rect()),
            &dst,
            "output region",
        )?;

        if !dst.has_backing() {
            let fourcc = if dst.expected_format == RtFormat::Yuv420_10bpp {
                Fourcc::P010
            } else {
                Fourcc::NV12
            };
            drv.surfaces
                .ensure_backing(target, true, fourcc, Subsampling::Yuv420)?;
            dst = drv.surfaces.resolve(target).ok_or_else(|| {
                VppError::invalid_surface(format!("render target {target:?} vanished"))
            })?;
        }

        Ok(ProcInputs {
            src,
            src_rect,
            dst,
            dst_rect,
            filters,
            flags: params.filter_flags,
            background: params.output_background_color,
            forward_references: params.forward_references.clone(),
        })
    }

    /// Validate `params`, run the driver for this generation and release every intermediate.
    pub fn process(
        &mut self,
        drv: &mut DriverContext<'_>,
        params: &PipelineParameters,
        target: SurfaceId,
    ) -> VppResult<ProcReport> {
        let inputs = Self::validate(drv, params, target)?;
        let mut report = ProcReport::default();
        let mut temps = TempSurfaces::new();
        let result = if self.config.vebox_enabled() {
            self.staged_proc_picture(drv, &inputs, &mut temps, &mut report)
        } else {
            self.proc_picture(drv, &inputs, &mut temps, &mut report)
        };
        report.intermediates = temps.len();
        temps.destroy_all(drv.surfaces);
        result.map(|()| report)
    }

    /// Single GPE-kernel dispatch for the 4:2:0 to 4:2:0 cases.
    fn common_scaling(
        &mut self,
        drv: &mut DriverContext<'_>,
        hop: Hop<'_>,
        flags: FilterFlags,
        background: u32,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        let src_fourcc = hop.src.format()?;
        let dst_fourcc = hop.dst.format()?;
        let flag = derive_scale_flag(
            src_fourcc,
            hop.src_rect,
            dst_fourcc,
            hop.dst_rect,
            self.config.vebox_enabled(),
        );
        let chosen = route(flag);
        if report.scale_flag.is_none() {
            report.scale_flag = Some(flag);
            report.route = Some(chosen);
        }
        tracing::debug!(scale_flag = flag, route = ?chosen, "scale flag derived");

        let ScaleRoute::Gpe(kernel) = chosen else {
            return Err(VppError::unimplemented(format!(
                "no GPE scaling kernel for {src_fourcc} to {dst_fourcc}"
            )));
        };
        if !self.pp.has_scaling_kernel(kernel) {
            return Err(VppError::unimplemented(format!(
                "{} not available",
                kernel.name()
            )));
        }
        let dst_rect = align_dst_rect(hop.dst_rect, kernel.x_alignment());
        if kernel == ScalingKernel::Yuv420_8Bit && clear_surface(drv.batch, hop.dst, background)? {
            report.clears += 1;
        }
        self.pp
            .run_gpe_scaling(drv, kernel, hop.src, hop.src_rect, hop.dst, dst_rect, flags)?;
        report.gpe_kernels.push(kernel);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_module(
        &mut self,
        drv: &mut DriverContext<'_>,
        index: PpIndex,
        hop: Hop<'_>,
        filter: Option<&FilterParameter>,
        flags: FilterFlags,
        forward_references: &[SurfaceId],
        report: &mut ProcReport,
    ) -> VppResult<()> {
        let call = ModuleCall {
            src: hop.src,
            src_rect: hop.src_rect,
            dst: hop.dst,
            dst_rect: hop.dst_rect,
            filter,
            filter_flags: flags,
            forward_references,
        };
        self.pp.run(drv, index, &call)?;
        report.pp_modules.push(index);
        Ok(())
    }

    /// Module lookup for a plain format and size conversion.
    fn image_processing(
        &mut self,
        drv: &mut DriverContext<'_>,
        hop: Hop<'_>,
        flags: FilterFlags,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        let src_fourcc = hop.src.format()?;
        let dst_fourcc = hop.dst.format()?;
        let ops = PpOps::between(src_fourcc, hop.src_rect, dst_fourcc, hop.dst_rect);
        let index = pp_get_kernel_index(src_fourcc, Some(dst_fourcc), ops, flags)
            .filter(|&i| self.pp.has_kernel(i))
            .ok_or_else(|| {
                VppError::unimplemented(format!("no module for {src_fourcc} to {dst_fourcc}"))
            })?;
        if ops.changes_size() && !self.pp.module(index).can_scale() {
            return Err(VppError::unimplemented(format!("{index} cannot resize")));
        }
        tracing::debug!(%index, ?ops, "module selected");
        self.run_module(drv, index, hop, None, flags, &[], report)
    }

    /// NV12 to NV12 resampling through the scaling or AVS module.
    fn scaling_processing(
        &mut self,
        drv: &mut DriverContext<'_>,
        hop: Hop<'_>,
        flags: FilterFlags,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        if hop.src.format()? != Fourcc::NV12 || hop.dst.format()? != Fourcc::NV12 {
            return Err(VppError::unimplemented("scaling modules take NV12 only"));
        }
        let index = if avs_is_needed(flags) {
            PpIndex::Nv12Avs
        } else {
            PpIndex::Nv12Scaling
        };
        self.run_module(drv, index, hop, None, flags, &[], report)
    }

    /// Kernel-index fast path: background clear, then one module.
    fn proc_picture_fast(
        &mut self,
        drv: &mut DriverContext<'_>,
        hop: Hop<'_>,
        flags: FilterFlags,
        background: u32,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        let src_fourcc = hop.src.format()?;
        let dst_fourcc = hop.dst.format()?;
        let ops = PpOps::between(src_fourcc, hop.src_rect, dst_fourcc, hop.dst_rect);
        let Some(index) = pp_get_kernel_index(src_fourcc, Some(dst_fourcc), ops, flags) else {
            return Err(VppError::unimplemented(format!(
                "no fast module for {src_fourcc} to {dst_fourcc}"
            )));
        };
        if !self.pp.has_kernel(index) || (ops.changes_size() && !self.pp.module(index).can_scale())
        {
            return Err(VppError::unimplemented(format!("{index} unusable here")));
        }
        if clear_surface(drv.batch, hop.dst, background)? {
            report.clears += 1;
        }
        self.run_module(drv, index, hop, None, flags, &[], report)
    }

    /// The implicit format and scale conversion: fast kernels first, then the general chain.
    fn convert_picture(
        &mut self,
        drv: &mut DriverContext<'_>,
        hop: Hop<'_>,
        flags: FilterFlags,
        background: u32,
        temps: &mut TempSurfaces,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        if let Some(done) = fall_through(
            self.common_scaling(drv, hop, flags, background, report),
            "common scaling",
        ) {
            return done;
        }
        if let Some(done) = fall_through(
            self.proc_picture_fast(drv, hop, flags, background, report),
            "fast conversion",
        ) {
            return done;
        }
        self.general_convert(drv, hop, &[], flags, background, &[], temps, report)
    }

    /// To NV12, through each filter module, then scaled (and converted) into the destination.
    #[allow(clippy::too_many_arguments)]
    fn general_convert(
        &mut self,
        drv: &mut DriverContext<'_>,
        hop: Hop<'_>,
        filters: &[FilterParameter],
        flags: FilterFlags,
        background: u32,
        forward_references: &[SurfaceId],
        temps: &mut TempSurfaces,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        let mut current = hop.src.clone();
        let rect = hop.src_rect;

        if current.format()? != Fourcc::NV12 {
            let tmp = temps.create_nv12(drv.surfaces, current.orig_width, current.orig_height)?;
            let to_nv12 = Hop {
                src: &current,
                src_rect: rect,
                dst: &tmp,
                dst_rect: rect,
            };
            self.image_processing(drv, to_nv12, flags, report)?;
            current = tmp;
        }

        for filter in filters {
            let index = match filter.filter_type() {
                FilterType::NoiseReduction => Some(PpIndex::Nv12Dn),
                FilterType::Deinterlacing => Some(PpIndex::Nv12Dndi),
                _ => None,
            };
            let Some(index) = index.filter(|&i| self.pp.has_kernel(i)) else {
                tracing::debug!(filter = ?filter.filter_type(), "no module for filter, skipped");
                continue;
            };
            let tmp = temps.create_nv12(drv.surfaces, current.orig_width, current.orig_height)?;
            let step = Hop {
                src: &current,
                src_rect: rect,
                dst: &tmp,
                dst_rect: rect,
            };
            self.run_module(drv, index, step, Some(filter), flags, forward_references, report)?;
            current = tmp;
        }

        if clear_surface(drv.batch, hop.dst, background)? {
            report.clears += 1;
        }

        if hop.dst.format()? == Fourcc::NV12 {
            let scale = Hop {
                src: &current,
                src_rect: rect,
                ..hop
            };
            return self.scaling_processing(drv, scale, flags, report);
        }

        let tmp = temps.create_nv12(drv.surfaces, hop.dst.orig_width, hop.dst.orig_height)?;
        let scale = Hop {
            src: &current,
            src_rect: rect,
            dst: &tmp,
            dst_rect: hop.dst_rect,
        };
        self.scaling_processing(drv, scale, flags, report)?;
        let convert = Hop {
            src: &tmp,
            src_rect: hop.dst_rect,
            ..hop
        };
        self.image_processing(drv, convert, flags, report)
    }

    /// Driver for parts without VEBOX.
    fn proc_picture(
        &mut self,
        drv: &mut DriverContext<'_>,
        inputs: &ProcInputs,
        temps: &mut TempSurfaces,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        let hop = Hop {
            src: &inputs.src,
            src_rect: inputs.src_rect,
            dst: &inputs.dst,
            dst_rect: inputs.dst_rect,
        };
        if inputs.filters.is_empty() {
            if let Some(done) = fall_through(
                self.common_scaling(drv, hop, inputs.flags, inputs.background, report),
                "common scaling",
            ) {
                return done;
            }
            if let Some(done) = fall_through(
                self.proc_picture_fast(drv, hop, inputs.flags, inputs.background, report),
                "fast module",
            ) {
                return done;
            }
        }
        self.general_convert(
            drv,
            hop,
            &inputs.filters,
            inputs.flags,
            inputs.background,
            &inputs.forward_references,
            temps,
            report,
        )
    }

    fn run_vebox(
        &mut self,
        drv: &mut DriverContext<'_>,
        request: VeboxRequest<'_>,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        self.vebox_mut()?.process(drv, &request)?;
        report.vebox_passes += 1;
        Ok(())
    }

    /// Driver for parts with VEBOX: up to three passes around the 10-bit endpoints.
    fn staged_proc_picture(
        &mut self,
        drv: &mut DriverContext<'_>,
        inputs: &ProcInputs,
        temps: &mut TempSurfaces,
        report: &mut ProcReport,
    ) -> VppResult<()> {
        let hop = Hop {
            src: &inputs.src,
            src_rect: inputs.src_rect,
            dst: &inputs.dst,
            dst_rect: inputs.dst_rect,
        };
        let has_filters = !inputs.filters.is_empty();
        if !has_filters
            && let Some(done) = fall_through(
                self.common_scaling(drv, hop, inputs.flags, inputs.background, report),
                "common scaling",
            )
        {
            return done;
        }

        let src_class = FormatClass::of(inputs.src.format()?);
        let dst_class = FormatClass::of(inputs.dst.format()?);
        let plan = plan_stages(
            src_class,
            dst_class,
            inputs.src_rect == inputs.dst_rect,
            has_filters,
        );
        report.plan = Some(plan);
        tracing::debug!(?src_class, ?dst_class, ?plan, "stage plan");

        let mut current = inputs.src.clone();
        let mut current_rect = inputs.src_rect;

        if plan.stage1 {
            let out = if !plan.stage2 && !plan.stage3 {
                inputs.dst.clone()
            } else {
                temps.create_nv12(drv.surfaces, inputs.src.orig_width, inputs.src.orig_height)?
            };
            let request = VeboxRequest {
                src: &current,
                dst: &out,
                rect: current_rect,
                filters: &[],
                forward_references: &[],
            };
            self.run_vebox(drv, request, report)?;
            current = out;
        }

        if plan.stage2 {
            let out = if plan.stage3 {
                temps.create_nv12(drv.surfaces, inputs.dst.orig_width, inputs.dst.orig_height)?
            } else {
                inputs.dst.clone()
            };
            let out_rect = inputs.dst_rect;

            if !has_filters {
                let step = Hop {
                    src: &current,
                    src_rect: current_rect,
                    dst: &out,
                    dst_rect: out_rect,
                };
                self.convert_picture(drv, step, inputs.flags, inputs.background, temps, report)?;
            } else {
                if inputs.filters.len() > 1 {
                    validate_vebox_chain(&inputs.filters)?;
                }
                // VEBOX cannot move or resize; filter in place first and convert afterwards.
                let filtered = if current_rect == out_rect {
                    out.clone()
                } else {
                    temps.create_nv12(drv.surfaces, current.orig_width, current.orig_height)?
                };
                let request = VeboxRequest {
                    src: &current,
                    dst: &filtered,
                    rect: current_rect,
                    filters: &inputs.filters,
                    forward_references: &inputs.forward_references,
                };
                self.run_vebox(drv, request, report)?;
                if current_rect != out_rect {
                    let step = Hop {
                        src: &filtered,
                        src_rect: current_rect,
                        dst: &out,
                        dst_rect: out_rect,
                    };
                    self.convert_picture(
                        drv,
                        step,
                        inputs.flags,
                        inputs.background,
                        temps,
                        report,
                    )?;
                }
            }
            current = out;
            current_rect = out_rect;
        }

        if plan.stage3 {
            let request = VeboxRequest {
                src: &current,
                dst: &inputs.dst,
                rect: current_rect,
                filters: &[],
                forward_references: &[],
            };
            self.run_vebox(drv, request, report)?;
        }
        Ok(())
    }

    /// Display-time processing: deinterlace a field picture and resize, into a new NV12
    /// surface the caller owns. `None` when nothing had to be done.
    pub fn put_surface(
        &mut self,
        drv: &mut DriverContext<'_>,
        surface: SurfaceId,
        src_rect: Rect,
        dst_rect: Rect,
        flags: FilterFlags,
    ) -> VppResult<Option<SurfaceId>> {
        let src = drv
            .surfaces
            .resolve(surface)
            .filter(SurfaceDescriptor::has_backing)
            .ok_or_else(|| VppError::invalid_surface(format!("cannot display {surface:?}")))?;
        let src_rect = check_rect(src_rect, &src, "source rect")?;
        let dst_rect = dst_rect.validate("destination rect")?;

        let mut temps = TempSurfaces::new();
        let result = self.put_surface_inner(drv, &src, src_rect, dst_rect, flags, &mut temps);
        if let Ok(Some(id)) = &result {
            temps.keep(*id);
        }
        temps.destroy_all(drv.surfaces);
        result
    }

    fn put_surface_inner(
        &mut self,
        drv: &mut DriverContext<'_>,
        src: &SurfaceDescriptor,
        src_rect: Rect,
        dst_rect: Rect,
        flags: FilterFlags,
        temps: &mut TempSurfaces,
    ) -> VppResult<Option<SurfaceId>> {
        let mut report = ProcReport::default();
        let mut current = src.clone();
        let mut current_rect = src_rect;
        let mut produced = None;

        let field = flags.field();
        if field != FieldFlag::Frame {
            let di_flags = if field == FieldFlag::BottomField {
                DeinterlaceFlags::BOTTOM_FIELD_FIRST | DeinterlaceFlags::BOTTOM_FIELD
            } else {
                0
            };
            let filter = FilterParameter::Deinterlacing {
                algorithm: DeinterlaceAlgorithm::Bob,
                flags: di_flags,
            };
            let out = temps.create_nv12(drv.surfaces, src.orig_width, src.orig_height)?;
            let done = if self.pp.has_kernel(PpIndex::Nv12Dndi) {
                let hop = Hop {
                    src: &current,
                    src_rect: current_rect,
                    dst: &out,
                    dst_rect: current_rect,
                };
                self.run_module(drv, PpIndex::Nv12Dndi, hop, Some(&filter), flags, &[], &mut report)
            } else {
                let request = VeboxRequest {
                    src: &current,
                    dst: &out,
                    rect: current_rect,
                    filters: std::slice::from_ref(&filter),
                    forward_references: &[],
                };
                self.run_vebox(drv, request, &mut report)
            };
            match fall_through(done, "display deinterlace") {
                Some(Err(e)) => return Err(e),
                Some(Ok(())) => {
                    produced = Some(out.id);
                    current = out;
                }
                None => {}
            }
        }

        if !current_rect.same_size(dst_rect) {
            let index = if avs_is_needed(flags) {
                PpIndex::Nv12Avs
            } else {
                PpIndex::Nv12Scaling
            };
            let out = temps.create_nv12(drv.surfaces, dst_rect.width, dst_rect.height)?;
            let out_rect = Rect::full(dst_rect.width, dst_rect.height);
            let hop = Hop {
                src: &current,
                src_rect: current_rect,
                dst: &out,
                dst_rect: out_rect,
            };
            let done = self.run_module(drv, index, hop, None, flags, &[], &mut report);
            match fall_through(done, "display scaling") {
                Some(Err(e)) => return Err(e),
                Some(Ok(())) => {
                    produced = Some(out.id);
                    current_rect = out_rect;
                }
                None => {}
            }
        }

        tracing::debug!(produced = ?produced, rect = ?current_rect, "display post-processing done");
        Ok(produced)
    }

    /// Release every GPU resource and scratch surface held across calls.
    pub fn destroy(&mut self, drv: &mut DriverContext<'_>) {
        self.pp.finalize(drv);
        if let Some(mut vebox) = self.vebox.take() {
            vebox.destroy(drv.surfaces);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/driver.rs"]
mod tests;
