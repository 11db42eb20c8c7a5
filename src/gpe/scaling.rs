//! GPE scaling kernels: one fixed kernel per bit depth, dispatched through a [`GpeContext`].

use crate::color::ColorMatrix;
use crate::foundation::core::{Fourcc, Rect};
use crate::foundation::error::{VppError, VppResult};
use crate::foundation::math::{DwordWriter, align_up};
use crate::gpe::context::{GpeContext, GpeLayout, VfeParams, WalkerParams};
use crate::gpu::batch::BatchEmitter;
use crate::gpu::memory::GpuMemory;
use crate::gpu::state::plane_states;
use crate::surface::descriptor::SurfaceDescriptor;

/// Binding-table index of the first input plane.
pub const SCALING_BTI_INPUT: u32 = 0;
/// Binding-table index of the first output plane.
pub const SCALING_BTI_OUTPUT: u32 = 8;
pub const SCALING_CURBE_SIZE: usize = 128;
/// Output block edge covered by one walker item.
pub const SCALING_BLOCK: u32 = 16;

/// The two fixed GPE scaling kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ScalingKernel {
    /// P010/I010 in, P010/I010 out.
    Yuv420_10Bit,
    /// NV12/I420 in, NV12/I420 out.
    Yuv420_8Bit,
}

impl ScalingKernel {
    pub const ALL: [ScalingKernel; 2] = [ScalingKernel::Yuv420_10Bit, ScalingKernel::Yuv420_8Bit];

    /// Kernel binary name, without the generation extension.
    pub fn name(self) -> &'static str {
        match self {
            ScalingKernel::Yuv420_10Bit => "pl016_scaling",
            ScalingKernel::Yuv420_8Bit => "pl2_8bit_420_scaling",
        }
    }

    /// Required destination x alignment.
    pub fn x_alignment(self) -> u32 {
        match self {
            ScalingKernel::Yuv420_10Bit => 2,
            ScalingKernel::Yuv420_8Bit => 4,
        }
    }

    /// Context layout used for every dispatch of this kernel.
    pub fn new_context(self, sampler_size: usize, max_surfaces: usize) -> GpeContext {
        GpeContext::new(
            self.name(),
            GpeLayout {
                curbe_size: SCALING_CURBE_SIZE,
                idrt_entries: 1,
                sampler_size,
                max_surfaces,
                vfe_in_memory: false,
            },
            VfeParams {
                max_threads: 112,
                num_urb_entries: 16,
                urb_entry_size: 16,
                curbe_allocation_size: SCALING_CURBE_SIZE as u32 / 32,
            },
        )
    }
}

/// CURBE contents read by both scaling kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct ScalingCurbe {
    pub inv_width: f32,
    pub inv_height: f32,
    /// Samples are MSB aligned in 16-bit words.
    pub src_msb: bool,
    pub dst_msb: bool,
    pub src_packed: bool,
    pub dst_packed: bool,
    pub x_dst: u32,
    pub y_dst: u32,
    pub x_factor: f32,
    pub y_factor: f32,
    pub x_orig: f32,
    pub y_orig: f32,
    pub bti_input: u32,
    pub bti_output: u32,
    pub coefs: ColorMatrix,
}

impl ScalingCurbe {
    /// Parameters mapping `src_rect` of `src` onto `dst_rect` of `dst`.
    pub fn new(
        src: &SurfaceDescriptor,
        src_rect: Rect,
        dst: &SurfaceDescriptor,
        dst_rect: Rect,
        coefs: &ColorMatrix,
    ) -> Self {
        let src_w = src.orig_width.max(1) as f32;
        let src_h = src.orig_height.max(1) as f32;
        let is_10bit = |f: Option<Fourcc>| matches!(f, Some(Fourcc::P010) | Some(Fourcc::I010));
        let is_packed = |f: Option<Fourcc>| f.is_some_and(Fourcc::is_packed_yuv);
        Self {
            inv_width: 1.0 / src_w,
            inv_height: 1.0 / src_h,
            src_msb: is_10bit(src.fourcc),
            dst_msb: is_10bit(dst.fourcc),
            src_packed: is_packed(src.fourcc),
            dst_packed: is_packed(dst.fourcc),
            x_dst: dst_rect.x,
            y_dst: dst_rect.y,
            x_factor: src_rect.width as f32 / dst_rect.width.max(1) as f32 / src_w,
            y_factor: src_rect.height as f32 / dst_rect.height.max(1) as f32 / src_h,
            x_orig: src_rect.x as f32 / src_w,
            y_orig: src_rect.y as f32 / src_h,
            bti_input: SCALING_BTI_INPUT,
            bti_output: SCALING_BTI_OUTPUT,
            coefs: *coefs,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let flags = u32::from(self.src_msb)
            | u32::from(self.dst_msb) << 1
            | u32::from(self.src_packed) << 2
            | u32::from(self.dst_packed) << 3;
        let mut w = DwordWriter::with_capacity(SCALING_CURBE_SIZE);
        w.f32(self.inv_width)
            .f32(self.inv_height)
            .u32(flags)
            .u32(self.x_dst)
            .u32(self.y_dst)
            .f32(self.x_factor)
            .f32(self.y_factor)
            .f32(self.x_orig)
            .f32(self.y_orig)
            .u32(self.bti_input)
            .u32(self.bti_output);
        for c in self.coefs {
            w.f32(c);
        }
        w.pad_to(SCALING_CURBE_SIZE);
        w.finish()
    }
}

/// One walker item per 16x16 output block of `dst_rect`.
pub fn walker_for(dst_rect: Rect) -> WalkerParams {
    WalkerParams {
        resolution_x: align_up(dst_rect.width, SCALING_BLOCK) / SCALING_BLOCK,
        resolution_y: align_up(dst_rect.height, SCALING_BLOCK) / SCALING_BLOCK,
    }
}

/// Re-initialize `ctx`, bind every plane of `src` and `dst`, fill the CURBE and dispatch.
#[allow(clippy::too_many_arguments)]
pub fn run_scaling(
    ctx: &mut GpeContext,
    mem: &mut dyn GpuMemory,
    batch: &mut dyn BatchEmitter,
    src: &SurfaceDescriptor,
    src_rect: Rect,
    dst: &SurfaceDescriptor,
    dst_rect: Rect,
    coefs: &ColorMatrix,
    size_hint: usize,
) -> VppResult<()> {
    if ctx.kernel().is_none() {
        return Err(VppError::unimplemented(format!(
            "{}: kernel not loaded",
            ctx.name()
        )));
    }
    ctx.init(mem)?;
    ctx.reset_binding_table(mem)?;

    let curbe = ScalingCurbe::new(src, src_rect, dst, dst_rect, coefs).encode();
    ctx.with_curbe(mem, |region| {
        region[..curbe.len()].copy_from_slice(&curbe);
        Ok(())
    })?;

    for (index, state) in plane_states(src, SCALING_BTI_INPUT, false)? {
        ctx.add_surface(mem, index, &state)?;
    }
    for (index, state) in plane_states(dst, SCALING_BTI_OUTPUT, true)? {
        ctx.add_surface(mem, index, &state)?;
    }
    ctx.setup_interface_descriptor(mem, 0)?;

    tracing::debug!(
        kernel = ctx.name(),
        ?src_rect,
        ?dst_rect,
        "dispatching GPE scaling kernel"
    );
    ctx.run_walker(batch, walker_for(dst_rect), size_hint)
}

#[cfg(test)]
#[path = "../../tests/unit/gpe/scaling.rs"]
mod tests;
