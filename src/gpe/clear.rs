use crate::color::rgb_to_yuv;
use crate::foundation::core::Fourcc;
use crate::foundation::error::VppResult;
use crate::gpu::batch::{BatchEmitter, GpuCommand, Reloc};
use crate::surface::descriptor::SurfaceDescriptor;

/// Batch space reserved for the two blits.
const CLEAR_BATCH_HINT: usize = 0x100;

/// Fill `dst` with `background` (`0xAARRGGBB`) using the blitter.
///
/// Returns `false` without touching the batch when the color is fully transparent or `dst` is
/// not NV12.
pub fn clear_surface(
    batch: &mut dyn BatchEmitter,
    dst: &SurfaceDescriptor,
    background: u32,
) -> VppResult<bool> {
    let color = rgb_to_yuv(background);
    if color.a == 0 {
        return Ok(false);
    }
    let fourcc = dst.format()?;
    if fourcc != Fourcc::NV12 {
        tracing::debug!(%fourcc, surface = ?dst.id, "background clear skipped for non-NV12 target");
        return Ok(false);
    }
    let buffer = dst.backing()?;
    let luma = dst.plane(0)?;
    let chroma = dst.plane(1)?;

    batch.begin_atomic(CLEAR_BATCH_HINT);
    batch.emit(GpuCommand::ColorBlt {
        at: Reloc::new(buffer, luma.offset),
        pitch: luma.pitch,
        width_bytes: dst.width,
        height: dst.height,
        bytes_per_pixel: 1,
        color: u32::from(color.y),
    });
    batch.emit(GpuCommand::ColorBlt {
        at: Reloc::new(buffer, chroma.offset),
        pitch: chroma.pitch,
        width_bytes: dst.width,
        height: dst.height / 2,
        bytes_per_pixel: 2,
        color: u32::from(color.v) << 8 | u32::from(color.u),
    });
    batch.end_atomic();
    batch.flush()?;
    Ok(true)
}

#[cfg(test)]
#[path = "../../tests/unit/gpe/clear.rs"]
mod tests;
