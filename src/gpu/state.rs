use smallvec::SmallVec;

use crate::foundation::core::Fourcc;
use crate::foundation::error::{VppError, VppResult};
use crate::foundation::math::DwordWriter;
use crate::gpu::memory::BufferHandle;
use crate::surface::descriptor::{SurfaceDescriptor, Tiling};

/// Every surface-state record is padded to this size.
pub const SURFACE_STATE_PADDED_SIZE: usize = 64;
/// One binding-table entry is a 32-bit pointer.
pub const BINDING_TABLE_ENTRY_SIZE: usize = 4;
/// Interface-descriptor entries are 32 bytes on every generation handled here.
pub const INTERFACE_DESCRIPTOR_SIZE: usize = 32;
/// Dynamic-state sub-regions are placed on this boundary.
pub const STATE_ALIGNMENT: usize = 64;

/// Surface format of one plane view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum SurfaceFormat {
    R8Unorm,
    R8G8Unorm,
    R16Unorm,
    R16G16Unorm,
    /// Packed YUY2.
    YCrCbNormal,
    /// Packed UYVY.
    YCrCbSwapY,
    R8G8B8A8Unorm,
    B8G8R8A8Unorm,
    /// Media-sampler planar 4:2:0, 8 bit.
    Planar420_8,
    /// Media-sampler planar 4:2:0, 16 bit.
    Planar420_16,
}

impl SurfaceFormat {
    fn code(self) -> u32 {
        match self {
            SurfaceFormat::R8Unorm => 0x140,
            SurfaceFormat::R8G8Unorm => 0x106,
            SurfaceFormat::R16Unorm => 0x10a,
            SurfaceFormat::R16G16Unorm => 0x0cc,
            SurfaceFormat::YCrCbNormal => 0x182,
            SurfaceFormat::YCrCbSwapY => 0x18f,
            SurfaceFormat::R8G8B8A8Unorm => 0x0c7,
            SurfaceFormat::B8G8R8A8Unorm => 0x0c0,
            SurfaceFormat::Planar420_8 => 0x1a5,
            SurfaceFormat::Planar420_16 => 0x1a6,
        }
    }

    /// Luma view format for `fourcc`.
    pub fn luma_for(fourcc: Fourcc) -> VppResult<Self> {
        let info = fourcc
            .info()
            .ok_or_else(|| VppError::unsupported_rt_format(format!("no surface format for {fourcc}")))?;
        Ok(match fourcc {
            Fourcc::YUY2 => SurfaceFormat::YCrCbNormal,
            Fourcc::UYVY => SurfaceFormat::YCrCbSwapY,
            Fourcc::RGBA | Fourcc::RGBX => SurfaceFormat::R8G8B8A8Unorm,
            Fourcc::BGRA | Fourcc::BGRX => SurfaceFormat::B8G8R8A8Unorm,
            _ if info.bit_depth > 8 => SurfaceFormat::R16Unorm,
            _ => SurfaceFormat::R8Unorm,
        })
    }

    /// Chroma view format for `fourcc` (interleaved UV or a single U/V plane).
    pub fn chroma_for(fourcc: Fourcc) -> VppResult<Self> {
        let info = fourcc
            .info()
            .ok_or_else(|| VppError::unsupported_rt_format(format!("no surface format for {fourcc}")))?;
        Ok(match (info.num_planes, info.bit_depth > 8) {
            (2, false) => SurfaceFormat::R8G8Unorm,
            (2, true) => SurfaceFormat::R16G16Unorm,
            (_, true) => SurfaceFormat::R16Unorm,
            _ => SurfaceFormat::R8Unorm,
        })
    }
}

/// One surface-state record: a single plane view of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SurfaceState {
    pub buffer: BufferHandle,
    pub offset: u32,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub format: SurfaceFormat,
    pub tiling: Tiling,
    pub is_output: bool,
}

impl SurfaceState {
    /// Encode into a padded record; the buffer address travels as the handle value.
    pub fn encode(&self) -> Vec<u8> {
        let tiling = match self.tiling {
            Tiling::None => 0,
            Tiling::X => 2,
            Tiling::Y => 3,
        };
        let mut w = DwordWriter::with_capacity(SURFACE_STATE_PADDED_SIZE);
        w.u32(self.format.code() << 18 | tiling << 12 | u32::from(self.is_output) << 8)
            .u32(self.width.saturating_sub(1) | self.height.saturating_sub(1) << 16)
            .u32(self.pitch.saturating_sub(1))
            .u32(self.offset)
            .u64(self.buffer.0)
            .pad_to(SURFACE_STATE_PADDED_SIZE);
        w.finish()
    }
}

/// Interface-descriptor table entry binding one kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct InterfaceDescriptor {
    pub kernel_offset: u32,
    pub sampler_offset: u32,
    pub sampler_count: u32,
    pub binding_table_offset: u32,
    pub binding_table_entries: u32,
    /// CURBE read length in 32-byte units.
    pub curbe_read_length: u32,
}

impl InterfaceDescriptor {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = DwordWriter::with_capacity(INTERFACE_DESCRIPTOR_SIZE);
        w.u32(self.kernel_offset)
            .u32(0)
            .u32(self.sampler_offset | self.sampler_count.min(4) << 2)
            .u32(self.binding_table_offset | self.binding_table_entries.min(31))
            .u32(self.curbe_read_length << 16)
            .pad_to(INTERFACE_DESCRIPTOR_SIZE);
        w.finish()
    }
}

/// Byte offset of surface-state record `index` in a combined surface-state/binding-table
/// buffer.
pub fn surface_state_offset(index: usize) -> usize {
    index * SURFACE_STATE_PADDED_SIZE
}

/// Byte offset of binding-table entry `index` in a combined buffer sized for `max_surfaces`.
pub fn binding_table_entry_offset(max_surfaces: usize, index: usize) -> usize {
    max_surfaces * SURFACE_STATE_PADDED_SIZE + index * BINDING_TABLE_ENTRY_SIZE
}

/// Size of the combined surface-state/binding-table buffer.
pub fn surface_state_buffer_size(max_surfaces: usize) -> usize {
    (SURFACE_STATE_PADDED_SIZE + BINDING_TABLE_ENTRY_SIZE) * max_surfaces
}

/// Bytes one sample occupies in a view of `format`.
pub fn bytes_per_sample(format: SurfaceFormat) -> u32 {
    match format {
        SurfaceFormat::R8Unorm | SurfaceFormat::Planar420_8 => 1,
        SurfaceFormat::R8G8Unorm
        | SurfaceFormat::R16Unorm
        | SurfaceFormat::Planar420_16
        | SurfaceFormat::YCrCbNormal
        | SurfaceFormat::YCrCbSwapY => 2,
        SurfaceFormat::R16G16Unorm
        | SurfaceFormat::R8G8B8A8Unorm
        | SurfaceFormat::B8G8R8A8Unorm => 4,
    }
}

/// One surface state per plane of `desc`, bound from binding index `base` upwards.
pub fn plane_states(
    desc: &SurfaceDescriptor,
    base: u32,
    is_output: bool,
) -> VppResult<SmallVec<[(u32, SurfaceState); 3]>> {
    let fourcc = desc.format()?;
    let buffer = desc.backing()?;
    let mut out = SmallVec::new();
    for (i, plane) in desc.planes.iter().enumerate() {
        let format = if i == 0 {
            SurfaceFormat::luma_for(fourcc)?
        } else {
            SurfaceFormat::chroma_for(fourcc)?
        };
        out.push((
            base + i as u32,
            SurfaceState {
                buffer,
                offset: plane.offset,
                width: plane.width,
                height: plane.height,
                pitch: plane.pitch,
                format,
                tiling: desc.tiling,
                is_output,
            },
        ));
    }
    if out.is_empty() {
        return Err(VppError::invalid_surface(format!(
            "surface {:?} has no plane layout",
            desc.id
        )));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/state.rs"]
mod tests;
