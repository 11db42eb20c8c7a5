use smallvec::SmallVec;

use crate::foundation::core::{FieldFlag, Fourcc, Rect, RtFormat, Subsampling, SurfaceId};
use crate::foundation::error::{VppError, VppResult};
use crate::foundation::math::align_up;
use crate::gpu::memory::BufferHandle;

/// Memory tiling of a surface's backing buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiling {
    #[default]
    None,
    X,
    Y,
}

impl Tiling {
    /// Pitch and height alignment required by this tiling mode.
    pub fn alignment(self) -> (u32, u32) {
        match self {
            Tiling::None => (16, 16),
            Tiling::X => (512, 8),
            Tiling::Y => (128, 32),
        }
    }
}

/// One memory plane of a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaneLayout {
    /// Byte offset of the plane inside the backing buffer.
    pub offset: u32,
    /// Row pitch in bytes.
    pub pitch: u32,
    /// Plane width in samples (not bytes).
    pub width: u32,
    /// Plane height in rows.
    pub height: u32,
}

/// Where a descriptor came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceOrigin {
    /// Driver-managed surface.
    #[default]
    Surface,
    /// Client image wrapped in place by [`derive_surface`].
    Image,
}

/// Uniform view of one image buffer usable as input or output.
///
/// Planes are always listed Y first, then U (or interleaved UV), then V, regardless of the
/// order they sit in memory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceDescriptor {
    pub id: SurfaceId,
    #[serde(default)]
    pub origin: SurfaceOrigin,
    /// Pixel format; `None` until backing storage is attached.
    pub fourcc: Option<Fourcc>,
    /// Visible width.
    pub orig_width: u32,
    /// Visible height.
    pub orig_height: u32,
    /// Allocated (padded) width.
    pub width: u32,
    /// Allocated (padded) height.
    pub height: u32,
    #[serde(default)]
    pub planes: SmallVec<[PlaneLayout; 3]>,
    #[serde(default)]
    pub tiling: Tiling,
    #[serde(default)]
    pub subsampling: Option<Subsampling>,
    #[serde(default)]
    pub buffer: Option<BufferHandle>,
    #[serde(default)]
    pub field: FieldFlag,
    /// Render-target format the surface was created for; drives lazy allocation.
    #[serde(default)]
    pub expected_format: RtFormat,
}

impl SurfaceDescriptor {
    /// A surface without backing storage.
    pub fn unallocated(id: SurfaceId, width: u32, height: u32, expected_format: RtFormat) -> Self {
        Self {
            id,
            origin: SurfaceOrigin::Surface,
            fourcc: None,
            orig_width: width,
            orig_height: height,
            width,
            height,
            planes: SmallVec::new(),
            tiling: Tiling::None,
            subsampling: None,
            buffer: None,
            field: FieldFlag::Frame,
            expected_format,
        }
    }

    /// `true` once a backing buffer is attached.
    pub fn has_backing(&self) -> bool {
        self.buffer.is_some()
    }

    /// Backing buffer, or `InvalidSurface` when none is attached.
    pub fn backing(&self) -> VppResult<BufferHandle> {
        self.buffer.ok_or_else(|| {
            VppError::invalid_surface(format!("surface {:?} has no backing buffer", self.id))
        })
    }

    /// Pixel format, or `InvalidSurface` for an unallocated surface.
    pub fn format(&self) -> VppResult<Fourcc> {
        self.fourcc.ok_or_else(|| {
            VppError::invalid_surface(format!("surface {:?} has no pixel format", self.id))
        })
    }

    /// Rect covering the visible extent.
    pub fn full_rect(&self) -> Rect {
        Rect::full(self.orig_width, self.orig_height)
    }

    /// Plane `index`, or `InvalidSurface` when the layout has fewer planes.
    pub fn plane(&self, index: usize) -> VppResult<PlaneLayout> {
        self.planes.get(index).copied().ok_or_else(|| {
            VppError::invalid_surface(format!(
                "surface {:?} has {} planes, plane {index} requested",
                self.id,
                self.planes.len()
            ))
        })
    }

    pub fn is_tiled(&self) -> bool {
        self.tiling != Tiling::None
    }
}

/// Plane geometry and allocation size for a freshly laid out surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceLayout {
    pub width: u32,
    pub height: u32,
    pub planes: SmallVec<[PlaneLayout; 3]>,
    pub size: usize,
}

/// Lay out `fourcc` at `width x height` under `tiling`.
pub fn compute_plane_layout(
    fourcc: Fourcc,
    width: u32,
    height: u32,
    tiling: Tiling,
) -> VppResult<SurfaceLayout> {
    let info = fourcc
        .info()
        .ok_or_else(|| VppError::unsupported_rt_format(format!("no layout for {fourcc}")))?;
    if width == 0 || height == 0 {
        return Err(VppError::invalid_parameter(format!(
            "surface extent must be non-zero, got {width}x{height}"
        )));
    }

    let overflow = || {
        VppError::invalid_parameter(format!("{fourcc} surface of {width}x{height} is too large"))
    };
    let mul = |a: u32, b: u32| a.checked_mul(b).ok_or_else(overflow);
    let add = |a: u32, b: u32| a.checked_add(b).ok_or_else(overflow);

    let (pitch_align, height_align) = tiling.alignment();
    let bytes_per_sample: u32 = if info.bit_depth > 8 { 2 } else { 1 };
    let alloc_w = align_up(width, 16);
    let alloc_h = align_up(height, height_align);

    let mut planes: SmallVec<[PlaneLayout; 3]> = SmallVec::new();
    let size: u32;

    match fourcc {
        Fourcc::NV12 | Fourcc::P010 => {
            let pitch = align_up(mul(alloc_w, bytes_per_sample)?, pitch_align);
            let uv_offset = mul(pitch, alloc_h)?;
            let uv_h = align_up(alloc_h / 2, height_align.min(16));
            planes.push(PlaneLayout {
                offset: 0,
                pitch,
                width: alloc_w,
                height: alloc_h,
            });
            planes.push(PlaneLayout {
                offset: uv_offset,
                pitch,
                width: alloc_w / 2,
                height: alloc_h / 2,
            });
            size = add(uv_offset, mul(pitch, uv_h)?)?;
        }
        Fourcc::IMC1 | Fourcc::IMC3 => {
            // Chroma planes share the luma pitch and sit below it.
            let pitch = align_up(alloc_w, pitch_align);
            let c_h = alloc_h / 2;
            let first = mul(pitch, alloc_h)?;
            let second = add(first, mul(pitch, c_h)?)?;
            let (u, v) = if fourcc == Fourcc::IMC3 {
                (first, second)
            } else {
                (second, first)
            };
            planes.push(PlaneLayout {
                offset: 0,
                pitch,
                width: alloc_w,
                height: alloc_h,
            });
            planes.push(PlaneLayout {
                offset: u,
                pitch,
                width: alloc_w / 2,
                height: c_h,
            });
            planes.push(PlaneLayout {
                offset: v,
                pitch,
                width: alloc_w / 2,
                height: c_h,
            });
            size = add(second, mul(pitch, c_h)?)?;
        }
        Fourcc::YUY2 | Fourcc::UYVY | Fourcc::RGBA | Fourcc::RGBX | Fourcc::BGRA
        | Fourcc::BGRX => {
            let bpp = if info.rgb { 4 } else { 2 };
            let pitch = align_up(mul(alloc_w, bpp)?, pitch_align);
            planes.push(PlaneLayout {
                offset: 0,
                pitch,
                width: alloc_w,
                height: alloc_h,
            });
            size = mul(pitch, alloc_h)?;
        }
        _ => {
            let (cw, ch) = match info.subsampling {
                Subsampling::Yuv420 => (alloc_w / 2, alloc_h / 2),
                Subsampling::Yuv422H => (alloc_w / 2, alloc_h),
                Subsampling::Yuv422V => (alloc_w, alloc_h / 2),
                Subsampling::Yuv411 => (alloc_w / 4, alloc_h),
                _ => (alloc_w, alloc_h),
            };
            let pitch = align_up(mul(alloc_w, bytes_per_sample)?, pitch_align);
            let c_pitch = align_up(mul(cw, bytes_per_sample)?, pitch_align.min(16).max(8));
            let first = mul(pitch, alloc_h)?;
            let second = add(first, mul(c_pitch, ch)?)?;
            // YV12/YV16 store V before U.
            let (u, v) = if fourcc == Fourcc::YV12 || fourcc == Fourcc::YV16 {
                (second, first)
            } else {
                (first, second)
            };
            planes.push(PlaneLayout {
                offset: 0,
                pitch,
                width: alloc_w,
                height: alloc_h,
            });
            planes.push(PlaneLayout {
                offset: u,
                pitch: c_pitch,
                width: cw,
                height: ch,
            });
            planes.push(PlaneLayout {
                offset: v,
                pitch: c_pitch,
                width: cw,
                height: ch,
            });
            size = add(second, mul(c_pitch, ch)?)?;
        }
    }

    Ok(SurfaceLayout {
        width: alloc_w,
        height: alloc_h,
        planes,
        size: size as usize,
    })
}

/// Client image as handed over by the image collaborator.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageDescriptor {
    pub fourcc: Fourcc,
    pub width: u32,
    pub height: u32,
    pub buffer: BufferHandle,
    /// Per-plane `(offset, pitch)` in memory order of Y, U, V.
    pub planes: SmallVec<[(u32, u32); 3]>,
}

/// Wrap a client image as a linear surface descriptor without copying pixels.
pub fn derive_surface(image: &ImageDescriptor) -> VppResult<SurfaceDescriptor> {
    let info = image
        .fourcc
        .info()
        .ok_or_else(|| VppError::unsupported_rt_format(format!("image format {}", image.fourcc)))?;
    if image.planes.len() < usize::from(info.num_planes) {
        return Err(VppError::invalid_parameter(format!(
            "image {} needs {} planes, got {}",
            image.fourcc,
            info.num_planes,
            image.planes.len()
        )));
    }

    let (cw, ch) = match info.subsampling {
        Subsampling::Yuv420 => (image.width.div_ceil(2), image.height.div_ceil(2)),
        Subsampling::Yuv422H => (image.width.div_ceil(2), image.height),
        Subsampling::Yuv422V => (image.width, image.height.div_ceil(2)),
        Subsampling::Yuv411 => (image.width.div_ceil(4), image.height),
        _ => (image.width, image.height),
    };
    let planes = image
        .planes
        .iter()
        .take(usize::from(info.num_planes))
        .enumerate()
        .map(|(i, &(offset, pitch))| {
            let (width, height) = if i == 0 || info.packed {
                (image.width, image.height)
            } else {
                (cw, ch)
            };
            PlaneLayout {
                offset,
                pitch,
                width,
                height,
            }
        })
        .collect();

    Ok(SurfaceDescriptor {
        id: SurfaceId::INVALID,
        origin: SurfaceOrigin::Image,
        fourcc: Some(image.fourcc),
        orig_width: image.width,
        orig_height: image.height,
        width: image.width,
        height: image.height,
        planes,
        tiling: Tiling::None,
        subsampling: Some(info.subsampling),
        buffer: Some(image.buffer),
        field: FieldFlag::Frame,
        expected_format: RtFormat::Yuv420,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/surface/descriptor.rs"]
mod tests;
