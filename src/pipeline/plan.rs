//! Pure decisions: scale-flag derivation, fast-route selection and stage planning.

use crate::foundation::core::{Fourcc, Rect};
use crate::foundation::math::align_down;
use crate::gpe::scaling::ScalingKernel;

/// Scale-flag bit codes. The low nibble describes the source, the high nibble the destination.
pub struct ScaleFlag;

impl ScaleFlag {
    pub const SRC_8BIT_420: u32 = 0x01;
    pub const SRC_10BIT_420: u32 = 0x05;
    pub const SRC_PACKED: u32 = 0x08;
    pub const DST_8BIT_420: u32 = Self::SRC_8BIT_420 << 4;
    pub const DST_10BIT_420: u32 = Self::SRC_10BIT_420 << 4;
    pub const DST_PACKED: u32 = Self::SRC_PACKED << 4;

    pub const SRC_MASK: u32 = 0x0f;
    pub const DST_MASK: u32 = 0xf0;

    pub const SCALE_10BIT_420: u32 = Self::SRC_10BIT_420 | Self::DST_10BIT_420;
    pub const SCALE_8BIT_420: u32 = Self::SRC_8BIT_420 | Self::DST_8BIT_420;
}

fn format_code(fourcc: Fourcc) -> u32 {
    match fourcc {
        Fourcc::NV12 | Fourcc::I420 => ScaleFlag::SRC_8BIT_420,
        Fourcc::P010 | Fourcc::I010 => ScaleFlag::SRC_10BIT_420,
        Fourcc::YUY2 | Fourcc::UYVY => ScaleFlag::SRC_PACKED,
        _ => 0,
    }
}

/// Scale flag for converting `src` in `src_rect` to `dst` in `dst_rect`.
///
/// With VEBOX present, a same-rect P010 to P010 call yields 0 so the VEBOX path takes it.
pub fn derive_scale_flag(
    src: Fourcc,
    src_rect: Rect,
    dst: Fourcc,
    dst_rect: Rect,
    has_vebox: bool,
) -> u32 {
    if has_vebox && src == Fourcc::P010 && dst == Fourcc::P010 && src_rect == dst_rect {
        return 0;
    }
    (format_code(src) & ScaleFlag::SRC_MASK) | ((format_code(dst) << 4) & ScaleFlag::DST_MASK)
}

/// Where the implicit format and scale conversion goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleRoute {
    /// A single GPE scaling kernel dispatch produces the output.
    Gpe(ScalingKernel),
    /// Neither fast kernel applies.
    Staged,
}

pub fn route(scale_flag: u32) -> ScaleRoute {
    match scale_flag & (ScaleFlag::SRC_MASK | ScaleFlag::DST_MASK) {
        ScaleFlag::SCALE_10BIT_420 => ScaleRoute::Gpe(ScalingKernel::Yuv420_10Bit),
        ScaleFlag::SCALE_8BIT_420 => ScaleRoute::Gpe(ScalingKernel::Yuv420_8Bit),
        _ => ScaleRoute::Staged,
    }
}

/// Move `rect.x` down to a multiple of `alignment`, widening so the original right edge stays.
pub fn align_dst_rect(rect: Rect, alignment: u32) -> Rect {
    let x = align_down(rect.x, alignment);
    Rect {
        x,
        width: rect.width + (rect.x - x),
        ..rect
    }
}

/// Endpoint format as far as stage planning cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatClass {
    Nv12,
    P010,
    Other,
}

impl FormatClass {
    pub fn of(fourcc: Fourcc) -> Self {
        match fourcc {
            Fourcc::NV12 => FormatClass::Nv12,
            Fourcc::P010 => FormatClass::P010,
            _ => FormatClass::Other,
        }
    }
}

/// Which of the three staged passes run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct StagePlan {
    /// VEBOX pass over the source region, out of 10-bit.
    pub stage1: bool,
    /// Filters or the implicit conversion.
    pub stage2: bool,
    /// VEBOX pass into a 10-bit destination.
    pub stage3: bool,
}

impl StagePlan {
    pub fn stage_count(self) -> usize {
        usize::from(self.stage1) + usize::from(self.stage2) + usize::from(self.stage3)
    }
}

pub fn plan_stages(
    src: FormatClass,
    dst: FormatClass,
    rects_equal: bool,
    has_filters: bool,
) -> StagePlan {
    match (src, dst) {
        (FormatClass::P010, _) => {
            let stage2 = !rects_equal || dst == FormatClass::Other || has_filters;
            StagePlan {
                stage1: true,
                stage2,
                stage3: stage2 && dst == FormatClass::P010,
            }
        }
        (_, FormatClass::P010) => StagePlan {
            stage1: false,
            stage2: !(src == FormatClass::Nv12 && !has_filters && rects_equal),
            stage3: true,
        },
        _ => StagePlan {
            stage1: false,
            stage2: true,
            stage3: false,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/plan.rs"]
mod tests;
