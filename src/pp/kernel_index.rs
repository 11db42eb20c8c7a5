use crate::avs::avs_is_needed;
use crate::foundation::core::{FilterFlags, Fourcc, Rect};
use crate::pp::index::PpIndex;

/// Operations a conversion performs, as seen by the module lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PpOps(pub u32);

impl PpOps {
    pub const CHANGE_FORMAT: u32 = 0x1;
    pub const CHANGE_SIZE: u32 = 0x2;

    /// Ops implied by converting `src` in `src_rect` to `dst` in `dst_rect`.
    pub fn between(src: Fourcc, src_rect: Rect, dst: Fourcc, dst_rect: Rect) -> Self {
        let mut ops = 0;
        if !src_rect.same_size(dst_rect) {
            ops |= Self::CHANGE_SIZE;
        }
        if src != dst {
            ops |= Self::CHANGE_FORMAT;
        }
        PpOps(ops)
    }

    pub fn changes_size(self) -> bool {
        self.0 & Self::CHANGE_SIZE != 0
    }

    pub fn changes_format(self) -> bool {
        self.0 & Self::CHANGE_FORMAT != 0
    }
}

/// Module converting `src` to `dst` (same format when `dst` is `None`), or `None` when no
/// module covers the pair.
pub fn pp_get_kernel_index(
    src: Fourcc,
    dst: Option<Fourcc>,
    ops: PpOps,
    filter_flags: FilterFlags,
) -> Option<PpIndex> {
    let dst = dst.unwrap_or(src);
    let dst_pl3 = matches!(dst, Fourcc::I420 | Fourcc::YV12 | Fourcc::IMC1 | Fourcc::IMC3);
    let dst_pa = matches!(dst, Fourcc::YUY2 | Fourcc::UYVY);

    match src {
        Fourcc::RGBX | Fourcc::RGBA | Fourcc::BGRX | Fourcc::BGRA => {
            (dst == Fourcc::NV12).then_some(PpIndex::RgbxLoadSaveNv12)
        }
        Fourcc::YUY2 | Fourcc::UYVY => match dst {
            Fourcc::NV12 => Some(PpIndex::PaLoadSaveNv12),
            Fourcc::I420 | Fourcc::YV12 => Some(PpIndex::PaLoadSavePl3),
            _ if dst_pa => Some(PpIndex::PaLoadSavePa),
            _ => None,
        },
        Fourcc::NV12 => match dst {
            Fourcc::NV12 if ops.changes_size() => Some(if avs_is_needed(filter_flags) {
                PpIndex::Nv12Avs
            } else {
                PpIndex::Nv12Scaling
            }),
            Fourcc::NV12 => Some(PpIndex::Nv12LoadSaveN12),
            _ if dst_pl3 => Some(PpIndex::Nv12LoadSavePl3),
            _ if dst_pa => Some(PpIndex::Nv12LoadSavePa),
            _ if dst.is_rgb() => Some(PpIndex::Nv12LoadSaveRgbx),
            _ => None,
        },
        Fourcc::I420
        | Fourcc::YV12
        | Fourcc::IMC1
        | Fourcc::IMC3
        | Fourcc::YV16
        | Fourcc::P411
        | Fourcc::P422H
        | Fourcc::P422V
        | Fourcc::P444 => match dst {
            Fourcc::NV12 => Some(PpIndex::Pl3LoadSaveN12),
            _ if dst_pl3 => Some(PpIndex::Pl3LoadSavePl3),
            _ if dst_pa => Some(PpIndex::Pl3LoadSavePa),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pp/kernel_index.rs"]
mod tests;
