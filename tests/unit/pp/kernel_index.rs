use super::*;

fn index(src: Fourcc, dst: Fourcc, resize: bool, flags: u32) -> Option<PpIndex> {
    let dst_rect = if resize {
        Rect::full(32, 32)
    } else {
        Rect::full(64, 64)
    };
    let ops = PpOps::between(src, Rect::full(64, 64), dst, dst_rect);
    pp_get_kernel_index(src, Some(dst), ops, FilterFlags(flags))
}

#[test]
fn ops_reflect_size_and_format_changes() {
    let ops = PpOps::between(Fourcc::NV12, Rect::full(8, 8), Fourcc::I420, Rect::new(4, 4, 8, 8));
    assert!(!ops.changes_size());
    assert!(ops.changes_format());
    let ops = PpOps::between(Fourcc::NV12, Rect::full(8, 8), Fourcc::NV12, Rect::full(8, 4));
    assert_eq!(ops, PpOps(PpOps::CHANGE_SIZE));
}

#[test]
fn nv12_sources() {
    assert_eq!(index(Fourcc::NV12, Fourcc::NV12, false, 0), Some(PpIndex::Nv12LoadSaveN12));
    assert_eq!(index(Fourcc::NV12, Fourcc::NV12, true, 0), Some(PpIndex::Nv12Scaling));
    assert_eq!(
        index(Fourcc::NV12, Fourcc::NV12, true, FilterFlags::SCALING_HQ),
        Some(PpIndex::Nv12Avs)
    );
    assert_eq!(index(Fourcc::NV12, Fourcc::YV12, false, 0), Some(PpIndex::Nv12LoadSavePl3));
    assert_eq!(index(Fourcc::NV12, Fourcc::UYVY, false, 0), Some(PpIndex::Nv12LoadSavePa));
    assert_eq!(index(Fourcc::NV12, Fourcc::BGRX, false, 0), Some(PpIndex::Nv12LoadSaveRgbx));
    assert_eq!(index(Fourcc::NV12, Fourcc::P010, false, 0), None);
}

#[test]
fn planar_packed_and_rgb_sources() {
    assert_eq!(index(Fourcc::I420, Fourcc::NV12, true, 0), Some(PpIndex::Pl3LoadSaveN12));
    assert_eq!(index(Fourcc::P422H, Fourcc::IMC3, false, 0), Some(PpIndex::Pl3LoadSavePl3));
    assert_eq!(index(Fourcc::YV12, Fourcc::YUY2, false, 0), Some(PpIndex::Pl3LoadSavePa));
    assert_eq!(index(Fourcc::YUY2, Fourcc::NV12, false, 0), Some(PpIndex::PaLoadSaveNv12));
    assert_eq!(index(Fourcc::UYVY, Fourcc::I420, false, 0), Some(PpIndex::PaLoadSavePl3));
    assert_eq!(index(Fourcc::YUY2, Fourcc::UYVY, false, 0), Some(PpIndex::PaLoadSavePa));
    assert_eq!(index(Fourcc::RGBA, Fourcc::NV12, false, 0), Some(PpIndex::RgbxLoadSaveNv12));
    assert_eq!(index(Fourcc::RGBA, Fourcc::I420, false, 0), None);
    assert_eq!(index(Fourcc::P010, Fourcc::NV12, false, 0), None);
}

#[test]
fn missing_destination_means_same_format() {
    let ops = PpOps::default();
    assert_eq!(
        pp_get_kernel_index(Fourcc::I420, None, ops, FilterFlags(0)),
        Some(PpIndex::Pl3LoadSavePl3)
    );
}
