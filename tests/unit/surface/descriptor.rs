use super::*;

#[test]
fn nv12_tiled_layout() {
    let layout = compute_plane_layout(Fourcc::NV12, 1920, 1080, Tiling::Y).unwrap();
    assert_eq!(layout.width, 1920);
    assert_eq!(layout.height, 1088);
    assert_eq!(layout.planes.len(), 2);
    assert_eq!(layout.planes[0].pitch, 1920);
    assert_eq!(layout.planes[1].offset, 1920 * 1088);
    assert_eq!(layout.planes[1].width, 960);
    assert_eq!(layout.planes[1].height, 544);
    assert_eq!(layout.size, 1920 * 1088 + 1920 * 544);
}

#[test]
fn p010_uses_two_bytes_per_sample() {
    let layout = compute_plane_layout(Fourcc::P010, 64, 64, Tiling::None).unwrap();
    assert_eq!(layout.planes[0].pitch, 128);
    assert_eq!(layout.planes[1].offset, 128 * 64);
}

#[test]
fn three_plane_layouts_order_u_and_v() {
    let i420 = compute_plane_layout(Fourcc::I420, 64, 48, Tiling::None).unwrap();
    assert_eq!(i420.planes[1].offset, 3072);
    assert_eq!(i420.planes[2].offset, 3840);
    assert_eq!(i420.planes[1].pitch, 32);

    let yv12 = compute_plane_layout(Fourcc::YV12, 64, 48, Tiling::None).unwrap();
    assert_eq!(yv12.planes[1].offset, 3840);
    assert_eq!(yv12.planes[2].offset, 3072);
}

#[test]
fn layout_rejects_unknown_formats_and_empty_extents() {
    let err = compute_plane_layout(Fourcc::from_chars(*b"ZZZZ"), 16, 16, Tiling::None).unwrap_err();
    assert!(matches!(err, VppError::UnsupportedRtFormat(_)));
    let err = compute_plane_layout(Fourcc::NV12, 0, 16, Tiling::None).unwrap_err();
    assert!(matches!(err, VppError::InvalidParameter(_)));
}

#[test]
fn layout_rejects_extents_past_the_address_range() {
    for fourcc in [Fourcc::NV12, Fourcc::P010, Fourcc::IMC3, Fourcc::YUY2, Fourcc::I420] {
        let err = compute_plane_layout(fourcc, 1 << 20, 1 << 20, Tiling::Y).unwrap_err();
        assert!(matches!(err, VppError::InvalidParameter(_)), "{fourcc}");
    }
    let err = compute_plane_layout(Fourcc::RGBA, u32::MAX, 1, Tiling::None).unwrap_err();
    assert!(matches!(err, VppError::InvalidParameter(_)));
    assert!(compute_plane_layout(Fourcc::NV12, 16384, 16384, Tiling::Y).is_ok());
}

#[test]
fn unallocated_surfaces_report_missing_backing() {
    let desc = SurfaceDescriptor::unallocated(SurfaceId(5), 320, 240, RtFormat::Yuv420_10bpp);
    assert!(!desc.has_backing());
    assert!(desc.backing().is_err());
    assert!(desc.format().is_err());
    assert!(desc.plane(0).is_err());
    assert_eq!(desc.full_rect(), Rect::full(320, 240));
    assert!(!desc.is_tiled());
}

#[test]
fn derived_images_keep_client_planes() {
    let image = ImageDescriptor {
        fourcc: Fourcc::I420,
        width: 63,
        height: 31,
        buffer: BufferHandle(9),
        planes: smallvec::smallvec![(0, 64), (4096, 32), (5120, 32)],
    };
    let desc = derive_surface(&image).unwrap();
    assert_eq!(desc.origin, SurfaceOrigin::Image);
    assert_eq!(desc.planes.len(), 3);
    assert_eq!(desc.planes[1].width, 32);
    assert_eq!(desc.planes[1].height, 16);
    assert_eq!(desc.planes[2].offset, 5120);
    assert_eq!(desc.buffer, Some(BufferHandle(9)));
}

#[test]
fn derived_images_need_every_plane() {
    let image = ImageDescriptor {
        fourcc: Fourcc::NV12,
        width: 16,
        height: 16,
        buffer: BufferHandle(1),
        planes: smallvec::smallvec![(0, 16)],
    };
    assert!(matches!(
        derive_surface(&image).unwrap_err(),
        VppError::InvalidParameter(_)
    ));
}
