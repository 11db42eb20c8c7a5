use super::*;

const FULL: Rect = Rect::full(1920, 1080);
const HALF: Rect = Rect::full(960, 540);

#[test]
fn scale_flag_packs_source_and_destination() {
    assert_eq!(
        derive_scale_flag(Fourcc::P010, FULL, Fourcc::P010, HALF, true),
        0x55
    );
    assert_eq!(
        derive_scale_flag(Fourcc::NV12, FULL, Fourcc::I420, HALF, true),
        0x11
    );
    assert_eq!(
        derive_scale_flag(Fourcc::YUY2, FULL, Fourcc::NV12, HALF, false),
        0x18
    );
    assert_eq!(
        derive_scale_flag(Fourcc::NV12, FULL, Fourcc::RGBA, FULL, false),
        0x01
    );
}

#[test]
fn same_rect_p010_stays_on_vebox() {
    assert_eq!(
        derive_scale_flag(Fourcc::P010, FULL, Fourcc::P010, FULL, true),
        0
    );
    assert_eq!(
        derive_scale_flag(Fourcc::P010, FULL, Fourcc::P010, FULL, false),
        ScaleFlag::SCALE_10BIT_420
    );
}

#[test]
fn routes_follow_the_flag() {
    assert_eq!(route(0x55), ScaleRoute::Gpe(ScalingKernel::Yuv420_10Bit));
    assert_eq!(route(0x11), ScaleRoute::Gpe(ScalingKernel::Yuv420_8Bit));
    assert_eq!(route(0x15), ScaleRoute::Staged);
    assert_eq!(route(0x51), ScaleRoute::Staged);
    assert_eq!(route(0), ScaleRoute::Staged);
}

#[test]
fn destination_alignment_keeps_the_right_edge() {
    let r = align_dst_rect(Rect::new(7, 3, 100, 50), 4);
    assert_eq!(r, Rect::new(4, 3, 103, 50));
    assert_eq!(r.x + r.width, 107);

    let r = align_dst_rect(Rect::new(7, 0, 100, 50), 2);
    assert_eq!(r, Rect::new(6, 0, 101, 50));

    let aligned = Rect::new(8, 0, 100, 50);
    assert_eq!(align_dst_rect(aligned, 4), aligned);
}

#[test]
fn format_classes() {
    assert_eq!(FormatClass::of(Fourcc::NV12), FormatClass::Nv12);
    assert_eq!(FormatClass::of(Fourcc::P010), FormatClass::P010);
    assert_eq!(FormatClass::of(Fourcc::I420), FormatClass::Other);
    assert_eq!(FormatClass::of(Fourcc::YUY2), FormatClass::Other);
}

#[test]
fn ten_bit_source_always_starts_on_vebox() {
    use FormatClass::*;
    let p = plan_stages(P010, Nv12, true, false);
    assert_eq!(
        p,
        StagePlan {
            stage1: true,
            stage2: false,
            stage3: false,
        }
    );
    assert_eq!(p.stage_count(), 1);

    let p = plan_stages(P010, Nv12, false, false);
    assert!(p.stage1 && p.stage2 && !p.stage3);

    let p = plan_stages(P010, Other, true, false);
    assert!(p.stage1 && p.stage2 && !p.stage3);

    let p = plan_stages(P010, P010, false, false);
    assert_eq!(p.stage_count(), 3);

    let p = plan_stages(P010, P010, true, false);
    assert_eq!(p.stage_count(), 1);

    let p = plan_stages(P010, P010, true, true);
    assert_eq!(p.stage_count(), 3);
}

#[test]
fn ten_bit_destination_always_ends_on_vebox() {
    use FormatClass::*;
    let p = plan_stages(Nv12, P010, true, false);
    assert_eq!(
        p,
        StagePlan {
            stage1: false,
            stage2: false,
            stage3: true,
        }
    );
    assert!(plan_stages(Nv12, P010, false, false).stage2);
    assert!(plan_stages(Nv12, P010, true, true).stage2);
    assert!(plan_stages(Other, P010, true, false).stage2);
}

#[test]
fn eight_bit_pairs_use_the_middle_stage_only() {
    use FormatClass::*;
    for (src, dst) in [(Nv12, Nv12), (Nv12, Other), (Other, Nv12), (Other, Other)] {
        for rects_equal in [true, false] {
            for has_filters in [true, false] {
                let p = plan_stages(src, dst, rects_equal, has_filters);
                assert_eq!(
                    p,
                    StagePlan {
                        stage1: false,
                        stage2: true,
                        stage3: false,
                    }
                );
            }
        }
    }
}
