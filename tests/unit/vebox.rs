use super::*;
use crate::filter::DeinterlaceAlgorithm;
use crate::host::HostDriver;

fn surface(host: &mut HostDriver, fourcc: Fourcc) -> SurfaceDescriptor {
    let id = host.surfaces.add_allocated(fourcc, 720, 480, true).unwrap();
    host.surfaces.get(id).unwrap().clone()
}

fn run(
    host: &mut HostDriver,
    vebox: &mut VeboxContext,
    src: &SurfaceDescriptor,
    dst: &SurfaceDescriptor,
    filters: &[FilterParameter],
    fwd: &[SurfaceId],
) -> VppResult<()> {
    let req = VeboxRequest {
        src,
        dst,
        rect: Rect::full(src.orig_width, src.orig_height),
        filters,
        forward_references: fwd,
    };
    vebox.process(&mut host.context(), &req)
}

fn di(algorithm: DeinterlaceAlgorithm) -> FilterParameter {
    FilterParameter::Deinterlacing {
        algorithm,
        flags: 0,
    }
}

fn last_di_iecp(host: &HostDriver) -> GpuCommand {
    host.batch
        .commands()
        .filter(|c| matches!(c, GpuCommand::VeboxDiIecp { .. }))
        .last()
        .cloned()
        .unwrap()
}

#[test]
fn only_vebox_generations_build_a_context() {
    assert_eq!(
        VeboxContext::new(Generation::Gen75, 0x1000).unwrap().layout(),
        VeboxLayout::Haswell
    );
    assert_eq!(
        VeboxContext::new(Generation::Gen9, 0x1000).unwrap().layout(),
        VeboxLayout::Gen9
    );
    for generation in [Generation::Gen5, Generation::Gen6, Generation::Gen7] {
        let err = VeboxContext::new(generation, 0x1000).unwrap_err();
        assert!(err.is_unimplemented());
    }
}

#[test]
fn plain_pass_is_one_atomic_submission() {
    let mut host = HostDriver::new();
    let mut vebox = VeboxContext::new(Generation::Gen9, 0x1000).unwrap();
    let src = surface(&mut host, Fourcc::NV12);
    let dst = surface(&mut host, Fourcc::NV12);
    run(&mut host, &mut vebox, &src, &dst, &[], &[]).unwrap();

    assert_eq!(
        host.batch.command_names(),
        vec![
            "VEB_STATE",
            "VEB_SURFACE_STATE",
            "VEB_SURFACE_STATE",
            "VEB_DI_IECP"
        ]
    );
    assert_eq!(host.batch.flushes(), 1);
    assert!(host.batch.is_balanced());
    assert_eq!(vebox.invocations(), 1);
    assert_eq!(vebox.features(), VeboxFeatures::default());
    match last_di_iecp(&host) {
        GpuCommand::VeboxDiIecp {
            previous_input,
            stmm_input,
            previous_output,
            current_output,
            ..
        } => {
            assert_eq!(previous_input, None);
            assert_eq!(stmm_input, None);
            assert_eq!(previous_output, None);
            assert_eq!(Some(current_output.buffer), dst.buffer);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn format_change_enables_csc() {
    let mut host = HostDriver::new();
    let mut vebox = VeboxContext::new(Generation::Gen8, 0x1000).unwrap();
    let src = surface(&mut host, Fourcc::NV12);
    let dst = surface(&mut host, Fourcc::YUY2);
    run(&mut host, &mut vebox, &src, &dst, &[], &[]).unwrap();
    assert!(vebox.features().csc);
}

#[test]
fn ten_bit_needs_gen9() {
    let mut host = HostDriver::new();
    let src = surface(&mut host, Fourcc::P010);
    let dst = surface(&mut host, Fourcc::NV12);

    let mut gen8 = VeboxContext::new(Generation::Gen8, 0x1000).unwrap();
    let err = run(&mut host, &mut gen8, &src, &dst, &[], &[]).unwrap_err();
    assert!(matches!(err, VppError::UnsupportedRtFormat(_)));
    assert!(host.batch.command_names().is_empty());

    let mut gen9 = VeboxContext::new(Generation::Gen9, 0x1000).unwrap();
    run(&mut host, &mut gen9, &src, &dst, &[], &[]).unwrap();
    assert!(gen9.features().csc);
}

#[test]
fn bad_chains_are_rejected_before_emission() {
    let mut host = HostDriver::new();
    let mut vebox = VeboxContext::new(Generation::Gen9, 0x1000).unwrap();
    let src = surface(&mut host, Fourcc::NV12);
    let dst = surface(&mut host, Fourcc::NV12);
    let nr = FilterParameter::NoiseReduction { value: 0.5 };
    let err = run(&mut host, &mut vebox, &src, &dst, &[nr.clone(), nr], &[]).unwrap_err();
    assert!(matches!(err, VppError::InvalidFilterChain(_)));

    let err = run(
        &mut host,
        &mut vebox,
        &src,
        &dst,
        &[di(DeinterlaceAlgorithm::Weave)],
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, VppError::UnsupportedFilter(_)));
    assert!(host.batch.command_names().is_empty());
    assert_eq!(vebox.invocations(), 0);
}

#[test]
fn bob_runs_as_first_frame_with_motion_buffers() {
    let mut host = HostDriver::new();
    let mut vebox = VeboxContext::new(Generation::Gen9, 0x1000).unwrap();
    let src = surface(&mut host, Fourcc::NV12);
    let dst = surface(&mut host, Fourcc::NV12);
    run(
        &mut host,
        &mut vebox,
        &src,
        &dst,
        &[di(DeinterlaceAlgorithm::Bob)],
        &[],
    )
    .unwrap();

    assert!(vebox.features().deinterlace);
    assert!(vebox.dndi_state().is_first_frame);
    let state = host
        .batch
        .commands()
        .find_map(|c| match c {
            GpuCommand::VeboxState { first_frame, .. } => Some(*first_frame),
            _ => None,
        })
        .unwrap();
    assert!(state);
    match last_di_iecp(&host) {
        GpuCommand::VeboxDiIecp {
            stmm_input,
            stmm_output,
            previous_output,
            ..
        } => {
            assert!(stmm_input.is_some());
            assert!(stmm_output.is_some());
            assert_ne!(stmm_input, stmm_output);
            assert_eq!(previous_output, None);
        }
        other => panic!("unexpected {other:?}"),
    }

    vebox.destroy(&mut host.surfaces);
    assert_eq!(host.surfaces.created(), host.surfaces.destroyed());
    assert!(host.surfaces.contains(src.id));
    assert!(host.surfaces.contains(dst.id));
}

#[test]
fn motion_adaptive_binds_previous_frames() {
    let mut host = HostDriver::new();
    let mut vebox = VeboxContext::new(Generation::Gen9, 0x1000).unwrap();
    let reference = surface(&mut host, Fourcc::NV12);
    let first = surface(&mut host, Fourcc::NV12);
    let second = surface(&mut host, Fourcc::NV12);
    let d0 = surface(&mut host, Fourcc::NV12);
    let d1 = surface(&mut host, Fourcc::NV12);
    let ma = [di(DeinterlaceAlgorithm::MotionAdaptive)];

    run(&mut host, &mut vebox, &first, &d0, &ma, &[reference.id]).unwrap();
    assert!(vebox.dndi_state().is_first_frame);

    run(&mut host, &mut vebox, &second, &d1, &ma, &[first.id]).unwrap();
    assert!(!vebox.dndi_state().is_first_frame);
    assert!(vebox.dndi_state().is_di_adv_enabled);
    match last_di_iecp(&host) {
        GpuCommand::VeboxDiIecp {
            previous_input,
            previous_output,
            ..
        } => {
            assert_eq!(previous_input.map(|r| r.buffer), first.buffer);
            assert!(previous_output.is_some());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(vebox.invocations(), 2);

    vebox.destroy(&mut host.surfaces);
    assert_eq!(host.surfaces.created(), host.surfaces.destroyed());
}

#[test]
fn denoise_strength_reaches_the_state() {
    let mut host = HostDriver::new();
    let mut vebox = VeboxContext::new(Generation::Gen75, 0x1000).unwrap();
    let src = surface(&mut host, Fourcc::NV12);
    let dst = surface(&mut host, Fourcc::NV12);
    let filters = [
        FilterParameter::NoiseReduction { value: 1.0 },
        FilterParameter::SkinToneEnhancement { value: 0.5 },
    ];
    run(&mut host, &mut vebox, &src, &dst, &filters, &[]).unwrap();

    let features = vebox.features();
    assert!(features.denoise && features.skin_tone);
    assert!(!features.deinterlace);
    let strength = host
        .batch
        .commands()
        .find_map(|c| match c {
            GpuCommand::VeboxState { dn_strength, .. } => Some(*dn_strength),
            _ => None,
        })
        .unwrap();
    assert_eq!(strength, 31);
}
