use super::*;
use crate::foundation::core::{Fourcc, SurfaceId};
use crate::host::HostDriver;

fn setup(generation: Generation) -> (HostDriver, PostProcessingContext) {
    let mut host = HostDriver::new();
    let config = VppConfig::for_generation(generation);
    let kernels = KernelStore::synthetic(generation);
    let ctx = PostProcessingContext::new(&config, &kernels, &mut host.memory).unwrap();
    (host, ctx)
}

fn nv12(host: &mut HostDriver, w: u32, h: u32) -> SurfaceId {
    host.surfaces.add_allocated(Fourcc::NV12, w, h, true).unwrap()
}

fn dispatch(
    host: &mut HostDriver,
    ctx: &mut PostProcessingContext,
    index: PpIndex,
    src: SurfaceId,
    dst: SurfaceId,
) -> VppResult<()> {
    let src = host.surfaces.get(src).unwrap().clone();
    let dst = host.surfaces.get(dst).unwrap().clone();
    let call = ModuleCall {
        src: &src,
        src_rect: Rect::full(src.orig_width, src.orig_height),
        dst: &dst,
        dst_rect: Rect::full(dst.orig_width, dst.orig_height),
        filter: None,
        filter_flags: FilterFlags::default(),
        forward_references: &[],
    };
    ctx.run(&mut host.context(), index, &call)
}

#[test]
fn shared_kernel_binaries_are_uploaded_once() {
    let (host, ctx) = setup(Generation::Gen7);
    assert_eq!(
        ctx.kernel_offset(PpIndex::Nv12Scaling),
        ctx.kernel_offset(PpIndex::Nv12Avs)
    );
    assert!(!ctx.has_kernel(PpIndex::Null));
    assert!(ctx.has_kernel(PpIndex::Nv12Dndi));
    assert_eq!(host.memory.find("kernel instructions").len(), 1);
}

#[test]
fn gen9_leaves_temporal_modules_to_vebox() {
    let (_host, ctx) = setup(Generation::Gen9);
    assert!(!ctx.has_kernel(PpIndex::Nv12Dndi));
    assert!(!ctx.has_kernel(PpIndex::Nv12Dn));
    assert!(ctx.has_kernel(PpIndex::Nv12LoadSaveN12));
    assert!(ctx.has_scaling_kernel(ScalingKernel::Yuv420_8Bit));
    assert!(ctx.has_scaling_kernel(ScalingKernel::Yuv420_10Bit));

    let (_host, gen8) = setup(Generation::Gen8);
    assert!(!gen8.has_scaling_kernel(ScalingKernel::Yuv420_8Bit));
}

#[test]
fn missing_kernels_report_unimplemented_without_emitting() {
    let mut host = HostDriver::new();
    let config = VppConfig::for_generation(Generation::Gen75);
    let mut ctx =
        PostProcessingContext::new(&config, &KernelStore::new(), &mut host.memory).unwrap();
    assert_eq!(host.memory.allocs(), 0);

    let src = nv12(&mut host, 64, 64);
    let dst = nv12(&mut host, 64, 64);
    let err = dispatch(&mut host, &mut ctx, PpIndex::Nv12Scaling, src, dst).unwrap_err();
    assert!(err.is_unimplemented());
    assert!(host.batch.command_names().is_empty());
    assert_eq!(ctx.current(), None);
}

#[test]
fn gen7_family_runs_objects_from_a_second_level_batch() {
    let (mut host, mut ctx) = setup(Generation::Gen75);
    let src = nv12(&mut host, 1920, 1080);
    let dst = nv12(&mut host, 1280, 720);
    dispatch(&mut host, &mut ctx, PpIndex::Nv12Scaling, src, dst).unwrap();

    assert_eq!(ctx.current(), Some(PpIndex::Nv12Scaling));
    assert_eq!(host.batch.flushes(), 1);
    let names: Vec<_> = host.batch.batches()[0].iter().map(GpuCommand::name).collect();
    assert_eq!(
        names,
        vec![
            "MI_FLUSH",
            "PIPELINE_SELECT",
            "STATE_BASE_ADDRESS",
            "MEDIA_VFE_STATE",
            "MEDIA_CURBE_LOAD",
            "MEDIA_INTERFACE_DESCRIPTOR_LOAD",
            "MEDIA_VFE_STATE",
            "MI_BATCH_BUFFER_START",
        ]
    );
    let objects = host
        .batch
        .count(|c| matches!(c, GpuCommand::MediaObject { .. }));
    assert!(objects > 0);
    assert_eq!(
        host.batch
            .count(|c| matches!(c, GpuCommand::MediaStateFlush)),
        objects
    );
    assert!(host.batch.is_balanced());
    assert!(host.memory.find("command objects buffer").is_empty());
}

#[test]
fn vfe_state_is_reloaded_after_the_descriptors_up_to_gen75() {
    for generation in [Generation::Gen6, Generation::Gen7, Generation::Gen75] {
        let (mut host, mut ctx) = setup(generation);
        let src = nv12(&mut host, 640, 480);
        let dst = nv12(&mut host, 320, 240);
        dispatch(&mut host, &mut ctx, PpIndex::Nv12Scaling, src, dst).unwrap();

        let outer = &host.batch.batches()[0];
        let vfe = outer
            .iter()
            .filter(|c| matches!(c, GpuCommand::VfeState { .. }))
            .count();
        assert_eq!(vfe, 2, "{generation:?}");
        let idt = outer
            .iter()
            .position(|c| c.name() == "MEDIA_INTERFACE_DESCRIPTOR_LOAD")
            .unwrap();
        assert_eq!(outer[idt + 1].name(), "MEDIA_VFE_STATE");
    }

    let (mut host, mut ctx) = setup(Generation::Gen9);
    let src = nv12(&mut host, 640, 480);
    let dst = nv12(&mut host, 320, 240);
    dispatch(&mut host, &mut ctx, PpIndex::Nv12Scaling, src, dst).unwrap();
    assert_eq!(
        host.batch.batches()[0]
            .iter()
            .filter(|c| matches!(c, GpuCommand::VfeState { .. }))
            .count(),
        1
    );
}

#[test]
fn gen8_family_ends_the_pipeline_after_the_walk() {
    let (mut host, mut ctx) = setup(Generation::Gen9);
    let src = nv12(&mut host, 640, 480);
    let dst = nv12(&mut host, 320, 240);
    dispatch(&mut host, &mut ctx, PpIndex::Nv12Scaling, src, dst).unwrap();

    let batches = host.batch.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(
        batches[0].last().map(GpuCommand::name),
        Some("MI_BATCH_BUFFER_START")
    );
    assert_eq!(batches[1], vec![GpuCommand::PipelineEnd]);
    assert!(host.batch.is_balanced());
}

#[test]
fn ironlake_keeps_objects_in_the_primary_batch() {
    let (mut host, mut ctx) = setup(Generation::Gen5);
    let src = nv12(&mut host, 320, 240);
    let dst = nv12(&mut host, 320, 240);
    dispatch(&mut host, &mut ctx, PpIndex::Nv12Scaling, src, dst).unwrap();

    assert_eq!(host.batch.flushes(), 1);
    let names: Vec<_> = host.batch.batches()[0].iter().map(GpuCommand::name).collect();
    assert_eq!(
        names[..7],
        [
            "MI_FLUSH",
            "PIPELINE_SELECT",
            "URB_FENCE",
            "STATE_BASE_ADDRESS",
            "MEDIA_STATE_POINTERS",
            "CS_URB_STATE",
            "CONSTANT_BUFFER",
        ]
    );
    assert!(names[7..].iter().all(|n| *n == "MEDIA_OBJECT"));
    assert!(names.len() > 7);
    assert_eq!(
        host.batch
            .count(|c| matches!(c, GpuCommand::BatchBufferStart { .. })),
        0
    );
}

#[test]
fn gpe_scaling_dispatches_one_walker() {
    let (mut host, mut ctx) = setup(Generation::Gen9);
    let src = nv12(&mut host, 1920, 1080);
    let dst = nv12(&mut host, 1280, 720);
    let src = host.surfaces.get(src).unwrap().clone();
    let dst = host.surfaces.get(dst).unwrap().clone();
    ctx.run_gpe_scaling(
        &mut host.context(),
        ScalingKernel::Yuv420_8Bit,
        &src,
        Rect::full(1920, 1080),
        &dst,
        Rect::full(1280, 720),
        FilterFlags::default(),
    )
    .unwrap();

    let names: Vec<_> = host.batch.batches()[0].iter().map(GpuCommand::name).collect();
    assert_eq!(
        names,
        vec![
            "MI_FLUSH",
            "PIPELINE_SELECT",
            "STATE_BASE_ADDRESS",
            "MEDIA_VFE_STATE",
            "MEDIA_CURBE_LOAD",
            "MEDIA_INTERFACE_DESCRIPTOR_LOAD",
            "MEDIA_OBJECT_WALKER",
            "MEDIA_STATE_FLUSH",
            "PIPELINE_END",
        ]
    );
    let walker = host.batch.batches()[0].iter().find_map(|c| match c {
        GpuCommand::MediaObjectWalker {
            resolution_x,
            resolution_y,
            ..
        } => Some((*resolution_x, *resolution_y)),
        _ => None,
    });
    assert_eq!(walker, Some((80, 45)));
}

#[test]
fn gpe_scaling_off_by_default_before_gen9() {
    let (mut host, mut ctx) = setup(Generation::Gen8);
    let src = nv12(&mut host, 64, 64);
    let src = host.surfaces.get(src).unwrap().clone();
    let err = ctx
        .run_gpe_scaling(
            &mut host.context(),
            ScalingKernel::Yuv420_8Bit,
            &src,
            Rect::full(64, 64),
            &src,
            Rect::full(64, 64),
            FilterFlags::default(),
        )
        .unwrap_err();
    assert!(err.is_unimplemented());
}

#[test]
fn finalize_releases_every_buffer() {
    let (mut host, mut ctx) = setup(Generation::Gen9);
    let src = nv12(&mut host, 256, 256);
    let dst = nv12(&mut host, 128, 128);
    dispatch(&mut host, &mut ctx, PpIndex::Nv12Scaling, src, dst).unwrap();
    let s = host.surfaces.get(src).unwrap().clone();
    let d = host.surfaces.get(dst).unwrap().clone();
    ctx.run_gpe_scaling(
        &mut host.context(),
        ScalingKernel::Yuv420_8Bit,
        &s,
        Rect::full(256, 256),
        &d,
        Rect::full(128, 128),
        FilterFlags::default(),
    )
    .unwrap();
    assert!(host.memory.live_buffers() > 0);

    ctx.finalize(&mut host.context());
    assert_eq!(host.memory.live_buffers(), 0);
    assert_eq!(host.memory.mapped_count(), 0);
    assert!(!ctx.has_kernel(PpIndex::Nv12Scaling));
}
