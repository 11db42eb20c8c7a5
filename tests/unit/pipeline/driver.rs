use super::*;
use crate::foundation::core::Generation;
use crate::gpu::batch::GpuCommand;
use crate::host::HostDriver;

fn state(host: &mut HostDriver, generation: Generation) -> EngineState {
    let config = VppConfig::for_generation(generation);
    let kernels = KernelStore::synthetic(generation);
    EngineState::new(config, &kernels, &mut host.memory).unwrap()
}

#[test]
fn staged_conversion_clears_an_opaque_background() {
    for generation in [Generation::Gen75, Generation::Gen8] {
        let mut host = HostDriver::new();
        let mut state = state(&mut host, generation);
        let src = host
            .surfaces
            .add_allocated(Fourcc::NV12, 1920, 1080, true)
            .unwrap();
        let dst = host
            .surfaces
            .add_allocated(Fourcc::NV12, 1920, 1080, true)
            .unwrap();
        let params = PipelineParameters::new(src)
            .with_output_region(Rect::new(0, 0, 1280, 720))
            .with_background(0xff00_0000);

        let report = state.process(&mut host.context(), &params, dst).unwrap();
        assert_eq!(report.pp_modules, vec![PpIndex::Nv12Scaling], "{generation:?}");
        assert_eq!(report.clears, 1, "{generation:?}");
        assert_eq!(host.batch.command_names()[0], "XY_COLOR_BLT");
        assert!(host.batch.is_balanced());
    }
}

#[test]
fn transparent_background_skips_the_clear() {
    let mut host = HostDriver::new();
    let mut state = state(&mut host, Generation::Gen8);
    let src = host
        .surfaces
        .add_allocated(Fourcc::NV12, 1920, 1080, true)
        .unwrap();
    let dst = host
        .surfaces
        .add_allocated(Fourcc::NV12, 1920, 1080, true)
        .unwrap();
    let params = PipelineParameters::new(src)
        .with_output_region(Rect::new(0, 0, 1280, 720))
        .with_background(0x00ff_ffff);

    let report = state.process(&mut host.context(), &params, dst).unwrap();
    assert_eq!(report.clears, 0);
    assert_eq!(
        host.batch
            .count(|c| matches!(c, GpuCommand::ColorBlt { .. })),
        0
    );
}
