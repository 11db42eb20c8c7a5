//! Post-processing modules and the per-generation tables that hold them.
//!
//! Each table maps every [`PpIndex`] to a kernel name and an initializer. An initializer binds
//! the source and destination planes, fills the static parameters its kernel reads and
//! describes the tile sweep; the context turns that into GPU state and commands.

use std::fmt;

use smallvec::SmallVec;

use crate::avs::{AvsConfig, AvsState, GEN6_AVS_CONFIG, GEN8_AVS_CONFIG};
use crate::color::{color_standard_to_coefs, filter_to_color_standard};
use crate::filter::FilterParameter;
use crate::foundation::core::{FilterFlags, Fourcc, Generation, Rect, SurfaceId};
use crate::foundation::error::{VppError, VppResult};
use crate::gpe::scaling::ScalingKernel;
use crate::gpu::memory::GpuMemory;
use crate::gpu::state::{SurfaceFormat, SurfaceState, plane_states};
use crate::pp::dndi::{DndiState, DnState, FrameSlot};
use crate::pp::geometry::{
    BLOCK_HEIGHT, BlockUpdater, BlockWalk, DNDI_BLOCK_HEIGHT, DiStatic, StaticParameters,
};
use crate::pp::index::PpIndex;
use crate::surface::descriptor::SurfaceDescriptor;
use crate::surface::registry::SurfaceRegistry;

/// Binding-table slot of the first source plane.
pub const BT_SRC: u32 = 1;
/// Binding-table slot of the previous input frame (DNDI).
pub const BT_PREVIOUS: u32 = 4;
/// Binding-table slot of the first destination plane.
pub const BT_DST: u32 = 7;
/// Binding-table slot of the previous output frame (DNDI).
pub const BT_OUT_PREVIOUS: u32 = 10;
pub const BT_STMM_IN: u32 = 20;
pub const BT_STMM_OUT: u32 = 21;

/// One module invocation as seen by an initializer.
#[derive(Clone, Copy, Debug)]
pub struct ModuleCall<'c> {
    pub src: &'c SurfaceDescriptor,
    pub src_rect: Rect,
    pub dst: &'c SurfaceDescriptor,
    pub dst_rect: Rect,
    pub filter: Option<&'c FilterParameter>,
    pub filter_flags: FilterFlags,
    pub forward_references: &'c [SurfaceId],
}

/// Mutable state an initializer may touch.
pub struct ModuleEnv<'e> {
    pub surfaces: &'e mut dyn SurfaceRegistry,
    pub memory: &'e mut dyn GpuMemory,
    pub dndi: &'e mut DndiState,
    pub dn: &'e mut DnState,
    pub avs: &'e mut AvsState,
}

/// Sampler programming requested by a module.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SamplerSetup {
    #[default]
    None,
    Bilinear,
    /// Fixed-point AVS coefficient table.
    Avs(Vec<u8>),
}

/// Everything an initializer produces for one invocation.
#[derive(Clone, Debug, Default)]
pub struct ModuleSetup {
    pub bindings: SmallVec<[(u32, SurfaceState); 8]>,
    pub statics: StaticParameters,
    pub walk: BlockWalk,
    pub sampler: SamplerSetup,
}

/// Generation-specific setup of one post-processing module.
pub trait ModuleInitializer: Sync + fmt::Debug {
    fn initialize(
        &self,
        env: &mut ModuleEnv<'_>,
        call: &ModuleCall<'_>,
    ) -> VppResult<ModuleSetup>;

    /// Whether the module may be asked to resize.
    fn can_scale(&self) -> bool {
        false
    }
}

/// Table entry.
#[derive(Debug)]
pub struct PostProcessingModule {
    pub name: &'static str,
    pub index: PpIndex,
    /// Kernel binary name, without the generation extension.
    pub kernel: Option<&'static str>,
    pub initializer: Option<&'static dyn ModuleInitializer>,
}

impl PostProcessingModule {
    pub fn can_scale(&self) -> bool {
        self.initializer.is_some_and(|i| i.can_scale())
    }
}

fn bind_src_dst(call: &ModuleCall<'_>, setup: &mut ModuleSetup) -> VppResult<()> {
    setup
        .bindings
        .extend(plane_states(call.src, BT_SRC, false)?);
    setup
        .bindings
        .extend(plane_states(call.dst, BT_DST, true)?);
    Ok(())
}

fn require_nv12(desc: &SurfaceDescriptor, what: &str) -> VppResult<()> {
    match desc.format()? {
        Fourcc::NV12 => Ok(()),
        other => Err(VppError::unimplemented(format!(
            "{what} surface is {other}, module handles NV12 only"
        ))),
    }
}

/// Static parameters and walk shared by the copy and resample modules.
fn base_setup(call: &ModuleCall<'_>, block_height: u32, updater: BlockUpdater) -> ModuleSetup {
    let src_w = call.src.orig_width.max(1) as f32;
    let src_h = call.src.orig_height.max(1) as f32;
    let step_x = call.src_rect.width as f32 / call.dst_rect.width.max(1) as f32 / src_w;
    let step_y = call.src_rect.height as f32 / call.dst_rect.height.max(1) as f32 / src_h;
    let origin_x = call.src_rect.x as f32 / src_w;
    let origin_y = call.src_rect.y as f32 / src_h;

    let walk = BlockWalk::new(
        call.dst_rect,
        block_height,
        (call.dst.width, call.dst.height),
        updater,
    );
    // The walk starts left of dst_rect.x when that is not dword aligned.
    let shift = (call.dst_rect.x - walk.origin_x) as f32;
    let walk = walk.with_source(origin_x - shift * step_x, origin_y, step_x, step_y);

    let fourccs = (call.src.fourcc, call.dst.fourcc);
    let statics = StaticParameters {
        src_width: call.src.orig_width,
        src_height: call.src.orig_height,
        dst_x: call.dst_rect.x,
        dst_y: call.dst_rect.y,
        dst_width: call.dst_rect.width,
        dst_height: call.dst_rect.height,
        origin_x,
        origin_y,
        step_x,
        step_y,
        uv_swap: matches!(fourccs.0, Some(Fourcc::YV12) | Some(Fourcc::IMC1))
            || matches!(fourccs.1, Some(Fourcc::YV12) | Some(Fourcc::IMC1)),
        packed_swap_y: fourccs.0 == Some(Fourcc::UYVY) || fourccs.1 == Some(Fourcc::UYVY),
        ..StaticParameters::default()
    };

    ModuleSetup {
        statics,
        walk,
        ..ModuleSetup::default()
    }
}

fn csc_for(call: &ModuleCall<'_>) -> Option<crate::color::ColorMatrix> {
    let rgb = call.src.fourcc.is_some_and(Fourcc::is_rgb) || call.dst.fourcc.is_some_and(Fourcc::is_rgb);
    rgb.then(|| *color_standard_to_coefs(filter_to_color_standard(call.filter_flags)))
}

fn avs_table(avs: &mut AvsState, config: AvsConfig, call: &ModuleCall<'_>) -> VppResult<Vec<u8>> {
    if *avs.config() != config {
        *avs = AvsState::new(config);
    }
    let sx = call.dst_rect.width as f32 / call.src_rect.width.max(1) as f32;
    let sy = call.dst_rect.height as f32 / call.src_rect.height.max(1) as f32;
    avs.update_coefficients(sx, sy, call.filter_flags.0);
    if !avs.check_coefficients() {
        return Err(VppError::invalid_value(format!(
            "AVS coefficients out of range for scale {sx}x{sy}"
        )));
    }
    Ok(avs.encode_table())
}

/// Test module with no surfaces and a single empty tile.
#[derive(Debug)]
pub struct NullInit;

impl ModuleInitializer for NullInit {
    fn initialize(&self, _env: &mut ModuleEnv<'_>, _call: &ModuleCall<'_>) -> VppResult<ModuleSetup> {
        Ok(ModuleSetup {
            walk: BlockWalk::null(),
            ..ModuleSetup::default()
        })
    }
}

/// GEN5/GEN6 same-size copy between layouts.
#[derive(Debug)]
pub struct LoadSaveInit;

impl ModuleInitializer for LoadSaveInit {
    fn initialize(&self, _env: &mut ModuleEnv<'_>, call: &ModuleCall<'_>) -> VppResult<ModuleSetup> {
        let mut setup = base_setup(call, BLOCK_HEIGHT, BlockUpdater::LoadSave);
        setup.statics.csc = csc_for(call);
        bind_src_dst(call, &mut setup)?;
        Ok(setup)
    }
}

/// GEN5/GEN6 bilinear NV12 scaling.
#[derive(Debug)]
pub struct ScalingInit;

impl ModuleInitializer for ScalingInit {
    fn initialize(&self, _env: &mut ModuleEnv<'_>, call: &ModuleCall<'_>) -> VppResult<ModuleSetup> {
        require_nv12(call.src, "source")?;
        require_nv12(call.dst, "destination")?;
        let mut setup = base_setup(call, BLOCK_HEIGHT, BlockUpdater::Scaling);
        setup.sampler = SamplerSetup::Bilinear;
        bind_src_dst(call, &mut setup)?;
        Ok(setup)
    }

    fn can_scale(&self) -> bool {
        true
    }
}

/// GEN5/GEN6 NV12 scaling through the adaptive scaler.
#[derive(Debug)]
pub struct AvsInit {
    pub config: AvsConfig,
}

impl ModuleInitializer for AvsInit {
    fn initialize(&self, env: &mut ModuleEnv<'_>, call: &ModuleCall<'_>) -> VppResult<ModuleSetup> {
        require_nv12(call.src, "source")?;
        require_nv12(call.dst, "destination")?;
        let mut setup = base_setup(call, BLOCK_HEIGHT, BlockUpdater::Avs);
        setup.statics.avs = true;
        setup.statics.nonlinear = call.filter_flags.scaling() == FilterFlags::SCALING_NL_ANAMORPHIC;
        setup.sampler = SamplerSetup::Avs(avs_table(env.avs, self.config, call)?);
        bind_src_dst(call, &mut setup)?;
        Ok(setup)
    }

    fn can_scale(&self) -> bool {
        true
    }
}

/// GEN7+ combined module: any supported layout pair, scaled through the AVS sampler.
#[derive(Debug)]
pub struct PlxAvsInit {
    pub config: AvsConfig,
}

impl ModuleInitializer for PlxAvsInit {
    fn initialize(&self, env: &mut ModuleEnv<'_>, call: &ModuleCall<'_>) -> VppResult<ModuleSetup> {
        let mut setup = base_setup(call, BLOCK_HEIGHT, BlockUpdater::Avs);
        setup.statics.avs = true;
        setup.statics.nonlinear = call.filter_flags.scaling() == FilterFlags::SCALING_NL_ANAMORPHIC;
        setup.statics.csc = csc_for(call);
        setup.sampler = SamplerSetup::Avs(avs_table(env.avs, self.config, call)?);
        bind_src_dst(call, &mut setup)?;
        Ok(setup)
    }

    fn can_scale(&self) -> bool {
        true
    }
}

/// NV12 deinterlace with the temporal frame store.
#[derive(Debug)]
pub struct DndiInit;

impl ModuleInitializer for DndiInit {
    fn initialize(&self, env: &mut ModuleEnv<'_>, call: &ModuleCall<'_>) -> VppResult<ModuleSetup> {
        require_nv12(call.src, "source")?;
        require_nv12(call.dst, "destination")?;
        let Some(FilterParameter::Deinterlacing { algorithm, flags }) = call.filter else {
            return Err(VppError::invalid_parameter(
                "DNDI module needs a deinterlacing filter parameter",
            ));
        };

        let dndi = &mut *env.dndi;
        dndi.init_surface_params(call.src.id, *algorithm, *flags, call.forward_references)?;
        dndi.ensure_surfaces_storage(env.surfaces, call.src.orig_width, call.src.orig_height)?;
        let target =
            dndi.ensure_surfaces(env.surfaces, call.src.id, call.dst.id, call.forward_references);

        let mut setup = base_setup(call, DNDI_BLOCK_HEIGHT, BlockUpdater::Dndi);
        setup.statics.di = DiStatic {
            enabled: dndi.is_di_enabled,
            motion_adaptive: dndi.is_di_adv_enabled,
            first_frame: dndi.is_first_frame,
            second_field: dndi.is_second_field,
            top_field_first: dndi.top_field_first,
        };

        setup
            .bindings
            .extend(plane_states(call.src, BT_SRC, false)?);
        setup
            .bindings
            .extend(plane_states(call.dst, BT_DST, true)?);

        let slot_desc = |surfaces: &dyn SurfaceRegistry, slot: FrameSlot| {
            dndi.frame_store
                .get(slot)
                .id()
                .and_then(|id| surfaces.resolve(id))
        };
        let previous = slot_desc(&*env.surfaces, FrameSlot::InPrevious);
        setup.bindings.extend(plane_states(
            previous.as_ref().unwrap_or(call.src),
            BT_PREVIOUS,
            false,
        )?);
        for (slot, bt, out) in [
            (FrameSlot::InStmm, BT_STMM_IN, false),
            (FrameSlot::OutStmm, BT_STMM_OUT, true),
        ] {
            let desc = slot_desc(&*env.surfaces, slot).ok_or_else(|| {
                VppError::allocation_failed(format!("frame-store slot {slot:?} has no surface"))
            })?;
            // Motion measure is a single luma-sized plane.
            let mut planes = plane_states(&desc, bt, out)?;
            planes.truncate(1);
            setup.bindings.extend(planes);
        }
        if dndi.is_di_adv_enabled && !dndi.is_first_frame {
            let other = if target == FrameSlot::OutPrevious {
                FrameSlot::OutCurrent
            } else {
                FrameSlot::OutPrevious
            };
            if let Some(desc) = slot_desc(&*env.surfaces, other) {
                setup
                    .bindings
                    .extend(plane_states(&desc, BT_OUT_PREVIOUS, true)?);
            }
        }
        Ok(setup)
    }
}

/// NV12 temporal denoise.
#[derive(Debug)]
pub struct DnInit;

impl ModuleInitializer for DnInit {
    fn initialize(&self, env: &mut ModuleEnv<'_>, call: &ModuleCall<'_>) -> VppResult<ModuleSetup> {
        require_nv12(call.src, "source")?;
        require_nv12(call.dst, "destination")?;
        let value = match call.filter {
            Some(FilterParameter::NoiseReduction { value }) => *value,
            _ => 0.0,
        };
        env.dn.strength = DnState::strength_from_value(value);
        let stmm = env
            .dn
            .ensure_stmm(env.memory, call.src.orig_width, call.src.orig_height)?;

        let mut setup = base_setup(call, DNDI_BLOCK_HEIGHT, BlockUpdater::Dn);
        setup.statics.dn_strength = env.dn.strength;
        bind_src_dst(call, &mut setup)?;
        setup.bindings.push((
            BT_STMM_IN,
            SurfaceState {
                buffer: stmm,
                offset: 0,
                width: call.src.orig_width,
                height: call.src.orig_height,
                pitch: call.src.orig_width,
                format: SurfaceFormat::R8Unorm,
                tiling: Default::default(),
                is_output: true,
            },
        ));
        Ok(setup)
    }
}

static NULL_INIT: NullInit = NullInit;
static LOAD_SAVE_INIT: LoadSaveInit = LoadSaveInit;
static SCALING_INIT: ScalingInit = ScalingInit;
static GEN5_AVS_INIT: AvsInit = AvsInit {
    config: GEN6_AVS_CONFIG,
};
static GEN7_PLX_INIT: PlxAvsInit = PlxAvsInit {
    config: GEN6_AVS_CONFIG,
};
static GEN8_PLX_INIT: PlxAvsInit = PlxAvsInit {
    config: GEN8_AVS_CONFIG,
};
static DNDI_INIT: DndiInit = DndiInit;
static DN_INIT: DnInit = DnInit;

const fn module(
    index: PpIndex,
    name: &'static str,
    kernel: Option<&'static str>,
    initializer: &'static dyn ModuleInitializer,
) -> PostProcessingModule {
    PostProcessingModule {
        name,
        index,
        kernel,
        initializer: Some(initializer),
    }
}

static GEN5_MODULES: [PostProcessingModule; PpIndex::COUNT] = [
    module(PpIndex::Null, "NULL module (for testing)", Some("null"), &NULL_INIT),
    module(PpIndex::Nv12LoadSaveN12, "NV12_NV12", Some("nv12_load_save_nv12"), &LOAD_SAVE_INIT),
    module(PpIndex::Nv12LoadSavePl3, "NV12_PL3", Some("nv12_load_save_pl3"), &LOAD_SAVE_INIT),
    module(PpIndex::Pl3LoadSaveN12, "PL3_NV12", Some("pl3_load_save_nv12"), &LOAD_SAVE_INIT),
    module(PpIndex::Pl3LoadSavePl3, "PL3_PL3", Some("pl3_load_save_pl3"), &LOAD_SAVE_INIT),
    module(PpIndex::Nv12Scaling, "NV12 Scaling module", Some("nv12_scaling"), &SCALING_INIT),
    module(PpIndex::Nv12Avs, "NV12 AVS module", Some("nv12_avs"), &GEN5_AVS_INIT),
    module(PpIndex::Nv12Dndi, "NV12 DNDI module", Some("nv12_dndi"), &DNDI_INIT),
    module(PpIndex::Nv12Dn, "NV12 DN module", Some("nv12_dn"), &DN_INIT),
    module(PpIndex::Nv12LoadSavePa, "NV12_PA module", Some("nv12_load_save_pa"), &LOAD_SAVE_INIT),
    module(PpIndex::Pl3LoadSavePa, "PL3_PA module", Some("pl3_load_save_pa"), &LOAD_SAVE_INIT),
    module(PpIndex::PaLoadSaveNv12, "PA_NV12 module", Some("pa_load_save_nv12"), &LOAD_SAVE_INIT),
    module(PpIndex::PaLoadSavePl3, "PA_PL3 module", Some("pa_load_save_pl3"), &LOAD_SAVE_INIT),
    module(PpIndex::PaLoadSavePa, "PA_PA module", None, &LOAD_SAVE_INIT),
    module(PpIndex::RgbxLoadSaveNv12, "RGBX_NV12 module", None, &LOAD_SAVE_INIT),
    module(PpIndex::Nv12LoadSaveRgbx, "NV12_RGBX module", None, &LOAD_SAVE_INIT),
];

static GEN6_MODULES: [PostProcessingModule; PpIndex::COUNT] = [
    module(PpIndex::Null, "NULL module (for testing)", Some("null"), &NULL_INIT),
    module(PpIndex::Nv12LoadSaveN12, "NV12_NV12", Some("nv12_load_save_nv12"), &LOAD_SAVE_INIT),
    module(PpIndex::Nv12LoadSavePl3, "NV12_PL3", Some("nv12_load_save_pl3"), &LOAD_SAVE_INIT),
    module(PpIndex::Pl3LoadSaveN12, "PL3_NV12", Some("pl3_load_save_nv12"), &LOAD_SAVE_INIT),
    module(PpIndex::Pl3LoadSavePl3, "PL3_PL3", Some("pl3_load_save_pl3"), &LOAD_SAVE_INIT),
    module(PpIndex::Nv12Scaling, "NV12 Scaling module", Some("nv12_scaling"), &SCALING_INIT),
    module(PpIndex::Nv12Avs, "NV12 AVS module", Some("nv12_avs"), &GEN5_AVS_INIT),
    module(PpIndex::Nv12Dndi, "NV12 DNDI module", Some("nv12_dndi"), &DNDI_INIT),
    module(PpIndex::Nv12Dn, "NV12 DN module", Some("nv12_dn"), &DN_INIT),
    module(PpIndex::Nv12LoadSavePa, "NV12_PA module", Some("nv12_load_save_pa"), &LOAD_SAVE_INIT),
    module(PpIndex::Pl3LoadSavePa, "PL3_PA module", Some("pl3_load_save_pa"), &LOAD_SAVE_INIT),
    module(PpIndex::PaLoadSaveNv12, "PA_NV12 module", Some("pa_load_save_nv12"), &LOAD_SAVE_INIT),
    module(PpIndex::PaLoadSavePl3, "PA_PL3 module", Some("pa_load_save_pl3"), &LOAD_SAVE_INIT),
    module(PpIndex::PaLoadSavePa, "PA_PA module", Some("pa_load_save_pa"), &LOAD_SAVE_INIT),
    module(PpIndex::RgbxLoadSaveNv12, "RGBX_NV12 module", Some("rgbx_load_save_nv12"), &LOAD_SAVE_INIT),
    module(PpIndex::Nv12LoadSaveRgbx, "NV12_RGBX module", Some("nv12_load_save_rgbx"), &LOAD_SAVE_INIT),
];

/// GEN7 and GEN7.5 share names; the binaries differ by extension.
static GEN7_MODULES: [PostProcessingModule; PpIndex::COUNT] = [
    module(PpIndex::Null, "NULL module (for testing)", None, &NULL_INIT),
    module(PpIndex::Nv12LoadSaveN12, "NV12_NV12", Some("pl2_to_pl2"), &GEN7_PLX_INIT),
    module(PpIndex::Nv12LoadSavePl3, "NV12_PL3", Some("pl2_to_pl3"), &GEN7_PLX_INIT),
    module(PpIndex::Pl3LoadSaveN12, "PL3_NV12", Some("pl3_to_pl2"), &GEN7_PLX_INIT),
    module(PpIndex::Pl3LoadSavePl3, "PL3_PL3", Some("pl3_to_pl3"), &GEN7_PLX_INIT),
    module(PpIndex::Nv12Scaling, "NV12 Scaling module", Some("avs"), &GEN7_PLX_INIT),
    module(PpIndex::Nv12Avs, "NV12 AVS module", Some("avs"), &GEN7_PLX_INIT),
    module(PpIndex::Nv12Dndi, "NV12 DNDI module", Some("dndi"), &DNDI_INIT),
    module(PpIndex::Nv12Dn, "NV12 DN module", Some("nv12_dn_nv12"), &DN_INIT),
    module(PpIndex::Nv12LoadSavePa, "NV12_PA module", Some("pl2_to_pa"), &GEN7_PLX_INIT),
    module(PpIndex::Pl3LoadSavePa, "PL3_PA module", Some("pl3_to_pa"), &GEN7_PLX_INIT),
    module(PpIndex::PaLoadSaveNv12, "PA_NV12 module", Some("pa_to_pl2"), &GEN7_PLX_INIT),
    module(PpIndex::PaLoadSavePl3, "PA_PL3 module", Some("pa_to_pl3"), &GEN7_PLX_INIT),
    module(PpIndex::PaLoadSavePa, "PA_PA module", Some("pa_to_pa"), &GEN7_PLX_INIT),
    module(PpIndex::RgbxLoadSaveNv12, "RGBX_NV12 module", Some("rgbx_to_nv12"), &GEN7_PLX_INIT),
    module(PpIndex::Nv12LoadSaveRgbx, "NV12_RGBX module", Some("pl2_to_rgbx"), &GEN7_PLX_INIT),
];

/// GEN8 and GEN9: deinterlace and denoise moved to VEBOX.
static GEN8_MODULES: [PostProcessingModule; PpIndex::COUNT] = [
    module(PpIndex::Null, "NULL module (for testing)", None, &NULL_INIT),
    module(PpIndex::Nv12LoadSaveN12, "NV12_NV12", Some("pl2_to_pl2"), &GEN8_PLX_INIT),
    module(PpIndex::Nv12LoadSavePl3, "NV12_PL3", Some("pl2_to_pl3"), &GEN8_PLX_INIT),
    module(PpIndex::Pl3LoadSaveN12, "PL3_NV12", Some("pl3_to_pl2"), &GEN8_PLX_INIT),
    module(PpIndex::Pl3LoadSavePl3, "PL3_PL3", Some("pl3_to_pl3"), &GEN8_PLX_INIT),
    module(PpIndex::Nv12Scaling, "NV12 Scaling module", Some("avs"), &GEN8_PLX_INIT),
    module(PpIndex::Nv12Avs, "NV12 AVS module", Some("avs"), &GEN8_PLX_INIT),
    PostProcessingModule {
        name: "NV12 DNDI module",
        index: PpIndex::Nv12Dndi,
        kernel: None,
        initializer: None,
    },
    PostProcessingModule {
        name: "NV12 DN module",
        index: PpIndex::Nv12Dn,
        kernel: None,
        initializer: None,
    },
    module(PpIndex::Nv12LoadSavePa, "NV12_PA module", Some("pl2_to_pa"), &GEN8_PLX_INIT),
    module(PpIndex::Pl3LoadSavePa, "PL3_PA module", Some("pl3_to_pa"), &GEN8_PLX_INIT),
    module(PpIndex::PaLoadSaveNv12, "PA_NV12 module", Some("pa_to_pl2"), &GEN8_PLX_INIT),
    module(PpIndex::PaLoadSavePl3, "PA_PL3 module", Some("pa_to_pl3"), &GEN8_PLX_INIT),
    module(PpIndex::PaLoadSavePa, "PA_PA module", Some("pa_to_pa"), &GEN8_PLX_INIT),
    module(PpIndex::RgbxLoadSaveNv12, "RGBX_NV12 module", Some("rgbx_to_nv12"), &GEN8_PLX_INIT),
    module(PpIndex::Nv12LoadSaveRgbx, "NV12_RGBX module", Some("pl2_to_rgbx"), &GEN8_PLX_INIT),
];

/// Module table for `generation`.
pub fn modules_for(generation: Generation) -> &'static [PostProcessingModule; PpIndex::COUNT] {
    match generation {
        Generation::Gen5 => &GEN5_MODULES,
        Generation::Gen6 => &GEN6_MODULES,
        Generation::Gen7 | Generation::Gen75 => &GEN7_MODULES,
        Generation::Gen8 | Generation::Gen9 => &GEN8_MODULES,
    }
}

/// Every kernel binary name `generation` may load, deduplicated, PP modules first.
pub fn kernel_names(generation: Generation) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for m in modules_for(generation) {
        if let Some(k) = m.kernel
            && !names.contains(&k)
        {
            names.push(k);
        }
    }
    if generation >= Generation::Gen8 {
        names.extend(ScalingKernel::ALL.iter().map(|k| k.name()));
    }
    names
}

#[cfg(test)]
#[path = "../../tests/unit/pp/module.rs"]
mod tests;
