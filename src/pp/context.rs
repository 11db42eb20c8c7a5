//! The post-processing context: kernel upload, per-call state setup and command emission.

use std::collections::HashMap;

use crate::avs::{AvsState, GEN6_AVS_CONFIG, GEN8_AVS_CONFIG};
use crate::color::{color_standard_to_coefs, filter_to_color_standard};
use crate::config::{KernelStore, VppConfig};
use crate::driver::DriverContext;
use crate::foundation::core::{FilterFlags, GenFamily, Generation, Rect};
use crate::foundation::error::{VppError, VppResult};
use crate::foundation::math::{DwordWriter, align_up_usize};
use crate::gpe::context::{GpeContext, GpeLayout, VfeParams};
use crate::gpe::scaling::{ScalingKernel, run_scaling};
use crate::gpu::arena::Region;
use crate::gpu::batch::{BatchEmitter, GpuCommand, PipelineKind, Reloc};
use crate::gpu::memory::{BufferHandle, GpuMemory, write_bytes};
use crate::gpu::state::STATE_ALIGNMENT;
use crate::pp::dndi::{DndiState, DnState};
use crate::pp::geometry::{InlineParameters, STATIC_PARAMETERS_SIZE};
use crate::pp::index::PpIndex;
use crate::pp::module::{ModuleCall, ModuleEnv, ModuleSetup, PostProcessingModule, SamplerSetup, modules_for};
use crate::surface::descriptor::SurfaceDescriptor;

/// Bytes of one bilinear sampler state.
const SAMPLER_STATE_SIZE: usize = 16;
/// URB rows the GEN5 VFE keeps before the constant URB entries.
const GEN5_URB_VFE_ENTRIES: u32 = 32;
const GEN5_URB_ENTRY_SIZE: u32 = 1;

fn vfe_params(generation: Generation) -> VfeParams {
    let max_threads = match generation {
        Generation::Gen5 => 40,
        Generation::Gen6 => 60,
        Generation::Gen7 | Generation::Gen75 => 70,
        Generation::Gen8 | Generation::Gen9 => 112,
    };
    VfeParams {
        max_threads,
        num_urb_entries: GEN5_URB_VFE_ENTRIES,
        urb_entry_size: GEN5_URB_ENTRY_SIZE,
        curbe_allocation_size: (STATIC_PARAMETERS_SIZE / 32) as u32,
    }
}

fn bilinear_sampler_state() -> Vec<u8> {
    // min/mag linear, clamp on all three axes
    let mut w = DwordWriter::with_capacity(SAMPLER_STATE_SIZE);
    w.u32(0x1 << 17 | 0x1 << 14).u32(0x2 << 6 | 0x2 << 3 | 0x2).pad_to(SAMPLER_STATE_SIZE);
    w.finish()
}

/// Owns everything one post-processing module dispatch needs and keeps it across calls.
#[derive(Debug)]
pub struct PostProcessingContext {
    generation: Generation,
    batch_size_hint: usize,
    gpe_scaling_enabled: bool,
    modules: &'static [PostProcessingModule; PpIndex::COUNT],
    /// Kernel offsets inside `instructions`, per table slot.
    kernel_offsets: [Option<u32>; PpIndex::COUNT],
    instructions: Option<BufferHandle>,
    state: GpeContext,
    scaling: [Option<GpeContext>; 2],
    scaling_blobs: [Option<Vec<u8>>; 2],
    sampler_size: usize,
    max_surfaces: usize,
    current: Option<PpIndex>,
    pub(crate) dndi: DndiState,
    pub(crate) dn: DnState,
    avs: AvsState,
}

impl PostProcessingContext {
    /// Pick the module table for the configured generation and upload every kernel blob once.
    pub fn new(
        config: &VppConfig,
        kernels: &KernelStore,
        mem: &mut dyn GpuMemory,
    ) -> VppResult<Self> {
        let generation = config.generation;
        let modules = modules_for(generation);

        let mut kernel_offsets = [None; PpIndex::COUNT];
        let mut by_name: HashMap<&'static str, u32> = HashMap::new();
        let mut image: Vec<u8> = Vec::new();
        for m in modules.iter() {
            let Some(name) = m.kernel else { continue };
            let Some(blob) = kernels.get(name) else {
                tracing::debug!(module = m.name, kernel = name, "kernel binary missing");
                continue;
            };
            let offset = *by_name.entry(name).or_insert_with(|| {
                let at = image.len() as u32;
                image.extend_from_slice(blob);
                image.resize(align_up_usize(image.len(), STATE_ALIGNMENT), 0);
                at
            });
            kernel_offsets[m.index.slot()] = Some(offset);
        }

        let instructions = if image.is_empty() {
            None
        } else {
            let h = mem.alloc("kernel instructions", image.len(), 4096)?;
            if let Err(e) = write_bytes(mem, h, 0, &image) {
                mem.release(h);
                return Err(e);
            }
            Some(h)
        };

        let scaling_blobs = ScalingKernel::ALL.map(|k| {
            if generation >= Generation::Gen8 {
                kernels.get(k.name()).map(<[u8]>::to_vec)
            } else {
                None
            }
        });

        let state = GpeContext::new(
            "post processing",
            GpeLayout {
                curbe_size: STATIC_PARAMETERS_SIZE,
                idrt_entries: 1,
                sampler_size: config.sampler_size,
                max_surfaces: config.max_pp_surfaces,
                vfe_in_memory: generation == Generation::Gen5,
            },
            vfe_params(generation),
        );

        let avs_config = if generation >= Generation::Gen8 {
            GEN8_AVS_CONFIG
        } else {
            GEN6_AVS_CONFIG
        };

        tracing::debug!(
            ?generation,
            kernels = by_name.len(),
            bytes = image.len(),
            "post-processing context initialized"
        );

        Ok(Self {
            generation,
            batch_size_hint: config.batch_size_hint,
            gpe_scaling_enabled: config.gpe_scaling_enabled(),
            modules,
            kernel_offsets,
            instructions,
            state,
            scaling: [None, None],
            scaling_blobs,
            sampler_size: config.sampler_size,
            max_surfaces: config.max_pp_surfaces,
            current: None,
            dndi: DndiState::default(),
            dn: DnState::default(),
            avs: AvsState::new(avs_config),
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn module(&self, index: PpIndex) -> &'static PostProcessingModule {
        &self.modules[index.slot()]
    }

    /// `true` when `index` has both an initializer and an uploaded kernel.
    pub fn has_kernel(&self, index: PpIndex) -> bool {
        self.module(index).initializer.is_some() && self.kernel_offsets[index.slot()].is_some()
    }

    pub fn kernel_offset(&self, index: PpIndex) -> Option<u32> {
        self.kernel_offsets[index.slot()]
    }

    /// Module of the last dispatch.
    pub fn current(&self) -> Option<PpIndex> {
        self.current
    }

    pub fn dndi_state(&self) -> &DndiState {
        &self.dndi
    }

    /// `true` when `kernel` can be dispatched through its GPE context.
    pub fn has_scaling_kernel(&self, kernel: ScalingKernel) -> bool {
        self.gpe_scaling_enabled && self.scaling_blobs[kernel as usize].is_some()
    }

    /// Configure and dispatch module `index` for one source/destination pair.
    pub fn run(
        &mut self,
        drv: &mut DriverContext<'_>,
        index: PpIndex,
        call: &ModuleCall<'_>,
    ) -> VppResult<()> {
        let module = self.module(index);
        let (Some(initializer), Some(offset), Some(instructions)) =
            (module.initializer, self.kernel_offset(index), self.instructions)
        else {
            return Err(VppError::unimplemented(format!(
                "{} has no kernel on {:?}",
                index, self.generation
            )));
        };
        self.current = Some(index);
        tracing::debug!(module = module.name, %index, src = ?call.src_rect, dst = ?call.dst_rect, "running post-processing module");

        self.state.bind_kernel(drv.memory, instructions, offset);
        self.state.init(drv.memory)?;

        let setup = {
            let mut env = ModuleEnv {
                surfaces: &mut *drv.surfaces,
                memory: &mut *drv.memory,
                dndi: &mut self.dndi,
                dn: &mut self.dn,
                avs: &mut self.avs,
            };
            initializer.initialize(&mut env, call)?
        };

        self.states_setup(drv.memory, &setup)?;
        self.pipeline_setup(drv.memory, drv.batch, &setup)
    }

    fn states_setup(&mut self, mem: &mut dyn GpuMemory, setup: &ModuleSetup) -> VppResult<()> {
        for (index, state) in &setup.bindings {
            self.state.add_surface(mem, *index, state)?;
        }

        let sampler_count = match &setup.sampler {
            SamplerSetup::None => 0,
            SamplerSetup::Bilinear => {
                self.state
                    .write_region(mem, Region::Sampler, &bilinear_sampler_state())?;
                1
            }
            SamplerSetup::Avs(table) => {
                self.state.write_region(mem, Region::Sampler, table)?;
                1
            }
        };
        self.state.setup_interface_descriptor(mem, sampler_count)?;

        let statics = setup.statics.encode();
        self.state.with_curbe(mem, |region| {
            let n = statics.len().min(region.len());
            region[..n].copy_from_slice(&statics[..n]);
            Ok(())
        })?;

        if self.state.layout().vfe_in_memory {
            let vfe = self.state.vfe();
            let mut w = DwordWriter::with_capacity(32);
            w.u32(vfe.max_threads)
                .u32(vfe.num_urb_entries)
                .u32(vfe.urb_entry_size)
                .u32(vfe.curbe_allocation_size)
                .u32(self.state.region_reloc(Region::InterfaceDescriptors)?.offset)
                .pad_to(32);
            self.state
                .write_region(mem, Region::VfeState, &w.finish())?;
        }
        Ok(())
    }

    fn tiles(setup: &ModuleSetup) -> Vec<InlineParameters> {
        let walk = &setup.walk;
        let mut out = Vec::with_capacity(walk.tile_count() as usize);
        for y in 0..walk.y_steps {
            for x in 0..walk.x_steps {
                let mut inline = InlineParameters::default();
                if walk.update(x, y, &mut inline) {
                    out.push(inline);
                }
            }
        }
        out
    }

    fn pipeline_setup(
        &self,
        mem: &mut dyn GpuMemory,
        batch: &mut dyn BatchEmitter,
        setup: &ModuleSetup,
    ) -> VppResult<()> {
        let tiles = Self::tiles(setup);
        batch.begin_atomic(self.batch_size_hint);
        batch.emit(GpuCommand::MiFlush);
        let emitted = match self.generation.family() {
            GenFamily::Ironlake => self.emit_ironlake(batch, &tiles),
            GenFamily::Gen6 => self.state.emit_state_commands(batch).and_then(|()| {
                // gen6 through gen7.5 want the VFE state again after the IDT load
                batch.emit(self.state.vfe_command());
                self.object_walker(mem, batch, &tiles)
            }),
            GenFamily::Gen8 => self.state.emit_state_commands(batch).and_then(|()| {
                self.object_walker(mem, batch, &tiles)?;
                batch.emit(GpuCommand::PipelineEnd);
                Ok(())
            }),
        };
        batch.end_atomic();
        match emitted {
            Ok(()) => batch.flush(),
            Err(e) => {
                tracing::error!(error = %e, "post-processing pipeline emission failed");
                Err(e)
            }
        }
    }

    fn emit_ironlake(
        &self,
        batch: &mut dyn BatchEmitter,
        tiles: &[InlineParameters],
    ) -> VppResult<()> {
        let cs_entries = (STATIC_PARAMETERS_SIZE / 64) as u32;
        let instruction = self.state.kernel().map(|k| k.buffer);
        batch.emit(GpuCommand::PipelineSelect(PipelineKind::Media));
        batch.emit(GpuCommand::UrbFence {
            vfe_start: 0,
            cs_start: GEN5_URB_VFE_ENTRIES * GEN5_URB_ENTRY_SIZE,
        });
        batch.emit(GpuCommand::StateBaseAddress {
            surface_state: self.state.surface_state()?,
            dynamic_state: Some(self.state.dynamic_state()?),
            instruction,
        });
        batch.emit(GpuCommand::MediaStatePointers {
            vfe_state: self.state.region_reloc(Region::VfeState)?,
        });
        batch.emit(GpuCommand::CsUrbState {
            entry_size: cs_entries,
            num_entries: 1,
        });
        batch.emit(GpuCommand::ConstantBuffer {
            at: self.state.region_reloc(Region::Curbe)?,
            length: STATIC_PARAMETERS_SIZE as u32,
        });
        for inline in tiles {
            batch.emit(GpuCommand::MediaObject {
                interface_descriptor: 0,
                inline_data: inline.encode(),
            });
        }
        Ok(())
    }

    /// Emit the tiles into a second-level batch and execute it right away.
    ///
    /// The second-level batch ends with `BATCH_BUFFER_END`, which would also end the primary
    /// batch, so the primary is flushed here and a new atomic section opened.
    fn object_walker(
        &self,
        mem: &mut dyn GpuMemory,
        batch: &mut dyn BatchEmitter,
        tiles: &[InlineParameters],
    ) -> VppResult<()> {
        let mut commands = Vec::with_capacity(tiles.len() * 2 + 1);
        for inline in tiles {
            commands.push(GpuCommand::MediaObject {
                interface_descriptor: 0,
                inline_data: inline.encode(),
            });
            commands.push(GpuCommand::MediaStateFlush);
        }
        commands.push(GpuCommand::BatchBufferEnd);
        let bytes: usize = commands.iter().map(|c| c.dword_len() * 4).sum();
        let buffer = mem.alloc("command objects buffer", align_up_usize(bytes, 4096), 4096)?;

        batch.emit(GpuCommand::BatchBufferStart {
            at: Reloc::new(buffer, 0),
            second_level: true,
            commands,
        });
        batch.end_atomic();
        let flushed = batch.flush();
        batch.begin_atomic(self.batch_size_hint);
        mem.release(buffer);
        flushed
    }

    /// Dispatch one of the GPE scaling kernels, building its context on first use.
    #[allow(clippy::too_many_arguments)]
    pub fn run_gpe_scaling(
        &mut self,
        drv: &mut DriverContext<'_>,
        kernel: ScalingKernel,
        src: &SurfaceDescriptor,
        src_rect: Rect,
        dst: &SurfaceDescriptor,
        dst_rect: Rect,
        filter_flags: FilterFlags,
    ) -> VppResult<()> {
        if !self.gpe_scaling_enabled {
            return Err(VppError::unimplemented(format!(
                "GPE scaling disabled on {:?}",
                self.generation
            )));
        }
        let slot = kernel as usize;
        let Some(blob) = self.scaling_blobs[slot].as_deref() else {
            return Err(VppError::unimplemented(format!(
                "{} kernel not available",
                kernel.name()
            )));
        };
        if self.scaling[slot].is_none() {
            let mut ctx = kernel.new_context(self.sampler_size, self.max_surfaces);
            ctx.load_kernel(drv.memory, blob)?;
            self.scaling[slot] = Some(ctx);
        }
        let Some(ctx) = self.scaling[slot].as_mut() else {
            return Err(VppError::unimplemented(kernel.name()));
        };
        let coefs = color_standard_to_coefs(filter_to_color_standard(filter_flags));
        run_scaling(
            ctx,
            drv.memory,
            drv.batch,
            src,
            src_rect,
            dst,
            dst_rect,
            coefs,
            self.batch_size_hint,
        )
    }

    /// Release every GPU buffer and scratch surface the context holds.
    pub fn finalize(&mut self, drv: &mut DriverContext<'_>) {
        self.state.destroy(drv.memory);
        for mut ctx in self.scaling.iter_mut().filter_map(Option::take) {
            ctx.destroy(drv.memory);
        }
        if let Some(h) = self.instructions.take() {
            drv.memory.release(h);
        }
        self.kernel_offsets = [None; PpIndex::COUNT];
        self.dn.release(drv.memory);
        self.dndi.reset(drv.surfaces);
        self.current = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pp/context.rs"]
mod tests;
