use crate::foundation::error::{VppError, VppResult};
use crate::foundation::math::align_up_usize;
use crate::gpu::arena::{Region, RegionSpan, StateArena};
use crate::gpu::batch::{BatchEmitter, GpuCommand, PipelineKind, Reloc};
use crate::gpu::memory::{BufferHandle, GpuMemory, with_mapped, write_bytes, zero_bytes};
use crate::gpu::state::{
    INTERFACE_DESCRIPTOR_SIZE, InterfaceDescriptor, STATE_ALIGNMENT, SurfaceState,
    binding_table_entry_offset, surface_state_buffer_size, surface_state_offset,
};

/// VFE dispatch parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct VfeParams {
    pub max_threads: u32,
    pub num_urb_entries: u32,
    pub urb_entry_size: u32,
    pub curbe_allocation_size: u32,
}

/// Sizes of the state a context lays out on every [`GpeContext::init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpeLayout {
    pub curbe_size: usize,
    pub idrt_entries: usize,
    pub sampler_size: usize,
    pub max_surfaces: usize,
    /// GEN5 keeps VFE state in memory rather than in the command.
    pub vfe_in_memory: bool,
}

/// Kernel code the interface descriptor points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelBinding {
    pub buffer: BufferHandle,
    pub offset: u32,
    owned: bool,
}

/// Media walker dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkerParams {
    pub resolution_x: u32,
    pub resolution_y: u32,
}

/// Reusable binding for one compute-style kernel dispatch.
///
/// Offsets are re-derived on every [`GpeContext::init`]; callers must not cache them across
/// calls.
#[derive(Debug)]
pub struct GpeContext {
    name: &'static str,
    layout: GpeLayout,
    vfe: VfeParams,
    arena: StateArena,
    dynamic_state: Option<(BufferHandle, usize)>,
    surface_state: Option<BufferHandle>,
    kernel: Option<KernelBinding>,
    bound_surfaces: u32,
    initialized: bool,
}

impl GpeContext {
    pub fn new(name: &'static str, layout: GpeLayout, vfe: VfeParams) -> Self {
        Self {
            name,
            layout,
            vfe,
            arena: StateArena::new(),
            dynamic_state: None,
            surface_state: None,
            kernel: None,
            bound_surfaces: 0,
            initialized: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn layout(&self) -> &GpeLayout {
        &self.layout
    }

    pub fn vfe(&self) -> VfeParams {
        self.vfe
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn kernel(&self) -> Option<KernelBinding> {
        self.kernel
    }

    /// Upload `blob` into a buffer owned by this context.
    pub fn load_kernel(&mut self, mem: &mut dyn GpuMemory, blob: &[u8]) -> VppResult<()> {
        if blob.is_empty() {
            return Err(VppError::unimplemented(format!("{}: empty kernel", self.name)));
        }
        self.release_kernel(mem);
        let size = align_up_usize(blob.len(), STATE_ALIGNMENT);
        let buffer = mem.alloc(self.name, size, 4096)?;
        if let Err(e) = write_bytes(mem, buffer, 0, blob) {
            mem.release(buffer);
            return Err(e);
        }
        self.kernel = Some(KernelBinding {
            buffer,
            offset: 0,
            owned: true,
        });
        Ok(())
    }

    /// Point at kernel code living in a shared instruction buffer.
    pub fn bind_kernel(&mut self, mem: &mut dyn GpuMemory, buffer: BufferHandle, offset: u32) {
        self.release_kernel(mem);
        self.kernel = Some(KernelBinding {
            buffer,
            offset,
            owned: false,
        });
    }

    fn release_kernel(&mut self, mem: &mut dyn GpuMemory) {
        if let Some(KernelBinding {
            buffer,
            owned: true,
            ..
        }) = self.kernel.take()
        {
            mem.release(buffer);
        }
    }

    /// Lay out CURBE, interface descriptors and sampler state, then (re)allocate and zero the
    /// backing buffers.
    pub fn init(&mut self, mem: &mut dyn GpuMemory) -> VppResult<()> {
        self.initialized = false;
        self.arena.reset();
        self.arena
            .reserve(Region::Curbe, self.layout.curbe_size, STATE_ALIGNMENT)?;
        self.arena.reserve(
            Region::InterfaceDescriptors,
            self.layout.idrt_entries * INTERFACE_DESCRIPTOR_SIZE,
            STATE_ALIGNMENT,
        )?;
        self.arena
            .reserve(Region::Sampler, self.layout.sampler_size, STATE_ALIGNMENT)?;
        if self.layout.vfe_in_memory {
            self.arena.reserve(Region::VfeState, 32, STATE_ALIGNMENT)?;
        }

        let size = self.arena.total_size();
        match self.dynamic_state {
            Some((_, existing)) if existing == size => {}
            Some((handle, _)) => {
                mem.release(handle);
                self.dynamic_state = None;
            }
            None => {}
        }
        let dynamic = match self.dynamic_state {
            Some((h, _)) => h,
            None => {
                let h = mem.alloc("dynamic state", size, 4096)?;
                self.dynamic_state = Some((h, size));
                h
            }
        };
        zero_bytes(mem, dynamic, 0, size)?;

        let ss_size = surface_state_buffer_size(self.layout.max_surfaces);
        let surface_state = match self.surface_state {
            Some(h) => h,
            None => {
                let h = mem.alloc("surface state & binding table", ss_size, 4096)?;
                self.surface_state = Some(h);
                h
            }
        };
        zero_bytes(mem, surface_state, 0, ss_size)?;

        self.bound_surfaces = 0;
        self.initialized = true;
        Ok(())
    }

    fn require_initialized(&self) -> VppResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(VppError::invalid_value(format!(
                "{}: GPE context used before init",
                self.name
            )))
        }
    }

    pub fn span(&self, region: Region) -> VppResult<RegionSpan> {
        self.arena
            .span(region)
            .ok_or_else(|| VppError::invalid_value(format!("{}: no {region:?} region", self.name)))
    }

    pub fn dynamic_state(&self) -> VppResult<BufferHandle> {
        self.dynamic_state
            .map(|(h, _)| h)
            .ok_or_else(|| VppError::invalid_value(format!("{}: no dynamic state", self.name)))
    }

    pub fn surface_state(&self) -> VppResult<BufferHandle> {
        self.surface_state
            .ok_or_else(|| VppError::invalid_value(format!("{}: no surface state", self.name)))
    }

    pub fn region_reloc(&self, region: Region) -> VppResult<Reloc> {
        Ok(Reloc::new(
            self.dynamic_state()?,
            self.span(region)?.offset as u32,
        ))
    }

    /// Scoped write access to the CURBE region.
    pub fn with_curbe<T>(
        &mut self,
        mem: &mut dyn GpuMemory,
        f: impl FnOnce(&mut [u8]) -> VppResult<T>,
    ) -> VppResult<T> {
        self.require_initialized()?;
        let span = self.span(Region::Curbe)?;
        with_mapped(mem, self.dynamic_state()?, |buf| {
            let region = buf.get_mut(span.offset..span.end()).ok_or_else(|| {
                VppError::invalid_value("CURBE region outside dynamic state buffer")
            })?;
            f(region)
        })
    }

    /// Copy `bytes` to the start of `region`.
    pub fn write_region(
        &mut self,
        mem: &mut dyn GpuMemory,
        region: Region,
        bytes: &[u8],
    ) -> VppResult<()> {
        self.require_initialized()?;
        let span = self.span(region)?;
        if bytes.len() > span.size {
            return Err(VppError::invalid_value(format!(
                "{}: {} bytes do not fit {region:?} ({} bytes)",
                self.name,
                bytes.len(),
                span.size
            )));
        }
        write_bytes(mem, self.dynamic_state()?, span.offset, bytes)
    }

    /// Forget every surface bound by a previous dispatch.
    pub fn reset_binding_table(&mut self, mem: &mut dyn GpuMemory) -> VppResult<()> {
        self.require_initialized()?;
        let ss = self.surface_state()?;
        zero_bytes(mem, ss, 0, surface_state_buffer_size(self.layout.max_surfaces))?;
        self.bound_surfaces = 0;
        Ok(())
    }

    /// Write surface state `state` and point binding-table entry `index` at it.
    pub fn add_surface(
        &mut self,
        mem: &mut dyn GpuMemory,
        index: u32,
        state: &SurfaceState,
    ) -> VppResult<()> {
        self.require_initialized()?;
        let max = self.layout.max_surfaces;
        let idx = index as usize;
        if idx >= max {
            return Err(VppError::invalid_value(format!(
                "{}: binding index {index} exceeds {max} surfaces",
                self.name
            )));
        }
        let ss = self.surface_state()?;
        let state_offset = surface_state_offset(idx);
        write_bytes(mem, ss, state_offset, &state.encode())?;
        write_bytes(
            mem,
            ss,
            binding_table_entry_offset(max, idx),
            &(state_offset as u32).to_le_bytes(),
        )?;
        self.bound_surfaces = self.bound_surfaces.max(index + 1);
        Ok(())
    }

    pub fn bound_surfaces(&self) -> u32 {
        self.bound_surfaces
    }

    /// Write interface descriptor 0 for the bound kernel.
    pub fn setup_interface_descriptor(
        &mut self,
        mem: &mut dyn GpuMemory,
        sampler_count: u32,
    ) -> VppResult<()> {
        self.require_initialized()?;
        let kernel = self.kernel.ok_or_else(|| {
            VppError::unimplemented(format!("{}: no kernel bound", self.name))
        })?;
        let desc = InterfaceDescriptor {
            kernel_offset: kernel.offset,
            sampler_offset: self.span(Region::Sampler)?.offset as u32,
            sampler_count,
            binding_table_offset: binding_table_entry_offset(self.layout.max_surfaces, 0) as u32,
            binding_table_entries: self.bound_surfaces,
            curbe_read_length: (self.layout.curbe_size / 32) as u32,
        };
        self.write_region(mem, Region::InterfaceDescriptors, &desc.encode())
    }

    /// Commands shared by every media dispatch up to and including the IDT load.
    pub fn emit_state_commands(&self, batch: &mut dyn BatchEmitter) -> VppResult<()> {
        self.require_initialized()?;
        let instruction = self.kernel.map(|k| k.buffer);
        batch.emit(GpuCommand::PipelineSelect(PipelineKind::Media));
        batch.emit(GpuCommand::StateBaseAddress {
            surface_state: self.surface_state()?,
            dynamic_state: Some(self.dynamic_state()?),
            instruction,
        });
        batch.emit(self.vfe_command());
        batch.emit(GpuCommand::CurbeLoad {
            at: self.region_reloc(Region::Curbe)?,
            length: self.layout.curbe_size as u32,
        });
        batch.emit(GpuCommand::InterfaceDescriptorLoad {
            at: self.region_reloc(Region::InterfaceDescriptors)?,
            length: (self.layout.idrt_entries * INTERFACE_DESCRIPTOR_SIZE) as u32,
        });
        Ok(())
    }

    pub fn vfe_command(&self) -> GpuCommand {
        GpuCommand::VfeState {
            max_threads: self.vfe.max_threads,
            num_urb_entries: self.vfe.num_urb_entries,
            urb_entry_size: self.vfe.urb_entry_size,
            curbe_allocation_size: self.vfe.curbe_allocation_size,
        }
    }

    /// Full walker dispatch: state, one walker, media-state flush, pipeline end, then flush.
    pub fn run_walker(
        &self,
        batch: &mut dyn BatchEmitter,
        walker: WalkerParams,
        size_hint: usize,
    ) -> VppResult<()> {
        batch.begin_atomic(size_hint);
        batch.emit(GpuCommand::MiFlush);
        let emitted = self.emit_state_commands(batch);
        if emitted.is_ok() {
            batch.emit(GpuCommand::MediaObjectWalker {
                interface_descriptor: 0,
                resolution_x: walker.resolution_x,
                resolution_y: walker.resolution_y,
            });
            batch.emit(GpuCommand::MediaStateFlush);
            batch.emit(GpuCommand::PipelineEnd);
        }
        batch.end_atomic();
        emitted?;
        batch.flush()
    }

    /// Release every buffer this context owns.
    pub fn destroy(&mut self, mem: &mut dyn GpuMemory) {
        self.release_kernel(mem);
        if let Some((h, _)) = self.dynamic_state.take() {
            mem.release(h);
        }
        if let Some(h) = self.surface_state.take() {
            mem.release(h);
        }
        self.arena.reset();
        self.bound_surfaces = 0;
        self.initialized = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpe/context.rs"]
mod tests;
