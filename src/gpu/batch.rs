use crate::foundation::core::{Fourcc, Rect};
use crate::foundation::error::VppResult;
use crate::gpu::memory::BufferHandle;

/// Reference into a GPU buffer, resolved to an address by the batch emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Reloc {
    /// Target buffer.
    pub buffer: BufferHandle,
    /// Byte offset inside `buffer`.
    pub offset: u32,
}

impl Reloc {
    pub fn new(buffer: BufferHandle, offset: u32) -> Self {
        Self { buffer, offset }
    }
}

/// Pipeline selected by `PIPELINE_SELECT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum PipelineKind {
    ThreeD,
    Media,
    Gpgpu,
}

/// VEBOX feature set programmed for one call.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct VeboxFeatures {
    pub denoise: bool,
    pub deinterlace: bool,
    pub skin_tone: bool,
    pub proc_amp: bool,
    pub sharpen: bool,
    pub csc: bool,
}

/// Register layout used to encode VEBOX state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum VeboxLayout {
    Haswell,
    Gen8,
    Gen9,
}

/// One command in a GPU batch.
///
/// The pipeline speaks in these semantic commands; turning them into dwords for a given
/// generation is the batch emitter's job. Buffer references travel as [`Reloc`]s.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum GpuCommand {
    /// `MI_FLUSH` / pipe-control flush.
    MiFlush,
    PipelineSelect(PipelineKind),
    StateBaseAddress {
        surface_state: BufferHandle,
        dynamic_state: Option<BufferHandle>,
        instruction: Option<BufferHandle>,
    },
    VfeState {
        max_threads: u32,
        num_urb_entries: u32,
        urb_entry_size: u32,
        curbe_allocation_size: u32,
    },
    CurbeLoad {
        at: Reloc,
        length: u32,
    },
    InterfaceDescriptorLoad {
        at: Reloc,
        length: u32,
    },
    /// GEN5: VFE state pointer.
    MediaStatePointers {
        vfe_state: Reloc,
    },
    /// GEN5: URB partitioning between VFE and constant storage.
    UrbFence {
        vfe_start: u32,
        cs_start: u32,
    },
    /// GEN5: constant URB entry size/count.
    CsUrbState {
        entry_size: u32,
        num_entries: u32,
    },
    /// GEN5: constant buffer fetch.
    ConstantBuffer {
        at: Reloc,
        length: u32,
    },
    MediaObject {
        interface_descriptor: u32,
        inline_data: Vec<u8>,
    },
    MediaObjectWalker {
        interface_descriptor: u32,
        resolution_x: u32,
        resolution_y: u32,
    },
    MediaStateFlush,
    /// GEN8+: explicit end of the media pipeline work.
    PipelineEnd,
    BatchBufferStart {
        at: Reloc,
        second_level: bool,
        /// Commands the emitter writes into `at` before submission.
        commands: Vec<GpuCommand>,
    },
    BatchBufferEnd,
    /// Blitter solid fill of one plane.
    ColorBlt {
        at: Reloc,
        pitch: u32,
        width_bytes: u32,
        height: u32,
        bytes_per_pixel: u32,
        color: u32,
    },
    VeboxState {
        layout: VeboxLayout,
        features: VeboxFeatures,
        dn_strength: u32,
        first_frame: bool,
        second_field: bool,
        top_field_first: bool,
    },
    VeboxSurfaceState {
        is_output: bool,
        fourcc: Fourcc,
        at: Reloc,
        width: u32,
        height: u32,
        pitch: u32,
        uv_offset: u32,
    },
    VeboxDiIecp {
        rect: Rect,
        current_input: Reloc,
        previous_input: Option<Reloc>,
        stmm_input: Option<Reloc>,
        stmm_output: Option<Reloc>,
        denoised_output: Option<Reloc>,
        current_output: Reloc,
        previous_output: Option<Reloc>,
    },
}

impl GpuCommand {
    /// Encoded size in dwords, used to size second-level batch buffers.
    pub fn dword_len(&self) -> usize {
        match self {
            GpuCommand::MiFlush => 1,
            GpuCommand::PipelineSelect(_) => 1,
            GpuCommand::StateBaseAddress { .. } => 16,
            GpuCommand::VfeState { .. } => 9,
            GpuCommand::CurbeLoad { .. } | GpuCommand::InterfaceDescriptorLoad { .. } => 4,
            GpuCommand::MediaStatePointers { .. } => 3,
            GpuCommand::UrbFence { .. } => 3,
            GpuCommand::CsUrbState { .. } => 2,
            GpuCommand::ConstantBuffer { .. } => 2,
            GpuCommand::MediaObject { inline_data, .. } => 6 + inline_data.len().div_ceil(4),
            GpuCommand::MediaObjectWalker { .. } => 17,
            GpuCommand::MediaStateFlush => 2,
            GpuCommand::PipelineEnd => 6,
            GpuCommand::BatchBufferStart { .. } => 3,
            GpuCommand::BatchBufferEnd => 2,
            GpuCommand::ColorBlt { .. } => 6,
            GpuCommand::VeboxState { .. } => 16,
            GpuCommand::VeboxSurfaceState { .. } => 9,
            GpuCommand::VeboxDiIecp { .. } => 20,
        }
    }

    /// Short stable name, used in logs and dry-run dumps.
    pub fn name(&self) -> &'static str {
        match self {
            GpuCommand::MiFlush => "MI_FLUSH",
            GpuCommand::PipelineSelect(_) => "PIPELINE_SELECT",
            GpuCommand::StateBaseAddress { .. } => "STATE_BASE_ADDRESS",
            GpuCommand::VfeState { .. } => "MEDIA_VFE_STATE",
            GpuCommand::CurbeLoad { .. } => "MEDIA_CURBE_LOAD",
            GpuCommand::InterfaceDescriptorLoad { .. } => "MEDIA_INTERFACE_DESCRIPTOR_LOAD",
            GpuCommand::MediaStatePointers { .. } => "MEDIA_STATE_POINTERS",
            GpuCommand::UrbFence { .. } => "URB_FENCE",
            GpuCommand::CsUrbState { .. } => "CS_URB_STATE",
            GpuCommand::ConstantBuffer { .. } => "CONSTANT_BUFFER",
            GpuCommand::MediaObject { .. } => "MEDIA_OBJECT",
            GpuCommand::MediaObjectWalker { .. } => "MEDIA_OBJECT_WALKER",
            GpuCommand::MediaStateFlush => "MEDIA_STATE_FLUSH",
            GpuCommand::PipelineEnd => "PIPELINE_END",
            GpuCommand::BatchBufferStart { .. } => "MI_BATCH_BUFFER_START",
            GpuCommand::BatchBufferEnd => "MI_BATCH_BUFFER_END",
            GpuCommand::ColorBlt { .. } => "XY_COLOR_BLT",
            GpuCommand::VeboxState { .. } => "VEB_STATE",
            GpuCommand::VeboxSurfaceState { .. } => "VEB_SURFACE_STATE",
            GpuCommand::VeboxDiIecp { .. } => "VEB_DI_IECP",
        }
    }
}

/// Command-buffer sink consumed by the pipeline.
///
/// `begin_atomic`/`end_atomic` bracket a run of commands that must land in one submission.
/// `flush` submits everything emitted so far; it returns once the kernel driver has the batch,
/// not when the GPU has finished it.
pub trait BatchEmitter {
    fn begin_atomic(&mut self, size_hint: usize);

    fn emit(&mut self, cmd: GpuCommand);

    fn end_atomic(&mut self);

    fn flush(&mut self) -> VppResult<()>;
}
