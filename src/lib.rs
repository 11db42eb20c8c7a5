#![forbid(unsafe_code)]

pub mod avs;
pub mod color;
pub mod config;
pub mod driver;
pub mod engine;
pub mod filter;
pub mod foundation;
pub mod gpe;
pub mod gpu;
pub mod host;
pub mod pipeline;
pub mod pp;
pub mod surface;
pub mod vebox;

pub use config::{KernelStore, VppConfig};
pub use driver::DriverContext;
pub use engine::{CodecState, HwContext, ProcState, Profile, VppEngine};
pub use filter::{DeinterlaceAlgorithm, FilterParameter, FilterType};
pub use foundation::core::{
    BufferId, FilterFlags, Fourcc, Generation, Rect, RtFormat, SurfaceId,
};
pub use foundation::error::{Status, VppError, VppResult};
pub use pipeline::driver::ProcReport;
pub use pipeline::params::PipelineParameters;
pub use pipeline::plan::{FormatClass, ScaleRoute, StagePlan};
