//! The hardware-context entry point: one [`VppEngine`] per driver instance.
//!
//! Every call takes the engine lock for its whole duration. The GPU scratch regions owned by
//! the post-processing and VEBOX contexts are rewritten in place on each call, so two callers
//! must never interleave between stage selection and the final flush.

use std::sync::{Mutex, MutexGuard};

use crate::config::{KernelStore, VppConfig};
use crate::driver::DriverContext;
use crate::foundation::core::{FilterFlags, Rect, SurfaceId};
use crate::foundation::error::{Status, VppError, VppResult};
use crate::gpu::memory::GpuMemory;
use crate::pipeline::driver::{EngineState, ProcReport};
use crate::pipeline::params::PipelineParameters;

/// Profile of the context a call arrives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    VideoProc,
    Decode,
    Encode,
}

/// Processing state the surrounding driver accumulates before `run`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProcState {
    pub pipeline_param: Option<PipelineParameters>,
    pub current_render_target: SurfaceId,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CodecState {
    pub proc_state: ProcState,
}

/// Per-feature dispatch contract of the surrounding driver.
pub trait HwContext {
    fn run(&self, drv: &mut DriverContext<'_>, profile: Profile, codec_state: &CodecState)
    -> Status;

    /// Release every GPU resource the context holds.
    fn destroy(&self, drv: &mut DriverContext<'_>);
}

/// Post-processing engine: owns the post-processing context and the lazily built VEBOX
/// context behind one lock.
#[derive(Debug)]
pub struct VppEngine {
    state: Mutex<EngineState>,
}

impl VppEngine {
    /// Validate `config`, upload every available kernel and build the shared contexts.
    pub fn new(
        config: VppConfig,
        kernels: &KernelStore,
        mem: &mut dyn GpuMemory,
    ) -> VppResult<Self> {
        let state = EngineState::new(config, kernels, mem)?;
        tracing::debug!(
            generation = ?state.config().generation,
            vebox = state.config().vebox_enabled(),
            gpe_scaling = state.config().gpe_scaling_enabled(),
            "post-processing engine ready"
        );
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // Scratch state is rebuilt per call.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Process one picture into `target`, returning what was dispatched.
    #[tracing::instrument(skip(self, drv, params), fields(src = ?params.surface))]
    pub fn process(
        &self,
        drv: &mut DriverContext<'_>,
        params: &PipelineParameters,
        target: SurfaceId,
    ) -> VppResult<ProcReport> {
        self.lock().process(drv, params, target)
    }

    /// Display-time post-processing of `surface`; see [`EngineState::put_surface`].
    #[tracing::instrument(skip(self, drv))]
    pub fn put_surface(
        &self,
        drv: &mut DriverContext<'_>,
        surface: SurfaceId,
        src_rect: Rect,
        dst_rect: Rect,
        flags: FilterFlags,
    ) -> VppResult<Option<SurfaceId>> {
        self.lock()
            .put_surface(drv, surface, src_rect, dst_rect, flags)
    }

    /// Inspect the engine state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        f(&self.lock())
    }

    fn run_checked(
        &self,
        drv: &mut DriverContext<'_>,
        profile: Profile,
        codec_state: &CodecState,
    ) -> VppResult<ProcReport> {
        if profile != Profile::VideoProc {
            return Err(VppError::invalid_parameter(format!(
                "{profile:?} context cannot post-process"
            )));
        }
        let proc_state = &codec_state.proc_state;
        let params = proc_state
            .pipeline_param
            .as_ref()
            .ok_or_else(|| VppError::invalid_parameter("no pipeline parameters"))?;
        self.process(drv, params, proc_state.current_render_target)
    }
}

impl HwContext for VppEngine {
    #[tracing::instrument(skip(self, drv, codec_state))]
    fn run(
        &self,
        drv: &mut DriverContext<'_>,
        profile: Profile,
        codec_state: &CodecState,
    ) -> Status {
        match self.run_checked(drv, profile, codec_state) {
            Ok(report) => {
                tracing::debug!(
                    plan = ?report.plan,
                    modules = ?report.pp_modules,
                    vebox_passes = report.vebox_passes,
                    "picture processed"
                );
                Status::Success
            }
            Err(err) => {
                let status = Status::from(&err);
                if err.is_unimplemented() {
                    tracing::trace!(%err, "no path handles this conversion");
                } else {
                    tracing::debug!(%err, ?status, "picture rejected");
                }
                status
            }
        }
    }

    fn destroy(&self, drv: &mut DriverContext<'_>) {
        self.lock().destroy(drv);
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
