use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::foundation::core::Generation;
use crate::foundation::error::{VppError, VppResult};

/// Engine configuration, loadable from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VppConfig {
    pub generation: Generation,
    /// Force VEBOX on or off; `None` follows the generation.
    pub vebox: Option<bool>,
    /// Force the GPE scaling kernels on or off; `None` enables them on Gen9 only.
    pub gpe_scaling: Option<bool>,
    /// Surface slots in the surface-state/binding-table buffer.
    pub max_pp_surfaces: usize,
    /// Bytes reserved for sampler state.
    pub sampler_size: usize,
    /// Size hint passed to `begin_atomic`.
    pub batch_size_hint: usize,
}

impl Default for VppConfig {
    fn default() -> Self {
        Self {
            generation: Generation::default(),
            vebox: None,
            gpe_scaling: None,
            max_pp_surfaces: 48,
            sampler_size: 4 * 4096,
            batch_size_hint: 0x1000,
        }
    }
}

impl VppConfig {
    pub fn for_generation(generation: Generation) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub fn from_json_str(s: &str) -> VppResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .context("parse VPP config JSON")
            .map_err(VppError::from)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> VppResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read VPP config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> VppResult<()> {
        if self.max_pp_surfaces == 0 {
            return Err(VppError::invalid_value("max_pp_surfaces must be > 0"));
        }
        if self.sampler_size == 0 {
            return Err(VppError::invalid_value("sampler_size must be > 0"));
        }
        if self.vebox == Some(true) && !self.generation.has_vebox() {
            return Err(VppError::invalid_value(format!(
                "{:?} has no VEBOX unit",
                self.generation
            )));
        }
        Ok(())
    }

    pub fn vebox_enabled(&self) -> bool {
        self.vebox.unwrap_or_else(|| self.generation.has_vebox())
    }

    pub fn gpe_scaling_enabled(&self) -> bool {
        self.gpe_scaling
            .unwrap_or(self.generation == Generation::Gen9)
    }
}

/// Kernel binaries keyed by kernel name.
#[derive(Clone, Debug, Default)]
pub struct KernelStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl KernelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, blob: Vec<u8>) -> &mut Self {
        self.blobs.insert(name.into(), blob);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.blobs.get(name).map(Vec::as_slice).filter(|b| !b.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Load `<name>.<ext>` for every kernel `generation` uses from `dir`.
    ///
    /// Missing files are skipped; the matching modules then report `Unimplemented`.
    pub fn from_dir(dir: &Path, generation: Generation) -> VppResult<Self> {
        let ext = generation.kernel_extension();
        let mut store = Self::new();
        for name in crate::pp::module::kernel_names(generation) {
            let path = dir.join(format!("{name}.{ext}"));
            if !path.exists() {
                tracing::debug!(kernel = name, path = %path.display(), "kernel binary not found");
                continue;
            }
            let blob = std::fs::read(&path)
                .with_context(|| format!("read kernel {}", path.display()))?;
            store.insert(name, blob);
        }
        Ok(store)
    }

    /// Placeholder blobs for every kernel `generation` uses, for dry runs and tests.
    pub fn synthetic(generation: Generation) -> Self {
        let mut store = Self::new();
        for name in crate::pp::module::kernel_names(generation) {
            store.insert(name, vec![0u8; 64]);
        }
        store
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
