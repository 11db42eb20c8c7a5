//! Kernel-based post-processing: module tables, per-module setup and the shared context.

pub mod context;
pub mod dndi;
pub mod geometry;
pub mod index;
pub mod kernel_index;
pub mod module;
