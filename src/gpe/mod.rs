//! GPU pipeline-execution contexts and the fixed kernels dispatched through them.

pub mod clear;
pub mod context;
pub mod scaling;
