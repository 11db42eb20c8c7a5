/// Convenience result type used across the crate.
pub type VppResult<T> = Result<T, VppError>;

/// Failure causes of a post-processing call.
///
/// `Unimplemented` is not a fault: it is the signal a fast path returns when it does not apply,
/// and callers fall back to the next path when they see it.
#[derive(thiserror::Error, Debug)]
pub enum VppError {
    #[error("invalid surface: {0}")]
    InvalidSurface(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid filter chain: {0}")]
    InvalidFilterChain(String),

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("unsupported render target format: {0}")]
    UnsupportedRtFormat(String),

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VppError {
    pub fn invalid_surface(msg: impl Into<String>) -> Self {
        Self::InvalidSurface(msg.into())
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    pub fn invalid_filter_chain(msg: impl Into<String>) -> Self {
        Self::InvalidFilterChain(msg.into())
    }

    pub fn unsupported_filter(msg: impl Into<String>) -> Self {
        Self::UnsupportedFilter(msg.into())
    }

    pub fn unsupported_rt_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedRtFormat(msg.into())
    }

    pub fn unimplemented(msg: impl Into<String>) -> Self {
        Self::Unimplemented(msg.into())
    }

    pub fn allocation_failed(msg: impl Into<String>) -> Self {
        Self::AllocationFailed(msg.into())
    }

    /// `true` when this is the "path does not apply" signal.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented(_))
    }
}

/// Closed status set returned across the hardware-context boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Status {
    Success,
    ErrorInvalidSurface,
    ErrorInvalidParameter,
    ErrorInvalidValue,
    ErrorInvalidFilterChain,
    ErrorUnsupportedFilter,
    ErrorUnsupportedRtFormat,
    ErrorUnimplemented,
    ErrorAllocationFailed,
}

impl Status {
    /// `true` only for [`Status::Success`].
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl From<&VppError> for Status {
    fn from(err: &VppError) -> Self {
        match err {
            VppError::InvalidSurface(_) => Status::ErrorInvalidSurface,
            VppError::InvalidParameter(_) => Status::ErrorInvalidParameter,
            VppError::InvalidValue(_) => Status::ErrorInvalidValue,
            VppError::InvalidFilterChain(_) => Status::ErrorInvalidFilterChain,
            VppError::UnsupportedFilter(_) => Status::ErrorUnsupportedFilter,
            VppError::UnsupportedRtFormat(_) => Status::ErrorUnsupportedRtFormat,
            VppError::Unimplemented(_) => Status::ErrorUnimplemented,
            VppError::AllocationFailed(_) => Status::ErrorAllocationFailed,
            VppError::Other(_) => Status::ErrorInvalidValue,
        }
    }
}

impl<T> From<&VppResult<T>> for Status {
    fn from(res: &VppResult<T>) -> Self {
        match res {
            Ok(_) => Status::Success,
            Err(e) => Status::from(e),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
