use super::*;

#[test]
fn constructors_map_to_statuses() {
    let cases = [
        (VppError::invalid_surface("x"), Status::ErrorInvalidSurface),
        (VppError::invalid_parameter("x"), Status::ErrorInvalidParameter),
        (VppError::invalid_value("x"), Status::ErrorInvalidValue),
        (
            VppError::invalid_filter_chain("x"),
            Status::ErrorInvalidFilterChain,
        ),
        (VppError::unsupported_filter("x"), Status::ErrorUnsupportedFilter),
        (
            VppError::unsupported_rt_format("x"),
            Status::ErrorUnsupportedRtFormat,
        ),
        (VppError::unimplemented("x"), Status::ErrorUnimplemented),
        (VppError::allocation_failed("x"), Status::ErrorAllocationFailed),
    ];
    for (err, status) in cases {
        assert_eq!(Status::from(&err), status);
    }
}

#[test]
fn foreign_errors_become_invalid_value() {
    let err: VppError = anyhow::anyhow!("kernel file truncated").into();
    assert_eq!(Status::from(&err), Status::ErrorInvalidValue);
    assert_eq!(err.to_string(), "kernel file truncated");
}

#[test]
fn only_unimplemented_is_the_fallback_signal() {
    assert!(VppError::unimplemented("fast path").is_unimplemented());
    assert!(!VppError::invalid_surface("gone").is_unimplemented());
}

#[test]
fn results_map_to_status() {
    let ok: VppResult<u32> = Ok(1);
    assert!(Status::from(&ok).is_success());
    let err: VppResult<u32> = Err(VppError::invalid_surface("gone"));
    assert_eq!(Status::from(&err), Status::ErrorInvalidSurface);
    assert!(!Status::from(&err).is_success());
}

#[test]
fn display_prefixes_are_stable() {
    assert_eq!(
        VppError::unsupported_rt_format("P010 on Gen8").to_string(),
        "unsupported render target format: P010 on Gen8"
    );
    assert_eq!(
        VppError::invalid_filter_chain("repeated filter").to_string(),
        "invalid filter chain: repeated filter"
    );
}
