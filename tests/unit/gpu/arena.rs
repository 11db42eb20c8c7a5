use super::*;

#[test]
fn regions_are_aligned_and_never_overlap() {
    let mut arena = StateArena::new();
    let curbe = arena.reserve(Region::Curbe, 100, 64).unwrap();
    let idt = arena.reserve(Region::InterfaceDescriptors, 32, 64).unwrap();
    let sampler = arena.reserve(Region::Sampler, 16, 32).unwrap();
    assert_eq!(curbe, 0);
    assert_eq!(idt, 128);
    assert_eq!(sampler, 160);
    assert_eq!(arena.total_size(), 176);

    let spans: Vec<_> = arena.regions().map(|(_, s)| s).collect();
    for pair in spans.windows(2) {
        assert!(pair[0].end() <= pair[1].offset);
    }
}

#[test]
fn reserving_twice_is_rejected() {
    let mut arena = StateArena::new();
    arena.reserve(Region::Curbe, 32, 64).unwrap();
    let err = arena.reserve(Region::Curbe, 32, 64).unwrap_err();
    assert!(matches!(err, VppError::InvalidValue(_)));
}

#[test]
fn capacity_is_enforced() {
    let mut arena = StateArena::with_capacity(128);
    arena.reserve(Region::Curbe, 64, 64).unwrap();
    let err = arena.reserve(Region::Sampler, 65, 64).unwrap_err();
    assert!(matches!(err, VppError::AllocationFailed(_)));
    assert!(arena.span(Region::Sampler).is_none());
}

#[test]
fn offsets_of_missing_regions_error_and_reset_clears() {
    let mut arena = StateArena::new();
    assert!(arena.offset(Region::VfeState).is_err());
    arena.reserve(Region::VfeState, 32, 0).unwrap();
    assert_eq!(arena.offset(Region::VfeState).unwrap(), 0);
    arena.reset();
    assert_eq!(arena.total_size(), 0);
    assert!(arena.span(Region::VfeState).is_none());
}
