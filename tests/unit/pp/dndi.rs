use super::*;
use crate::host::{HostMemory, SurfaceTable};

fn nv12(table: &mut SurfaceTable) -> SurfaceId {
    table.add_allocated(Fourcc::NV12, 720, 480, true).unwrap()
}

/// One deinterlace call: classify, allocate, rotate. Returns the slot `dst` landed in.
fn field(
    state: &mut DndiState,
    table: &mut SurfaceTable,
    src: SurfaceId,
    dst: SurfaceId,
    flags: u32,
    fwd: &[SurfaceId],
) -> FrameSlot {
    state
        .init_surface_params(src, DeinterlaceAlgorithm::MotionAdaptive, flags, fwd)
        .unwrap();
    state.ensure_surfaces_storage(table, 720, 480).unwrap();
    state.ensure_surfaces(table, src, dst, fwd)
}

#[test]
fn bob_always_runs_as_a_first_frame() {
    let mut table = SurfaceTable::new();
    let src = nv12(&mut table);
    let mut state = DndiState::default();
    state
        .init_surface_params(src, DeinterlaceAlgorithm::Bob, 0, &[])
        .unwrap();
    assert!(state.is_di_enabled);
    assert!(state.is_first_frame);
    assert!(!state.is_di_adv_enabled);
    assert!(!state.is_second_field);
    assert!(state.top_field_first);
}

#[test]
fn motion_adaptive_on_an_empty_store_starts_fresh() {
    let mut table = SurfaceTable::new();
    let src = nv12(&mut table);
    let mut state = DndiState::default();
    state
        .init_surface_params(src, DeinterlaceAlgorithm::MotionAdaptive, 0, &[])
        .unwrap();
    assert!(state.is_first_frame);
    assert!(!state.is_di_adv_enabled);
}

#[test]
fn weave_is_unsupported() {
    let mut state = DndiState::default();
    let err = state
        .init_surface_params(SurfaceId(1), DeinterlaceAlgorithm::Weave, 0, &[])
        .unwrap_err();
    assert!(matches!(err, VppError::UnsupportedFilter(_)));
}

#[test]
fn second_field_must_follow_its_first_field() {
    let mut table = SurfaceTable::new();
    let a = nv12(&mut table);
    let b = nv12(&mut table);
    let dst = nv12(&mut table);
    let mut state = DndiState::default();
    field(&mut state, &mut table, a, dst, 0, &[]);

    let err = state
        .init_surface_params(
            b,
            DeinterlaceAlgorithm::MotionAdaptive,
            DeinterlaceFlags::BOTTOM_FIELD,
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, VppError::InvalidParameter(_)));
}

#[test]
fn later_frames_need_a_forward_reference() {
    let mut table = SurfaceTable::new();
    let a = nv12(&mut table);
    let b = nv12(&mut table);
    let dst = nv12(&mut table);
    let mut state = DndiState::default();
    field(&mut state, &mut table, a, dst, 0, &[]);

    let err = state
        .init_surface_params(b, DeinterlaceAlgorithm::MotionCompensated, 0, &[])
        .unwrap_err();
    assert!(matches!(err, VppError::InvalidParameter(_)));
    let err = state
        .init_surface_params(
            b,
            DeinterlaceAlgorithm::MotionCompensated,
            0,
            &[SurfaceId::INVALID],
        )
        .unwrap_err();
    assert!(matches!(err, VppError::InvalidParameter(_)));
}

#[test]
fn second_field_without_reference_is_still_a_first_frame() {
    let mut table = SurfaceTable::new();
    let a = nv12(&mut table);
    let dst = nv12(&mut table);
    let mut state = DndiState::default();
    field(&mut state, &mut table, a, dst, 0, &[]);
    field(
        &mut state,
        &mut table,
        a,
        dst,
        DeinterlaceFlags::BOTTOM_FIELD,
        &[],
    );
    assert!(state.is_second_field);
    assert!(state.is_first_frame);
}

#[test]
fn alternating_fields_rotate_the_output_slots() {
    let mut table = SurfaceTable::new();
    let reference = nv12(&mut table);
    let frames: Vec<SurfaceId> = (0..4).map(|_| nv12(&mut table)).collect();
    let mut state = DndiState::default();

    let mut first_frames = 0;
    let mut last: Option<(Slot, Slot)> = None;
    for (n, &src) in frames.iter().enumerate() {
        let fwd = if n == 0 { reference } else { frames[n - 1] };
        for flags in [0, DeinterlaceFlags::BOTTOM_FIELD] {
            let dst = nv12(&mut table);
            let target = field(&mut state, &mut table, src, dst, flags, &[fwd]);
            if state.is_first_frame {
                first_frames += 1;
            }
            assert_eq!(state.frame_store.get(target), Slot::Borrowed(dst));
            assert_eq!(
                state.frame_store.get(FrameSlot::InCurrent),
                Slot::Borrowed(src)
            );
            assert_eq!(
                state.frame_store.get(FrameSlot::InPrevious),
                Slot::Borrowed(fwd)
            );

            let cur = state.frame_store.get(FrameSlot::OutCurrent);
            let prev = state.frame_store.get(FrameSlot::OutPrevious);
            if let Some((last_cur, last_prev)) = last {
                match target {
                    FrameSlot::OutCurrent => assert_eq!(prev, last_cur),
                    FrameSlot::OutPrevious => assert_eq!(cur, last_prev),
                    other => panic!("unexpected target {other:?}"),
                }
            }
            last = Some((cur, prev));
        }
    }
    assert_eq!(first_frames, 1);
}

#[test]
fn stmm_slots_swap_once_per_new_frame() {
    let mut table = SurfaceTable::new();
    let a = nv12(&mut table);
    let b = nv12(&mut table);
    let dst = nv12(&mut table);
    let mut state = DndiState::default();

    field(&mut state, &mut table, a, dst, 0, &[]);
    let in_stmm = state.frame_store.get(FrameSlot::InStmm);
    let out_stmm = state.frame_store.get(FrameSlot::OutStmm);
    assert!(matches!(in_stmm, Slot::Owned(_)));
    assert!(matches!(out_stmm, Slot::Owned(_)));

    field(
        &mut state,
        &mut table,
        a,
        dst,
        DeinterlaceFlags::BOTTOM_FIELD,
        &[],
    );
    assert_eq!(state.frame_store.get(FrameSlot::InStmm), in_stmm);

    field(&mut state, &mut table, b, dst, 0, &[a]);
    assert_eq!(state.frame_store.get(FrameSlot::InStmm), out_stmm);
    assert_eq!(state.frame_store.get(FrameSlot::OutStmm), in_stmm);
}

#[test]
fn reset_destroys_only_owned_surfaces() {
    let mut table = SurfaceTable::new();
    let reference = nv12(&mut table);
    let a = nv12(&mut table);
    let b = nv12(&mut table);
    let d0 = nv12(&mut table);
    let d1 = nv12(&mut table);
    let d2 = nv12(&mut table);
    let mut state = DndiState::default();

    field(&mut state, &mut table, a, d0, 0, &[reference]);
    field(
        &mut state,
        &mut table,
        a,
        d1,
        DeinterlaceFlags::BOTTOM_FIELD,
        &[reference],
    );
    field(&mut state, &mut table, b, d2, 0, &[a]);

    let owned = state.frame_store.owned_count();
    assert!(owned >= 2);
    let destroyed_before = table.destroyed();
    state.reset(&mut table);

    assert_eq!(table.destroyed() - destroyed_before, owned);
    assert_eq!(table.created(), table.destroyed());
    for id in [reference, a, b, d0, d1, d2] {
        assert!(table.contains(id), "{id:?} was destroyed");
    }
    for slot in FrameSlot::ALL {
        assert!(state.frame_store.get(slot).is_empty());
    }
    assert!(!state.is_di_enabled);
}

#[test]
fn clearing_a_borrowed_slot_keeps_the_surface() {
    let mut table = SurfaceTable::new();
    let a = nv12(&mut table);
    let mut store = FrameStore::default();
    store.borrow_into(FrameSlot::InCurrent, a, &mut table);
    store.clear(FrameSlot::InCurrent, &mut table);
    assert!(table.contains(a));
    assert_eq!(table.destroyed(), 0);
    assert_eq!(store.get(FrameSlot::InCurrent), Slot::Empty);
}

#[test]
fn scratch_creation_failure_propagates() {
    let mut table = SurfaceTable::new();
    let a = nv12(&mut table);
    table.fail_create_after(1);
    let mut state = DndiState::default();
    state
        .init_surface_params(a, DeinterlaceAlgorithm::Bob, 0, &[])
        .unwrap();
    let err = state.ensure_surfaces_storage(&mut table, 720, 480).unwrap_err();
    assert!(matches!(err, VppError::AllocationFailed(_)));
    assert_eq!(state.frame_store.owned_count(), 1);
    state.reset(&mut table);
    assert_eq!(table.created(), table.destroyed());
}

#[test]
fn denoise_strength_maps_onto_kernel_range() {
    assert_eq!(DnState::strength_from_value(0.0), 0);
    assert_eq!(DnState::strength_from_value(0.5), 15);
    assert_eq!(DnState::strength_from_value(1.0), DN_MAX_STRENGTH);
    assert_eq!(DnState::strength_from_value(4.0), DN_MAX_STRENGTH);
    assert_eq!(DnState::strength_from_value(-1.0), 0);
    assert_eq!(DnState::strength_from_value(f32::NAN), 0);
}

#[test]
fn denoise_motion_buffer_is_allocated_once() {
    let mut mem = HostMemory::new();
    let mut dn = DnState::default();
    let first = dn.ensure_stmm(&mut mem, 16, 16).unwrap();
    let again = dn.ensure_stmm(&mut mem, 1920, 1080).unwrap();
    assert_eq!(first, again);
    assert_eq!(mem.allocs(), 1);
    assert_eq!(mem.bytes(first).unwrap().len(), 4096);

    dn.release(&mut mem);
    assert_eq!(dn.stmm, None);
    assert_eq!(mem.live_buffers(), 0);
}
