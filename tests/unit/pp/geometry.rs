use super::*;

#[test]
fn aligned_rects_keep_full_masks() {
    assert_eq!(
        calculate_boundary_block_mask(Rect::new(0, 0, 32, 16)),
        BoundaryMasks::default()
    );
}

#[test]
fn misaligned_rects_mask_the_edges() {
    let masks = calculate_boundary_block_mask(Rect::new(5, 0, 20, 10));
    assert_eq!(masks.left, 0xfffe);
    assert_eq!(masks.right, 0x1f);
    assert_eq!(masks.bottom, 0x3);
}

#[test]
fn walk_covers_the_aligned_rect() {
    let walk = BlockWalk::new(Rect::new(5, 0, 20, 10), BLOCK_HEIGHT, (64, 64), BlockUpdater::Scaling)
        .with_source(0.1, 0.0, 0.01, 0.02);
    assert_eq!(walk.origin_x, 4);
    assert_eq!(walk.width, 21);
    assert_eq!((walk.x_steps, walk.y_steps), (2, 2));
    assert_eq!(walk.tile_count(), 4);

    let mut inline = InlineParameters::default();
    assert!(walk.update(0, 0, &mut inline));
    assert_eq!((inline.dest_x, inline.dest_y), (4, 0));
    assert_eq!(inline.horizontal_mask, 0xfffe);
    assert_eq!(inline.vertical_mask, 0xff);

    assert!(walk.update(1, 1, &mut inline));
    assert_eq!((inline.dest_x, inline.dest_y), (20, 8));
    assert_eq!(inline.horizontal_mask, 0x1f);
    assert_eq!(inline.vertical_mask, 0x3);
    assert!((inline.source_x - 0.26).abs() < 1e-6);
    assert!((inline.source_y - 0.16).abs() < 1e-6);
    assert_eq!(inline.block_count_x, 2);

    assert!(!walk.update(2, 0, &mut inline));
}

#[test]
fn tiles_past_the_surface_are_dropped() {
    let walk = BlockWalk::new(Rect::new(0, 0, 32, 8), BLOCK_HEIGHT, (16, 8), BlockUpdater::LoadSave);
    let mut inline = InlineParameters::default();
    assert!(walk.update(0, 0, &mut inline));
    assert!(!walk.update(1, 0, &mut inline));
}

#[test]
fn temporal_updaters_use_short_blocks() {
    let walk = BlockWalk::new(Rect::full(64, 8), DNDI_BLOCK_HEIGHT, (64, 8), BlockUpdater::Dndi);
    assert_eq!(walk.y_steps, 2);
    let mut inline = InlineParameters::default();
    assert!(walk.update(3, 1, &mut inline));
    assert_eq!((inline.dest_x, inline.dest_y), (48, 4));
    assert_eq!(inline.vertical_mask, 0xf);
}

#[test]
fn null_walk_is_a_single_tile() {
    let walk = BlockWalk::null();
    assert_eq!(walk.tile_count(), 1);
    let mut inline = InlineParameters::default();
    assert!(walk.update(0, 0, &mut inline));
    assert!(!walk.update(0, 1, &mut inline));
}

#[test]
fn encoded_parameter_blocks_have_fixed_sizes() {
    assert_eq!(InlineParameters::default().encode().len(), INLINE_PARAMETERS_SIZE);
    let statics = StaticParameters {
        csc: Some([1.0; 12]),
        ..StaticParameters::default()
    };
    let bytes = statics.encode();
    assert_eq!(bytes.len(), STATIC_PARAMETERS_SIZE);
    let flags = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
    assert_eq!(flags, 1 << 4);
}
