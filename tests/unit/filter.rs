use super::*;
use crate::host::BufferTable;

fn nr(value: f32) -> FilterParameter {
    FilterParameter::NoiseReduction { value }
}

fn bob() -> FilterParameter {
    FilterParameter::Deinterlacing {
        algorithm: DeinterlaceAlgorithm::Bob,
        flags: 0,
    }
}

#[test]
fn filters_resolve_in_order() {
    let mut buffers = BufferTable::new();
    let a = buffers.insert_filter(nr(0.5));
    let b = buffers.insert_filter(bob());
    let list = resolve_filters(&buffers, &[b, a]).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].filter_type(), FilterType::Deinterlacing);
    assert_eq!(list[1], nr(0.5));
}

#[test]
fn unresolvable_or_foreign_buffers_invalidate_the_chain() {
    let mut buffers = BufferTable::new();
    let raw = buffers.insert(BufferPayload::Raw {
        type_id: 7,
        bytes: vec![1, 2, 3],
    });
    let err = resolve_filters(&buffers, &[raw]).unwrap_err();
    assert!(matches!(err, VppError::InvalidFilterChain(_)));
    let err = resolve_filters(&buffers, &[BufferId(99)]).unwrap_err();
    assert!(matches!(err, VppError::InvalidFilterChain(_)));
}

#[test]
fn vebox_chains_reject_sharpening_and_repeats() {
    assert!(validate_vebox_chain(&[nr(0.2), bob()]).is_ok());
    assert!(
        validate_vebox_chain(&[
            nr(0.2),
            FilterParameter::ColorBalance { attribs: vec![] },
            FilterParameter::SkinToneEnhancement { value: 1.0 },
        ])
        .is_ok()
    );

    let err = validate_vebox_chain(&[nr(0.2), FilterParameter::Sharpening { value: 0.5 }])
        .unwrap_err();
    assert!(matches!(err, VppError::InvalidFilterChain(_)));
    let err = validate_vebox_chain(&[nr(0.2), nr(0.4)]).unwrap_err();
    assert!(matches!(err, VppError::InvalidFilterChain(_)));
}

#[test]
fn advanced_deinterlacing_modes() {
    assert!(!DeinterlaceAlgorithm::Bob.is_advanced());
    assert!(!DeinterlaceAlgorithm::Weave.is_advanced());
    assert!(DeinterlaceAlgorithm::MotionAdaptive.is_advanced());
    assert!(DeinterlaceAlgorithm::MotionCompensated.is_advanced());
}

#[test]
fn filter_json_is_tagged_by_type() {
    let f: FilterParameter =
        serde_json::from_str(r#"{"type":"deinterlacing","algorithm":"motion_adaptive"}"#).unwrap();
    assert_eq!(
        f,
        FilterParameter::Deinterlacing {
            algorithm: DeinterlaceAlgorithm::MotionAdaptive,
            flags: 0,
        }
    );
    let json = serde_json::to_string(&nr(0.5)).unwrap();
    assert_eq!(json, r#"{"type":"noise_reduction","value":0.5}"#);
}
