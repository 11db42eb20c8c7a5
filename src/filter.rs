use smallvec::SmallVec;

use crate::foundation::core::BufferId;
use crate::foundation::error::{VppError, VppResult};
use crate::surface::registry::{BufferPayload, BufferRegistry};

/// Upper bound on filters attached to one pipeline call.
pub const MAX_FILTERS: usize = 4;

/// Filter kinds a pipeline call may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    NoiseReduction,
    Deinterlacing,
    SkinToneEnhancement,
    Sharpening,
    ColorBalance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeinterlaceAlgorithm {
    Bob,
    Weave,
    MotionAdaptive,
    MotionCompensated,
}

impl DeinterlaceAlgorithm {
    /// Motion-adaptive and motion-compensated modes keep temporal state between calls.
    pub fn is_advanced(self) -> bool {
        matches!(
            self,
            DeinterlaceAlgorithm::MotionAdaptive | DeinterlaceAlgorithm::MotionCompensated
        )
    }
}

/// `flags` bits of a deinterlacing filter.
pub struct DeinterlaceFlags;

impl DeinterlaceFlags {
    /// Bottom field is first in temporal order.
    pub const BOTTOM_FIELD_FIRST: u32 = 0x0001;
    /// The current picture is the bottom field.
    pub const BOTTOM_FIELD: u32 = 0x0002;
    /// Only one field is supplied.
    pub const ONE_FIELD: u32 = 0x0004;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBalanceKind {
    Hue,
    Saturation,
    Brightness,
    Contrast,
    AutoSaturation,
    AutoBrightness,
    AutoContrast,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorBalanceAttrib {
    pub kind: ColorBalanceKind,
    pub value: f32,
}

/// Payload of a filter parameter buffer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterParameter {
    NoiseReduction {
        /// Strength in `[0, 1]`.
        value: f32,
    },
    Deinterlacing {
        algorithm: DeinterlaceAlgorithm,
        #[serde(default)]
        flags: u32,
    },
    SkinToneEnhancement {
        #[serde(default)]
        value: f32,
    },
    Sharpening {
        value: f32,
    },
    ColorBalance {
        #[serde(default)]
        attribs: Vec<ColorBalanceAttrib>,
    },
}

impl FilterParameter {
    pub fn filter_type(&self) -> FilterType {
        match self {
            FilterParameter::NoiseReduction { .. } => FilterType::NoiseReduction,
            FilterParameter::Deinterlacing { .. } => FilterType::Deinterlacing,
            FilterParameter::SkinToneEnhancement { .. } => FilterType::SkinToneEnhancement,
            FilterParameter::Sharpening { .. } => FilterType::Sharpening,
            FilterParameter::ColorBalance { .. } => FilterType::ColorBalance,
        }
    }
}

pub type FilterList = SmallVec<[FilterParameter; MAX_FILTERS]>;

/// Resolve every id to its filter payload.
///
/// An id that does not resolve, or resolves to something other than a filter, makes the whole
/// chain invalid.
pub fn resolve_filters(buffers: &dyn BufferRegistry, ids: &[BufferId]) -> VppResult<FilterList> {
    ids.iter()
        .map(|&id| match buffers.resolve(id) {
            Some(BufferPayload::Filter(f)) => Ok(f),
            Some(BufferPayload::Raw { .. }) => Err(VppError::invalid_filter_chain(format!(
                "buffer {id:?} does not hold a filter parameter"
            ))),
            None => Err(VppError::invalid_filter_chain(format!(
                "filter buffer {id:?} does not resolve"
            ))),
        })
        .collect()
}

/// Check that a chain of two or more filters can run as one VEBOX pass.
///
/// Sharpening only runs alone, and each filter type may appear once.
pub fn validate_vebox_chain(filters: &[FilterParameter]) -> VppResult<()> {
    let mut seen: SmallVec<[FilterType; MAX_FILTERS]> = SmallVec::new();
    for f in filters {
        let ty = f.filter_type();
        if ty == FilterType::Sharpening {
            return Err(VppError::invalid_filter_chain(
                "sharpening cannot be combined with other filters",
            ));
        }
        if seen.contains(&ty) {
            return Err(VppError::invalid_filter_chain(format!(
                "filter {ty:?} appears more than once"
            )));
        }
        seen.push(ty);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/filter.rs"]
mod tests;
