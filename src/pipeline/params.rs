use crate::filter::MAX_FILTERS;
use crate::foundation::core::{BufferId, FilterFlags, Rect, SurfaceId};
use crate::foundation::error::{VppError, VppResult};

/// Caller-supplied description of one processing call.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineParameters {
    /// Source surface.
    pub surface: SurfaceId,
    /// Source region; the full visible source when `None`.
    pub surface_region: Option<Rect>,
    /// Destination region; the full visible destination when `None`.
    pub output_region: Option<Rect>,
    /// Filter buffers. `None` together with `num_filters > 0` is malformed.
    pub filters: Option<Vec<BufferId>>,
    pub num_filters: usize,
    pub filter_flags: FilterFlags,
    /// `0xAARRGGBB`; alpha 0 disables the background clear.
    pub output_background_color: u32,
    pub forward_references: Vec<SurfaceId>,
    pub backward_references: Vec<SurfaceId>,
}

impl PipelineParameters {
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            ..Self::default()
        }
    }

    pub fn with_surface_region(mut self, rect: Rect) -> Self {
        self.surface_region = Some(rect);
        self
    }

    pub fn with_output_region(mut self, rect: Rect) -> Self {
        self.output_region = Some(rect);
        self
    }

    pub fn with_filters(mut self, ids: Vec<BufferId>) -> Self {
        self.num_filters = ids.len();
        self.filters = Some(ids);
        self
    }

    pub fn with_filter_flags(mut self, flags: u32) -> Self {
        self.filter_flags = FilterFlags(flags);
        self
    }

    pub fn with_background(mut self, argb: u32) -> Self {
        self.output_background_color = argb;
        self
    }

    pub fn with_forward_references(mut self, refs: Vec<SurfaceId>) -> Self {
        self.forward_references = refs;
        self
    }

    /// The first `num_filters` filter ids, checked for presence and count.
    pub fn filter_ids(&self) -> VppResult<&[BufferId]> {
        if self.num_filters == 0 {
            return Ok(&[]);
        }
        if self.num_filters > MAX_FILTERS {
            return Err(VppError::invalid_parameter(format!(
                "{} filters requested, at most {MAX_FILTERS} supported",
                self.num_filters
            )));
        }
        match &self.filters {
            None => Err(VppError::invalid_parameter(format!(
                "num_filters is {} but no filter list was given",
                self.num_filters
            ))),
            Some(ids) if ids.len() < self.num_filters => Err(VppError::invalid_parameter(format!(
                "num_filters is {} but the list holds {}",
                self.num_filters,
                ids.len()
            ))),
            Some(ids) => Ok(&ids[..self.num_filters]),
        }
    }

    /// `true` when an explicit filter list is present.
    pub fn has_filters(&self) -> bool {
        self.num_filters > 0 && self.filters.is_some()
    }
}
