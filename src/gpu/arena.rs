use std::fmt;

use smallvec::SmallVec;

use crate::foundation::error::{VppError, VppResult};
use crate::foundation::math::align_up_usize;

/// Named sub-region of a GPU state buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Region {
    Curbe,
    InterfaceDescriptors,
    Sampler,
    /// AVS / 8x8 sampler coefficient tables.
    SamplerCoefficients,
    SurfaceStates,
    BindingTable,
    VfeState,
}

/// Placement of one region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RegionSpan {
    pub offset: usize,
    pub size: usize,
}

impl RegionSpan {
    pub fn end(self) -> usize {
        self.offset + self.size
    }
}

/// Linear layout planner for a GPU state buffer.
///
/// Regions are placed in request order at their requested alignment and never overlap. The
/// arena tracks offsets only; the caller allocates one buffer of [`StateArena::total_size`]
/// bytes afterwards.
#[derive(Clone, Default)]
pub struct StateArena {
    capacity: Option<usize>,
    cursor: usize,
    regions: SmallVec<[(Region, RegionSpan); 6]>,
}

impl StateArena {
    /// Arena that grows as regions are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena limited to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Drop every placement.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.regions.clear();
    }

    /// Place `region` with `size` bytes at `alignment` and return its offset.
    pub fn reserve(&mut self, region: Region, size: usize, alignment: usize) -> VppResult<usize> {
        if self.span(region).is_some() {
            return Err(VppError::invalid_value(format!(
                "state region {region:?} reserved twice"
            )));
        }
        let offset = align_up_usize(self.cursor, alignment.max(1));
        let end = offset.checked_add(size).ok_or_else(|| {
            VppError::allocation_failed(format!("state region {region:?} size overflows"))
        })?;
        if let Some(cap) = self.capacity
            && end > cap
        {
            return Err(VppError::allocation_failed(format!(
                "state region {region:?} ({size} bytes) does not fit in {cap} bytes"
            )));
        }
        self.cursor = end;
        self.regions.push((region, RegionSpan { offset, size }));
        Ok(offset)
    }

    pub fn span(&self, region: Region) -> Option<RegionSpan> {
        self.regions
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, span)| *span)
    }

    /// Offset of a placed region, `InvalidValue` if it was never reserved.
    pub fn offset(&self, region: Region) -> VppResult<usize> {
        self.span(region)
            .map(|s| s.offset)
            .ok_or_else(|| VppError::invalid_value(format!("state region {region:?} not laid out")))
    }

    /// Bytes needed to back every placed region.
    pub fn total_size(&self) -> usize {
        self.cursor
    }

    pub fn regions(&self) -> impl Iterator<Item = (Region, RegionSpan)> + '_ {
        self.regions.iter().copied()
    }
}

impl fmt::Debug for StateArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateArena")
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .field("regions", &self.regions.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/arena.rs"]
mod tests;
