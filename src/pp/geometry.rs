use crate::color::ColorMatrix;
use crate::foundation::core::Rect;
use crate::foundation::math::{DwordWriter, align_down, align_up};

/// Width of one kernel thread's output block.
pub const BLOCK_WIDTH: u32 = 16;
/// Height of one kernel thread's output block.
pub const BLOCK_HEIGHT: u32 = 8;
/// DNDI and DN kernels work on shorter blocks.
pub const DNDI_BLOCK_HEIGHT: u32 = 4;
/// Destination x offsets must be dword aligned.
pub const X_OFFSET_ALIGNMENT: u32 = 4;

/// Bytes of static (CURBE) parameters.
pub const STATIC_PARAMETERS_SIZE: usize = 192;
/// Bytes of inline parameters carried by each `MEDIA_OBJECT`.
pub const INLINE_PARAMETERS_SIZE: usize = 32;

/// Per-edge write masks for blocks on the destination boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BoundaryMasks {
    pub left: u16,
    pub right: u16,
    pub bottom: u16,
}

impl Default for BoundaryMasks {
    fn default() -> Self {
        Self {
            left: 0xffff,
            right: 0xffff,
            bottom: 0xff,
        }
    }
}

/// Masks for a destination rect whose x origin is moved down to a dword boundary.
pub fn calculate_boundary_block_mask(dst: Rect) -> BoundaryMasks {
    let misalign = dst.x % X_OFFSET_ALIGNMENT;
    let left = if misalign != 0 {
        (misalign..BLOCK_WIDTH).fold(0u16, |m, i| m | 1 << i)
    } else {
        0xffff
    };

    let width_adjust = dst.width + misalign;
    let right = match width_adjust % BLOCK_WIDTH {
        0 => 0xffff,
        rem => ((1u32 << rem) - 1) as u16,
    };

    let bottom = match dst.height % BLOCK_HEIGHT {
        0 => 0xff,
        rem => ((1u32 << rem) - 1) as u16,
    };

    BoundaryMasks {
        left,
        right,
        bottom,
    }
}

/// How one tile's inline parameters are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub enum BlockUpdater {
    #[default]
    Null,
    LoadSave,
    Scaling,
    Avs,
    Dndi,
    Dn,
}

/// Inline parameters of one `MEDIA_OBJECT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct InlineParameters {
    pub dest_x: u32,
    pub dest_y: u32,
    pub horizontal_mask: u16,
    pub vertical_mask: u16,
    /// Normalized source origin of the block.
    pub source_x: f32,
    pub source_y: f32,
    /// Normalized source step per destination pixel.
    pub step_x: f32,
    pub step_y: f32,
    pub block_count_x: u32,
}

impl InlineParameters {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = DwordWriter::with_capacity(INLINE_PARAMETERS_SIZE);
        w.u32(self.dest_x)
            .u32(self.dest_y)
            .u32(u32::from(self.vertical_mask) << 16 | u32::from(self.horizontal_mask))
            .f32(self.source_x)
            .f32(self.source_y)
            .f32(self.step_x)
            .f32(self.step_y)
            .u32(self.block_count_x)
            .pad_to(INLINE_PARAMETERS_SIZE);
        w.finish()
    }
}

/// Deinterlace state the kernel reads from the CURBE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DiStatic {
    pub enabled: bool,
    pub motion_adaptive: bool,
    pub first_frame: bool,
    pub second_field: bool,
    pub top_field_first: bool,
}

/// CURBE contents shared by every module; each initializer fills what its kernel reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct StaticParameters {
    pub src_width: u32,
    pub src_height: u32,
    pub dst_x: u32,
    pub dst_y: u32,
    pub dst_width: u32,
    pub dst_height: u32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub step_x: f32,
    pub step_y: f32,
    pub avs: bool,
    pub nonlinear: bool,
    /// Swap U and V when reading or writing three-plane layouts.
    pub uv_swap: bool,
    pub packed_swap_y: bool,
    pub csc: Option<ColorMatrix>,
    pub dn_strength: u32,
    pub di: DiStatic,
}

impl StaticParameters {
    pub fn encode(&self) -> Vec<u8> {
        let flags = u32::from(self.avs)
            | u32::from(self.nonlinear) << 1
            | u32::from(self.uv_swap) << 2
            | u32::from(self.packed_swap_y) << 3
            | u32::from(self.csc.is_some()) << 4;
        let di = u32::from(self.di.enabled)
            | u32::from(self.di.motion_adaptive) << 1
            | u32::from(self.di.first_frame) << 2
            | u32::from(self.di.second_field) << 3
            | u32::from(self.di.top_field_first) << 4;
        let mut w = DwordWriter::with_capacity(STATIC_PARAMETERS_SIZE);
        w.u32(self.src_width)
            .u32(self.src_height)
            .u32(self.dst_x)
            .u32(self.dst_y)
            .u32(self.dst_width)
            .u32(self.dst_height)
            .f32(self.origin_x)
            .f32(self.origin_y)
            .f32(self.step_x)
            .f32(self.step_y)
            .u32(flags)
            .u32(self.dn_strength)
            .u32(di);
        for c in self.csc.unwrap_or_default() {
            w.f32(c);
        }
        w.pad_to(STATIC_PARAMETERS_SIZE);
        w.finish()
    }
}

/// Tile sweep over a destination rect.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct BlockWalk {
    /// Destination x after dword alignment.
    pub origin_x: u32,
    pub origin_y: u32,
    /// Destination width extended by the alignment shift.
    pub width: u32,
    pub height: u32,
    pub block_width: u32,
    pub block_height: u32,
    pub x_steps: u32,
    pub y_steps: u32,
    /// Destination surface extent; tiles starting beyond it are dropped.
    pub limit_width: u32,
    pub limit_height: u32,
    pub masks: BoundaryMasks,
    pub updater: BlockUpdater,
    pub source_x: f32,
    pub source_y: f32,
    pub step_x: f32,
    pub step_y: f32,
}

impl BlockWalk {
    /// Sweep `dst` in `BLOCK_WIDTH x block_height` tiles, clipped to a `limit` sized surface.
    pub fn new(dst: Rect, block_height: u32, limit: (u32, u32), updater: BlockUpdater) -> Self {
        let origin_x = align_down(dst.x, X_OFFSET_ALIGNMENT);
        let width = dst.width + (dst.x - origin_x);
        Self {
            origin_x,
            origin_y: dst.y,
            width,
            height: dst.height,
            block_width: BLOCK_WIDTH,
            block_height,
            x_steps: align_up(width, BLOCK_WIDTH) / BLOCK_WIDTH,
            y_steps: align_up(dst.height, block_height) / block_height,
            limit_width: limit.0,
            limit_height: limit.1,
            masks: calculate_boundary_block_mask(dst),
            updater,
            source_x: 0.0,
            source_y: 0.0,
            step_x: 1.0,
            step_y: 1.0,
        }
    }

    /// The single-tile walk used by the null module.
    pub fn null() -> Self {
        Self {
            x_steps: 1,
            y_steps: 1,
            block_width: BLOCK_WIDTH,
            block_height: BLOCK_HEIGHT,
            limit_width: BLOCK_WIDTH,
            limit_height: BLOCK_HEIGHT,
            ..Self::default()
        }
    }

    /// Bind the normalized source origin and per-pixel step used by resampling updaters.
    pub fn with_source(mut self, source_x: f32, source_y: f32, step_x: f32, step_y: f32) -> Self {
        self.source_x = source_x;
        self.source_y = source_y;
        self.step_x = step_x;
        self.step_y = step_y;
        self
    }

    pub fn tile_count(&self) -> u32 {
        self.x_steps * self.y_steps
    }

    /// Fill `inline` for tile `(x, y)`; `false` drops the tile.
    pub fn update(&self, x: u32, y: u32, inline: &mut InlineParameters) -> bool {
        if x >= self.x_steps || y >= self.y_steps {
            return false;
        }
        let dest_x = self.origin_x + x * self.block_width;
        let dest_y = self.origin_y + y * self.block_height;
        if self.updater != BlockUpdater::Null
            && (dest_x >= self.limit_width || dest_y >= self.limit_height)
        {
            return false;
        }

        inline.dest_x = dest_x;
        inline.dest_y = dest_y;
        inline.block_count_x = self.x_steps;

        match self.updater {
            BlockUpdater::Null => {}
            BlockUpdater::LoadSave | BlockUpdater::Scaling | BlockUpdater::Avs => {
                let mut h_mask = 0xffffu16;
                if x == 0 {
                    h_mask &= self.masks.left;
                }
                if x + 1 == self.x_steps {
                    h_mask &= self.masks.right;
                }
                inline.horizontal_mask = h_mask;
                inline.vertical_mask = if y + 1 == self.y_steps {
                    self.masks.bottom
                } else {
                    0xff
                };
                if self.updater != BlockUpdater::LoadSave {
                    let dx = (x * self.block_width) as f32;
                    let dy = (y * self.block_height) as f32;
                    inline.source_x = self.source_x + dx * self.step_x;
                    inline.source_y = self.source_y + dy * self.step_y;
                    inline.step_x = self.step_x;
                    inline.step_y = self.step_y;
                }
            }
            BlockUpdater::Dndi | BlockUpdater::Dn => {
                inline.horizontal_mask = 0xffff;
                inline.vertical_mask = 0xf;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pp/geometry.rs"]
mod tests;
