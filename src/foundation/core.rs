use std::fmt;

use crate::foundation::error::{VppError, VppResult};

/// Four-character pixel format code, stored little-endian as in VA-API.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fourcc(pub u32);

impl Fourcc {
    /// Semi-planar 8-bit 4:2:0.
    pub const NV12: Fourcc = Fourcc::from_chars(*b"NV12");
    /// Planar 8-bit 4:2:0, U before V.
    pub const I420: Fourcc = Fourcc::from_chars(*b"I420");
    /// Planar 8-bit 4:2:0, V before U.
    pub const YV12: Fourcc = Fourcc::from_chars(*b"YV12");
    /// Planar 4:2:0 with chroma planes stacked below luma.
    pub const IMC1: Fourcc = Fourcc::from_chars(*b"IMC1");
    /// Planar 4:2:0 with chroma planes stacked below luma, U first.
    pub const IMC3: Fourcc = Fourcc::from_chars(*b"IMC3");
    /// Semi-planar 10-bit 4:2:0 (MSB aligned in 16-bit words).
    pub const P010: Fourcc = Fourcc::from_chars(*b"P010");
    /// Planar 10-bit 4:2:0.
    pub const I010: Fourcc = Fourcc::from_chars(*b"I010");
    /// Packed 4:2:2, Y0 U Y1 V.
    pub const YUY2: Fourcc = Fourcc::from_chars(*b"YUY2");
    /// Packed 4:2:2, U Y0 V Y1.
    pub const UYVY: Fourcc = Fourcc::from_chars(*b"UYVY");
    /// Planar 4:2:2, V before U.
    pub const YV16: Fourcc = Fourcc::from_chars(*b"YV16");
    /// Planar 4:1:1.
    pub const P411: Fourcc = Fourcc::from_chars(*b"411P");
    /// Planar 4:2:2 horizontally subsampled.
    pub const P422H: Fourcc = Fourcc::from_chars(*b"422H");
    /// Planar 4:2:2 vertically subsampled.
    pub const P422V: Fourcc = Fourcc::from_chars(*b"422V");
    /// Planar 4:4:4.
    pub const P444: Fourcc = Fourcc::from_chars(*b"444P");
    /// 32-bit RGB with alpha.
    pub const RGBA: Fourcc = Fourcc::from_chars(*b"RGBA");
    /// 32-bit RGB, alpha ignored.
    pub const RGBX: Fourcc = Fourcc::from_chars(*b"RGBX");
    /// 32-bit BGR with alpha.
    pub const BGRA: Fourcc = Fourcc::from_chars(*b"BGRA");
    /// 32-bit BGR, alpha ignored.
    pub const BGRX: Fourcc = Fourcc::from_chars(*b"BGRX");

    /// Build a fourcc from its four ASCII characters.
    pub const fn from_chars(c: [u8; 4]) -> Self {
        Fourcc(u32::from_le_bytes(c))
    }

    /// The four ASCII characters of this code.
    pub fn chars(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Static layout information, or `None` for codes the pipeline does not know.
    pub fn info(self) -> Option<FourccInfo> {
        use Subsampling::*;
        let (planes, subsampling, bit_depth, packed, rgb) = match self {
            Fourcc::NV12 => (2, Yuv420, 8, false, false),
            Fourcc::P010 => (2, Yuv420, 10, false, false),
            Fourcc::I420 | Fourcc::YV12 | Fourcc::IMC1 | Fourcc::IMC3 => {
                (3, Yuv420, 8, false, false)
            }
            Fourcc::I010 => (3, Yuv420, 10, false, false),
            Fourcc::YUY2 | Fourcc::UYVY => (1, Yuv422H, 8, true, false),
            Fourcc::YV16 | Fourcc::P422H => (3, Yuv422H, 8, false, false),
            Fourcc::P422V => (3, Yuv422V, 8, false, false),
            Fourcc::P411 => (3, Yuv411, 8, false, false),
            Fourcc::P444 => (3, Yuv444, 8, false, false),
            Fourcc::RGBA | Fourcc::RGBX | Fourcc::BGRA | Fourcc::BGRX => {
                (1, Rgbx, 8, true, true)
            }
            _ => return None,
        };
        Some(FourccInfo {
            num_planes: planes,
            subsampling,
            bit_depth,
            packed,
            rgb,
        })
    }

    /// `true` for the 32-bit RGB family.
    pub fn is_rgb(self) -> bool {
        self.info().is_some_and(|i| i.rgb)
    }

    /// `true` for three-plane YUV layouts.
    pub fn is_planar3(self) -> bool {
        self.info().is_some_and(|i| i.num_planes == 3)
    }

    /// `true` for packed 4:2:2 YUV layouts.
    pub fn is_packed_yuv(self) -> bool {
        self.info().is_some_and(|i| i.packed && !i.rgb)
    }
}

impl fmt::Display for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            if c.is_ascii_graphic() {
                write!(f, "{}", c as char)?;
            } else {
                write!(f, "\\x{c:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fourcc({self})")
    }
}

impl TryFrom<String> for Fourcc {
    type Error = VppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Fourcc> for String {
    fn from(f: Fourcc) -> Self {
        f.to_string()
    }
}

impl std::str::FromStr for Fourcc {
    type Err = VppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| VppError::invalid_parameter(format!("fourcc '{s}' must be 4 chars")))?;
        Ok(Fourcc::from_chars(bytes))
    }
}

/// Chroma subsampling of a pixel format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsampling {
    /// 4:2:0.
    Yuv420,
    /// 4:2:2, horizontal.
    Yuv422H,
    /// 4:2:2, vertical.
    Yuv422V,
    /// 4:1:1.
    Yuv411,
    /// 4:4:4.
    Yuv444,
    /// Luma only.
    Yuv400,
    /// Packed 32-bit RGB.
    Rgbx,
}

/// Layout facts about a [`Fourcc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FourccInfo {
    /// Number of memory planes.
    pub num_planes: u8,
    /// Chroma subsampling.
    pub subsampling: Subsampling,
    /// Bits per component.
    pub bit_depth: u8,
    /// Interleaved components in a single plane.
    pub packed: bool,
    /// RGB rather than YUV.
    pub rgb: bool,
}

/// Render-target format a surface was created for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RtFormat {
    /// 8-bit 4:2:0.
    #[default]
    Yuv420,
    /// 10-bit 4:2:0.
    Yuv420_10bpp,
    /// 8-bit 4:2:2.
    Yuv422,
    /// 8-bit 4:4:4.
    Yuv444,
    /// 32-bit RGB.
    Rgb32,
}

/// Opaque surface identifier handed out by the surface registry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SurfaceId(pub u32);

impl SurfaceId {
    /// The "no surface" sentinel (`VA_INVALID_SURFACE`).
    pub const INVALID: SurfaceId = SurfaceId(u32::MAX);

    /// Return `true` for the sentinel value.
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Opaque parameter-buffer identifier handed out by the buffer registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BufferId(pub u32);

/// Axis-aligned region in surface pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels, must be > 0.
    pub width: u32,
    /// Height in pixels, must be > 0.
    pub height: u32,
}

impl Rect {
    /// Construct a rect.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect covering `[0, width) x [0, height)`.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Same width and height as `other`, ignoring origin.
    pub fn same_size(self, other: Rect) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Reject degenerate rects.
    pub fn validate(self, what: &str) -> VppResult<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(VppError::invalid_parameter(format!(
                "{what} must have non-zero extent, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(self)
    }
}

/// GPU hardware generation.
///
/// Ordering follows release order so `gen >= Generation::Gen8` style checks read naturally.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Ironlake (GEN5 / 5.5).
    Gen5,
    /// Sandy Bridge.
    Gen6,
    /// Ivy Bridge.
    Gen7,
    /// Haswell.
    Gen75,
    /// Broadwell.
    Gen8,
    /// Skylake and derivatives.
    #[default]
    Gen9,
}

impl Generation {
    /// Whether the part carries a VEBOX fixed-function unit.
    pub fn has_vebox(self) -> bool {
        self >= Generation::Gen75
    }

    /// Kernel-binary file extension for this generation.
    pub fn kernel_extension(self) -> &'static str {
        match self {
            Generation::Gen5 => "g4b.gen5",
            Generation::Gen6 => "g6b",
            Generation::Gen7 => "g7b",
            Generation::Gen75 => "g75b",
            Generation::Gen8 => "g8b",
            Generation::Gen9 => "g9b",
        }
    }

    /// Command-emission family.
    pub fn family(self) -> GenFamily {
        match self {
            Generation::Gen5 => GenFamily::Ironlake,
            Generation::Gen6 | Generation::Gen7 | Generation::Gen75 => GenFamily::Gen6,
            Generation::Gen8 | Generation::Gen9 => GenFamily::Gen8,
        }
    }
}

/// Generations that share one media-pipeline command sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenFamily {
    /// GEN5: URB fence + constant buffer, media objects in the primary batch.
    Ironlake,
    /// GEN6 to GEN7.5: VFE + CURBE + IDT, VFE re-emitted before the walker.
    Gen6,
    /// GEN8+: 48-bit addressing, explicit pipeline end.
    Gen8,
}

/// `filter_flags` bitfield carried by pipeline parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FilterFlags(pub u32);

impl FilterFlags {
    /// Progressive frame.
    pub const FRAME_PICTURE: u32 = 0x0000_0000;
    /// Top field only.
    pub const TOP_FIELD: u32 = 0x0000_0001;
    /// Bottom field only.
    pub const BOTTOM_FIELD: u32 = 0x0000_0002;
    /// BT.601 source.
    pub const SRC_BT601: u32 = 0x0000_0010;
    /// BT.709 source.
    pub const SRC_BT709: u32 = 0x0000_0020;
    /// SMPTE 240M source.
    pub const SRC_SMPTE_240: u32 = 0x0000_0040;
    /// Mask of the source color standard bits.
    pub const SRC_COLOR_MASK: u32 = 0x0000_00f0;
    /// Default scaling.
    pub const SCALING_DEFAULT: u32 = 0x0000_0000;
    /// Fast scaling.
    pub const SCALING_FAST: u32 = 0x0000_0100;
    /// High-quality scaling.
    pub const SCALING_HQ: u32 = 0x0000_0200;
    /// Non-linear anamorphic scaling.
    pub const SCALING_NL_ANAMORPHIC: u32 = 0x0000_0300;
    /// Mask of the scaling quality bits.
    pub const SCALING_MASK: u32 = 0x0000_0f00;

    /// Picture structure encoded in the low two bits.
    pub fn field(self) -> FieldFlag {
        match self.0 & 0x3 {
            Self::TOP_FIELD => FieldFlag::TopField,
            Self::BOTTOM_FIELD => FieldFlag::BottomField,
            _ => FieldFlag::Frame,
        }
    }

    /// Scaling quality bits.
    pub fn scaling(self) -> u32 {
        self.0 & Self::SCALING_MASK
    }
}

/// Which part of an interlaced frame a surface view addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFlag {
    /// Whole frame.
    #[default]
    Frame,
    /// Even lines.
    TopField,
    /// Odd lines.
    BottomField,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
