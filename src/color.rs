use crate::foundation::core::FilterFlags;

/// Source color standard selected through the filter flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorStandard {
    #[default]
    Bt601,
    Bt709,
    Smpte240,
}

/// Row-major 3x4 YUV to RGB matrix: R, G, B rows of (Y, U, V, offset).
pub type ColorMatrix = [f32; 12];

const BT601: ColorMatrix = [
    1.164, 0.0, 1.596, -0.06275, //
    1.164, -0.392, -0.813, -0.50196, //
    1.164, 2.017, 0.0, -0.50196,
];

const BT709: ColorMatrix = [
    1.164, 0.0, 1.793, -0.06275, //
    1.164, -0.213, -0.533, -0.50196, //
    1.164, 2.112, 0.0, -0.50196,
];

const SMPTE240: ColorMatrix = [
    1.164, 0.0, 1.794, -0.06275, //
    1.164, -0.258, -0.5425, -0.50196, //
    1.164, 2.078, 0.0, -0.50196,
];

/// Color standard named by the `SRC_*` bits of `flags`, BT.601 when none is set.
pub fn filter_to_color_standard(flags: FilterFlags) -> ColorStandard {
    match flags.0 & FilterFlags::SRC_COLOR_MASK {
        FilterFlags::SRC_BT709 => ColorStandard::Bt709,
        FilterFlags::SRC_SMPTE_240 => ColorStandard::Smpte240,
        _ => ColorStandard::Bt601,
    }
}

pub fn color_standard_to_coefs(standard: ColorStandard) -> &'static ColorMatrix {
    match standard {
        ColorStandard::Bt601 => &BT601,
        ColorStandard::Bt709 => &BT709,
        ColorStandard::Smpte240 => &SMPTE240,
    }
}

/// Background color in studio-range YUV.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Yuva {
    pub y: u8,
    pub u: u8,
    pub v: u8,
    pub a: u8,
}

impl Yuva {
    /// Packed `0xAAYYUUVV`.
    pub fn packed(self) -> u32 {
        u32::from(self.a) << 24 | u32::from(self.y) << 16 | u32::from(self.u) << 8 | u32::from(self.v)
    }
}

/// Integer BT.601 conversion of a packed `0xAARRGGBB` color.
pub fn rgb_to_yuv(argb: u32) -> Yuva {
    let a = (argb >> 24) as u8;
    let r = ((argb >> 16) & 0xff) as i32;
    let g = ((argb >> 8) & 0xff) as i32;
    let b = (argb & 0xff) as i32;

    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;

    Yuva {
        y: y.clamp(0, 255) as u8,
        u: u.clamp(0, 255) as u8,
        v: v.clamp(0, 255) as u8,
        a,
    }
}

#[cfg(test)]
#[path = "../tests/unit/color.rs"]
mod tests;
