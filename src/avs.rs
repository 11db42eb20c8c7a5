//! Polyphase coefficient generation for the adaptive video scaler.

use crate::foundation::core::FilterFlags;
use crate::foundation::math::DwordWriter;

pub const AVS_MAX_LUMA_COEFFS: usize = 8;
pub const AVS_MAX_CHROMA_COEFFS: usize = 4;

/// One phase worth of taps for both axes and both planes.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct AvsCoeffs {
    /// Luma, horizontal.
    pub y_k_h: [f32; AVS_MAX_LUMA_COEFFS],
    /// Luma, vertical.
    pub y_k_v: [f32; AVS_MAX_LUMA_COEFFS],
    /// Chroma, horizontal.
    pub uv_k_h: [f32; AVS_MAX_CHROMA_COEFFS],
    /// Chroma, vertical.
    pub uv_k_v: [f32; AVS_MAX_CHROMA_COEFFS],
}

/// Inclusive bounds every coefficient must satisfy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvsCoeffRange {
    pub lower_bound: AvsCoeffs,
    pub upper_bound: AvsCoeffs,
}

/// Per-generation scaler description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvsConfig {
    pub coeff_frac_bits: u32,
    pub coeff_epsilon: f32,
    pub num_phases: usize,
    pub num_luma_coeffs: usize,
    pub num_chroma_coeffs: usize,
    pub coeff_range: AvsCoeffRange,
}

const LUMA_LOWER: [f32; 8] = [-0.25, -0.5, -1.0, 0.0, 0.0, -1.0, -0.5, -0.25];
const LUMA_UPPER: [f32; 8] = [0.25, 0.5, 1.0, 2.0, 2.0, 1.0, 0.5, 0.25];
const CHROMA_LOWER: [f32; 4] = [-1.0, 0.0, 0.0, -1.0];
const CHROMA_UPPER: [f32; 4] = [1.0, 2.0, 2.0, 1.0];

/// Scaler configuration shared by GEN6 through GEN9 parts.
pub const GEN6_AVS_CONFIG: AvsConfig = AvsConfig {
    coeff_frac_bits: 6,
    coeff_epsilon: 1.0 / 64.0,
    num_phases: 16,
    num_luma_coeffs: 8,
    num_chroma_coeffs: 4,
    coeff_range: AvsCoeffRange {
        lower_bound: AvsCoeffs {
            y_k_h: LUMA_LOWER,
            y_k_v: LUMA_LOWER,
            uv_k_h: CHROMA_LOWER,
            uv_k_v: CHROMA_LOWER,
        },
        upper_bound: AvsCoeffs {
            y_k_h: LUMA_UPPER,
            y_k_v: LUMA_UPPER,
            uv_k_h: CHROMA_UPPER,
            uv_k_v: CHROMA_UPPER,
        },
    },
};

/// GEN8+ tables carry more fractional precision.
pub const GEN8_AVS_CONFIG: AvsConfig = AvsConfig {
    coeff_frac_bits: 8,
    coeff_epsilon: 1.0 / 256.0,
    ..GEN6_AVS_CONFIG
};

type Generator = fn(&mut [f32], usize, usize, f32);

fn kernel_linear(x: f32) -> f32 {
    let abs_x = x.abs();
    if abs_x < 1.0 { 1.0 - abs_x } else { 0.0 }
}

fn gen_coeffs_linear(coeffs: &mut [f32], phase: usize, num_phases: usize, _factor: f32) {
    let c = coeffs.len() / 2 - 1;
    let p = phase as f32 / (num_phases * 2) as f32;
    coeffs.fill(0.0);
    coeffs[c] = kernel_linear(p);
    coeffs[c + 1] = kernel_linear(p - 1.0);
}

/// Generator for a scaling-quality selector. Every level currently maps to the linear kernel.
fn generator_for(flags: u32) -> Generator {
    match flags & FilterFlags::SCALING_MASK {
        FilterFlags::SCALING_HQ | FilterFlags::SCALING_NL_ANAMORPHIC => gen_coeffs_linear,
        _ => gen_coeffs_linear,
    }
}

/// Mutable coefficient table bound to one [`AvsConfig`].
#[derive(Clone, Debug)]
pub struct AvsState {
    config: AvsConfig,
    /// `num_phases + 1` entries.
    pub coeffs: Vec<AvsCoeffs>,
    pub scale_x: f32,
    pub scale_y: f32,
    pub flags: u32,
}

impl AvsState {
    pub fn new(config: AvsConfig) -> Self {
        Self {
            config,
            coeffs: vec![AvsCoeffs::default(); config.num_phases + 1],
            scale_x: 0.0,
            scale_y: 0.0,
            flags: 0,
        }
    }

    pub fn config(&self) -> &AvsConfig {
        &self.config
    }

    /// Regenerate every phase for the given scale factors.
    pub fn update_coefficients(&mut self, scale_x: f32, scale_y: f32, flags: u32) {
        let generate = generator_for(flags);
        let cfg = self.config;
        let (nl, nc) = (cfg.num_luma_coeffs, cfg.num_chroma_coeffs);
        for (phase, c) in self.coeffs.iter_mut().enumerate() {
            generate(&mut c.y_k_h[..nl], phase, cfg.num_phases, scale_x);
            generate(&mut c.y_k_v[..nl], phase, cfg.num_phases, scale_y);
            generate(&mut c.uv_k_h[..nc], phase, cfg.num_phases, scale_x);
            generate(&mut c.uv_k_v[..nc], phase, cfg.num_phases, scale_y);
        }
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self.flags = flags;
    }

    /// `true` when every coefficient lies within the configured range, give or take epsilon.
    pub fn check_coefficients(&self) -> bool {
        let cfg = &self.config;
        let lo = &cfg.coeff_range.lower_bound;
        let hi = &cfg.coeff_range.upper_bound;
        let eps = cfg.coeff_epsilon;
        let within = |v: &[f32], lo: &[f32], hi: &[f32]| {
            v.iter()
                .zip(lo.iter().zip(hi))
                .all(|(&v, (&l, &h))| v >= l - eps && v <= h + eps)
        };
        self.coeffs.iter().all(|c| {
            within(&c.y_k_h[..cfg.num_luma_coeffs], &lo.y_k_h, &hi.y_k_h)
                && within(&c.y_k_v[..cfg.num_luma_coeffs], &lo.y_k_v, &hi.y_k_v)
                && within(&c.uv_k_h[..cfg.num_chroma_coeffs], &lo.uv_k_h, &hi.uv_k_h)
                && within(&c.uv_k_v[..cfg.num_chroma_coeffs], &lo.uv_k_v, &hi.uv_k_v)
        })
    }

    /// Sampler coefficient table: per phase, every tap as a fixed-point dword.
    pub fn encode_table(&self) -> Vec<u8> {
        let cfg = &self.config;
        let per_phase = 2 * (cfg.num_luma_coeffs + cfg.num_chroma_coeffs);
        let mut w = DwordWriter::with_capacity(self.coeffs.len() * per_phase * 4);
        let bits = cfg.coeff_frac_bits;
        for c in &self.coeffs {
            let taps = c.y_k_h[..cfg.num_luma_coeffs]
                .iter()
                .chain(&c.y_k_v[..cfg.num_luma_coeffs])
                .chain(&c.uv_k_h[..cfg.num_chroma_coeffs])
                .chain(&c.uv_k_v[..cfg.num_chroma_coeffs]);
            for &t in taps {
                w.i32(crate::foundation::math::to_fixed(t, bits));
            }
        }
        w.finish()
    }
}

/// High-quality scaling modes need the AVS module rather than bilinear sampling.
pub fn avs_is_needed(flags: FilterFlags) -> bool {
    matches!(
        flags.scaling(),
        FilterFlags::SCALING_HQ | FilterFlags::SCALING_NL_ANAMORPHIC
    )
}

#[cfg(test)]
#[path = "../tests/unit/avs.rs"]
mod tests;
