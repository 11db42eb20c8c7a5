/// Round `value` up to a multiple of `alignment` (> 0), saturating on overflow.
pub fn align_up(value: u32, alignment: u32) -> u32 {
    debug_assert!(alignment > 0);
    match value.checked_add(alignment - 1) {
        Some(v) => v / alignment * alignment,
        None => u32::MAX / alignment * alignment,
    }
}

/// Round `value` down to a multiple of `alignment` (> 0).
pub fn align_down(value: u32, alignment: u32) -> u32 {
    debug_assert!(alignment > 0);
    value / alignment * alignment
}

/// `usize` flavour of [`align_up`] for byte offsets.
pub fn align_up_usize(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment > 0);
    match value.checked_add(alignment - 1) {
        Some(v) => v / alignment * alignment,
        None => usize::MAX / alignment * alignment,
    }
}

/// Convert `value` to signed fixed point with `frac_bits` fractional bits, rounding to nearest.
pub fn to_fixed(value: f32, frac_bits: u32) -> i32 {
    (value * (1u32 << frac_bits) as f32).round() as i32
}

/// Little-endian dword writer for GPU state records.
#[derive(Default, Debug)]
pub(crate) struct DwordWriter {
    buf: Vec<u8>,
}

impl DwordWriter {
    pub(crate) fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
        }
    }

    pub(crate) fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Zero-pad to `len` bytes; never truncates.
    pub(crate) fn pad_to(&mut self, len: usize) -> &mut Self {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
