//! Field offsets of vertex and edge records, and little-endian field codecs.
//!
//! ```text
//! Vertex: [first_in: u32][first_out: u32][x: f64][y: f64][z: f64][time: i32][radius: f64]
//! Edge:   [source: u32][target: u32][next_out: u32][prev_out: u32][next_in: u32][prev_in: u32]
//! ```
//!
//! Link fields hold slot indices, with [`NO_SLOT`](super::NO_SLOT) for "none".

const U32_SIZE: usize = 4;
const I32_SIZE: usize = 4;
const F64_SIZE: usize = 8;

/// Vertex record layout.
pub(crate) mod vertex {
    use super::{F64_SIZE, I32_SIZE, U32_SIZE};

    pub(crate) const FIRST_IN: usize = 0;
    pub(crate) const FIRST_OUT: usize = FIRST_IN + U32_SIZE;
    pub(crate) const X: usize = FIRST_OUT + U32_SIZE;
    pub(crate) const Y: usize = X + F64_SIZE;
    pub(crate) const Z: usize = Y + F64_SIZE;
    pub(crate) const TIME: usize = Z + F64_SIZE;
    pub(crate) const RADIUS: usize = TIME + I32_SIZE;
    pub(crate) const SIZE: usize = RADIUS + F64_SIZE;

    /// Position field offsets by dimension.
    pub(crate) const POSITION: [usize; 3] = [X, Y, Z];
}

/// Edge record layout.
pub(crate) mod edge {
    use super::U32_SIZE;

    pub(crate) const SOURCE: usize = 0;
    pub(crate) const TARGET: usize = SOURCE + U32_SIZE;
    pub(crate) const NEXT_OUT: usize = TARGET + U32_SIZE;
    pub(crate) const PREV_OUT: usize = NEXT_OUT + U32_SIZE;
    pub(crate) const NEXT_IN: usize = PREV_OUT + U32_SIZE;
    pub(crate) const PREV_IN: usize = NEXT_IN + U32_SIZE;
    pub(crate) const SIZE: usize = PREV_IN + U32_SIZE;
}

#[inline]
pub(crate) fn read_u32(record: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; U32_SIZE];
    buf.copy_from_slice(&record[offset..offset + U32_SIZE]);
    u32::from_le_bytes(buf)
}

#[inline]
pub(crate) fn write_u32(record: &mut [u8], offset: usize, value: u32) {
    record[offset..offset + U32_SIZE].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn read_i32(record: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; I32_SIZE];
    buf.copy_from_slice(&record[offset..offset + I32_SIZE]);
    i32::from_le_bytes(buf)
}

#[inline]
pub(crate) fn write_i32(record: &mut [u8], offset: usize, value: i32) {
    record[offset..offset + I32_SIZE].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn read_f64(record: &[u8], offset: usize) -> f64 {
    let mut buf = [0u8; F64_SIZE];
    buf.copy_from_slice(&record[offset..offset + F64_SIZE]);
    f64::from_le_bytes(buf)
}

#[inline]
pub(crate) fn write_f64(record: &mut [u8], offset: usize, value: f64) {
    record[offset..offset + F64_SIZE].copy_from_slice(&value.to_le_bytes());
}
