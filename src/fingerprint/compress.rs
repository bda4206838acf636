//! Chromaprint fingerprint compression.
//!
//! Produces the same byte layout as `chromaprint_encode_fingerprint`, so the
//! base64 text from [`encode`] is interchangeable with `fpcalc` output and
//! accepted by AcoustID:
//!
//! ```text
//! [algorithm:1][item count:3 BE][normal bits: packed int3][exceptional bits: packed int5]
//! ```
//!
//! Every sub-fingerprint is XORed with its predecessor; the positions of the
//! set bits are stored as deltas, terminated by a zero. Deltas of 7 or more
//! spill their excess into the exceptional array.

use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine};

const NORMAL_BITS: u32 = 3;
const EXCEPTIONAL_BITS: u32 = 5;
const MAX_NORMAL_VALUE: u8 = (1 << NORMAL_BITS) - 1;

/// Compress a raw fingerprint for `algorithm`.
pub fn compress(fingerprint: &[u32], algorithm: u8) -> Vec<u8> {
    let mut normal = Vec::with_capacity(fingerprint.len() * 4);
    let mut exceptional = Vec::new();

    let mut previous = 0u32;
    for &item in fingerprint {
        push_bit_deltas(item ^ previous, &mut normal, &mut exceptional);
        previous = item;
    }

    let size = fingerprint.len();
    let mut output = Vec::with_capacity(
        4 + packed_len(normal.len(), NORMAL_BITS) + packed_len(exceptional.len(), EXCEPTIONAL_BITS),
    );
    output.push(algorithm);
    output.push(((size >> 16) & 0xFF) as u8);
    output.push(((size >> 8) & 0xFF) as u8);
    output.push((size & 0xFF) as u8);
    pack(&normal, NORMAL_BITS, &mut output);
    pack(&exceptional, EXCEPTIONAL_BITS, &mut output);
    output
}

/// Compress and base64-encode (URL-safe alphabet, no padding).
pub fn encode(fingerprint: &[u32], algorithm: u8) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(compress(fingerprint, algorithm))
}

fn push_bit_deltas(mut x: u32, normal: &mut Vec<u8>, exceptional: &mut Vec<u8>) {
    let mut bit = 1u8;
    let mut last_bit = 0u8;
    while x != 0 {
        if x & 1 != 0 {
            let delta = bit - last_bit;
            if delta >= MAX_NORMAL_VALUE {
                normal.push(MAX_NORMAL_VALUE);
                exceptional.push(delta - MAX_NORMAL_VALUE);
            } else {
                normal.push(delta);
            }
            last_bit = bit;
        }
        x >>= 1;
        bit += 1;
    }
    normal.push(0);
}

fn packed_len(count: usize, bits: u32) -> usize {
    (count * bits as usize).div_ceil(8)
}

/// Packs `bits`-wide values least-significant bit first.
fn pack(values: &[u8], bits: u32, out: &mut Vec<u8>) {
    let mask = (1u32 << bits) - 1;
    let mut acc = 0u32;
    let mut filled = 0u32;
    for &value in values {
        acc |= (u32::from(value) & mask) << filled;
        filled += bits;
        while filled >= 8 {
            out.push((acc & 0xFF) as u8);
            acc >>= 8;
            filled -= 8;
        }
    }
    if filled > 0 {
        out.push((acc & 0xFF) as u8);
    }
}
