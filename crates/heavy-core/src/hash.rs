//! Receiver and table name hashing.
//!
//! Every receiver, table and symbol is identified at runtime by a 32-bit hash of
//! its declared name. Host adapters compute the same hash to address the patch,
//! so the function below is a wire format: it must stay bit-exact.
//!
//! The algorithm is a MurmurHash2 variant seeded with the byte length of the
//! input. Words are read little-endian, the tail is folded in byte by byte, and a
//! final avalanche mixes the result.
//!
//! # Example
//!
//! ```rust
//! use heavy_core::hash::string_to_hash;
//!
//! const FREQ: u32 = string_to_hash("freq");
//! assert_eq!(FREQ, 0x345F_C008);
//! ```

const M: u32 = 0x5bd1_e995;
const R: u32 = 24;

/// Hash of the reserved load-bang receiver, fired once when a context is built.
pub const INIT_RECEIVER_HASH: u32 = string_to_hash("__hv_init");

/// Hash value used for a Bang element.
pub const BANG_HASH: u32 = 0xFFFF_FFFF;

/// Hashes a name. Usable in `const` items.
pub const fn string_to_hash(name: &str) -> u32 {
    hash_bytes(name.as_bytes())
}

/// Hashes raw bytes with the length-seeded MurmurHash2 variant.
pub const fn hash_bytes(bytes: &[u8]) -> u32 {
    let len = bytes.len();
    let mut h = len as u32;
    let mut i = 0;

    while i + 4 <= len {
        let mut k = (bytes[i] as u32)
            | ((bytes[i + 1] as u32) << 8)
            | ((bytes[i + 2] as u32) << 16)
            | ((bytes[i + 3] as u32) << 24);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
        i += 4;
    }

    let tail = len - i;
    if tail >= 3 {
        h ^= (bytes[i + 2] as u32) << 16;
    }
    if tail >= 2 {
        h ^= (bytes[i + 1] as u32) << 8;
    }
    if tail >= 1 {
        h ^= bytes[i] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

/// Hash of a float element: its IEEE-754 bit pattern.
#[inline]
pub fn float_hash(value: f32) -> u32 {
    value.to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(string_to_hash(""), 0x0000_0000);
        assert_eq!(string_to_hash("a"), 0x9268_5F5E);
        assert_eq!(string_to_hash("ab"), 0x1AA1_4063);
        assert_eq!(string_to_hash("abc"), 0x1357_7C9B);
        assert_eq!(string_to_hash("abcd"), 0x2687_3021);
        assert_eq!(string_to_hash("freq"), 0x345F_C008);
        assert_eq!(string_to_hash("gain"), 0x811C_C33F);
        assert_eq!(string_to_hash("samplerate"), 0x8A83_DA69);
    }

    #[test]
    fn init_receiver_constant() {
        assert_eq!(INIT_RECEIVER_HASH, 0xCE5C_C65B);
    }

    #[test]
    fn control_symbols() {
        assert_eq!(string_to_hash("flush"), 0x6974_723D);
        assert_eq!(string_to_hash("clear"), 0x47BE_8354);
        assert_eq!(string_to_hash("stop"), 0x7A5B_032D);
        assert_eq!(string_to_hash("set"), 0x3E00_4DAB);
        assert_eq!(string_to_hash("table"), 0x1443_F360);
    }

    #[test]
    fn bytes_and_str_agree() {
        assert_eq!(hash_bytes(b"__hv_init"), string_to_hash("__hv_init"));
    }

    #[test]
    fn float_hash_is_bit_pattern() {
        assert_eq!(float_hash(1.0), 0x3F80_0000);
        assert_eq!(float_hash(0.0), 0);
    }
}
