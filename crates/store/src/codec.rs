//! Binary vector codec.
//!
//! Encodes a vector of double-precision floats to the canonical byte layout
//! expected by backends that take vectors as opaque binary query parameters:
//! little-endian, 8 bytes per element, element order preserved. This exact
//! layout is a wire-compatibility contract with the remote search engine;
//! a wrong endianness or element width silently corrupts KNN ranking
//! without raising an error.

use vecstore_core::{AppError, AppResult};

/// Encode a vector into its little-endian byte layout.
pub fn encode(vector: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 8);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode the exact inverse of [`encode`].
///
/// The only validation is that the byte length is a multiple of 8.
pub fn decode(bytes: &[u8]) -> AppResult<Vec<f64>> {
    if bytes.len() % 8 != 0 {
        return Err(AppError::Serialization(format!(
            "Vector byte length {} is not a multiple of 8",
            bytes.len()
        )));
    }

    let mut vector = Vec::with_capacity(bytes.len() / 8);
    for chunk in bytes.chunks_exact(8) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        vector.push(f64::from_le_bytes(buf));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(vector: &[f64]) {
        let bytes = encode(vector);
        assert_eq!(bytes.len(), vector.len() * 8);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.len(), vector.len());
        // Bit-for-bit, not approximate: NaN payloads and signed zeros must
        // survive
        for (a, b) in vector.iter().zip(decoded.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_round_trip_empty() {
        round_trip(&[]);
    }

    #[test]
    fn test_round_trip_single() {
        round_trip(&[std::f64::consts::PI]);
    }

    #[test]
    fn test_round_trip_many() {
        let vector: Vec<f64> = (0..1024).map(|i| (i as f64) * 0.125 - 64.0).collect();
        round_trip(&vector);
    }

    #[test]
    fn test_round_trip_special_values() {
        round_trip(&[
            0.0,
            -0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
            f64::MIN_POSITIVE,
            f64::MAX,
        ]);
    }

    #[test]
    fn test_little_endian_layout() {
        // 1.0f64 is 0x3FF0000000000000; least significant byte first
        assert_eq!(
            encode(&[1.0]),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F]
        );
    }

    #[test]
    fn test_element_order_preserved() {
        let bytes = encode(&[1.0, 2.0]);
        assert_eq!(decode(&bytes[..8]).unwrap(), vec![1.0]);
        assert_eq!(decode(&bytes[8..]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_decode_rejects_ragged_input() {
        let err = decode(&[0u8; 7]).unwrap_err();
        assert!(err.to_string().contains("multiple of 8"));
    }
}
