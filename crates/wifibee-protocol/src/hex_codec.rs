//! Hex framing for binary read-back.
//!
//! Raw packet bytes cannot travel over the prompt-scanned text channel, so the
//! firmware prints them as uppercase hex digit pairs between `|SOF|` and
//! `|EOF|`. The closing prompt starts with `|`, which is never a hex digit.

use crate::error::{ProtocolError, ProtocolResult};

/// Encode bytes as uppercase hex digit pairs, as the firmware prints them.
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode hex digit pairs. Upper and lower case digits are accepted.
pub fn decode_hex(digits: &[u8]) -> ProtocolResult<Vec<u8>> {
    hex::decode(digits).map_err(|err| match err {
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            ProtocolError::InvalidHexDigit { digit: c, index }
        }
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            ProtocolError::OddHexLength {
                digits: digits.len(),
            }
        }
    })
}

/// Whether `prompt` can terminate a hex stream without ambiguity.
pub fn is_hex_safe_prompt(prompt: &str) -> bool {
    prompt
        .as_bytes()
        .first()
        .map_or(false, |b| !b.is_ascii_hexdigit())
}

/// Decode the digits captured by one read-back pass.
///
/// `stored` holds the digits kept by the capture buffer, `total_digits` every
/// digit received before the closing prompt, kept or not. An odd total means
/// the stream was corrupted and is reported rather than silently rounded down.
/// If digits were dropped for lack of space, only the complete pairs that were
/// kept are decoded.
pub fn decode_readback(stored: &[u8], total_digits: usize) -> ProtocolResult<Vec<u8>> {
    if total_digits % 2 != 0 {
        return Err(ProtocolError::OddHexLength {
            digits: total_digits,
        });
    }

    let whole_pairs = stored.len() & !1;
    if whole_pairs < stored.len() {
        log::debug!(
            "read-back truncated mid-pair, discarding {} trailing digit",
            stored.len() - whole_pairs
        );
    }
    decode_hex(&stored[..whole_pairs])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EOF_PROMPT;

    #[test]
    fn test_three_byte_round_trip() {
        let data = [0x00, 0xFF, 0x0A];
        let encoded = encode_hex(&data);
        assert_eq!(encoded, "00FF0A");
        assert_eq!(decode_hex(encoded.as_bytes()).unwrap(), data.to_vec());
    }

    #[test]
    fn test_round_trip_all_byte_values() {
        let data: Vec<u8> = (0..=255).collect();
        let encoded = encode_hex(&data);
        assert_eq!(encoded.len(), 512);
        assert_eq!(decode_hex(encoded.as_bytes()).unwrap(), data);
    }

    #[test]
    fn test_odd_digit_count_is_an_error() {
        assert_eq!(
            decode_hex(b"00F"),
            Err(ProtocolError::OddHexLength { digits: 3 })
        );
        assert_eq!(
            decode_readback(b"00F", 3),
            Err(ProtocolError::OddHexLength { digits: 3 })
        );
    }

    #[test]
    fn test_invalid_digit_is_reported() {
        assert_eq!(
            decode_hex(b"0G"),
            Err(ProtocolError::InvalidHexDigit {
                digit: 'G',
                index: 1
            })
        );
    }

    #[test]
    fn test_readback_with_dropped_digits() {
        // Eight digits arrived but only five fit in the capture buffer.
        let decoded = decode_readback(b"01020", 8).unwrap();
        assert_eq!(decoded, vec![0x01, 0x02]);
    }

    #[test]
    fn test_prompt_safety() {
        assert!(is_hex_safe_prompt(EOF_PROMPT));
        assert!(!is_hex_safe_prompt("EOF"));
        assert!(!is_hex_safe_prompt(""));
    }
}
