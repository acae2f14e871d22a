use super::HexColorError;

const fn hex_digit(b: u8) -> u32 {
    match b {
        b'0'..=b'9' => (b - b'0') as u32,
        b'a'..=b'f' => (b - b'a' + 10) as u32,
        b'A'..=b'F' => (b - b'A' + 10) as u32,
        _ => panic!("invalid hex digit"),
    }
}

const fn prefix_len(bytes: &[u8]) -> usize {
    if !bytes.is_empty() && bytes[0] == b'#' {
        1
    } else if bytes.len() >= 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
        2
    } else {
        0
    }
}

/// Const-evaluable parser used by [`Color::from_hex`](crate::Color::from_hex).
pub const fn parse_packed(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let offset = prefix_len(bytes);
    assert!(bytes.len() - offset == 6, "expected 6 hex digits");

    let mut packed = 0;
    let mut i = offset;
    while i < bytes.len() {
        packed = (packed << 4) | hex_digit(bytes[i]);
        i += 1;
    }
    packed
}

const fn runtime_digit(b: u8, index: usize) -> Result<u32, HexColorError> {
    match b {
        b'0'..=b'9' => Ok((b - b'0') as u32),
        b'a'..=b'f' => Ok((b - b'a' + 10) as u32),
        b'A'..=b'F' => Ok((b - b'A' + 10) as u32),
        _ => Err(HexColorError::InvalidDigit(index)),
    }
}

pub fn parse_packed_runtime(s: &str) -> Result<u32, HexColorError> {
    let bytes = s.as_bytes();
    let offset = prefix_len(bytes);
    if bytes.len().saturating_sub(offset) != 6 {
        return Err(HexColorError::InvalidLength);
    }

    bytes[offset..]
        .iter()
        .enumerate()
        .try_fold(0, |packed, (i, &b)| {
            Ok((packed << 4) | runtime_digit(b, offset + i)?)
        })
}
