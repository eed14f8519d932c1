use super::words::{ADJECTIVES, NOUNS, PREFIXES, SUFFIXES};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const HEX_BYTES: usize = 12;

/// Generates a fresh human-readable API key:
/// `{prefix}-{adj}-{noun}-{adj}-{HEX24}-{suffix}`.
///
/// All randomness comes from the OS CSPRNG; effective entropy is at least
/// 121 bits. The caller shows the key to the user exactly once and persists
/// only its hash.
pub fn generate_api_key() -> String {
    let mut picks = [0u8; 4];
    OsRng.fill_bytes(&mut picks);
    let mut hex_bytes = [0u8; HEX_BYTES];
    OsRng.fill_bytes(&mut hex_bytes);

    let mut hex = String::with_capacity(HEX_BYTES * 2);
    for byte in hex_bytes {
        hex.push_str(&format!("{byte:02X}"));
    }

    format!(
        "{}-{}-{}-{}-{}-{}",
        PREFIXES[(picks[0] & 0b11) as usize],
        ADJECTIVES[(picks[1] & 0x7f) as usize],
        NOUNS[(picks[2] & 0x7f) as usize],
        ADJECTIVES[(picks[3] & 0x7f) as usize],
        hex,
        SUFFIXES[((picks[0] >> 2) & 0b11) as usize],
    )
}

/// Accepts the six-segment word format or the legacy 64-hex form; rejects
/// any deviation.
pub fn is_valid_key_format(key: &str) -> bool {
    if is_legacy_format(key) {
        return true;
    }

    let segments: Vec<&str> = key.split('-').collect();
    if segments.len() != 6 {
        return false;
    }

    PREFIXES.contains(&segments[0])
        && ADJECTIVES.contains(&segments[1])
        && NOUNS.contains(&segments[2])
        && ADJECTIVES.contains(&segments[3])
        && is_hex24(segments[4])
        && SUFFIXES.contains(&segments[5])
}

fn is_legacy_format(key: &str) -> bool {
    key.len() == 64
        && key
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn is_hex24(segment: &str) -> bool {
    segment.len() == 24
        && segment
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

/// Both key formats hash identically: SHA-256 over the raw string, hex.
pub fn hash_api_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}
