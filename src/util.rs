use sha2::Digest;

/// Truncate a string to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Short deterministic digest over the concatenation of parts.
pub fn short_digest(parts: &[&str], len: usize) -> String {
    let joined: String = parts.concat();
    let mut digest = sha256_hex(joined.as_bytes());
    digest.truncate(len);
    digest
}
