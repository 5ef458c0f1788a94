use sha2::{Digest, Sha256};

/// Windows-safe archive name: `{stem}_{timestamp}--{short_hash(content)}.txt`.
///
/// Characters that are not allowed in file names (the `:` of an RFC 3339
/// time in particular) become `-`.
pub fn archive_filename(stem: &str, timestamp: &str, content: &[u8]) -> String {
    let stamp: String = timestamp
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { '-' } else { c })
        .collect();
    format!("{stem}_{stamp}--{hash}.txt", hash = short_hash(content))
}

/// Appends `-{n}` before the extension, for the rare name collision.
pub fn with_counter(filename: &str, n: u32) -> String {
    match filename.rsplit_once('.') {
        Some((base, ext)) => format!("{base}-{n}.{ext}"),
        None => format!("{filename}-{n}"),
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' | '\0'..='\u{1F}'
    )
}

fn short_hash(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
