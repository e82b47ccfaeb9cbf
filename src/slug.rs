use sha2::{Digest, Sha256};

const MAX_SLUG_CHARS: usize = 50;

/// Convert a project name into a filesystem-safe directory name.
///
/// `"My Project"` → `my-project--0b3c1f5a`
///
/// The readable part is lowercased, non-alphanumerics become hyphens, runs
/// collapse, and the result is capped at 50 chars. A short hash of the
/// original name is always appended so that names which slug to the same
/// prefix (unicode-only names, case-only differences) still map to distinct
/// directories.
pub fn sanitize(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let trimmed: String = slug
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-");
    let truncated: String = trimmed.chars().take(MAX_SLUG_CHARS).collect();
    let readable = if truncated.is_empty() {
        "unnamed"
    } else {
        truncated.as_str()
    };
    format!("{}--{}", readable, short_hash(name))
}

fn short_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}
