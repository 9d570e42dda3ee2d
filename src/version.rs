//! Version tag handling for Docker image references.
//!
//! An image reference looks like `registry.example.com:5000/team/app:v1.0.3`.
//! The tag is whatever follows the last colon of the final path segment, so a
//! colon inside the registry host is never mistaken for a tag separator.

/// Tag used for a first deployment when the configuration carries none.
pub const DEFAULT_TAG: &str = "v1.0.0";

/// Returns the tag portion of an image reference, or `""` when it has none.
pub fn parse_tag(image_name: &str) -> &str {
    let basename_start = image_name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image_name[basename_start..].find(':') {
        Some(i) => &image_name[basename_start + i + 1..],
        None => "",
    }
}

/// Replaces (or appends) the tag of an image reference, leaving the
/// repository prefix untouched. An empty `tag` strips the tag entirely
/// rather than leaving a dangling colon.
pub fn set_tag(image_name: &str, tag: &str) -> String {
    let basename_start = image_name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let name_end = match image_name[basename_start..].find(':') {
        Some(i) => basename_start + i,
        None => image_name.len(),
    };
    if tag.is_empty() {
        image_name[..name_end].to_string()
    } else {
        format!("{}:{}", &image_name[..name_end], tag)
    }
}

/// Increments the trailing decimal run of a tag: `v1.0.9` becomes `v1.0.10`.
/// Tags without trailing digits are returned unchanged.
pub fn increment(tag: &str) -> String {
    let digits = tag.chars().rev().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return tag.to_string();
    }
    let run_start = tag.len() - digits;
    match tag[run_start..].parse::<u64>() {
        Ok(n) => format!("{}{}", &tag[..run_start], n + 1),
        // A digit run too long for u64 is left alone instead of wrapping.
        Err(_) => tag.to_string(),
    }
}
