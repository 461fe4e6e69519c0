//! Title normalization
//!
//! Pure string transforms producing comparable forms of a media-server title.

/// Movie-release prefixes, checked in this order
const PREFIXES: [&str; 4] = ["Eiga ", "Gekijouban ", "Movie: ", "The Movie"];

/// Movie-release suffixes, checked in this order
const SUFFIXES: [&str; 3] = [" (Movie)", " Movie", " - Movie"];

/// Separators that end the main title; the earliest one in the string wins
const SEPARATORS: [&str; 4] = [": ", " - ", " (", " ["];

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// One normalization pass
///
/// Trims whitespace and quotes, then strips each known prefix (in list
/// order, re-trimming after each), then each known suffix.
fn clean_once(title: &str) -> String {
    let mut title = title.trim().trim_matches(is_quote);

    for prefix in PREFIXES {
        if let Some(rest) = title.strip_prefix(prefix) {
            title = rest.trim();
        }
    }

    for suffix in SUFFIXES {
        if let Some(rest) = title.strip_suffix(suffix) {
            title = rest.trim();
        }
    }

    title.to_string()
}

/// Canonical form of a raw display title
///
/// The pass is repeated until the title stops changing, so the result is a
/// fixed point: `clean_title(&clean_title(x)) == clean_title(x)`. Case is
/// preserved and prefix/suffix matching is case-sensitive.
pub fn clean_title(title: &str) -> String {
    let mut current = clean_once(title);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Main title: the cleaned title cut at its first separator
///
/// Returns the cleaned title unchanged when no separator occurs.
pub fn main_title(title: &str) -> String {
    let cleaned = clean_title(title);

    let cut = SEPARATORS
        .iter()
        .filter_map(|sep| cleaned.find(sep))
        .min();

    match cut {
        Some(idx) => cleaned[..idx].trim().to_string(),
        None => cleaned,
    }
}
