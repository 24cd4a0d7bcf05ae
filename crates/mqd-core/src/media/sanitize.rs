//! Filename sanitization for titles coming from metadata.

/// Linux NAME_MAX.
pub(crate) const NAME_MAX: usize = 255;

/// Turns a media title into something safe to use as a file stem.
///
/// - Replaces NUL, `/`, `\` and control characters with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing spaces and dots
/// - Limits length to `max_len` bytes on a char boundary
pub fn sanitize_title(title: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_underscore = false;

    for c in title.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c == ' ' || c == '.' || c == '_');

    if trimmed.len() > max_len {
        let mut take = max_len;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_path_separators() {
        assert_eq!(sanitize_title("AC/DC \\ Live", NAME_MAX), "AC_DC _ Live");
    }

    #[test]
    fn keeps_spaces_inside_titles() {
        assert_eq!(sanitize_title("My Cat Video", NAME_MAX), "My Cat Video");
    }

    #[test]
    fn trims_dots_and_spaces() {
        assert_eq!(sanitize_title("  ..  clip  ..  ", NAME_MAX), "clip");
    }

    #[test]
    fn collapses_control_chars() {
        assert_eq!(sanitize_title("a\x00\x01\nb", NAME_MAX), "a_b");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let title = "é".repeat(10);
        let out = sanitize_title(&title, 5);
        assert_eq!(out, "éé");
    }
}
