//! Safe filename generation utilities

use regex::Regex;

/// Convert a remote title to a safe filename stem.
///
/// Replaces every occurrence of a character that is invalid in a Windows
/// path, plus dots, with `_`. The replacement is total: a title never
/// contributes any of `\ / * ? : < > | " .` to the output path.
pub fn sanitize_title(title: &str) -> String {
    let invalid_chars = Regex::new(r#"[\\/*?:<>|".]"#).unwrap();
    let mut safe_title = invalid_chars.replace_all(title, "_").to_string();

    // Limit length (Windows has 255 char limit, be conservative)
    if safe_title.len() > 200 {
        let mut cut = 200;
        while !safe_title.is_char_boundary(cut) {
            cut -= 1;
        }
        safe_title.truncate(cut);
        safe_title = safe_title.trim_end().to_string();
    }

    safe_title
}

/// Fallback filename stem used when metadata resolution fails: the current
/// Unix time in milliseconds, so the pipeline never produces an empty name.
pub fn fallback_title() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_every_invalid_char() {
        assert_eq!(sanitize_title(r#"a\b/c*d?e:f<g>h|i"j.k"#), "a_b_c_d_e_f_g_h_i_j_k");
        // Global replace, not just the first occurrence
        assert_eq!(sanitize_title("a...b???c"), "a___b___c");
    }

    #[test]
    fn test_sanitize_keeps_ordinary_titles() {
        assert_eq!(sanitize_title("Plain Title 123"), "Plain Title 123");
        assert_eq!(sanitize_title("dashes-and_underscores"), "dashes-and_underscores");
    }

    #[test]
    fn test_sanitize_output_contains_no_invalid_chars() {
        let out = sanitize_title(r#"Tricky: "name" <with> every/bad\char*?.ext"#);
        for c in ['\\', '/', '*', '?', ':', '<', '>', '|', '"', '.'] {
            assert!(!out.contains(c), "found {:?} in {:?}", c, out);
        }
    }

    #[test]
    fn test_sanitize_truncates_long_titles() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_title(&long).len(), 200);
    }

    #[test]
    fn test_fallback_title_is_numeric_and_nonempty() {
        let title = fallback_title();
        assert!(!title.is_empty());
        assert!(title.chars().all(|c| c.is_ascii_digit()));
        // Millisecond timestamps are 13 digits for the foreseeable future
        assert!(title.len() >= 13);
    }
}
