//! Text cleaning and file-name helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| {
    // Keep Latin alphanumerics, Hangul syllables, and whitespace.
    Regex::new(r"[^A-Za-z0-9가-힣\s]").expect("valid regex")
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip symbols and collapse whitespace before text is fed to a prompt.
pub fn clean_text(text: &str) -> String {
    let stripped = NON_WORD.replace_all(text, " ");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Filesystem-safe slug for a trend name: non-alphanumerics become underscores.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !slug.is_empty() {
            slug.push('_');
            last_was_sep = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_symbols_and_collapses_whitespace() {
        let cleaned = clean_text("Neuro-morphic   AI!!  (2030)\n\tchips");
        assert_eq!(cleaned, "Neuro morphic AI 2030 chips");
    }

    #[test]
    fn clean_keeps_hangul() {
        assert_eq!(clean_text("인공지능 — trends"), "인공지능 trends");
    }

    #[test]
    fn clean_empty_input() {
        assert_eq!(clean_text("  \n\t "), "");
    }

    #[test]
    fn slug_replaces_spaces() {
        assert_eq!(slugify("Synthetic Data"), "Synthetic_Data");
    }

    #[test]
    fn slug_collapses_runs_and_trims() {
        assert_eq!(slugify("  Edge / On-Device AI  "), "Edge_On_Device_AI");
        assert_eq!(slugify("AI?!"), "AI");
    }
}
