//! Turning raw stream lines into the plain text classifiers look at.

/// Introduces a two-character formatting code (`§c`, `§l`, ...).
pub const FORMAT_MARKER: char = '§';

fn is_ansi_final_byte(ch: char) -> bool {
    ('@'..='~').contains(&ch)
}

/// Removes ANSI escape sequences, keeping only visible text.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            if let Some(next) = chars.next()
                && next == '['
            {
                for seq_char in chars.by_ref() {
                    if is_ansi_final_byte(seq_char) {
                        break;
                    }
                }
            }
            continue;
        }

        out.push(ch);
    }

    out
}

/// Removes every [`FORMAT_MARKER`] together with the character after it.
///
/// A marker directly following another marker starts a new code rather than
/// being consumed as the first one's argument, so `"§§a"` strips to `""`.
pub fn strip_formatting_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut escaped = false;

    for ch in text.chars() {
        if ch == FORMAT_MARKER {
            escaped = true;
        } else {
            if !escaped {
                out.push(ch);
            }
            escaped = false;
        }
    }

    out
}

/// The text a tab's classifier is evaluated against.
pub fn plain_text(raw: &str) -> String {
    strip_formatting_codes(&strip_ansi(raw))
}

#[cfg(test)]
mod tests {
    use super::{plain_text, strip_ansi, strip_formatting_codes};

    #[test]
    fn strip_ansi_removes_escape_sequences() {
        let text = "\u{1b}[2m2026-02-06\u{1b}[0m \u{1b}[31mERROR\u{1b}[0m line";
        assert_eq!(strip_ansi(text), "2026-02-06 ERROR line");
    }

    #[test]
    fn formatting_codes_are_removed_with_their_argument() {
        assert_eq!(strip_formatting_codes("§cred §lbold§r plain"), "red bold plain");
        assert_eq!(strip_formatting_codes("no codes"), "no codes");
    }

    #[test]
    fn dangling_and_doubled_markers_are_dropped() {
        assert_eq!(strip_formatting_codes("trailing§"), "trailing");
        assert_eq!(strip_formatting_codes("§§ab"), "b");
    }

    #[test]
    fn plain_text_strips_both_kinds() {
        assert_eq!(
            plain_text("\u{1b}[33m§6[Trade]§r wts\u{1b}[0m sword"),
            "[Trade] wts sword"
        );
    }
}
