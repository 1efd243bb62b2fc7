//! Hygiene pass applied to raw model output before it reaches the
//! display manager (§4.4 "output hygiene"). Models occasionally wrap a
//! translation in quotes, a markdown fence, or a leading label even
//! when told not to; this strips the common forms without touching the
//! translated text itself.

pub fn clean_translation_output(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(stripped) = text.strip_prefix("```") {
        text = stripped
            .trim_start_matches(|c: char| c.is_alphanumeric())
            .trim_start_matches('\n');
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }

    text = strip_matched_quotes(text, '"', '"');
    text = strip_matched_quotes(text, '\u{201c}', '\u{201d}');
    text = strip_matched_quotes(text, '\'', '\'');

    for prefix in ["Translation:", "translation:", "Translated text:"] {
        if let Some(stripped) = text.strip_prefix(prefix) {
            text = stripped.trim_start();
        }
    }

    text.trim().to_string()
}

fn strip_matched_quotes(text: &str, open: char, close: char) -> &str {
    let mut chars = text.chars();
    if chars.next() == Some(open) {
        if let Some(rest) = text.strip_prefix(open) {
            if let Some(inner) = rest.strip_suffix(close) {
                if !inner.contains(open) && !inner.contains(close) {
                    return inner.trim();
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(clean_translation_output("\"hola mundo\""), "hola mundo");
    }

    #[test]
    fn strips_code_fence() {
        assert_eq!(clean_translation_output("```\nhola mundo\n```"), "hola mundo");
    }

    #[test]
    fn strips_label_prefix() {
        assert_eq!(clean_translation_output("Translation: hola mundo"), "hola mundo");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(clean_translation_output("hola mundo"), "hola mundo");
    }

    #[test]
    fn does_not_strip_internal_quotes() {
        let input = "he said \"hola\" to me";
        assert_eq!(clean_translation_output(input), input);
    }
}
