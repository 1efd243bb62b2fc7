//! System prompt construction for translation jobs (§4.3). Deliberately
//! small: the gateway's per-purpose config already pins model, tokens,
//! and effort, so this only needs to state the language pair and the
//! output contract.

pub fn translation_system_prompt(src_lang: &str, tgt_lang: &str) -> String {
    format!(
        "You are a real-time lecture translator. Translate the following \
         text from {src_lang} to {tgt_lang}. Preserve meaning and register; \
         do not add commentary, labels, or quotation marks around the \
         output. Respond with only the translation."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_both_languages() {
        let prompt = translation_system_prompt("en", "es");
        assert!(prompt.contains("en"));
        assert!(prompt.contains("es"));
    }
}
