//! Per-purpose model resolution (§4.4): every `Purpose` maps to its own
//! model, token budget, fixed reasoning effort, and timeout, configured
//! independently so a slow summary model never throttles the realtime
//! translation path.

use translate_config::{LlmConfig, PurposeModelConfig};
use translate_core::Purpose;

pub fn resolve(config: &LlmConfig, purpose: Purpose) -> &PurposeModelConfig {
    match purpose {
        Purpose::Translation => &config.translation,
        Purpose::Summary => &config.summary,
        Purpose::SummaryTranslate => &config.summary_translate,
        Purpose::UserTranslate => &config.user_translate,
        Purpose::Vocabulary => &config.vocabulary,
        Purpose::Report => &config.report,
    }
}

/// The gpt-5 model family only accepts the default sampling temperature
/// (§4.4 "gpt-5 family temperature override"); every other model uses a
/// low, deterministic-leaning temperature suited to translation.
pub fn temperature_for_model(model: &str) -> f32 {
    if model.starts_with("gpt-5") {
        1.0
    } else {
        0.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt5_family_forces_default_temperature() {
        assert_eq!(temperature_for_model("gpt-5"), 1.0);
        assert_eq!(temperature_for_model("gpt-5-mini"), 1.0);
        assert_eq!(temperature_for_model("gpt-4o"), 0.2);
    }

    #[test]
    fn resolve_picks_matching_purpose_config() {
        let config = LlmConfig::default();
        assert_eq!(resolve(&config, Purpose::Report).model, config.report.model);
        assert_eq!(
            resolve(&config, Purpose::Translation).model,
            config.translation.model
        );
    }
}
