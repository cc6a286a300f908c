// crates/courtside-ai/src/mock.rs
// ============================================================================
// Module: Deterministic Mock Provider
// Description: Structured fallback generation keyed on purpose and prompt.
// Purpose: Keep every AI-facing path testable without the external service.
// Dependencies: courtside-core, serde_json
// ============================================================================

//! ## Overview
//! The mock provider returns structured text keyed on `(purpose,
//! user_prompt)`. The interpreter path uses a small heuristic: a known rule
//! parameter name plus a number in the prompt becomes a parameter change;
//! anything else becomes a narrative-only effect. Tests run entirely on this
//! path, and production degrades to it when the external model is absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::hash::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use courtside_core::EffectDuration;
use courtside_core::EffectKind;
use courtside_core::EffectSpec;
use courtside_core::Generation;
use courtside_core::GenerationError;
use courtside_core::Interpretation;
use courtside_core::Purpose;
use courtside_core::RuleSet;
use courtside_core::RuleValue;
use courtside_core::TargetSelector;
use courtside_core::TextGenerator;
use courtside_core::UsageRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Model id reported by mock generations.
pub const MOCK_MODEL_ID: &str = "mock";

/// Phrases the mock classifier treats as injection attempts.
const INJECTION_MARKERS: &[&str] =
    &["ignore previous", "ignore all previous", "system prompt", "disregard the above"];

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Deterministic mock text provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    /// Stable fingerprint of a prompt for template suffixes.
    fn fingerprint(purpose: Purpose, user_prompt: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        purpose.as_str().hash(&mut hasher);
        user_prompt.hash(&mut hasher);
        hasher.finish()
    }

    /// Heuristic interpreter: parameter change when a known parameter and a
    /// number appear, narrative effect otherwise.
    fn interpret(user_prompt: &str) -> Interpretation {
        let lowered = user_prompt.to_lowercase();
        let parameter = RuleSet::parameter_names()
            .into_iter()
            .find(|name| lowered.contains(name) || lowered.contains(&name.replace('_', " ")));
        let number = lowered
            .split(|character: char| !character.is_ascii_digit() && character != '.')
            .filter(|token| !token.is_empty())
            .filter_map(|token| token.parse::<f64>().ok())
            .last();
        if let (Some(parameter), Some(number)) = (parameter, number) {
            let value = if number.fract() == 0.0 {
                RuleValue::Int(number as i64)
            } else {
                RuleValue::Float(number)
            };
            return Interpretation {
                summary: format!("Set {parameter} to {number}"),
                effects: vec![EffectSpec {
                    kind: EffectKind::ParameterChange,
                    name: format!("{parameter} change"),
                    hook_points: Vec::new(),
                    condition: None,
                    actions: Vec::new(),
                    scope: TargetSelector::League,
                    duration: EffectDuration::Permanent,
                    priority: 0,
                    parameter: Some(parameter.to_string()),
                    value: Some(value),
                }],
                confidence: 0.9,
                injection_flagged: false,
            };
        }
        Interpretation {
            summary: "Narrative flourish with no mechanical impact".to_string(),
            effects: vec![EffectSpec {
                kind: EffectKind::Narrative,
                name: "narrative flourish".to_string(),
                hook_points: Vec::new(),
                condition: None,
                actions: Vec::new(),
                scope: TargetSelector::League,
                duration: EffectDuration::Permanent,
                priority: 0,
                parameter: None,
                value: None,
            }],
            confidence: 0.6,
            injection_flagged: false,
        }
    }

    /// Generates the mock body text for a purpose.
    fn body(purpose: Purpose, user_prompt: &str) -> Result<String, GenerationError> {
        match purpose {
            Purpose::Interpreter => serde_json::to_string(&Self::interpret(user_prompt))
                .map_err(|err| GenerationError::Permanent(err.to_string())),
            Purpose::Classifier => {
                let lowered = user_prompt.to_lowercase();
                let flagged =
                    INJECTION_MARKERS.iter().any(|marker| lowered.contains(marker));
                Ok(if flagged { "FLAG".to_string() } else { "SAFE".to_string() })
            }
            Purpose::Commentary => Ok(format!(
                "The broadcast crew replays the sequence twice and still argues about it. \
                 [call #{:04x}]",
                Self::fingerprint(purpose, user_prompt) & 0xffff
            )),
            Purpose::ReportSim => Ok(format!(
                "Round recap: the games happened, the numbers are real, and the standings \
                 shifted accordingly. [sim #{:04x}]",
                Self::fingerprint(purpose, user_prompt) & 0xffff
            )),
            Purpose::ReportGov => Ok(format!(
                "Governance recap: proposals were weighed, tokens were spent, and the \
                 rulebook survived another window. [gov #{:04x}]",
                Self::fingerprint(purpose, user_prompt) & 0xffff
            )),
            Purpose::ReportPrivate => Ok(format!(
                "Confidential briefing: your team's outlook is exactly as good as the box \
                 scores say. [brief #{:04x}]",
                Self::fingerprint(purpose, user_prompt) & 0xffff
            )),
            Purpose::Evaluator => Ok("OK".to_string()),
        }
    }
}

impl TextGenerator for MockProvider {
    fn generate(
        &self,
        purpose: Purpose,
        _system_prompt: &str,
        user_prompt: &str,
        _max_tokens: u32,
    ) -> Result<Generation, GenerationError> {
        let text = Self::body(purpose, user_prompt)?;
        let usage = UsageRecord {
            purpose,
            model_id: MOCK_MODEL_ID.to_string(),
            input_tokens: user_prompt.len() as u64 / 4,
            output_tokens: text.len() as u64 / 4,
            cache_tokens: 0,
            latency_ms: 0,
        };
        Ok(Generation { text, usage })
    }
}
