//! Rule validation utilities.
//!
//! Skim patterns and keep rules are regular expressions evaluated by the
//! native runner with ECMAScript syntax. Only the shape of a keep rule is
//! enforced here. Patterns are compiled with the `regex` crate as a best
//! effort; look-around and backreferences are valid for the runner but not
//! for `regex`, so a pattern it cannot parse is logged and kept.

use crate::error::{ConfigError, Result};
use crate::process::SkimRule;
use log::warn;
use regex::Regex;

/// Whether `pattern` could be verified, logging a warning when it could not
fn check_pattern(rule: &str, pattern: &str) -> bool {
    match Regex::new(pattern) {
        Ok(_) => true,
        Err(e) => {
            warn!("Could not verify pattern '{}' of rule '{}': {}", pattern, rule, e);
            false
        }
    }
}

/// Check every skim name and label pattern.
///
/// Returns the number of patterns that could not be verified.
///
/// # Examples
/// ```
/// use ldmxcfg::process::SkimRule;
/// use ldmxcfg::utils::validate_skim_rules;
///
/// assert_eq!(validate_skim_rules(&[SkimRule::new("ecalVeto", "")]), 0);
/// assert_eq!(validate_skim_rules(&[SkimRule::new("ecal(Veto", "")]), 1);
/// ```
pub fn validate_skim_rules(rules: &[SkimRule]) -> usize {
    let mut unverified = 0;
    for rule in rules {
        if !check_pattern(&rule.name_pattern, &rule.name_pattern) {
            unverified += 1;
        }
        if !rule.matches_any_label() && !check_pattern(&rule.label_pattern, &rule.label_pattern) {
            unverified += 1;
        }
    }
    unverified
}

/// Check keep rules of the form `keep <regex>` or `drop <regex>`.
///
/// A missing pattern or an unknown decision word is an error. Returns the
/// number of patterns that could not be verified.
pub fn validate_keep_rules(rules: &[String]) -> Result<usize> {
    let mut unverified = 0;
    for rule in rules {
        let trimmed = rule.trim();
        let (decision, pattern) = trimmed.split_once(char::is_whitespace).ok_or_else(|| {
            ConfigError::InvalidRule {
                rule: rule.clone(),
                reason: "expected 'keep <pattern>' or 'drop <pattern>'".to_string(),
            }
        })?;
        if !matches!(decision.to_lowercase().as_str(), "keep" | "drop") {
            return Err(ConfigError::InvalidRule {
                rule: rule.clone(),
                reason: format!("unknown decision '{}'", decision),
            });
        }
        if !check_pattern(rule, pattern.trim()) {
            unverified += 1;
        }
    }
    Ok(unverified)
}
