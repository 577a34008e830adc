//! Exit criteria for each phase.
//!
//! Validation never fails with an error value; every unmet criterion becomes a
//! message in [`ValidationResult::errors`] or [`ValidationResult::warnings`].

use crate::paths;
use crate::spec_state::SpecState;
use crate::types::Phase;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub phase: Phase,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn new(phase: Phase, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            phase,
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Check whether `feature` satisfies the exit criteria of `phase`.
///
/// The state file is read first; if it is missing or unreadable the result
/// carries that single error and nothing else.
pub fn validate(root: &Path, feature: &str, phase: Phase) -> ValidationResult {
    tracing::info!(feature, %phase, "validating phase");

    let state = match SpecState::load(root, feature) {
        Ok(state) => state,
        Err(e) => {
            return ValidationResult::new(
                phase,
                vec![format!(
                    "cannot read spec.json: {e} (create {} for the feature)",
                    paths::spec_state_path(root, feature).display()
                )],
                Vec::new(),
            );
        }
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let doc = paths::document_path(root, feature, phase);
    let doc_exists = doc.is_file();
    if !doc_exists {
        errors.push(format!(
            "{} has not been written (expected at {})",
            phase.filename(),
            doc.display()
        ));
    }

    if let Some(prev) = phase.prerequisite() {
        if !state.is_complete(prev) {
            errors.push(format!(
                "{prev} phase is not complete (prerequisite; run: specsync phase approve {feature} {prev})"
            ));
        }
    }

    match phase {
        Phase::Requirements | Phase::Design => {
            if state.page_id(phase).is_none() {
                errors.push(format!(
                    "no wiki page recorded for {phase} (run: specsync docs sync {feature} {phase})"
                ));
            }
            if phase == Phase::Requirements && state.space_key().is_none() {
                errors.push(format!(
                    "confluence.spaceKey is not recorded in spec.json (run: specsync docs sync {feature} {phase})"
                ));
            }
        }
        Phase::Tasks => {
            if doc_exists {
                match std::fs::read_to_string(&doc) {
                    Ok(text) => warnings.extend(readability_warnings(&text)),
                    Err(e) => errors.push(format!("cannot read {}: {e}", doc.display())),
                }
            }
            if state.epic_key().is_none() {
                errors.push(format!(
                    "no tracker epic recorded (run: specsync tracker sync {feature})"
                ));
            }
            match state.story_counts() {
                Some(counts) if counts.created > 0 => {
                    if counts.created < counts.total {
                        warnings.push(format!(
                            "only {}/{} stories exist in the tracker (run: specsync tracker sync {feature})",
                            counts.created, counts.total
                        ));
                    }
                }
                _ => errors.push(format!(
                    "no tracker stories recorded (run: specsync tracker sync {feature})"
                )),
            }
        }
    }

    if !state.is_complete(phase) {
        warnings.push(format!(
            "milestones.{phase}.completed is false (run: specsync phase approve {feature} {phase} once reviewed)"
        ));
    }

    let result = ValidationResult::new(phase, errors, warnings);
    tracing::info!(
        feature,
        %phase,
        valid = result.valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validation finished"
    );
    result
}

// ---------------------------------------------------------------------------
// Readability markers
// ---------------------------------------------------------------------------

fn weekday_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[(（](?:Mon|Tue|Wed|Thu|Fri|Sat|Sun|月|火|水|木|金|土|日)[)）]").unwrap()
    })
}

fn business_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bDay ?\d+\b").unwrap())
}

fn weekend_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)土日|weekends?").unwrap())
}

/// One warning per schedule marker missing from a tasks document.
pub fn readability_warnings(text: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if !weekday_re().is_match(text) {
        warnings.push("tasks.md has no day-of-week annotations, e.g. (Mon) or （月）".to_string());
    }
    if !business_day_re().is_match(text) {
        warnings.push("tasks.md has no business-day counters, e.g. Day 1".to_string());
    }
    if !weekend_re().is_match(text) {
        warnings.push("tasks.md does not state that weekends are excluded".to_string());
    }
    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
