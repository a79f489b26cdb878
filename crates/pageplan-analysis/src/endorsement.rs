//! Multi-page endorsement continuation tracking.
//!
//! Signal priority, highest reliability first:
//!
//! 1. Form number match (+0.95, short-circuits) - "CA T3 53 02 15" printed
//!    on every page of the same form
//! 2. Explicit continuation text (+0.90)
//! 3. Mid-sentence start (+0.85)
//! 4. Section label sequence A,B,C -> D,E,F (+0.80)
//! 5. Content-continuity flag from layout metadata (+0.70)
//! 6. Consecutive page without a strong header (+0.50; +0.20 with one)
//! 7. Same policy number (+0.15)
//!
//! A page continues the active endorsement when the clamped sum reaches
//! 0.35. A fresh endorsement header with a different form number and no
//! explicit continuation always starts a new endorsement.

use pageplan_core::PageSignals;
use serde::Serialize;
use tracing::debug;

const ALPHA_SEQUENCE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Continuation threshold for the fused confidence score.
const CONTINUATION_THRESHOLD: f64 = 0.35;

/// Check whether `curr_labels` continues the label sequence of
/// `prev_labels`, either strictly (B -> C) or by bounded progression
/// (B -> G, at most 10 steps).
pub fn is_sequence_continuation(prev_labels: &[String], curr_labels: &[String]) -> (bool, String) {
    let (Some(prev_last), Some(curr_first)) = (prev_labels.last(), curr_labels.first()) else {
        return (false, String::new());
    };
    let prev_last = prev_last.to_uppercase();
    let curr_first = curr_first.to_uppercase();

    let alpha_index = |label: &str| ALPHA_SEQUENCE.find(label);
    if let (Some(prev_idx), Some(curr_idx)) = (alpha_index(&prev_last), alpha_index(&curr_first)) {
        if curr_idx == prev_idx + 1 {
            return (true, format!("Section sequence: {prev_last} -> {curr_first}"));
        }
        if curr_idx > prev_idx && curr_idx - prev_idx <= 10 {
            return (
                true,
                format!("Section progression: {prev_last} -> {curr_first}"),
            );
        }
    }

    if let (Ok(prev_num), Ok(curr_num)) = (prev_last.parse::<u32>(), curr_first.parse::<u32>()) {
        if curr_num == prev_num + 1 {
            return (true, format!("Section sequence: {prev_last} -> {curr_first}"));
        }
        if curr_num > prev_num && curr_num - prev_num <= 10 {
            return (
                true,
                format!("Section progression: {prev_last} -> {curr_first}"),
            );
        }
    }

    (false, String::new())
}

/// State for the endorsement currently being tracked.
#[derive(Debug, Clone, Serialize)]
pub struct EndorsementContext {
    /// Form number when known, else `ENDORSEMENT_PAGE_<n>`.
    pub endorsement_id: String,
    pub start_page: u32,
    pub policy_number: Option<String>,
    pub form_number: Option<String>,
    /// Section labels seen on the most recent page of this endorsement.
    pub last_section_labels: Vec<String>,
    pub pages_seen: Vec<u32>,
}

impl EndorsementContext {
    /// Score a page against this context.
    ///
    /// Rule order matters: the new-header rejection and the form-number
    /// short-circuit run before any additive scoring.
    fn continuation_candidate(&self, signals: &PageSignals) -> (bool, f64, String) {
        let metadata = &signals.additional_metadata;
        let has_strong_header = metadata
            .get("has_strong_header")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let content_continuity = metadata
            .get("content_continuity")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        // A new endorsement header means a new endorsement, unless the form
        // number matches or the page is explicitly marked as continuation.
        if signals.has_endorsement_header {
            let same_form = matches!(
                (&signals.form_number, &self.form_number),
                (Some(a), Some(b)) if a == b
            );
            if !same_form && signals.explicit_continuation.is_none() {
                return (
                    false,
                    0.0,
                    "New endorsement header detected - not a continuation".to_string(),
                );
            }
        }

        let mut confidence: f64 = 0.0;
        let mut reasons: Vec<String> = Vec::new();

        if let (Some(current), Some(tracked)) = (&signals.form_number, &self.form_number) {
            if current == tracked {
                confidence += 0.95;
                reasons.push(format!("Same form number: {current}"));
                return (true, confidence.min(1.0), reasons.join("; "));
            }
        }

        if let Some(continuation) = &signals.explicit_continuation {
            confidence += 0.90;
            reasons.push(format!("Explicit continuation: {continuation}"));
        }

        if signals.starts_mid_sentence {
            confidence += 0.85;
            let first_words: String = signals
                .first_line_text
                .as_deref()
                .unwrap_or("")
                .chars()
                .take(50)
                .collect();
            reasons.push(format!("Mid-sentence start: '{first_words}...'"));
        }

        if !self.last_section_labels.is_empty() && !signals.section_labels.is_empty() {
            let (is_seq, seq_reason) =
                is_sequence_continuation(&self.last_section_labels, &signals.section_labels);
            if is_seq {
                confidence += 0.80;
                reasons.push(seq_reason);
            }
        }

        if content_continuity {
            confidence += 0.70;
            reasons.push("Content continuity pattern detected".to_string());
        }

        if self
            .pages_seen
            .last()
            .is_some_and(|last| signals.page_number == last + 1)
        {
            if !has_strong_header && !signals.has_endorsement_header {
                confidence += 0.50;
                reasons.push("Consecutive page without strong header".to_string());
            } else {
                confidence += 0.20;
                reasons.push("Consecutive page".to_string());
            }
        }

        if let (Some(current), Some(tracked)) = (&signals.policy_number, &self.policy_number) {
            if current == tracked {
                confidence += 0.15;
                reasons.push(format!("Same policy number: {tracked}"));
            }
        }

        let is_continuation = confidence >= CONTINUATION_THRESHOLD;
        let reasoning = if reasons.is_empty() {
            "No continuation signals".to_string()
        } else {
            reasons.join("; ")
        };
        (is_continuation, confidence.min(1.0), reasoning)
    }
}

/// Outcome of a continuation check against the active context.
#[derive(Debug, Clone)]
pub struct ContinuationCheck {
    pub is_continuation: bool,
    pub context: Option<EndorsementContext>,
    pub confidence: f64,
    pub reasoning: String,
}

/// Tracks at most one active endorsement across a document's pages.
#[derive(Debug, Default)]
pub struct EndorsementTracker {
    active_context: Option<EndorsementContext>,
    completed: Vec<EndorsementContext>,
}

impl EndorsementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state for a new document.
    pub fn reset(&mut self) {
        if let Some(ctx) = self.active_context.take() {
            self.completed.push(ctx);
        }
        self.completed.clear();
    }

    pub fn has_active_context(&self) -> bool {
        self.active_context.is_some()
    }

    pub fn active_endorsement_id(&self) -> Option<&str> {
        self.active_context.as_ref().map(|c| c.endorsement_id.as_str())
    }

    /// Close any active context and begin tracking a new endorsement.
    pub fn start_endorsement(&mut self, signals: &PageSignals) -> &EndorsementContext {
        if let Some(ctx) = self.active_context.take() {
            self.completed.push(ctx);
        }

        let endorsement_id = signals
            .form_number
            .clone()
            .unwrap_or_else(|| format!("ENDORSEMENT_PAGE_{}", signals.page_number));

        debug!(
            id = %endorsement_id,
            page = signals.page_number,
            form = signals.form_number.as_deref().unwrap_or(""),
            "started tracking endorsement"
        );

        self.active_context.insert(EndorsementContext {
            endorsement_id,
            start_page: signals.page_number,
            policy_number: signals.policy_number.clone(),
            form_number: signals.form_number.clone(),
            last_section_labels: signals.section_labels.clone(),
            pages_seen: vec![signals.page_number],
        })
    }

    /// Check whether a page continues the active endorsement and, if so,
    /// fold the page's signals into the context.
    pub fn check_continuation(&mut self, signals: &PageSignals) -> ContinuationCheck {
        let Some(ctx) = self.active_context.as_mut() else {
            return ContinuationCheck {
                is_continuation: false,
                context: None,
                confidence: 0.0,
                reasoning: "No active endorsement context".to_string(),
            };
        };

        let (is_continuation, confidence, reasoning) = ctx.continuation_candidate(signals);
        if !is_continuation {
            return ContinuationCheck {
                is_continuation: false,
                context: None,
                confidence,
                reasoning,
            };
        }

        ctx.pages_seen.push(signals.page_number);
        if !signals.section_labels.is_empty() {
            ctx.last_section_labels = signals.section_labels.clone();
        }
        if ctx.policy_number.is_none() {
            ctx.policy_number = signals.policy_number.clone();
        }
        if ctx.form_number.is_none() {
            if let Some(form) = &signals.form_number {
                ctx.form_number = Some(form.clone());
                // A page-based id is promoted once the real form is known.
                if ctx.endorsement_id.starts_with("ENDORSEMENT_PAGE_") {
                    ctx.endorsement_id = form.clone();
                    debug!(page = signals.page_number, form = %form, "promoted endorsement id");
                }
            }
        }

        debug!(
            page = signals.page_number,
            id = %ctx.endorsement_id,
            confidence,
            %reasoning,
            "endorsement continuation"
        );

        ContinuationCheck {
            is_continuation: true,
            context: Some(ctx.clone()),
            confidence,
            reasoning,
        }
    }

    /// All tracked endorsements, completed first, active last.
    pub fn endorsement_summary(&self) -> Vec<&EndorsementContext> {
        let mut all: Vec<&EndorsementContext> = self.completed.iter().collect();
        if let Some(active) = &self.active_context {
            all.push(active);
        }
        all
    }
}
