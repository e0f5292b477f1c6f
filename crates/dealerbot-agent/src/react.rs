//! ReAct text protocol — parsing model output and keeping the scratchpad.
//!
//! The model answers in line-oriented blocks:
//!
//! ```text
//! Thought: ...
//! Action: <tool name>
//! Action Input: <free text>
//! ```
//!
//! or
//!
//! ```text
//! Thought: ...
//! Final Answer: <text for the customer>
//! ```
//!
//! Markers are matched case-sensitively at the start of a trimmed line.
//! When both shapes appear in one response, the final answer wins.

use thiserror::Error;

const THOUGHT: &str = "Thought:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const OBSERVATION: &str = "Observation:";
const FINAL_ANSWER: &str = "Final Answer:";

/// Why a response could not be parsed into a step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Missing tool name after 'Action:'")]
    MissingToolName,

    #[error("Missing text after 'Final Answer:'")]
    EmptyFinalAnswer,
}

impl ParseError {
    /// Observation fed back to the model so it can correct itself.
    pub fn corrective_observation(&self) -> String {
        format!(
            "Invalid Format: {self}. Check your output and make sure it conforms to the format instructions."
        )
    }
}

/// One classified model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasoningStep {
    Action {
        thought: String,
        tool_name: String,
        tool_input: String,
    },
    FinalAnswer {
        thought: String,
        text: String,
    },
    Malformed(ParseError),
}

// ─────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────

fn is_marker(line: &str) -> bool {
    [THOUGHT, ACTION, ACTION_INPUT, OBSERVATION, FINAL_ANSWER]
        .iter()
        .any(|m| line.starts_with(m))
}

/// Text before the marker line at `end`, minus a leading `Thought:`.
fn thought_before(lines: &[&str], end: usize) -> String {
    let text = lines[..end].join("\n");
    let text = text.trim();
    text.strip_prefix(THOUGHT).unwrap_or(text).trim().to_string()
}

/// `first` plus following lines up to the next marker line.
fn block_from(first: &str, rest: &[&str]) -> String {
    let mut parts = vec![first];
    parts.extend(rest.iter().take_while(|l| !is_marker(l)).copied());
    parts.join("\n").trim().to_string()
}

/// Strip one pair of surrounding double quotes.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// The model's own text, cut before any `Observation:` line it wrote itself.
fn own_text(raw: &str) -> String {
    raw.lines()
        .take_while(|l| !l.trim_start().starts_with(OBSERVATION))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Classify one model response.
pub fn parse_step(raw: &str) -> ReasoningStep {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();

    // Anything from a (hallucinated) observation onward is not the model's step.
    let end = lines
        .iter()
        .position(|l| l.starts_with(OBSERVATION))
        .unwrap_or(lines.len());
    let lines = &lines[..end];

    if let Some(i) = lines.iter().position(|l| l.starts_with(FINAL_ANSWER)) {
        let first = &lines[i][FINAL_ANSWER.len()..];
        let text = block_from(first, &lines[i + 1..]);
        if text.is_empty() {
            return ReasoningStep::Malformed(ParseError::EmptyFinalAnswer);
        }
        return ReasoningStep::FinalAnswer {
            thought: thought_before(lines, i),
            text,
        };
    }

    // "Action Input:" also starts with "Action", so test it first.
    let Some(a) = lines
        .iter()
        .position(|l| l.starts_with(ACTION) && !l.starts_with(ACTION_INPUT))
    else {
        return ReasoningStep::Malformed(ParseError::MissingAction);
    };

    let tool_name = lines[a][ACTION.len()..].trim().trim_matches('`').trim();
    if tool_name.is_empty() {
        return ReasoningStep::Malformed(ParseError::MissingToolName);
    }

    let tool_input = lines[a + 1..]
        .iter()
        .position(|l| l.starts_with(ACTION_INPUT))
        .map(|offset| {
            let i = a + 1 + offset;
            block_from(&lines[i][ACTION_INPUT.len()..], &lines[i + 1..])
        })
        .unwrap_or_default();

    ReasoningStep::Action {
        thought: thought_before(lines, a),
        tool_name: tool_name.to_string(),
        tool_input: unquote(&tool_input).to_string(),
    }
}

// ─────────────────────────────────────────────
// Transcript (scratchpad)
// ─────────────────────────────────────────────

/// One completed Thought → Action → Observation round.
///
/// `action` is `None` for corrective rounds where no tool ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub log: String,
    pub action: Option<(String, String)>,
    pub observation: String,
}

/// Ordered rounds for a single turn; discarded when the turn ends.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a round where a tool ran.
    pub fn record_action(
        &mut self,
        log: &str,
        tool_name: &str,
        tool_input: &str,
        observation: impl Into<String>,
    ) {
        self.entries.push(TranscriptEntry {
            log: own_text(log),
            action: Some((tool_name.to_string(), tool_input.to_string())),
            observation: observation.into(),
        });
    }

    /// Record a round where the output was rejected.
    pub fn record_correction(&mut self, log: &str, observation: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            log: own_text(log),
            action: None,
            observation: observation.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scratchpad text appended after the prompt.
    ///
    /// Each round replays the model's own output and its observation, then
    /// primes the next `Thought:`.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}\n{OBSERVATION} {}\n{THOUGHT} ", e.log, e.observation))
            .collect()
    }
}
