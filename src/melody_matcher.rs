//! Melody Matcher
//!
//! Octave-tolerant subsequence matching of a target melody against a note
//! timeline, with an edge-triggered "matched" signal.

use std::collections::VecDeque;

use crate::{note::Note, note_database::NoteDatabase, timeline::TimelineEntry};

/// Whether the target melody was fully found on the last evaluated cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MatchState {
    /// Some target notes are still missing from the timeline.
    #[default]
    Unmatched,
    /// Every target note was found, in order.
    Matched,
}

/// Result of one matching cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    /// `true` only on the cycle that moved the matcher from unmatched to
    /// matched.
    pub fired: bool,
    /// Target names consumed from the timeline this cycle, in target order.
    pub consumed: Vec<String>,
    /// Resolved target notes still waiting to be found.
    pub remaining: usize,
    /// The cycle was skipped: the target was empty or no name resolved.
    pub skipped: bool,
}

/// Two-state matcher: {Unmatched, Matched}. Only the Unmatched → Matched
/// transition fires.
#[derive(Debug, Clone, Default)]
pub struct MelodyMatcher {
    was_matched: bool,
}

impl MelodyMatcher {
    /// Create a matcher in the unmatched state.
    pub fn new() -> Self {
        Self::default()
    }

    /// State after the last non-skipped cycle.
    pub fn state(&self) -> MatchState {
        if self.was_matched {
            MatchState::Matched
        } else {
            MatchState::Unmatched
        }
    }

    /// Forget the previous match so the next full match fires again.
    pub fn reset(&mut self) {
        self.was_matched = false;
    }

    /// Scan `timeline` for the notes of `target`, in order.
    ///
    /// Names unknown to `db` are dropped. An empty target, or one where no
    /// name resolves, skips the cycle and leaves the state untouched.
    pub fn evaluate<S: AsRef<str>>(
        &mut self,
        db: &NoteDatabase,
        target: &[S],
        timeline: &[TimelineEntry],
    ) -> MatchOutcome {
        let mut queue: VecDeque<(&str, &Note)> = target
            .iter()
            .filter_map(|name| {
                let name = name.as_ref().trim();
                db.note_by_name(name).map(|note| (name, note))
            })
            .collect();

        if queue.is_empty() {
            if !target.is_empty() {
                log::warn!("none of the {} target note names are known", target.len());
            }
            return MatchOutcome {
                skipped: true,
                ..MatchOutcome::default()
            };
        }

        let mut consumed = Vec::new();
        for note in timeline.iter().flat_map(|entry| entry.notes.iter()) {
            match queue.front() {
                Some(&(name, front)) if note.equivalent_or_octave(front) => {
                    consumed.push(name.to_string());
                    queue.pop_front();
                }
                Some(_) => {}
                None => break,
            }
        }

        let complete = queue.is_empty();
        let fired = complete && !self.was_matched;
        if fired {
            log::debug!("melody matched: {}", consumed.join(" "));
        }
        self.was_matched = complete;

        MatchOutcome {
            fired,
            consumed,
            remaining: queue.len(),
            skipped: false,
        }
    }
}
