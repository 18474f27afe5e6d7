//! Timeline
//!
//! Turns the per-frame note readings of a [`NoteEventBuffer`](crate::NoteEventBuffer)
//! into note onsets: a note sustained across consecutive frames is reported
//! only at the instant it first appears.

use std::fmt::Display;

use crate::note::{Note, TimedNote};

/// Notes that started sounding at one observation instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    /// Host timestamp of the observation.
    pub time: f64,
    /// New notes, in the order they were detected (lowest frequency first).
    pub notes: Vec<Note>,
}

impl Display for TimelineEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "<{}>", self.time)?;
        for note in &self.notes {
            writeln!(f, "{note}")?;
        }
        Ok(())
    }
}

/// Build a fresh timeline snapshot from buffered notes (oldest first).
///
/// Consecutive entries sharing a timestamp form one group. The first group is
/// emitted whole; every later group contributes only the notes missing from
/// the group right before it, and is skipped if there are none.
pub fn aggregate<'a, I>(events: I) -> Vec<TimelineEntry>
where
    I: IntoIterator<Item = &'a TimedNote>,
{
    let mut timeline = Vec::new();
    let mut previous: Option<Vec<Note>> = None;
    let mut group: Vec<Note> = Vec::new();
    let mut group_time = 0.0;

    for event in events {
        if !group.is_empty() && event.time != group_time {
            flush(&mut timeline, &mut previous, group_time, std::mem::take(&mut group));
        }
        group_time = event.time;
        if !group.contains(&event.note) {
            group.push(event.note.clone());
        }
    }
    if !group.is_empty() {
        flush(&mut timeline, &mut previous, group_time, group);
    }
    timeline
}

#[inline]
fn flush(
    timeline: &mut Vec<TimelineEntry>,
    previous: &mut Option<Vec<Note>>,
    time: f64,
    group: Vec<Note>,
) {
    let notes: Vec<Note> = match previous.as_ref() {
        None => group.clone(),
        Some(prev) => group.iter().filter(|n| !prev.contains(n)).cloned().collect(),
    };
    if !notes.is_empty() {
        timeline.push(TimelineEntry { time, notes });
    }
    *previous = Some(group);
}
