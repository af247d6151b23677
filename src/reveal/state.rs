use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RevealStatus {
    #[default]
    Idle,
    Revealing,
    Complete,
}

/// What a tick did to the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    Completed,
    /// The tick belongs to a schedule that has since been replaced or
    /// cancelled; nothing changed.
    Stale,
}

/// Text being revealed one character at a time.
#[derive(Debug, Clone, Default)]
pub struct RevealStream {
    pub status: RevealStatus,
    pub final_text: String,
    pub cadence: Duration,
    pub revealed_chars: usize,
    pub total_chars: usize,
    /// Byte offset matching `revealed_chars`.
    revealed_bytes: usize,
    /// Identity of the schedule allowed to advance this stream.
    generation: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevealSnapshot {
    pub status: RevealStatus,
    pub prefix: String,
    pub revealed_chars: usize,
    pub total_chars: usize,
}

impl RevealStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stream and returns the generation new ticks must carry.
    /// Empty text or a zero cadence completes at once.
    pub fn begin(&mut self, final_text: String, cadence: Duration) -> u64 {
        let total_chars = final_text.chars().count();
        let generation = self.generation.wrapping_add(1);
        let instant = total_chars == 0 || cadence.is_zero();

        *self = Self {
            status: if instant {
                RevealStatus::Complete
            } else {
                RevealStatus::Revealing
            },
            revealed_chars: if instant { total_chars } else { 0 },
            revealed_bytes: if instant { final_text.len() } else { 0 },
            final_text,
            cadence,
            total_chars,
            generation,
        };
        generation
    }

    pub fn advance(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation || self.status != RevealStatus::Revealing {
            return TickOutcome::Stale;
        }

        if let Some(next) = self.final_text[self.revealed_bytes..].chars().next() {
            self.revealed_bytes += next.len_utf8();
            self.revealed_chars += 1;
        }

        if self.revealed_chars >= self.total_chars {
            self.status = RevealStatus::Complete;
            TickOutcome::Completed
        } else {
            TickOutcome::Advanced
        }
    }

    /// Invalidates the running schedule. The revealed prefix stays visible.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.status == RevealStatus::Revealing {
            self.status = RevealStatus::Idle;
        }
    }

    pub fn prefix(&self) -> &str {
        &self.final_text[..self.revealed_bytes]
    }

    pub fn is_complete(&self) -> bool {
        self.status == RevealStatus::Complete
    }

    pub fn snapshot(&self) -> RevealSnapshot {
        RevealSnapshot {
            status: self.status,
            prefix: self.prefix().to_string(),
            revealed_chars: self.revealed_chars,
            total_chars: self.total_chars,
        }
    }
}
