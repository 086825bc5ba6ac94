/// Typewriter reveal — the timed, character-by-character display of one
/// line, polled cooperatively and cancellable.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::core::config::DialogueConfig;
use crate::core::host::Presenter;

/// How a reveal ended. Every task yields exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Skipped,
}

/// Per-character tick sound with a random pitch.
#[derive(Debug, Clone)]
pub struct TickVoice {
    rng: StdRng,
    pitch: (f32, f32),
    enabled: bool,
}

impl TickVoice {
    pub fn new(config: &DialogueConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            pitch: config.tick_pitch,
            enabled: config.tick_sound,
        }
    }

    pub fn silent() -> Self {
        Self {
            rng: StdRng::seed_from_u64(0),
            pitch: (1.0, 1.0),
            enabled: false,
        }
    }

    fn play(&mut self, presenter: &mut dyn Presenter) {
        if !self.enabled {
            return;
        }
        let (lo, hi) = self.pitch;
        let pitch = if lo < hi {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        };
        presenter.play_reveal_tick(pitch);
    }
}

/// One in-flight reveal. Not restartable: a new line gets a new task.
///
/// The first character is shown when the task starts, then one more
/// every `interval`; the task is ready to complete one interval after the
/// last character. `finish` and `cancel` both consume the task, so its
/// completion can be observed only once.
#[derive(Debug)]
pub struct RevealTask {
    text: String,
    /// Byte offset just past each character.
    ends: Vec<usize>,
    shown: usize,
    interval: Duration,
    waited: Duration,
}

impl RevealTask {
    /// Clear the text buffer and show the first character.
    pub fn start(
        text: &str,
        interval: Duration,
        presenter: &mut dyn Presenter,
        voice: &mut TickVoice,
    ) -> Self {
        let ends = text
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();
        let mut task = Self {
            text: text.to_string(),
            ends,
            shown: 0,
            interval,
            waited: Duration::ZERO,
        };
        presenter.show_partial_text("");
        task.reveal_next(presenter, voice);
        task
    }

    /// Advance the reveal by `elapsed`. Returns `true` once the task is
    /// ready to complete; the caller then calls [`RevealTask::finish`].
    pub fn poll(
        &mut self,
        elapsed: Duration,
        presenter: &mut dyn Presenter,
        voice: &mut TickVoice,
    ) -> bool {
        if self.ends.is_empty() {
            return true;
        }
        self.waited += elapsed;
        while self.waited >= self.interval {
            self.waited -= self.interval;
            if !self.reveal_next(presenter, voice) {
                return true;
            }
        }
        false
    }

    /// Natural completion.
    pub fn finish(self, presenter: &mut dyn Presenter) -> RevealOutcome {
        presenter.show_full_text(&self.text);
        RevealOutcome::Completed
    }

    /// Skip: force the full line into the buffer in one call.
    pub fn cancel(self, presenter: &mut dyn Presenter) -> RevealOutcome {
        presenter.show_full_text(&self.text);
        RevealOutcome::Skipped
    }

    pub fn is_fully_shown(&self) -> bool {
        self.shown == self.ends.len()
    }

    pub fn visible_text(&self) -> &str {
        match self.shown {
            0 => "",
            n => &self.text[..self.ends[n - 1]],
        }
    }

    fn reveal_next(&mut self, presenter: &mut dyn Presenter, voice: &mut TickVoice) -> bool {
        if self.is_fully_shown() {
            return false;
        }
        self.shown += 1;
        presenter.show_partial_text(self.visible_text());
        voice.play(presenter);
        true
    }
}
