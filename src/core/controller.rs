/// The conversation controller: the session state machine the host drives.
///
/// Wires together the bridge hooks, the typewriter reveal, tag dispatch
/// and choice presentation around one script runtime.
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

use crate::core::bridge::{AdvanceGate, ExternalBridge};
use crate::core::choices::{ChoicePresenter, ChoiceSlot};
use crate::core::config::DialogueConfig;
use crate::core::host::{HostServices, Presenter};
use crate::core::reveal::{RevealOutcome, RevealTask, TickVoice};
use crate::core::runtime::{ScriptError, ScriptRuntime};
use crate::core::tags::{TagContext, TagProcessor};
use crate::schema::line::{Choice, Line};
use crate::schema::value::ScriptValue;

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("a conversation session is already active")]
    SessionActive,
    #[error("no active conversation session")]
    NoSession,
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    Revealing,
    AwaitingAdvance,
    AwaitingChoice,
    SessionEnded,
}

/// Session phase. The reveal task lives inside `Revealing`, so a task
/// exists exactly when the session is revealing.
enum Phase {
    Idle,
    Revealing(RevealTask),
    AwaitingAdvance,
    AwaitingChoice,
    Ended { remaining: Duration },
}

struct ConversationSession {
    script: Rc<RefCell<dyn ScriptRuntime>>,
    services: HostServices,
    bridge: ExternalBridge,
    gate: Rc<AdvanceGate>,
    phase: Phase,
    line: Line,
    /// Set when a line starts, cleared once its tags have been applied.
    tags_pending: bool,
}

impl ConversationSession {
    fn state(&self) -> ConversationState {
        match self.phase {
            Phase::Idle => ConversationState::Idle,
            Phase::Revealing(_) => ConversationState::Revealing,
            Phase::AwaitingAdvance => ConversationState::AwaitingAdvance,
            Phase::AwaitingChoice => ConversationState::AwaitingChoice,
            Phase::Ended { .. } => ConversationState::SessionEnded,
        }
    }

    fn script_outlook(&self) -> (bool, Vec<Choice>) {
        let script = self.script.borrow();
        (script.can_continue(), script.current_choices())
    }
}

pub struct ConversationController<P: Presenter> {
    config: DialogueConfig,
    presenter: P,
    choices: ChoicePresenter,
    tags: TagProcessor,
    voice: TickVoice,
    session: Option<ConversationSession>,
}

impl<P: Presenter> ConversationController<P> {
    pub fn new(config: DialogueConfig, presenter: P) -> Self {
        Self {
            choices: ChoicePresenter::new(config.choice_slots),
            tags: TagProcessor::default(),
            voice: TickVoice::new(&config),
            config,
            presenter,
            session: None,
        }
    }

    /// Replace the tag handler table.
    pub fn with_tag_processor(mut self, tags: TagProcessor) -> Self {
        self.tags = tags;
        self
    }

    pub fn tag_processor_mut(&mut self) -> &mut TagProcessor {
        &mut self.tags
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn choice_slots(&self) -> &[ChoiceSlot] {
        self.choices.slots()
    }

    /// True from `begin_session` until teardown, including the grace
    /// period after the session has ended.
    pub fn is_session_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> ConversationState {
        self.session
            .as_ref()
            .map_or(ConversationState::Idle, ConversationSession::state)
    }

    pub fn can_advance(&self) -> bool {
        self.session.as_ref().map_or(true, |s| s.gate.is_open())
    }

    pub fn current_text(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.line.text.as_str())
    }

    /// Start a conversation: bind the bridge hooks, show the dialogue UI
    /// and begin revealing the first line. A script with nothing to say
    /// ends the session immediately.
    pub fn begin_session(
        &mut self,
        script: Rc<RefCell<dyn ScriptRuntime>>,
        services: HostServices,
    ) -> Result<(), DialogueError> {
        if self.session.is_some() {
            tracing::warn!("Conversation requested while another session is active");
            return Err(DialogueError::SessionActive);
        }

        let gate = Rc::new(AdvanceGate::new());
        let bridge = ExternalBridge::new(services.clone(), Rc::clone(&gate));
        bridge.register(&mut *script.borrow_mut());
        let can_continue = script.borrow().can_continue();

        self.session = Some(ConversationSession {
            script,
            services,
            bridge,
            gate,
            phase: Phase::Idle,
            line: Line::new(""),
            tags_pending: false,
        });
        self.presenter.show_conversation_ui();
        tracing::info!(can_continue, "Conversation started");

        if can_continue {
            self.start_line();
        } else {
            self.end_session();
        }
        Ok(())
    }

    /// The accept/continue input. Skips an in-flight reveal or asks the
    /// script for the next step. Ignored while a level event is running or
    /// while advance is held.
    pub fn on_advance_input(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.services.is_event_running() {
            tracing::debug!("Advance ignored: level event running");
            return;
        }
        if !session.gate.is_open() {
            tracing::debug!("Advance ignored: advance held by script");
            return;
        }

        match session.state() {
            ConversationState::Revealing => self.finish_reveal(true),
            ConversationState::AwaitingAdvance => self.advance_script(),
            state => tracing::debug!(?state, "Advance ignored"),
        }
    }

    /// The player picked choice `index`. Only valid while awaiting a
    /// choice and with an index in range; anything else is logged and
    /// changes nothing.
    pub fn on_choice_selected(&mut self, index: usize) {
        let Some(session) = self.session.as_ref() else {
            tracing::warn!(index, "Choice selected with no active session");
            return;
        };
        let state = session.state();
        if state != ConversationState::AwaitingChoice {
            tracing::warn!(index, ?state, "Choice selected outside of a choice prompt");
            return;
        }
        if session.services.is_event_running() {
            tracing::debug!(index, "Choice ignored: level event running");
            return;
        }

        let script = Rc::clone(&session.script);
        let count = script.borrow().current_choices().len();
        if index >= count {
            tracing::warn!(index, count, "Choice index out of range");
            return;
        }
        if index >= self.choices.slots().len() {
            tracing::warn!(
                index,
                slots = self.choices.slots().len(),
                "No choice widget for selected choice"
            );
        }

        self.choices.dismiss(&mut self.presenter);
        let result = script.borrow_mut().choose_choice_index(index);
        match result {
            Ok(()) => {
                tracing::info!(index, "Choice selected");
                self.advance_script();
            }
            Err(e) => {
                tracing::error!(error = %e, index, "Script rejected choice");
                self.end_session();
            }
        }
    }

    /// Drive time forward by `dt`: polls the reveal and counts down the
    /// post-session grace timer.
    pub fn update(&mut self, dt: Duration) {
        let mut reveal_ready = false;
        let mut teardown = false;

        if let Some(session) = self.session.as_mut() {
            match &mut session.phase {
                Phase::Revealing(task) => {
                    reveal_ready = task.poll(dt, &mut self.presenter, &mut self.voice);
                }
                Phase::Ended { remaining } => {
                    if !session.services.is_event_running() {
                        *remaining = remaining.saturating_sub(dt);
                        teardown = remaining.is_zero();
                    }
                }
                _ => {}
            }
        }

        if reveal_ready {
            self.finish_reveal(false);
        }
        if teardown {
            self.teardown();
        }
    }

    /// Restore advance input after a script hold.
    pub fn resume_advance(&mut self) {
        if let Some(session) = self.session.as_ref() {
            session.gate.release();
            tracing::debug!("Advance input resumed");
        }
    }

    pub fn set_variable(&mut self, name: &str, value: ScriptValue) -> Result<(), DialogueError> {
        let session = self.session.as_ref().ok_or(DialogueError::NoSession)?;
        session.script.borrow_mut().set_variable(name, value)?;
        Ok(())
    }

    /// End the conversation now, regardless of script content. The usual
    /// grace period still applies before teardown.
    pub fn force_end(&mut self) {
        if self.session.is_some() {
            tracing::info!("Conversation ended by host");
            self.end_session();
        }
    }

    fn start_line(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.gate.release();

        let result = session.script.borrow_mut().cont();
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Script failed to continue");
                self.end_session();
                return;
            }
        };
        let tags = session.script.borrow().current_tags();
        session.line = Line::with_tags(text, tags);
        session.tags_pending = true;
        tracing::debug!(line = %session.line.text, tags = session.line.tags.len(), "Revealing line");

        let task = RevealTask::start(
            &session.line.text,
            self.config.typing_speed(),
            &mut self.presenter,
            &mut self.voice,
        );
        session.phase = Phase::Revealing(task);
    }

    /// Take the reveal out of the session and signal its outcome. With
    /// `skip`, a reveal that still has hidden characters is cancelled.
    fn finish_reveal(&mut self, skip: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let task = match std::mem::replace(&mut session.phase, Phase::AwaitingAdvance) {
            Phase::Revealing(task) => task,
            other => {
                session.phase = other;
                return;
            }
        };

        let outcome = if skip && !task.is_fully_shown() {
            task.cancel(&mut self.presenter)
        } else {
            task.finish(&mut self.presenter)
        };
        self.on_line_shown(outcome);
    }

    /// Full text is on screen: apply the line's tags once, then offer
    /// choices if configured to do so without another advance press.
    fn on_line_shown(&mut self, outcome: RevealOutcome) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        tracing::debug!(?outcome, "Reveal finished");
        if std::mem::take(&mut session.tags_pending) {
            let mut ctx = TagContext {
                services: &session.services,
                presenter: &mut self.presenter,
            };
            let report = self.tags.process(&session.line.tags, &mut ctx);
            if report.skipped > 0 {
                tracing::debug!(applied = report.applied, skipped = report.skipped, "Line tags processed");
            }
        }

        if self.config.present_choices_on_reveal_end {
            let (can_continue, choices) = session.script_outlook();
            if !can_continue && !choices.is_empty() {
                self.present_choices(choices);
            }
        }
    }

    fn advance_script(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let (can_continue, choices) = session.script_outlook();
        if can_continue {
            self.start_line();
        } else if !choices.is_empty() {
            self.present_choices(choices);
        } else {
            self.end_session();
        }
    }

    fn present_choices(&mut self, choices: Vec<Choice>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let shown = self.choices.present(&choices, &mut self.presenter);
        session.phase = Phase::AwaitingChoice;
        if shown == 0 {
            tracing::warn!(choices = choices.len(), "No choice widgets available; conversation cannot proceed");
        }
        tracing::info!(choices = choices.len(), shown, "Choices presented");
    }

    fn end_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if matches!(session.phase, Phase::Ended { .. }) {
            return;
        }

        let previous = std::mem::replace(
            &mut session.phase,
            Phase::Ended {
                remaining: self.config.finish_delay(),
            },
        );
        if let Phase::Revealing(task) = previous {
            task.cancel(&mut self.presenter);
        }
        session.tags_pending = false;

        if self.choices.active_count() > 0 {
            self.choices.dismiss(&mut self.presenter);
        }
        self.presenter.hide_conversation_ui();
        tracing::info!(
            grace_secs = self.config.finish_delay_secs,
            "Conversation ended"
        );
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.bridge.unregister(&mut *session.script.borrow_mut());
            tracing::info!("Conversation session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::{Inventory, LevelEvents, QuestTracker};
    use crate::core::story::ScriptedStory;
    use crate::schema::item::{Item, ItemId};
    use crate::schema::speaker::{Speaker, SpeakerRegistry};

    struct Silent;

    impl Presenter for Silent {
        fn show_conversation_ui(&mut self) {}
        fn hide_conversation_ui(&mut self) {}
        fn show_partial_text(&mut self, _text: &str) {}
        fn show_full_text(&mut self, _text: &str) {}
        fn set_speaker_layout(&mut self, _speaker: &Speaker) {}
        fn show_choices(&mut self, _choices: &[Choice]) {}
        fn hide_choices(&mut self) {}
    }

    struct Nothing;

    impl Inventory for Nothing {
        fn contains(&self, _id: &ItemId) -> bool {
            false
        }
        fn add_key_item(&mut self, _item: Item) -> bool {
            false
        }
        fn remove_one(&mut self, _id: &ItemId) -> Option<Item> {
            None
        }
    }

    impl QuestTracker for Nothing {
        fn advance_objective(&mut self) {}
    }

    impl LevelEvents for Nothing {
        fn trigger_event(&mut self, _index: usize) {}
        fn is_event_running(&self) -> bool {
            false
        }
    }

    fn services() -> HostServices {
        HostServices::new(
            Rc::new(RefCell::new(Nothing)),
            Rc::new(RefCell::new(Nothing)),
            Rc::new(RefCell::new(Nothing)),
            Rc::new(SpeakerRegistry::new()),
        )
    }

    fn one_line() -> Rc<RefCell<ScriptedStory>> {
        let story = ScriptedStory::parse_ron(
            r#"(start: "a", passages: { "a": (lines: [(text: "Hm.")]) })"#,
        )
        .unwrap();
        Rc::new(RefCell::new(story))
    }

    #[test]
    fn idle_without_session() {
        let mut c = ConversationController::new(DialogueConfig::default(), Silent);
        assert_eq!(c.state(), ConversationState::Idle);
        assert!(!c.is_session_active());
        assert!(c.can_advance());

        c.on_advance_input();
        c.on_choice_selected(0);
        c.update(Duration::from_secs(1));
        assert_eq!(c.state(), ConversationState::Idle);
    }

    #[test]
    fn begin_binds_hooks_and_rejects_second_session() {
        let mut c = ConversationController::new(DialogueConfig::default(), Silent);
        let script = one_line();
        c.begin_session(script.clone(), services()).unwrap();
        assert!(script.borrow().is_bound(crate::core::bridge::STOP_TYPING));

        let err = c.begin_session(one_line(), services()).unwrap_err();
        assert!(matches!(err, DialogueError::SessionActive));
        assert_eq!(c.state(), ConversationState::Revealing);
    }

    #[test]
    fn zero_finish_delay_tears_down_on_next_update() {
        let config = DialogueConfig::default().with_finish_delay(0.0);
        let mut c = ConversationController::new(config, Silent);
        c.begin_session(one_line(), services()).unwrap();
        c.on_advance_input();
        c.on_advance_input();
        assert_eq!(c.state(), ConversationState::SessionEnded);

        c.update(Duration::ZERO);
        assert!(!c.is_session_active());
    }
}
