/// Choice presenter — binds the current choices to a fixed pool of
/// pre-allocated widgets.
use crate::core::host::Presenter;
use crate::schema::line::Choice;

/// One pre-allocated choice widget. Active iff bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceSlot {
    bound: Option<Choice>,
}

impl ChoiceSlot {
    pub fn is_active(&self) -> bool {
        self.bound.is_some()
    }

    pub fn choice(&self) -> Option<&Choice> {
        self.bound.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct ChoicePresenter {
    slots: Vec<ChoiceSlot>,
}

impl ChoicePresenter {
    pub fn new(pool_size: usize) -> Self {
        Self {
            slots: vec![ChoiceSlot::default(); pool_size],
        }
    }

    pub fn slots(&self) -> &[ChoiceSlot] {
        &self.slots
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// Activate one slot per choice, in order, and deactivate the rest.
    /// Choices beyond the pool are dropped with a warning. Focus moves to
    /// the first choice. Returns the number of active slots.
    pub fn present(&mut self, choices: &[Choice], presenter: &mut dyn Presenter) -> usize {
        self.deactivate_all();

        if choices.len() > self.slots.len() {
            tracing::warn!(
                choices = choices.len(),
                slots = self.slots.len(),
                "More choices than choice slots, extra choices not shown"
            );
        }

        for (slot, choice) in self.slots.iter_mut().zip(choices) {
            slot.bound = Some(choice.clone());
        }

        let shown: Vec<Choice> = self
            .slots
            .iter()
            .filter_map(|s| s.choice().cloned())
            .collect();
        if shown.is_empty() {
            return 0;
        }

        presenter.show_choices(&shown);
        presenter.focus_choice(0);
        shown.len()
    }

    /// Deactivate every slot and hide the choice widgets.
    pub fn dismiss(&mut self, presenter: &mut dyn Presenter) {
        self.deactivate_all();
        presenter.hide_choices();
    }

    fn deactivate_all(&mut self) {
        for slot in &mut self.slots {
            slot.bound = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::speaker::Speaker;

    #[derive(Default)]
    struct Widgets {
        shown: Vec<String>,
        focused: Option<usize>,
        hidden: usize,
    }

    impl Presenter for Widgets {
        fn show_conversation_ui(&mut self) {}
        fn hide_conversation_ui(&mut self) {}
        fn show_partial_text(&mut self, _text: &str) {}
        fn show_full_text(&mut self, _text: &str) {}
        fn set_speaker_layout(&mut self, _speaker: &Speaker) {}
        fn show_choices(&mut self, choices: &[Choice]) {
            self.shown = choices.iter().map(|c| c.text.clone()).collect();
        }
        fn hide_choices(&mut self) {
            self.shown.clear();
            self.hidden += 1;
        }
        fn focus_choice(&mut self, slot: usize) {
            self.focused = Some(slot);
        }
    }

    fn choices(texts: &[&str]) -> Vec<Choice> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Choice::new(i, *t))
            .collect()
    }

    #[test]
    fn activates_exactly_one_slot_per_choice() {
        let mut pool = ChoicePresenter::new(4);
        let mut widgets = Widgets::default();

        assert_eq!(pool.present(&choices(&["Yes", "No"]), &mut widgets), 2);
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.slots()[1].choice().unwrap().text, "No");
        assert!(!pool.slots()[2].is_active());
        assert_eq!(widgets.shown, vec!["Yes", "No"]);
        assert_eq!(widgets.focused, Some(0));
    }

    #[test]
    fn re_present_deactivates_stale_slots() {
        let mut pool = ChoicePresenter::new(4);
        let mut widgets = Widgets::default();
        pool.present(&choices(&["A", "B", "C"]), &mut widgets);
        pool.present(&choices(&["D"]), &mut widgets);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn overflow_stops_at_pool_limit() {
        let mut pool = ChoicePresenter::new(2);
        let mut widgets = Widgets::default();
        assert_eq!(pool.present(&choices(&["A", "B", "C"]), &mut widgets), 2);
        assert_eq!(widgets.shown, vec!["A", "B"]);
    }

    #[test]
    fn empty_pool_shows_nothing() {
        let mut pool = ChoicePresenter::new(0);
        let mut widgets = Widgets::default();
        assert_eq!(pool.present(&choices(&["A"]), &mut widgets), 0);
        assert!(widgets.shown.is_empty());
        assert_eq!(widgets.focused, None);
    }

    #[test]
    fn dismiss_deactivates_all() {
        let mut pool = ChoicePresenter::new(3);
        let mut widgets = Widgets::default();
        pool.present(&choices(&["A", "B"]), &mut widgets);
        pool.dismiss(&mut widgets);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(widgets.hidden, 1);
    }
}
