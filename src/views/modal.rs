use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Choice {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModalOutcome {
    Open,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfirmModal {
    title: String,
    message: String,
    choice: Choice,
    outcome: ModalOutcome,
}

impl ConfirmModal {
    pub(crate) fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            choice: Choice::No,
            outcome: ModalOutcome::Open,
        }
    }

    pub(crate) fn update(mut self, key: KeyEvent) -> Self {
        if self.outcome != ModalOutcome::Open {
            return self;
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.choice = Choice::Yes,
            KeyCode::Right | KeyCode::Char('l') => self.choice = Choice::No,
            KeyCode::Tab | KeyCode::BackTab => {
                self.choice = match self.choice {
                    Choice::Yes => Choice::No,
                    Choice::No => Choice::Yes,
                };
            }
            KeyCode::Enter => {
                self.outcome = match self.choice {
                    Choice::Yes => ModalOutcome::Confirmed,
                    Choice::No => ModalOutcome::Cancelled,
                };
            }
            KeyCode::Esc | KeyCode::Char('n' | 'N' | 'q') => {
                self.outcome = ModalOutcome::Cancelled;
            }
            _ => {}
        }
        self
    }

    pub(crate) fn outcome(&self) -> ModalOutcome {
        self.outcome
    }

    pub(crate) fn choice(&self) -> Choice {
        self.choice
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn enter_on_default_cancels() {
        let modal = ConfirmModal::new("Delete", "Really?").update(key(KeyCode::Enter));
        assert_eq!(modal.outcome(), ModalOutcome::Cancelled);
    }

    #[test]
    fn selecting_yes_then_enter_confirms() {
        let modal = ConfirmModal::new("Delete", "Really?")
            .update(key(KeyCode::Left))
            .update(key(KeyCode::Enter));
        assert_eq!(modal.outcome(), ModalOutcome::Confirmed);
    }

    #[test]
    fn unrelated_keys_keep_it_open() {
        let modal = ConfirmModal::new("Delete", "Really?")
            .update(key(KeyCode::Char('x')))
            .update(key(KeyCode::Down));
        assert_eq!(modal.outcome(), ModalOutcome::Open);
        assert_eq!(modal.choice(), Choice::No);
    }

    #[test]
    fn escape_cancels_even_with_yes_selected() {
        let modal = ConfirmModal::new("Delete", "Really?")
            .update(key(KeyCode::Char('h')))
            .update(key(KeyCode::Esc));
        assert_eq!(modal.outcome(), ModalOutcome::Cancelled);
    }

    #[test]
    fn resolved_modal_ignores_further_keys() {
        let modal = ConfirmModal::new("Delete", "Really?")
            .update(key(KeyCode::Esc))
            .update(key(KeyCode::Left))
            .update(key(KeyCode::Enter));
        assert_eq!(modal.outcome(), ModalOutcome::Cancelled);
    }
}
