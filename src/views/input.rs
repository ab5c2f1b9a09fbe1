use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TextInput {
    value: String,
    cursor: usize,
    max_chars: Option<usize>,
    masked: bool,
}

impl TextInput {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self {
            value,
            cursor,
            ..Self::default()
        }
    }

    pub(crate) fn max_chars(mut self, max: usize) -> Self {
        self.max_chars = Some(max);
        self
    }

    pub(crate) fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub(crate) fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// Applies an editing key. Returns false when the key is not an editing key.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.len(),
            KeyCode::Char('u') if ctrl => {
                let tail = self.byte_offset(self.cursor);
                self.value.replace_range(..tail, "");
                self.cursor = 0;
            }
            KeyCode::Char('k') if ctrl => {
                let head = self.byte_offset(self.cursor);
                self.value.truncate(head);
            }
            KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => return false,
            KeyCode::Char(ch) => self.insert(ch),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            _ => return false,
        }
        true
    }

    fn insert(&mut self, ch: char) {
        if self.max_chars.is_some_and(|max| self.len() >= max) {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(input: &mut TextInput, text: &str) {
        for ch in text.chars() {
            input.handle_key(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn inserts_at_cursor() {
        let mut input = TextInput::with_value("hllo");
        input.handle_key(key(KeyCode::Home));
        input.handle_key(key(KeyCode::Right));
        type_text(&mut input, "e");
        assert_eq!(input.value(), "hello");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn backspace_and_delete_respect_cursor() {
        let mut input = TextInput::with_value("abc");
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "ac");
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.value(), "a");
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.value(), "a");
    }

    #[test]
    fn multibyte_chars_are_edited_whole() {
        let mut input = TextInput::new();
        type_text(&mut input, "zäh");
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "zh");
    }

    #[test]
    fn max_chars_limits_insertions() {
        let mut input = TextInput::new().max_chars(5);
        type_text(&mut input, "700000");
        assert_eq!(input.value(), "70000");
    }

    #[test]
    fn control_keys_are_not_consumed_as_text() {
        let mut input = TextInput::with_value("abc");
        let consumed = input.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!consumed);
        assert_eq!(input.value(), "abc");
        input.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn masked_display_hides_value() {
        let input = TextInput::with_value("secret").masked();
        assert_eq!(input.display(), "******");
        assert_eq!(input.value(), "secret");
    }
}
