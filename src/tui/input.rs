//! Input field handling for the terminal user interface.

/// A single-line text input. The cursor counts characters, not bytes, so
/// accented input ("Notoriété", "Prêt") edits correctly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_offset(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Trimmed value, `None` when blank.
    pub fn text(&self) -> Option<String> {
        let trimmed = self.value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text_by_character() {
        let mut field = InputField::with_value("Pret");
        field.move_cursor_left();
        field.handle_backspace();
        field.handle_char('ê');
        assert_eq!(field.value, "Prêt");
        field.move_cursor_right();
        field.move_cursor_right();
        field.move_cursor_right();
        field.handle_char('s');
        assert_eq!(field.value, "Prêts");
        assert_eq!(field.cursor, 5);
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(InputField::with_value("   ").text(), None);
        assert_eq!(InputField::with_value(" Martin ").text().as_deref(), Some("Martin"));
        let mut field = InputField::with_value("x");
        field.clear();
        assert_eq!(field, InputField::new());
    }
}
