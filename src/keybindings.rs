use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    SelectAll,
    ClearSelection,
    Undo,
    Redo,
    // Acts on the row under the cursor
    ToggleFocused,
}

impl fmt::Display for EditorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EditorAction::SelectAll => "Select all rows",
            EditorAction::ClearSelection => "Clear selection",
            EditorAction::Undo => "Undo last change",
            EditorAction::Redo => "Redo",
            EditorAction::ToggleFocused => "Toggle focused row / space",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    /// Letter keys match regardless of case; terminals disagree on whether
    /// Shift+Z arrives as `z` or `Z`.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        let code_matches = match (self.code, key.code) {
            (KeyCode::Char(a), KeyCode::Char(b)) => a.eq_ignore_ascii_case(&b),
            (a, b) => a == b,
        };
        code_matches && key.modifiers == self.mods
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.mods.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.mods.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.mods.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        let code = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            _ => format!("{:?}", self.code),
        };
        parts.push(code);
        parts.join("+")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<EditorAction, Vec<KeyCombo>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn add(&mut self, action: EditorAction, combo: KeyCombo) {
        self.map.entry(action).or_default().push(combo);
    }

    pub fn matches(&self, action: EditorAction, key: &KeyEvent) -> bool {
        self.map
            .get(&action)
            .is_some_and(|list| list.iter().any(|c| c.matches(key)))
    }

    pub fn action_for_key(&self, key: &KeyEvent) -> Option<EditorAction> {
        self.map
            .iter()
            .find(|(_, list)| list.iter().any(|c| c.matches(key)))
            .map(|(action, _)| *action)
    }

    /// Return the display strings for all combos mapped to `action`.
    pub fn combos_for(&self, action: EditorAction) -> Vec<String> {
        self.map
            .get(&action)
            .map(|list| list.iter().map(|c| c.display()).collect())
            .unwrap_or_default()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        use EditorAction::*;
        let mut kb = Self::new();
        kb.add(
            SelectAll,
            KeyCombo::new(KeyCode::Char('a'), KeyModifiers::CONTROL),
        );
        kb.add(
            ClearSelection,
            KeyCombo::new(KeyCode::Esc, KeyModifiers::NONE),
        );
        kb.add(Undo, KeyCombo::new(KeyCode::Char('z'), KeyModifiers::CONTROL));
        kb.add(
            Redo,
            KeyCombo::new(
                KeyCode::Char('z'),
                KeyModifiers::CONTROL | KeyModifiers::SHIFT,
            ),
        );
        kb.add(Redo, KeyCombo::new(KeyCode::Char('y'), KeyModifiers::CONTROL));
        kb.add(
            ToggleFocused,
            KeyCombo::new(KeyCode::Char(' '), KeyModifiers::NONE),
        );
        kb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_actions() {
        let kb = KeyBindings::default();
        let ev = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(kb.action_for_key(&ev), Some(EditorAction::SelectAll));
        let ev = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(kb.action_for_key(&ev), Some(EditorAction::ToggleFocused));
        let ev = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(kb.action_for_key(&ev), None);
    }

    #[test]
    fn redo_matches_either_case() {
        let kb = KeyBindings::default();
        let upper = KeyEvent::new(
            KeyCode::Char('Z'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        );
        assert!(kb.matches(EditorAction::Redo, &upper));
        assert!(!kb.matches(EditorAction::Undo, &upper));
        let plain = KeyEvent::new(KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(kb.action_for_key(&plain), Some(EditorAction::Undo));
    }

    #[test]
    fn combos_display() {
        let kb = KeyBindings::default();
        let mut redo = kb.combos_for(EditorAction::Redo);
        redo.sort();
        assert_eq!(redo, vec!["Ctrl+Shift+Z", "Ctrl+Y"]);
        assert_eq!(kb.combos_for(EditorAction::ToggleFocused), vec!["Space"]);
    }
}
