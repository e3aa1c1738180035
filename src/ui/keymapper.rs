//! Key mapping for terminal input
//!
//! Converts crossterm key events to experiment keys.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::ui::surface::Key;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Key mapper for converting key events to experiment keys
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent. Returns `None` for releases and repeats.
    pub fn map(event: &KeyEvent) -> Option<Key> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        let mods = Modifiers::from(event.modifiers);

        let key = match event.code {
            KeyCode::Esc => Key::Escape,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Enter => Key::Return,
            KeyCode::Char(ch) => Self::map_char(ch, mods),
            other => Key::Named(Self::code_name(other)),
        };
        Some(key)
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Key {
        // Ctrl+C aborts like escape; the terminal is in raw mode so SIGINT never arrives
        if mods.contains(Modifiers::CTRL) && ch.eq_ignore_ascii_case(&'c') {
            return Key::Escape;
        }
        if mods.intersects(Modifiers::CTRL | Modifiers::ALT) {
            let mut name = String::new();
            if mods.contains(Modifiers::CTRL) {
                name.push_str("ctrl+");
            }
            if mods.contains(Modifiers::ALT) {
                name.push_str("alt+");
            }
            name.push(ch);
            return Key::Named(name);
        }
        if ch == ' ' {
            return Key::Space;
        }
        Key::Char(ch)
    }

    fn code_name(code: KeyCode) -> String {
        match code {
            KeyCode::F(n) => format!("f{}", n),
            KeyCode::Up => "up".to_string(),
            KeyCode::Down => "down".to_string(),
            KeyCode::Left => "left".to_string(),
            KeyCode::Right => "right".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::Delete => "delete".to_string(),
            other => format!("{:?}", other).to_lowercase(),
        }
    }
}
