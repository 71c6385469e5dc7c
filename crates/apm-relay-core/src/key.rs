//! Keyboard input types for synthetic input injection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Keyboard key sent to a target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Regular character
    Char(char),

    // Navigation
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up
    PageUp,
    /// Page Down
    PageDown,

    // Actions
    /// Enter/Return key
    Enter,
    /// Tab key
    Tab,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Space key
    Space,

    /// Function key F1-F12
    Function(u8),

    // Modified keys
    /// Ctrl + character
    Ctrl(char),
    /// Alt + character
    Alt(char),
    /// Shift + key
    Shift(Box<Key>),
}

/// Strip a modifier prefix such as `Ctrl+`, ignoring ASCII case.
fn strip_modifier<'a>(s: &'a str, modifier: &str) -> Option<&'a str> {
    let head = s.get(..modifier.len())?;
    if head.eq_ignore_ascii_case(modifier) {
        Some(&s[modifier.len()..])
    } else {
        None
    }
}

impl Key {
    /// Parse key from string representation.
    ///
    /// Named keys are matched case-insensitively so settings may say either
    /// `space` or `Space`.
    ///
    /// Examples:
    /// - "a" -> Key::Char('a')
    /// - "Ctrl+a" -> Key::Ctrl('a')
    /// - "Shift+Tab" -> Key::Shift(Box::new(Key::Tab))
    /// - "enter" -> Key::Enter
    /// - "F5" -> Key::Function(5)
    pub fn parse(s: &str) -> Result<Self> {
        // a lone space names the key; anything else is trimmed
        if s == " " {
            return Ok(Key::Space);
        }
        let s = s.trim();

        if let Some(rest) = strip_modifier(s, "Ctrl+") {
            let ch = rest
                .chars()
                .next()
                .ok_or_else(|| Error::InvalidKey(s.to_string()))?;
            return Ok(Key::Ctrl(ch.to_ascii_lowercase()));
        }

        if let Some(rest) = strip_modifier(s, "Alt+") {
            let ch = rest
                .chars()
                .next()
                .ok_or_else(|| Error::InvalidKey(s.to_string()))?;
            return Ok(Key::Alt(ch.to_ascii_lowercase()));
        }

        if let Some(rest) = strip_modifier(s, "Shift+") {
            let inner = Key::parse(rest)?;
            return Ok(Key::Shift(Box::new(inner)));
        }

        let mut chars = s.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(ch));
        }

        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "enter" | "return" => Ok(Key::Enter),
            "tab" => Ok(Key::Tab),
            "escape" | "esc" => Ok(Key::Escape),
            "backspace" => Ok(Key::Backspace),
            "delete" | "del" => Ok(Key::Delete),
            "space" => Ok(Key::Space),
            "up" => Ok(Key::Up),
            "down" => Ok(Key::Down),
            "left" => Ok(Key::Left),
            "right" => Ok(Key::Right),
            "home" => Ok(Key::Home),
            "end" => Ok(Key::End),
            "pageup" | "pgup" => Ok(Key::PageUp),
            "pagedown" | "pgdn" => Ok(Key::PageDown),
            _ => match lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=12) => Ok(Key::Function(n)),
                _ => Err(Error::InvalidKey(s.to_string())),
            },
        }
    }

    /// Render the key as an `xdotool key` keysym chord.
    pub fn to_xdotool(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Up => "Up".to_string(),
            Key::Down => "Down".to_string(),
            Key::Left => "Left".to_string(),
            Key::Right => "Right".to_string(),
            Key::Home => "Home".to_string(),
            Key::End => "End".to_string(),
            Key::PageUp => "Prior".to_string(),
            Key::PageDown => "Next".to_string(),
            Key::Enter => "Return".to_string(),
            Key::Tab => "Tab".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Backspace => "BackSpace".to_string(),
            Key::Delete => "Delete".to_string(),
            Key::Space => "space".to_string(),
            Key::Function(n) => format!("F{n}"),
            Key::Ctrl(c) => format!("ctrl+{c}"),
            Key::Alt(c) => format!("alt+{c}"),
            Key::Shift(inner) => format!("shift+{}", inner.to_xdotool()),
        }
    }

    /// Render the key in `WScript.Shell.SendKeys` notation.
    pub fn to_sendkeys(&self) -> String {
        match self {
            Key::Char(c) => escape_sendkeys_char(*c),
            Key::Up => "{UP}".to_string(),
            Key::Down => "{DOWN}".to_string(),
            Key::Left => "{LEFT}".to_string(),
            Key::Right => "{RIGHT}".to_string(),
            Key::Home => "{HOME}".to_string(),
            Key::End => "{END}".to_string(),
            Key::PageUp => "{PGUP}".to_string(),
            Key::PageDown => "{PGDN}".to_string(),
            Key::Enter => "{ENTER}".to_string(),
            Key::Tab => "{TAB}".to_string(),
            Key::Escape => "{ESC}".to_string(),
            Key::Backspace => "{BACKSPACE}".to_string(),
            Key::Delete => "{DELETE}".to_string(),
            Key::Space => " ".to_string(),
            Key::Function(n) => format!("{{F{n}}}"),
            Key::Ctrl(c) => format!("^{}", escape_sendkeys_char(*c)),
            Key::Alt(c) => format!("%{}", escape_sendkeys_char(*c)),
            Key::Shift(inner) => format!("+{}", inner.to_sendkeys()),
        }
    }
}

/// Escape a literal character for SendKeys, where `+^%~(){}[]` are syntax.
pub fn escape_sendkeys_char(c: char) -> String {
    match c {
        '+' | '^' | '%' | '~' | '(' | ')' | '{' | '}' | '[' | ']' => format!("{{{c}}}"),
        _ => c.to_string(),
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::PageUp => write!(f, "PageUp"),
            Key::PageDown => write!(f, "PageDown"),
            Key::Enter => write!(f, "Enter"),
            Key::Tab => write!(f, "Tab"),
            Key::Escape => write!(f, "Escape"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Delete => write!(f, "Delete"),
            Key::Space => write!(f, "Space"),
            Key::Function(n) => write!(f, "F{n}"),
            Key::Ctrl(c) => write!(f, "Ctrl+{c}"),
            Key::Alt(c) => write!(f, "Alt+{c}"),
            Key::Shift(k) => write!(f, "Shift+{k}"),
        }
    }
}
