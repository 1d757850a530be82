//! Keybinding registry: maps actions to key events with config overrides.
//!
//! Bindings are data, not match arms, so users can remap any action from
//! config.toml.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Next,
    Prev,
    First,
    Last,
    Flush,
    LoadMore,
    Remove,
    Resync,
    ShowHelp,
    Back,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::Next => "Focus next item",
            Self::Prev => "Focus previous item",
            Self::First => "Jump to first item",
            Self::Last => "Jump to last item",
            Self::Flush => "Show new items",
            Self::LoadMore => "Load older items",
            Self::Remove => "Remove item from feed",
            Self::Resync => "Resync with server",
            Self::ShowHelp => "Show help",
            Self::Back => "Close overlay",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Help,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report `G` as `Char('G')` + SHIFT; the case already carries it.
    fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) => Self::new(self.code, self.modifiers - KeyModifiers::SHIFT),
            _ => self,
        }
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "Home", "End", "Space"
/// - Modifier combos: "Ctrl+d", "Ctrl+u"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        let c = chars.next()?;
        return chars.next().is_none().then(|| KeySpec::ctrl(c));
    }

    // Named keys (case-insensitive)
    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        "backspace" => Some(KeyCode::Backspace),
        "delete" | "del" => Some(KeyCode::Delete),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s.strip_prefix(['F', 'f']) {
        if let Ok(n) = n.parse::<u8>() {
            return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
        }
    }

    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then(|| KeySpec::plain(KeyCode::Char(c)))
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to `Global`.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the help screen
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        let key = key.normalized();
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Action::*;
        use KeyCode::Char;

        let global = [
            (Char('q'), Quit),
            (Char('j'), Next),
            (KeyCode::Down, Next),
            (KeyCode::Right, Next),
            (Char('k'), Prev),
            (KeyCode::Up, Prev),
            (KeyCode::Left, Prev),
            (Char('g'), First),
            (KeyCode::Home, First),
            (Char('G'), Last),
            (KeyCode::End, Last),
            (Char('n'), Flush),
            (Char('m'), LoadMore),
            (Char('x'), Remove),
            (Char('r'), Resync),
            (Char('?'), ShowHelp),
        ];
        for (code, action) in global {
            self.bind(Context::Global, KeySpec::plain(code), action);
        }

        // Help overlay captures its own dismiss keys; j/k fall through to Global.
        for code in [KeyCode::Esc, Char('q'), Char('?')] {
            self.bind(Context::Help, KeySpec::plain(code), Back);
        }
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "load_more").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            // Rebind in every context the action was bound in
            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// Tries the specific context first, then falls back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers).normalized();

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        if context != Context::Global {
            return self.lookup.get(&(Context::Global, key)).copied();
        }
        None
    }

    /// Global bindings grouped per action, for the help screen.
    ///
    /// Returns (keys, description) pairs in registration order, e.g.
    /// `("j / Down / Right", "Focus next item")`.
    pub fn help_rows(&self) -> Vec<(String, &'static str)> {
        let mut rows: Vec<(Action, Vec<String>)> = Vec::new();
        for (ctx, key, action) in &self.bindings {
            if *ctx != Context::Global {
                continue;
            }
            match rows.iter_mut().find(|(a, _)| a == action) {
                Some((_, keys)) => keys.push(format_key(key)),
                None => rows.push((*action, vec![format_key(key)])),
            }
        }
        rows.into_iter()
            .map(|(action, keys)| (keys.join(" / "), action.describe()))
            .collect()
    }

    /// First Global key bound to `action`, formatted for display.
    pub fn key_for(&self, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(ctx, _, a)| *ctx == Context::Global && *a == action)
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "next" | "nav_down" | "down" => Some(Action::Next),
        "prev" | "previous" | "nav_up" | "up" => Some(Action::Prev),
        "first" | "home" => Some(Action::First),
        "last" | "end" => Some(Action::Last),
        "flush" | "show_new" | "shownew" => Some(Action::Flush),
        "load_more" | "loadmore" | "more" => Some(Action::LoadMore),
        "remove" | "delete" => Some(Action::Remove),
        "resync" | "refresh" => Some(Action::Resync),
        "show_help" | "showhelp" | "help" => Some(Action::ShowHelp),
        "back" => Some(Action::Back),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
