//! Key-to-action table with user overrides from the `[keys]` config table.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Action Enum
// ============================================================================

/// Everything a key press can ask the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    Top,
    Bottom,
    NextCategory,
    PrevCategory,
    CycleRange,
    RangeToday,
    RangeYesterday,
    RangeThreeDays,
    RangeWeek,
    Reload,
    LoadMore,
    OpenInBrowser,
    ShowHelp,
}

impl Action {
    pub const ALL: [Action; 18] = [
        Action::Quit,
        Action::NavDown,
        Action::NavUp,
        Action::PageDown,
        Action::PageUp,
        Action::Top,
        Action::Bottom,
        Action::NextCategory,
        Action::PrevCategory,
        Action::CycleRange,
        Action::RangeToday,
        Action::RangeYesterday,
        Action::RangeThreeDays,
        Action::RangeWeek,
        Action::Reload,
        Action::LoadMore,
        Action::OpenInBrowser,
        Action::ShowHelp,
    ];

    /// Human-readable description for the help overlay.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::NavDown => "Next article",
            Self::NavUp => "Previous article",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::Top => "First article",
            Self::Bottom => "Last loaded article",
            Self::NextCategory => "Next category",
            Self::PrevCategory => "Previous category",
            Self::CycleRange => "Cycle time range",
            Self::RangeToday => "Today",
            Self::RangeYesterday => "Yesterday",
            Self::RangeThreeDays => "Last 3 days",
            Self::RangeWeek => "Last week",
            Self::Reload => "Reload feed",
            Self::LoadMore => "Load more articles",
            Self::OpenInBrowser => "Open in browser",
            Self::ShowHelp => "Toggle help",
        }
    }

    /// Name used in the `[keys]` config table.
    pub fn config_name(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::NavDown => "nav_down",
            Self::NavUp => "nav_up",
            Self::PageDown => "page_down",
            Self::PageUp => "page_up",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::NextCategory => "next_category",
            Self::PrevCategory => "prev_category",
            Self::CycleRange => "cycle_range",
            Self::RangeToday => "range_today",
            Self::RangeYesterday => "range_yesterday",
            Self::RangeThreeDays => "range_3days",
            Self::RangeWeek => "range_week",
            Self::Reload => "reload",
            Self::LoadMore => "load_more",
            Self::OpenInBrowser => "open",
            Self::ShowHelp => "help",
        }
    }

    fn from_config_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.config_name() == name)
    }
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

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report `G` as Shift+`G` and Shift+Tab as `BackTab` with
    /// Shift; the shift is already encoded in the code.
    fn normalized(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::new(code, modifiers.difference(KeyModifiers::SHIFT))
    }
}

/// Parse a key string from config: `"q"`, `"Ctrl+d"`, `"Enter"`, `"PageDown"`, `"F5"`.
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "backtab" => Some(KeyCode::BackTab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(|c: char| c == 'F' || c == 'f')
        .and_then(|n| n.parse::<u8>().ok())
    {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Format a key for the help overlay.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => "?".to_string(),
    };

    format!("{modifier}{name}")
}

// ============================================================================
// Keymap
// ============================================================================

/// Lookup table from key to action.
pub struct Keymap {
    lookup: HashMap<KeySpec, Action>,
    /// Binding order for the help overlay
    bindings: Vec<(KeySpec, Action)>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

impl Keymap {
    pub fn new() -> Self {
        let mut keymap = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        keymap.register_defaults();
        keymap
    }

    fn bind(&mut self, key: KeySpec, action: Action) {
        if let Some(previous) = self.lookup.insert(key, action) {
            self.bindings.retain(|(k, a)| !(*k == key && *a == previous));
        }
        self.bindings.push((key, action));
    }

    fn register_defaults(&mut self) {
        self.bind(KeySpec::ch('q'), Action::Quit);
        self.bind(KeySpec::ctrl('c'), Action::Quit);

        self.bind(KeySpec::ch('j'), Action::NavDown);
        self.bind(KeySpec::plain(KeyCode::Down), Action::NavDown);
        self.bind(KeySpec::ch('k'), Action::NavUp);
        self.bind(KeySpec::plain(KeyCode::Up), Action::NavUp);
        self.bind(KeySpec::ctrl('d'), Action::PageDown);
        self.bind(KeySpec::plain(KeyCode::PageDown), Action::PageDown);
        self.bind(KeySpec::ctrl('u'), Action::PageUp);
        self.bind(KeySpec::plain(KeyCode::PageUp), Action::PageUp);
        self.bind(KeySpec::ch('g'), Action::Top);
        self.bind(KeySpec::plain(KeyCode::Home), Action::Top);
        self.bind(KeySpec::ch('G'), Action::Bottom);
        self.bind(KeySpec::plain(KeyCode::End), Action::Bottom);

        self.bind(KeySpec::ch('l'), Action::NextCategory);
        self.bind(KeySpec::plain(KeyCode::Right), Action::NextCategory);
        self.bind(KeySpec::plain(KeyCode::Tab), Action::NextCategory);
        self.bind(KeySpec::ch('h'), Action::PrevCategory);
        self.bind(KeySpec::plain(KeyCode::Left), Action::PrevCategory);
        self.bind(KeySpec::plain(KeyCode::BackTab), Action::PrevCategory);

        self.bind(KeySpec::ch('t'), Action::CycleRange);
        self.bind(KeySpec::ch('1'), Action::RangeToday);
        self.bind(KeySpec::ch('2'), Action::RangeYesterday);
        self.bind(KeySpec::ch('3'), Action::RangeThreeDays);
        self.bind(KeySpec::ch('4'), Action::RangeWeek);

        self.bind(KeySpec::ch('r'), Action::Reload);
        self.bind(KeySpec::ch('m'), Action::LoadMore);
        self.bind(KeySpec::ch('o'), Action::OpenInBrowser);
        self.bind(KeySpec::plain(KeyCode::Enter), Action::OpenInBrowser);
        self.bind(KeySpec::ch('?'), Action::ShowHelp);
    }

    /// Apply `[keys]` overrides: action name to key string.
    ///
    /// An override replaces every default key of that action. Returns a
    /// warning per unknown action or unparseable key.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = Action::from_config_name(action_name) else {
                warnings.push(format!("Unknown action '{action_name}', ignoring"));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{key_str}' for action '{action_name}', ignoring"
                ));
                continue;
            };

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, a)| *a != action);
            self.bind(key, action);

            tracing::info!(action = %action_name, key = %key_str, "Applied key override");
        }

        warnings
    }

    pub fn action_for_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        self.lookup
            .get(&KeySpec::normalized(code, modifiers))
            .copied()
    }

    /// Display form of the first key bound to `action`, if any.
    pub fn key_label(&self, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(_, a)| *a == action)
            .map(|(k, _)| format_key(k))
    }

    /// `(keys, description)` rows for the help overlay, one per action.
    pub fn help_rows(&self) -> Vec<(String, &'static str)> {
        Action::ALL
            .into_iter()
            .filter_map(|action| {
                let keys: Vec<String> = self
                    .bindings
                    .iter()
                    .filter(|(_, a)| *a == action)
                    .map(|(k, _)| format_key(k))
                    .collect();
                (!keys.is_empty()).then(|| (keys.join(" / "), action.describe()))
            })
            .collect()
    }
}
