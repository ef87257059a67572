//! Theme selection for code highlighting.
//!
//! A [`ThemeResolver`] either uses a fixed theme name or, in auto mode, picks
//! the configured dark or light theme from the current [`Appearance`] reported
//! by a [`PreferenceSignal`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Default theme for dark appearance.
pub const DEFAULT_DARK_THEME: &str = "base16-ocean.dark";

/// Default theme for light appearance.
pub const DEFAULT_LIGHT_THEME: &str = "InspiredGitHub";

/// Dark or light color-scheme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

impl Appearance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Appearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an [`Appearance`].
#[derive(Debug, thiserror::Error)]
#[error("invalid appearance `{0}`, expected `dark` or `light`")]
pub struct ParseAppearanceError(String);

impl FromStr for Appearance {
    type Err = ParseAppearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ParseAppearanceError(s.to_owned())),
        }
    }
}

/// How the highlighting theme is chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ThemeMode {
    /// Follow the preference signal.
    #[default]
    Auto,
    /// Always use this theme.
    Named(String),
}

impl FromStr for ThemeMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Named(s.to_owned()))
        }
    }
}

/// Concrete theme name handed to the highlighter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedTheme(String);

impl ResolvedTheme {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Callback invoked with the new appearance.
pub type AppearanceCallback = Box<dyn Fn(Appearance) + Send + Sync>;

/// Source of the dark/light preference.
pub trait PreferenceSignal: Send + Sync {
    /// Appearance at the moment of the call.
    fn current(&self) -> Appearance;

    /// Register `callback` for appearance changes.
    ///
    /// The callback stays registered until the returned subscription is dropped.
    fn subscribe(&self, callback: AppearanceCallback) -> PreferenceSubscription;
}

/// Keeps a preference callback registered. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct PreferenceSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl PreferenceSubscription {
    /// Subscription that runs `cancel` when dropped.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription for a signal that never changes.
    pub fn noop() -> Self {
        Self { cancel: None }
    }
}

impl Drop for PreferenceSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for PreferenceSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Preference that never changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedPreference(pub Appearance);

impl PreferenceSignal for FixedPreference {
    fn current(&self) -> Appearance {
        self.0
    }

    fn subscribe(&self, _callback: AppearanceCallback) -> PreferenceSubscription {
        PreferenceSubscription::noop()
    }
}

#[derive(Default)]
struct SharedState {
    appearance: Appearance,
    next_id: u64,
    subscribers: HashMap<u64, Arc<dyn Fn(Appearance) + Send + Sync>>,
}

/// Preference that can be changed at runtime, e.g. when a config file is
/// edited. Clones share the same state.
#[derive(Clone, Default)]
pub struct SharedPreference {
    state: Arc<Mutex<SharedState>>,
}

impl SharedPreference {
    #[must_use]
    pub fn new(appearance: Appearance) -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState {
                appearance,
                ..SharedState::default()
            })),
        }
    }

    /// Update the appearance and notify subscribers if it changed.
    pub fn set(&self, appearance: Appearance) {
        let callbacks: Vec<_> = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.appearance == appearance {
                return;
            }
            state.appearance = appearance;
            state.subscribers.values().cloned().collect()
        };

        tracing::debug!(%appearance, subscribers = callbacks.len(), "Appearance changed");
        for callback in callbacks {
            callback(appearance);
        }
    }
}

impl PreferenceSignal for SharedPreference {
    fn current(&self) -> Appearance {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .appearance
    }

    fn subscribe(&self, callback: AppearanceCallback) -> PreferenceSubscription {
        let id = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.insert(id, Arc::from(callback));
            id
        };

        let state = Arc::downgrade(&self.state);
        PreferenceSubscription::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .subscribers
                    .remove(&id);
            }
        })
    }
}

impl fmt::Debug for SharedPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPreference")
            .field("appearance", &self.current())
            .finish_non_exhaustive()
    }
}

/// Resolves the theme for a render.
pub struct ThemeResolver {
    mode: ThemeMode,
    dark: String,
    light: String,
    signal: Arc<dyn PreferenceSignal>,
}

impl ThemeResolver {
    /// Resolver with default dark/light themes.
    pub fn new(mode: ThemeMode, signal: Arc<dyn PreferenceSignal>) -> Self {
        Self {
            mode,
            dark: DEFAULT_DARK_THEME.to_owned(),
            light: DEFAULT_LIGHT_THEME.to_owned(),
            signal,
        }
    }

    /// Set the themes used in auto mode.
    #[must_use]
    pub fn with_themes(mut self, dark: impl Into<String>, light: impl Into<String>) -> Self {
        self.dark = dark.into();
        self.light = light.into();
        self
    }

    pub fn mode(&self) -> &ThemeMode {
        &self.mode
    }

    /// Resolve against the signal's current appearance.
    pub fn resolve(&self) -> ResolvedTheme {
        match &self.mode {
            ThemeMode::Named(name) => ResolvedTheme::new(name.clone()),
            ThemeMode::Auto => self.resolve_for(self.signal.current()),
        }
    }

    /// Resolve as if the signal reported `appearance`.
    pub fn resolve_for(&self, appearance: Appearance) -> ResolvedTheme {
        match &self.mode {
            ThemeMode::Named(name) => ResolvedTheme::new(name.clone()),
            ThemeMode::Auto => ResolvedTheme::new(match appearance {
                Appearance::Dark => self.dark.clone(),
                Appearance::Light => self.light.clone(),
            }),
        }
    }

    /// Call `callback` with the newly resolved theme whenever the preference
    /// changes. Returns `None` for a named theme, which never changes.
    pub fn subscribe(
        &self,
        callback: impl Fn(ResolvedTheme) + Send + Sync + 'static,
    ) -> Option<PreferenceSubscription> {
        if !matches!(self.mode, ThemeMode::Auto) {
            return None;
        }

        let dark = self.dark.clone();
        let light = self.light.clone();
        Some(self.signal.subscribe(Box::new(move |appearance| {
            let theme = match appearance {
                Appearance::Dark => &dark,
                Appearance::Light => &light,
            };
            callback(ResolvedTheme::new(theme.clone()));
        })))
    }
}

impl fmt::Debug for ThemeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeResolver")
            .field("mode", &self.mode)
            .field("dark", &self.dark)
            .field("light", &self.light)
            .finish_non_exhaustive()
    }
}
