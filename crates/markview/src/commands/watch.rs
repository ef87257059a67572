//! `markview watch` command implementation.
//!
//! Renders once, then re-renders whenever the markdown file changes.
//!
//! Configuration edits are applied without a restart. A changed appearance is
//! pushed into the preview's preference signal and the theme subscription
//! triggers the re-render. Any other theme or render change rebuilds the
//! preview.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};

use clap::Args;
use markview_config::Config;
use markview_renderer::{Appearance, PreferenceSubscription, ResolvedTheme};
use notify::{EventKind, RecursiveMode, Watcher};

use super::SourceArgs;
use super::render::{report_warnings, write_html};
use crate::debouncer::Debouncer;
use crate::error::CliError;
use crate::output::Output;
use crate::preview::Preview;

/// Quiet period before a changed file is acted upon.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// How often pending changes are checked.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// File the HTML is written to on every change.
    #[arg(short, long)]
    output: PathBuf,

    /// Wrap the fragment in a complete HTML page.
    #[arg(long)]
    standalone: bool,
}

impl WatchArgs {
    /// Execute the watch command. Runs until the process is interrupted.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config()?;

        let source_path = self.source.file.canonicalize()?;
        let config_path = config
            .config_path
            .as_deref()
            .map(Path::canonicalize)
            .transpose()?;

        let (theme_tx, theme_rx) = mpsc::channel();
        let mut session = Session::start(config, &theme_tx)?;
        self.render_once(&session.preview, &output)?;

        let watched: Vec<PathBuf> = [Some(source_path), config_path.clone()]
            .into_iter()
            .flatten()
            .collect();
        let debouncer = Arc::new(Debouncer::new(DEBOUNCE));
        let mut watcher = notify::recommended_watcher({
            let debouncer = Arc::clone(&debouncer);
            let watched = watched.clone();
            move |res| record_events(res, &debouncer, &watched)
        })?;
        for dir in watch_dirs(&watched) {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }

        output.info(&format!(
            "Watching {} (press Ctrl+C to stop)",
            self.source.file.display()
        ));
        if let Some(path) = &config_path {
            output.info(&format!("Configuration: {}", path.display()));
        }

        loop {
            std::thread::sleep(POLL_INTERVAL);

            let mut dirty = false;
            for path in debouncer.drain_ready() {
                if config_path.as_deref() == Some(path.as_path()) {
                    dirty |= self.reload_config(&mut session, &theme_tx, &output, &path);
                } else {
                    dirty = true;
                }
            }
            if let Some(theme) = theme_rx.try_iter().last() {
                output.info(&format!("Theme changed to {theme}"));
                dirty = true;
            }

            if dirty && let Err(err) = self.render_once(&session.preview, &output) {
                output.error(&format!("Error: {err}"));
            }
        }
    }

    fn render_once(&self, preview: &Preview, output: &Output) -> Result<(), CliError> {
        let start = Instant::now();
        let rendered = preview.render_file(&self.source.file, self.standalone)?;
        report_warnings(output, &rendered);
        write_html(&self.output, &rendered.html)?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            code_blocks = rendered.code_blocks.len(),
            "Rendered preview"
        );
        output.success(&format!("Wrote {}", self.output.display()));
        Ok(())
    }

    /// Apply the configuration at `path`. Returns whether the output needs a
    /// re-render that no theme notification will trigger.
    fn reload_config(
        &self,
        session: &mut Session,
        themes: &Sender<ResolvedTheme>,
        output: &Output,
        path: &Path,
    ) -> bool {
        let result = Config::load(Some(path), Some(&self.source.cli_settings()))
            .map_err(CliError::from)
            .and_then(|config| session.update(config, themes));
        match result {
            Ok(change) => {
                tracing::info!(?change, "Configuration reloaded");
                change == ConfigChange::Rebuild
            }
            Err(err) => {
                output.warning(&format!("Ignoring configuration change: {err}"));
                false
            }
        }
    }
}

/// What a configuration edit requires of the running preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfigChange {
    Unchanged,
    /// Only the appearance preference moved.
    Appearance,
    /// Theme mode, theme names or render options moved.
    Rebuild,
}

impl ConfigChange {
    fn between(old: &Config, new: &Config) -> Self {
        let themes_moved = old.theme.mode != new.theme.mode
            || old.theme.dark != new.theme.dark
            || old.theme.light != new.theme.light;
        if themes_moved || old.render != new.render {
            Self::Rebuild
        } else if old.theme.appearance != new.theme.appearance {
            Self::Appearance
        } else {
            Self::Unchanged
        }
    }
}

/// The running preview, its theme subscription and the configuration both
/// were built from.
struct Session {
    config: Config,
    preview: Preview,
    _subscription: Option<PreferenceSubscription>,
}

impl Session {
    fn start(config: Config, themes: &Sender<ResolvedTheme>) -> Result<Self, CliError> {
        let preview = Preview::new(&config)?;
        let themes = themes.clone();
        let subscription = preview.subscribe(move |theme| {
            let _ = themes.send(theme);
        });
        Ok(Self {
            config,
            preview,
            _subscription: subscription,
        })
    }

    /// Move to `config`. On error the session keeps its previous state.
    fn update(
        &mut self,
        config: Config,
        themes: &Sender<ResolvedTheme>,
    ) -> Result<ConfigChange, CliError> {
        let change = ConfigChange::between(&self.config, &config);
        match change {
            ConfigChange::Rebuild => *self = Self::start(config, themes)?,
            ConfigChange::Appearance => {
                let appearance = Appearance::from_str(&config.theme.appearance)?;
                self.preview.set_appearance(appearance);
                self.config = config;
            }
            ConfigChange::Unchanged => {}
        }
        Ok(change)
    }
}

/// Record create, modify and remove events for watched paths.
fn record_events(res: notify::Result<notify::Event>, debouncer: &Debouncer, watched: &[PathBuf]) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "File watcher error");
            return;
        }
    };
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }
    for path in event.paths {
        if watched.contains(&path) {
            debouncer.record(path);
        }
    }
}

/// Parent directories of `files`, deduplicated.
///
/// Directories are watched rather than files so that editors that save by
/// renaming a temporary file over the original keep being noticed.
fn watch_dirs(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = files
        .iter()
        .filter_map(|file| file.parent())
        .map(Path::to_path_buf)
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use markview_config::CliSettings;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_watch_dirs_dedup() {
        let dirs = watch_dirs(&[
            PathBuf::from("/notes/readme.md"),
            PathBuf::from("/notes/markview.toml"),
            PathBuf::from("/other/a.md"),
        ]);
        assert_eq!(dirs, vec![PathBuf::from("/notes"), PathBuf::from("/other")]);
    }

    #[test]
    fn test_record_events_filters_paths_and_kinds() {
        let debouncer = Debouncer::new(Duration::ZERO);
        let watched = vec![PathBuf::from("/notes/readme.md")];

        let modify = notify::Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/notes/readme.md"))
            .add_path(PathBuf::from("/notes/other.md"));
        record_events(Ok(modify), &debouncer, &watched);

        let access = notify::Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/notes/readme.md"));
        record_events(Ok(access), &debouncer, &watched);

        assert_eq!(debouncer.drain_ready(), watched);
    }

    #[test]
    fn test_record_events_rename_over_original() {
        let debouncer = Debouncer::new(Duration::ZERO);
        let watched = vec![PathBuf::from("/notes/readme.md")];

        let create = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/notes/readme.md"));
        record_events(Ok(create), &debouncer, &watched);

        assert_eq!(debouncer.drain_ready().len(), 1);
    }

    fn markdown(dir: &Path) -> PathBuf {
        let path = dir.join("notes.md");
        std::fs::write(&path, "```rust\nfn main() {}\n```").unwrap();
        path
    }

    #[test]
    fn test_config_change_classification() {
        let old = Config::default();

        assert_eq!(ConfigChange::between(&old, &Config::default()), ConfigChange::Unchanged);

        let mut new = Config::default();
        new.theme.appearance = "dark".to_owned();
        assert_eq!(ConfigChange::between(&old, &new), ConfigChange::Appearance);

        let edits: [fn(&mut Config); 4] = [
            |c| c.theme.mode = "InspiredGitHub".to_owned(),
            |c| c.theme.dark = "Solarized (dark)".to_owned(),
            |c| c.theme.light = "Solarized (light)".to_owned(),
            |c| c.render.typographer = false,
        ];
        for edit in edits {
            let mut new = Config::default();
            new.theme.appearance = "dark".to_owned();
            edit(&mut new);
            assert_eq!(ConfigChange::between(&old, &new), ConfigChange::Rebuild);
        }
    }

    #[test]
    fn test_session_rebuilds_on_theme_edit() {
        let dir = tempfile::tempdir().unwrap();
        let path = markdown(dir.path());
        let (tx, _rx) = mpsc::channel();
        let mut session = Session::start(Config::default(), &tx).unwrap();

        let mut config = Config::default();
        config.theme.light = "Solarized (light)".to_owned();
        assert_eq!(session.update(config, &tx).unwrap(), ConfigChange::Rebuild);

        let output = session.preview.render_file(&path, false).unwrap();
        assert!(output.html.contains(r#"data-theme="Solarized (light)""#));
    }

    #[test]
    fn test_session_rebuilt_preview_keeps_notifying() {
        let (tx, rx) = mpsc::channel();
        let mut session = Session::start(Config::default(), &tx).unwrap();

        let mut config = Config::default();
        config.theme.dark = "Solarized (dark)".to_owned();
        session.update(config, &tx).unwrap();

        let mut config = Config::default();
        config.theme.dark = "Solarized (dark)".to_owned();
        config.theme.appearance = "dark".to_owned();
        assert_eq!(session.update(config, &tx).unwrap(), ConfigChange::Appearance);

        let themes: Vec<String> = rx.try_iter().map(|t| t.as_str().to_owned()).collect();
        assert_eq!(themes, vec!["Solarized (dark)"]);
        assert_eq!(session.preview.appearance(), Appearance::Dark);
    }

    #[test]
    fn test_session_keeps_state_on_bad_theme() {
        let dir = tempfile::tempdir().unwrap();
        let path = markdown(dir.path());
        let (tx, _rx) = mpsc::channel();
        let mut session = Session::start(Config::default(), &tx).unwrap();

        let mut config = Config::default();
        config.theme.mode = "no-such-theme".to_owned();
        assert!(session.update(config, &tx).is_err());

        assert_eq!(session.config.theme.mode, "auto");
        let output = session.preview.render_file(&path, false).unwrap();
        assert!(output.html.contains(r#"data-theme="InspiredGitHub""#));
    }

    #[test]
    fn test_reloaded_cli_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markview.toml");
        std::fs::write(&path, "[theme]\nappearance = \"dark\"\n").unwrap();
        let settings = CliSettings {
            appearance: Some("light".to_owned()),
            ..Default::default()
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();
        assert_eq!(config.theme.appearance, "light");
    }
}
