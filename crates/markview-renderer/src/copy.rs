//! Copy-to-clipboard control of code shells.
//!
//! Each highlighted fence is wrapped in a shell whose copy button names the
//! code body by `data-copy-target`. Two realisations of the same behaviour
//! exist:
//!
//! - [`CopyHandler`] works on a [`RenderOutput`](crate::RenderOutput) and any
//!   [`Clipboard`] implementation.
//! - [`COPY_SCRIPT`] is installed on a preview page and handles clicks inside
//!   the element marked with `data-markview-root`.

use std::time::{Duration, Instant};

/// Label shown on an idle copy button.
pub const COPY_LABEL: &str = "Copy";

/// How long the success or failure label is shown.
pub const FEEDBACK_DURATION: Duration = Duration::from_millis(1500);

/// Click handler for copy buttons, scoped to the preview root element.
pub const COPY_SCRIPT: &str = r#"(function () {
  var root = document.querySelector("[data-markview-root]");
  if (!root) return;
  root.addEventListener("click", function (event) {
    var button = event.target.closest(".copy-btn");
    if (!button || !root.contains(button)) return;
    var shell = button.closest(".code-block");
    var body = shell && shell.querySelector(".code-body");
    if (!body) return;
    var show = function (label) {
      button.textContent = label;
      clearTimeout(button._markviewTimer);
      button._markviewTimer = setTimeout(function () {
        button.textContent = "Copy";
      }, 1500);
    };
    navigator.clipboard.writeText(body.innerText).then(
      function () { show("Copied!"); },
      function () { show("Copy failed"); }
    );
  });
})();"#;

/// Error returned by a [`Clipboard`].
#[derive(Debug, thiserror::Error)]
#[error("clipboard write failed: {0}")]
pub struct ClipboardError(pub String);

/// Destination of copied text.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Error returned by [`CopyHandler::copy`].
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("no code block with id `{0}`")]
    UnknownTarget(String),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Raw source of a highlighted code block, keyed by its shell id.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeBlockSource {
    /// Id of the code body element (`code-{n}`).
    pub id: String,
    /// Language tag of the fence.
    pub language: String,
    /// Literal fence body.
    pub source: String,
}

/// Outcome shown on a button after a copy attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    Copied,
    Failed,
}

impl Feedback {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Copied => "Copied!",
            Self::Failed => "Copy failed",
        }
    }
}

/// Display state of one copy button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyButton {
    target: String,
    feedback: Option<(Feedback, Instant)>,
}

impl CopyButton {
    /// Button targeting the code body with id `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            feedback: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Label at time `now`. Feedback reverts to [`COPY_LABEL`] after
    /// [`FEEDBACK_DURATION`].
    pub fn label(&self, now: Instant) -> &'static str {
        match self.feedback {
            Some((feedback, since)) if now.saturating_duration_since(since) < FEEDBACK_DURATION => {
                feedback.label()
            }
            _ => COPY_LABEL,
        }
    }

    fn show(&mut self, feedback: Feedback, now: Instant) {
        self.feedback = Some((feedback, now));
    }
}

/// Copies code blocks of one render to a clipboard.
#[derive(Clone, Copy, Debug)]
pub struct CopyHandler<'a> {
    blocks: &'a [CodeBlockSource],
}

impl<'a> CopyHandler<'a> {
    pub fn new(blocks: &'a [CodeBlockSource]) -> Self {
        Self { blocks }
    }

    /// Buttons for every code block, in document order.
    pub fn buttons(&self) -> Vec<CopyButton> {
        self.blocks
            .iter()
            .map(|block| CopyButton::new(block.id.clone()))
            .collect()
    }

    /// Source of the block with shell id `target`.
    pub fn source(&self, target: &str) -> Option<&'a str> {
        self.blocks
            .iter()
            .find(|block| block.id == target)
            .map(|block| block.source.as_str())
    }

    /// Write the code of `button`'s target to `clipboard` and update the
    /// button's feedback.
    ///
    /// Unknown targets leave the button untouched. Clipboard failures show
    /// the failure label and are returned.
    pub fn copy(
        &self,
        button: &mut CopyButton,
        clipboard: &mut dyn Clipboard,
        now: Instant,
    ) -> Result<(), CopyError> {
        let source = self
            .source(&button.target)
            .ok_or_else(|| CopyError::UnknownTarget(button.target.clone()))?;

        match clipboard.write_text(source) {
            Ok(()) => {
                button.show(Feedback::Copied, now);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(target_id = %button.target, error = %e, "Copy to clipboard failed");
                button.show(Feedback::Failed, now);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct MemoryClipboard {
        contents: Option<String>,
        fail: bool,
    }

    impl Clipboard for MemoryClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError("denied".to_owned()));
            }
            self.contents = Some(text.to_owned());
            Ok(())
        }
    }

    fn blocks() -> Vec<CodeBlockSource> {
        vec![
            CodeBlockSource {
                id: "code-0".to_owned(),
                language: "rust".to_owned(),
                source: "fn main() {}\n".to_owned(),
            },
            CodeBlockSource {
                id: "code-1".to_owned(),
                language: "text".to_owned(),
                source: "<raw & text>\n".to_owned(),
            },
        ]
    }

    #[test]
    fn test_copy_writes_verbatim_source() {
        let blocks = blocks();
        let handler = CopyHandler::new(&blocks);
        let mut button = CopyButton::new("code-1");
        let mut clipboard = MemoryClipboard::default();
        let now = Instant::now();

        handler.copy(&mut button, &mut clipboard, now).unwrap();

        assert_eq!(clipboard.contents.as_deref(), Some("<raw & text>\n"));
        assert_eq!(button.label(now), "Copied!");
        assert_eq!(button.label(now + FEEDBACK_DURATION), "Copy");
    }

    #[test]
    fn test_copy_failure_label() {
        let blocks = blocks();
        let handler = CopyHandler::new(&blocks);
        let mut button = CopyButton::new("code-0");
        let mut clipboard = MemoryClipboard {
            fail: true,
            ..MemoryClipboard::default()
        };
        let now = Instant::now();

        let err = handler.copy(&mut button, &mut clipboard, now).unwrap_err();

        assert!(matches!(err, CopyError::Clipboard(_)));
        assert_eq!(button.label(now), "Copy failed");
        assert_eq!(
            button.label(now + Duration::from_millis(1499)),
            "Copy failed"
        );
        assert_eq!(button.label(now + Duration::from_secs(2)), "Copy");
    }

    #[test]
    fn test_unknown_target() {
        let blocks = blocks();
        let handler = CopyHandler::new(&blocks);
        let mut button = CopyButton::new("code-9");
        let now = Instant::now();

        let err = handler
            .copy(&mut button, &mut MemoryClipboard::default(), now)
            .unwrap_err();

        assert_eq!(err.to_string(), "no code block with id `code-9`");
        assert_eq!(button.label(now), "Copy");
    }

    #[test]
    fn test_buttons_in_document_order() {
        let blocks = blocks();
        let targets: Vec<String> = CopyHandler::new(&blocks)
            .buttons()
            .iter()
            .map(|b| b.target().to_owned())
            .collect();
        assert_eq!(targets, vec!["code-0", "code-1"]);
    }

    #[test]
    fn test_script_scoped_to_root() {
        assert!(COPY_SCRIPT.contains("[data-markview-root]"));
        assert!(COPY_SCRIPT.contains("Copied!"));
        assert!(COPY_SCRIPT.contains("Copy failed"));
        assert!(COPY_SCRIPT.contains("1500"));
        assert!(!COPY_SCRIPT.contains("document.addEventListener"));
    }
}
