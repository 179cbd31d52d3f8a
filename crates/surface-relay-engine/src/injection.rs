//! # Write-back
//!
//! Third-party editors handle programmatic text injection in undocumented and
//! mutually incompatible ways, so no single technique works everywhere. The
//! engine runs an ordered cascade and records what each step did:
//!
//! 1. **Input event**: dispatch a `beforeinput`/`insertText` event; rich
//!    editors that listen for it update their own model.
//! 2. **Paste simulation**: when the text is still not visible, put it on the
//!    clipboard, select the existing content, focus, wait briefly for
//!    late-installed handlers, then dispatch a synthetic `paste`.
//! 3. **Direct content**: when the paste throws, assign raw text content.
//! 4. **Native value**: always assign the native value and refocus, since
//!    some fields only honor the value setter.
//!
//! Every step can be disabled through [`InjectionConfig`]. A failing step is
//! recorded in the [`FillReport`] and the cascade moves on. With no surface
//! at all the text only goes to the clipboard.

use std::time::Duration;

use surface_relay_config::InjectionConfig;

use crate::host::{Host, HostError, Surface};
use crate::surface::TrackedSurface;

/// One technique for overwriting a surface's text, in cascade order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionStrategy {
    InputEvent,
    PasteSimulation,
    DirectContent,
    NativeValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// The step ran without error
    Applied,
    /// The step was not needed because the text was already visible
    AlreadyPresent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: InjectionStrategy,
    pub status: AttemptStatus,
}

/// Ordered record of every strategy the cascade reached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub attempts: Vec<Attempt>,
}

impl FillReport {
    fn record(&mut self, strategy: InjectionStrategy, result: Result<(), HostError>) {
        let status = match result {
            Ok(()) => AttemptStatus::Applied,
            Err(err) => {
                log::warn!("{strategy:?} write-back failed: {err}");
                AttemptStatus::Failed(err.to_string())
            }
        };
        self.attempts.push(Attempt { strategy, status });
    }

    pub fn status_of(&self, strategy: InjectionStrategy) -> Option<&AttemptStatus> {
        self.attempts
            .iter()
            .find(|attempt| attempt.strategy == strategy)
            .map(|attempt| &attempt.status)
    }

    pub fn strategies(&self) -> Vec<InjectionStrategy> {
        self.attempts.iter().map(|attempt| attempt.strategy).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// The cascade ran against a tracked surface
    Injected(FillReport),
    /// No surface was tracked; the text was only written to the clipboard
    ClipboardOnly,
}

impl FillOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, FillOutcome::ClipboardOnly)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InjectionEngine {
    config: InjectionConfig,
}

impl InjectionEngine {
    pub fn new(config: InjectionConfig) -> Self {
        Self { config }
    }

    pub fn paste_delay(&self) -> Duration {
        Duration::from_millis(self.config.paste_delay_ms)
    }

    /// Replace the full text of `surface` with `text`.
    ///
    /// Only the degraded clipboard-only path can fail; strategy failures are
    /// reported inside the returned [`FillReport`].
    pub async fn fill<H: Host>(
        &self,
        host: &H,
        surface: Option<&TrackedSurface<H::Surface>>,
        text: &str,
    ) -> Result<FillOutcome, HostError> {
        let Some(surface) = surface else {
            log::debug!("No surface tracked, copying text to the clipboard");
            host.write_clipboard(text).await?;
            return Ok(FillOutcome::ClipboardOnly);
        };

        let element = surface.element();
        let mut report = FillReport::default();

        if self.config.input_event {
            report.record(
                InjectionStrategy::InputEvent,
                element.dispatch_insert_text(text),
            );
        }

        let mut settled = shows(&surface.visible_text(), text);

        if self.config.paste_simulation {
            if settled {
                report.attempts.push(Attempt {
                    strategy: InjectionStrategy::PasteSimulation,
                    status: AttemptStatus::AlreadyPresent,
                });
            } else {
                let result = self.simulate_paste(host, surface, text).await;
                settled = result.is_ok();
                report.record(InjectionStrategy::PasteSimulation, result);
            }
        }

        if self.config.direct_content && !settled {
            report.record(
                InjectionStrategy::DirectContent,
                element.set_text_content(text),
            );
        }

        if self.config.native_value {
            let result = element.set_value(text).and_then(|()| element.focus());
            report.record(InjectionStrategy::NativeValue, result);
        }

        Ok(FillOutcome::Injected(report))
    }

    async fn simulate_paste<H: Host>(
        &self,
        host: &H,
        surface: &TrackedSurface<H::Surface>,
        text: &str,
    ) -> Result<(), HostError> {
        let element = surface.element();
        if let Err(err) = host.write_clipboard(text).await {
            log::warn!("Clipboard write before paste failed: {err}");
        }
        host.select_contents(surface)?;
        element.focus()?;
        host.sleep(self.paste_delay()).await;
        element.dispatch_paste(text)
    }
}

/// Whether `visible` already shows `text`. An empty target only counts as
/// shown when the surface is empty too.
///
/// This is a containment check, not equality: a target that is a substring of
/// longer existing text counts as shown, so the paste and direct-content steps
/// are skipped and only the native value assignment replaces the text. A
/// content-editable region keeps the longer text in that case.
fn shows(visible: &str, text: &str) -> bool {
    if text.is_empty() {
        visible.is_empty()
    } else {
        visible.contains(text)
    }
}
