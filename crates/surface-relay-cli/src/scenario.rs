//! Scenario files describing a document, its focused surface and the
//! commands an external session sends to it.

use anyhow::{Context, Result};
use futures::executor::block_on;
use serde::Deserialize;
use std::path::Path;
use std::rc::Rc;

use surface_relay_config::Config;
use surface_relay_engine::host::memory::{EventResponse, MemoryHost, MemoryPort, MemorySurface};
use surface_relay_engine::surface::SelectionDirection;
use surface_relay_engine::{
    CommandEnvelope, Dispatch, InjectionEngine, SessionContext, SessionId, SessionRouter, Surface,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    /// Pin the session id so replies in `commands` can address it
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Document selection as `[anchor, focus]`
    #[serde(default)]
    pub document_selection: Option<(usize, usize)>,
    #[serde(default)]
    pub clipboard_failure: Option<String>,
    #[serde(default)]
    pub surface: Option<SurfaceSpec>,
    pub commands: Vec<CommandEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SurfaceSpec {
    #[serde(default = "default_node")]
    pub node: String,
    #[serde(default)]
    pub content_editable: bool,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub selection: Option<SelectionSpec>,
    #[serde(default)]
    pub on_insert_text: Reaction,
    #[serde(default)]
    pub on_paste: Reaction,
}

fn default_node() -> String {
    "TEXTAREA".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionSpec {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub direction: String,
}

/// How the surface reacts to a synthetic event
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    #[default]
    Ignore,
    Apply,
    Fail(String),
}

impl From<Reaction> for EventResponse {
    fn from(reaction: Reaction) -> Self {
        match reaction {
            Reaction::Ignore => EventResponse::Ignore,
            Reaction::Apply => EventResponse::Apply,
            Reaction::Fail(reason) => EventResponse::Fail(reason),
        }
    }
}

impl SurfaceSpec {
    fn build(&self) -> MemorySurface {
        let mut surface = MemorySurface::new(&self.node)
            .on_insert_text(self.on_insert_text.clone().into())
            .on_paste(self.on_paste.clone().into());
        if let Some(value) = &self.value {
            surface = surface.with_value(value);
        }
        if let Some(text) = &self.text {
            surface = surface.with_text_content(text);
        }
        if let Some(selection) = &self.selection {
            let direction = selection
                .direction
                .parse()
                .unwrap_or(SelectionDirection::Unknown);
            surface = surface.with_selection(selection.start, selection.end, direction);
        }
        surface.set_content_editable(self.content_editable);
        surface
    }
}

/// What a replay produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    /// JSON of every message posted to the external session, in order
    pub outbound: Vec<String>,
    /// One entry per command; `None` where the command was ignored
    pub dispatches: Vec<Option<Dispatch>>,
    pub value: Option<String>,
    pub text: Option<String>,
    pub clipboard: Option<String>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid scenario")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario '{}'", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse scenario '{}'", path.display()))
    }

    pub fn replay(&self, config: &Config) -> Result<Replay> {
        let mut host = MemoryHost::new();
        if let Some((anchor, focus)) = self.document_selection {
            host = host.with_document_selection(anchor, focus);
        }
        host.set_hidden(self.hidden);
        if let Some(reason) = &self.clipboard_failure {
            host.fail_clipboard(reason);
        }

        let context = Rc::new(match &self.session_id {
            Some(id) => SessionContext::with_id(SessionId::from(id.as_str()), config.clone()),
            None => SessionContext::new(config.clone()),
        });
        let surface = self.surface.as_ref().map(SurfaceSpec::build);
        if let Some(surface) = &surface
            && !context.on_focus(surface.clone())
        {
            log::info!("Surface <{}> is not editable, nothing tracked", surface.node_name());
        }

        let port = MemoryPort::new();
        let router = SessionRouter::new(
            context,
            host.clone(),
            port.clone(),
            InjectionEngine::new(config.injection.clone()),
        );

        let dispatches = self
            .commands
            .iter()
            .map(|envelope| block_on(router.handle(envelope.clone())))
            .collect();

        let outbound = port
            .sent()
            .iter()
            .map(|message| message.to_json())
            .collect::<serde_json::Result<Vec<_>>>()?;

        Ok(Replay {
            outbound,
            dispatches,
            value: surface.as_ref().and_then(|s| s.value()),
            text: surface.as_ref().and_then(|s| s.text_content()),
            clipboard: host.clipboard(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use surface_relay_engine::FillOutcome;

    #[test]
    fn test_pull_then_push_on_plain_field() {
        let scenario = Scenario::from_json(
            r#"{
                "sessionId": "tab-1",
                "surface": {
                    "node": "TEXTAREA",
                    "value": "hello\nworld",
                    "selection": { "start": 6, "end": 6, "direction": "forward" }
                },
                "commands": [
                    { "command": "edit-text-input" },
                    { "command": "fill-text-input", "arguments": ["tab-1", "bye"] }
                ]
            }"#,
        )
        .unwrap();

        let replay = scenario.replay(&Config::default()).unwrap();

        assert_eq!(
            replay.outbound,
            vec![
                r#"{"command":"edit","arguments":[{"text":"hello\nworld","anchorLine":2,"anchorColumn":1,"cursorLine":2,"cursorColumn":1,"sessionId":"tab-1"}]}"#
                    .to_string()
            ]
        );
        assert_eq!(replay.value.as_deref(), Some("bye"));
        assert!(matches!(
            replay.dispatches[1],
            Some(Dispatch::Fill(FillOutcome::Injected(_)))
        ));
    }

    #[test]
    fn test_foreign_reply_is_ignored() {
        let scenario = Scenario::from_json(
            r#"{
                "sessionId": "mine",
                "surface": { "value": "keep" },
                "commands": [
                    { "command": "fill-text-input", "arguments": ["theirs", "clobber"] }
                ]
            }"#,
        )
        .unwrap();

        let replay = scenario.replay(&Config::default()).unwrap();

        assert_eq!(replay.dispatches, vec![None]);
        assert_eq!(replay.value.as_deref(), Some("keep"));
        assert_eq!(replay.clipboard, None);
    }

    #[test]
    fn test_unrecognized_node_leaves_reply_on_clipboard() {
        let scenario = Scenario::from_json(
            r#"{
                "sessionId": "s",
                "surface": { "node": "SPAN", "text": "label" },
                "commands": [
                    { "command": "edit-text-input" },
                    { "command": "fill-text-input", "arguments": ["s", "copied"] }
                ]
            }"#,
        )
        .unwrap();

        let replay = scenario.replay(&Config::default()).unwrap();

        assert!(replay.outbound.is_empty());
        assert_eq!(
            replay.dispatches,
            vec![None, Some(Dispatch::Fill(FillOutcome::ClipboardOnly))]
        );
        assert_eq!(replay.text.as_deref(), Some("label"));
        assert_eq!(replay.clipboard.as_deref(), Some("copied"));
    }

    #[test]
    fn test_rich_surface_with_paste_listener() {
        let scenario = Scenario::from_json(
            r#"{
                "sessionId": "s",
                "documentSelection": [2, 2],
                "surface": {
                    "node": "DIV",
                    "contentEditable": true,
                    "text": "draft",
                    "onPaste": "apply"
                },
                "commands": [
                    { "command": "fill-text-input", "arguments": ["s", "final"] }
                ]
            }"#,
        )
        .unwrap();

        let replay = scenario.replay(&Config::default()).unwrap();

        assert_eq!(replay.text.as_deref(), Some("final"));
        assert_eq!(replay.clipboard.as_deref(), Some("final"));
    }

    #[test]
    fn test_failing_reaction_parses() {
        let spec: SurfaceSpec =
            serde_json::from_str(r#"{ "onInsertText": { "fail": "blocked" } }"#).unwrap();

        assert_eq!(spec.node, "TEXTAREA");
        assert_eq!(spec.on_insert_text, Reaction::Fail("blocked".to_string()));
        assert_eq!(spec.on_paste, Reaction::Ignore);
    }

    #[test]
    fn test_unknown_scenario_field_is_rejected() {
        let result = Scenario::from_json(r#"{ "commands": [], "tabs": 3 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, r#"{ "hidden": true, "commands": [] }"#).unwrap();

        let scenario = Scenario::load(&path).unwrap();

        assert!(scenario.hidden);
        assert!(scenario.commands.is_empty());
    }
}
