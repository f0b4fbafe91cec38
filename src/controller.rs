use anyhow::Result;
use serde_json::Value;

use crate::bridge::{self, FetchOptions, SessionContext};
use crate::report::{self, ColumnSelection, GameRecord};

/// Handler layer behind the webview commands. Owns the HTTP client and
/// the session context so every handler can be driven from tests
/// without a running webview.
pub struct UiController {
    http: reqwest::Client,
    ctx: SessionContext,
}

impl UiController {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            ctx: SessionContext::default(),
        }
    }

    pub async fn fetch_json(&self, url: &str, options: FetchOptions) -> Result<Value> {
        bridge::perform_fetch(&self.http, &self.ctx, url, options).await
    }

    pub fn username(&self) -> Option<String> {
        self.ctx.username()
    }

    /// Render the report, falling back to the remembered username and
    /// then to "Unknown" when the caller does not pass one.
    pub fn render_results(
        &self,
        username: Option<String>,
        games: &[GameRecord],
        selection: ColumnSelection,
    ) -> String {
        let username = username
            .or_else(|| self.ctx.username())
            .unwrap_or_else(|| "Unknown".to_string());
        report::render(&username, games, selection)
    }
}

impl Default for UiController {
    fn default() -> Self {
        Self::new()
    }
}
