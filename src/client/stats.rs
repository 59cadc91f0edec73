use crate::types::events::UsageMetadata;

/// Running token totals across every usage report of a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    prompt_tokens: u64,
    response_tokens: u64,
    total_tokens: u64,
    reports: u64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update_usage(&mut self, usage: &UsageMetadata) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(usage.prompt_token_count().unwrap_or(0));
        self.response_tokens = self.response_tokens.saturating_add(usage.response_token_count().unwrap_or(0));
        self.total_tokens = self.total_tokens.saturating_add(usage.total_token_count().unwrap_or(0));
        self.reports = self.reports.saturating_add(1);
    }

    pub fn prompt_tokens(&self) -> u64 {
        self.prompt_tokens
    }

    pub fn response_tokens(&self) -> u64 {
        self.response_tokens
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Number of usage reports seen.
    pub fn reports(&self) -> u64 {
        self.reports
    }
}
