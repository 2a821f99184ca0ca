pub mod errors;
pub mod models;
pub mod providers;
pub mod render;
pub mod services;
pub mod storage;

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, warn};

use errors::CoreError;
use models::chart::ChartLayout;
use models::settings::{DashboardConfig, Preferences};
use models::state::{LegendToggle, TransactionState};
use providers::registry::DataProviderRegistry;
use render::chart_renderer::{ChartRenderer, RenderOptions};
use render::svg::SvgCanvas;
use services::animation_service::{AnimatedChart, AnimationScheduler};
use services::chart_service::ChartService;
use services::currency_service::SOURCE_CURRENCY;
use services::date_range_service::DateRangeParser;
use services::terminal_service::{CommandOutput, TerminalService};
use storage::loader::DataLoader;
use storage::preferences::PreferenceStore;

/// Background of rendered charts.
const CHART_BACKGROUND: &str = "#111111";

/// Main entry point for the fund dashboard core.
/// Holds the view state, the data sources and the services that operate on them.
#[must_use]
pub struct FundDashboard {
    config: DashboardConfig,
    state: TransactionState,
    terminal: TerminalService,
    registry: DataProviderRegistry,
    animations: AnimationScheduler,
    preferences: PreferenceStore,
    renderer: ChartRenderer,
    started: Instant,
}

impl std::fmt::Debug for FundDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundDashboard")
            .field("providers", &self.registry.provider_names())
            .field("transactions", &self.state.all_transactions.len())
            .field("active_chart", &self.state.active_chart)
            .field("currency", &self.state.selected_currency)
            .finish()
    }
}

impl FundDashboard {
    /// Dashboard reading from the sources named in `config`.
    pub fn new(config: DashboardConfig, preferences: PreferenceStore) -> Self {
        let registry = DataProviderRegistry::from_config(&config);
        Self::with_registry(config, registry, preferences)
    }

    /// Dashboard over a caller-assembled provider registry.
    pub fn with_registry(
        config: DashboardConfig,
        registry: DataProviderRegistry,
        preferences: PreferenceStore,
    ) -> Self {
        let prefs = preferences.load().unwrap_or_else(|e| {
            warn!(error = %e, "preferences unreadable; using defaults");
            Preferences::default()
        });
        let mut state = TransactionState::new();
        state.set_selected_currency(&prefs.selected_currency);

        let terminal = TerminalService::new(
            DateRangeParser::from_system_clock(),
            ChartService::with_config(&config),
        );
        Self {
            animations: AnimationScheduler::new(config.animations_enabled),
            config,
            state,
            terminal,
            registry,
            preferences,
            renderer: ChartRenderer::default(),
            started: Instant::now(),
        }
    }

    /// Pin "today" for relative date words and contribution padding.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.terminal = TerminalService::new(
            DateRangeParser::new(today),
            ChartService::with_config(&self.config).with_today(today),
        );
        self
    }

    // ── Data ────────────────────────────────────────────────────────

    /// Read every data file. Missing files leave their views empty.
    ///
    /// Without a published contribution series, one is rebuilt in USD from
    /// the transactions and padded to today; charts convert it on display.
    pub async fn load_data(&mut self) {
        let loaded = DataLoader::load_all(&self.registry).await;
        self.state.set_all_transactions(loaded.transactions);

        let mut data = loaded.chart_data;
        if data.contribution.is_empty() && !self.state.all_transactions.is_empty() {
            let today = self.terminal.charts().today();
            let entries = self
                .terminal
                .charts()
                .contribution_from_transactions(&self.state.all_transactions, today);
            info!(entries = entries.len(), "contribution series rebuilt from transactions");
            data.contribution.insert(SOURCE_CURRENCY.to_string(), entries);
        }
        self.state.set_data(data);
    }

    // ── Terminal ────────────────────────────────────────────────────

    /// Run one terminal command.
    ///
    /// Static text replies (`stats cagr` and friends) are fetched here and
    /// appended to the messages; `fetch` is always `None` on return.
    pub async fn run_command(&mut self, input: &str) -> CommandOutput {
        let previous = self.state.active_chart;
        let mut output = self.terminal.execute(&mut self.state, input);

        if let Some(file) = output.fetch.take() {
            let text = match self.registry.fetch_text(file.path()).await {
                Ok(text) => text.trim_end().to_string(),
                Err(e) => {
                    warn!(path = file.path(), error = %e, "static text unavailable");
                    file.error_message().to_string()
                }
            };
            output.messages.push(text);
        }

        if self.state.active_chart != previous {
            let now = self.elapsed_ms();
            self.animations.activate(self.state.active_chart, now);
        }
        output
    }

    /// Summary text for the chart currently shown.
    #[must_use]
    pub fn chart_summary(&self) -> Option<String> {
        self.terminal.chart_summary(&self.state)
    }

    // ── Charts ──────────────────────────────────────────────────────

    #[must_use]
    pub fn active_layout(&self) -> Option<ChartLayout> {
        self.terminal.charts().active_layout(&self.state)
    }

    /// SVG of the active chart, or `None` when no chart is shown or it has
    /// no data in range.
    #[must_use]
    pub fn render_active_svg(&self, width: f64, height: f64) -> Option<String> {
        let layout = self.active_layout()?;
        let glow_phase = AnimatedChart::for_chart(layout.kind)
            .filter(|chart| self.animations.running().contains(chart))
            .map(|chart| self.animations.tick(chart, self.elapsed_ms()));

        let mut canvas = SvgCanvas::new(width, height).with_background(CHART_BACKGROUND);
        let options = RenderOptions {
            show_labels: self.state.show_labels,
            glow_phase,
            ..RenderOptions::default()
        };
        self.renderer.render(&mut canvas, &layout, &options);
        Some(canvas.finish())
    }

    /// Legend click on `key` in the active chart.
    pub fn toggle_series(&mut self, key: &str) -> LegendToggle {
        self.state.toggle_series(key)
    }

    pub fn set_animations_enabled(&mut self, enabled: bool) {
        self.config.animations_enabled = enabled;
        self.animations.set_enabled(enabled);
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Switch the display currency and persist it.
    pub fn set_currency(&mut self, code: &str) -> Result<(), CoreError> {
        self.state.set_selected_currency(code);
        let prefs = Preferences {
            selected_currency: self.state.selected_currency.clone(),
        };
        self.preferences.save(&prefs)
    }

    #[must_use]
    pub fn selected_currency(&self) -> &str {
        &self.state.selected_currency
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    // ── State Access ────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TransactionState {
        &mut self.state
    }

    #[must_use]
    pub fn terminal(&self) -> &TerminalService {
        &self.terminal
    }

    #[must_use]
    pub fn animations(&self) -> &AnimationScheduler {
        &self.animations
    }

    /// Names of the configured data sources, in fetch order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.provider_names()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}
