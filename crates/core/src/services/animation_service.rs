use tracing::debug;

use crate::models::chart::ChartKind;

/// Default length of one glow cycle.
pub const DEFAULT_CYCLE_MS: f64 = 4000.0;

/// Charts with an animated glow trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimatedChart {
    Performance,
    Contribution,
    Fx,
    Pe,
    Concentration,
}

impl AnimatedChart {
    pub const ALL: [AnimatedChart; 5] = [
        AnimatedChart::Performance,
        AnimatedChart::Contribution,
        AnimatedChart::Fx,
        AnimatedChart::Pe,
        AnimatedChart::Concentration,
    ];

    /// Channel driving `kind`, if it animates.
    #[must_use]
    pub fn for_chart(kind: ChartKind) -> Option<Self> {
        match kind {
            ChartKind::Performance => Some(AnimatedChart::Performance),
            ChartKind::Contribution | ChartKind::DrawdownAbs => Some(AnimatedChart::Contribution),
            ChartKind::Fx => Some(AnimatedChart::Fx),
            ChartKind::Pe => Some(AnimatedChart::Pe),
            ChartKind::Concentration => Some(AnimatedChart::Concentration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelState {
    Idle,
    Running { started_at: f64 },
}

/// One looping animation. Timestamps are milliseconds from any monotonic
/// origin.
#[derive(Debug, Clone)]
pub struct AnimationChannel {
    state: ChannelState,
    cycle_ms: f64,
}

impl AnimationChannel {
    pub fn new(cycle_ms: f64) -> Self {
        Self {
            state: ChannelState::Idle,
            cycle_ms: if cycle_ms > 0.0 { cycle_ms } else { DEFAULT_CYCLE_MS },
        }
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, ChannelState::Running { .. })
    }

    /// Start at `ts`. A running channel keeps its original start.
    pub fn start(&mut self, ts: f64) {
        if !self.is_running() {
            self.state = ChannelState::Running { started_at: ts };
        }
    }

    pub fn stop(&mut self) {
        self.state = ChannelState::Idle;
    }

    /// Phase in `[0, 1)` while running, `0.0` when idle.
    #[must_use]
    pub fn tick(&self, ts: f64) -> f64 {
        match self.state {
            ChannelState::Idle => 0.0,
            ChannelState::Running { started_at } => {
                let elapsed = (ts - started_at).max(0.0);
                (elapsed % self.cycle_ms) / self.cycle_ms
            }
        }
    }
}

impl Default for AnimationChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_MS)
    }
}

/// Owns one channel per animated chart. At most one runs at a time.
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    channels: Vec<(AnimatedChart, AnimationChannel)>,
    enabled: bool,
}

impl AnimationScheduler {
    pub fn new(enabled: bool) -> Self {
        Self {
            channels: AnimatedChart::ALL
                .into_iter()
                .map(|chart| (chart, AnimationChannel::default()))
                .collect(),
            enabled,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning animation off stops every channel.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop_all();
        }
    }

    #[must_use]
    pub fn channel(&self, chart: AnimatedChart) -> Option<&AnimationChannel> {
        self.channels.iter().find(|(c, _)| *c == chart).map(|(_, ch)| ch)
    }

    /// Switch to `kind`: every other channel stops, then the channel for
    /// `kind` starts at `ts` if it has one.
    pub fn activate(&mut self, kind: Option<ChartKind>, ts: f64) {
        let target = kind.and_then(AnimatedChart::for_chart);
        for (chart, channel) in &mut self.channels {
            if Some(*chart) != target {
                channel.stop();
            }
        }
        if !self.enabled {
            return;
        }
        if let Some(target) = target {
            if let Some((_, channel)) = self.channels.iter_mut().find(|(c, _)| *c == target) {
                channel.start(ts);
                debug!(?target, "animation started");
            }
        }
    }

    pub fn stop_all(&mut self) {
        for (_, channel) in &mut self.channels {
            channel.stop();
        }
    }

    /// Phase of `chart` at `ts`; `0.0` when disabled or idle.
    #[must_use]
    pub fn tick(&self, chart: AnimatedChart, ts: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        self.channel(chart).map_or(0.0, |ch| ch.tick(ts))
    }

    /// Charts whose channel is running.
    #[must_use]
    pub fn running(&self) -> Vec<AnimatedChart> {
        self.channels
            .iter()
            .filter(|(_, ch)| ch.is_running())
            .map(|(c, _)| *c)
            .collect()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(true)
    }
}
