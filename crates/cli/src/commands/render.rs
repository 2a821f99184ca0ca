use std::path::Path;

use anyhow::{bail, Context};
use fund_terminal_core::FundDashboard;
use tracing::info;

pub async fn run(
    dashboard: &mut FundDashboard,
    plot: &str,
    date: Option<&str>,
    out: &Path,
    width: f64,
    height: f64,
) -> anyhow::Result<()> {
    let command = match date {
        Some(range) => format!("plot {plot} {range}"),
        None => format!("plot {plot}"),
    };
    let output = dashboard.run_command(&command).await;
    if dashboard.state().active_chart.is_none() {
        bail!("{}", output.text());
    }

    let Some(svg) = dashboard.render_active_svg(width, height) else {
        bail!("no data to plot for `{command}`");
    };
    tokio::fs::write(out, svg)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    info!(path = %out.display(), "chart written");
    println!("{}", output.text());
    Ok(())
}
