use fund_terminal_core::FundDashboard;

pub async fn run(dashboard: &mut FundDashboard, command: &str) -> anyhow::Result<()> {
    let output = dashboard.run_command(command).await;
    if !output.messages.is_empty() {
        println!("{}", output.text());
    }
    Ok(())
}
