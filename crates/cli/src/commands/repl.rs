use anyhow::Context;
use fund_terminal_core::FundDashboard;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const PROMPT: &str = "$ ";
const GREETING: &str = "Type \"help\" for available commands. \"exit\" quits.";

/// Line-oriented terminal over stdin/stdout.
pub async fn run(dashboard: &mut FundDashboard) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{GREETING}");
    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };
        let input = line.trim();
        if matches!(input, "exit" | "quit") {
            break;
        }

        let output = dashboard.run_command(input).await;
        if output.clear_output {
            // ANSI clear screen + home
            print!("\x1b[2J\x1b[H");
        }
        if !output.messages.is_empty() {
            println!("{}\n", output.text());
        }
    }
    Ok(())
}
