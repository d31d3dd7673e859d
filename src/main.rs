use anyhow::Result;

use garnet_chess::uci::uci_top::run_stdio_loop;

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout is reserved for the UCI stream.
    env_logger::init();

    run_stdio_loop()?;
    Ok(())
}
