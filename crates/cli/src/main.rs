use clap::Parser;

use courseware_cli::{Cli, run};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    courseware_observability::tracing::init(cli.log_format.into());

    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}
