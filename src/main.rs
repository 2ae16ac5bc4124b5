use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = matchcast::cli::Cli::parse();
    matchcast::run(cli)
}
