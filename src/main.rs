mod access;
mod cli;
mod config;
mod logging;

fn main() -> anyhow::Result<()> {
    cli::run()
}
