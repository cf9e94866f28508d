mod capture;
mod cli;
mod clock;
mod config;
mod geometry;
mod input;
mod logging;
mod rating;
mod score;
mod session;
mod sheet;
mod stats;
mod watch;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
