use clap::Parser;
use contour_tool::{cli::Cli, logging};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_json);
    if let Err(e) = cli.run() {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}
