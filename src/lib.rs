pub mod cli;
pub mod config;
pub mod headless;
pub mod hilite;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod runtime;
pub mod selection;
pub mod sync;

pub fn run_cli() -> Result<(), String> {
    cli::run_cli()
}
