mod runner;
mod shell;
mod types;

#[cfg(test)]
mod tests;

pub use runner::run_cli;
