mod client;
mod error;
mod server;

#[cfg(test)]
mod tests;

pub use client::{DefaultHiliteClient, HiliteClient, LOCALHOST};
pub use error::{ClientError, Result, ServerError};
pub use server::{HiliteServer, ServerStatus};
