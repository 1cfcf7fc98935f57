pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod completion;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod extract;
pub mod flagging;
pub mod prompts;
pub mod reformulate;
pub mod relevance;
pub mod session;
pub mod spreadsheet;

#[cfg(test)]
pub mod test_helpers;
