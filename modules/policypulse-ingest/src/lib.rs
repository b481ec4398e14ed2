pub mod bulk;
pub mod dedup;
pub mod digest;
pub mod federal_register;
pub mod impact;
pub mod news;
pub mod orchestrator;
pub mod prompts;
pub mod store;
pub mod summarize;
pub mod traits;

pub(crate) mod text;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod pipeline_tests;
