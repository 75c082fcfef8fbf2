//! End-to-end tests driving the pipeline against an in-memory provider.

mod mock_provider;
mod pipeline;
