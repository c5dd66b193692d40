//! Integration tests against an in-memory catalog

mod cli_parse;
mod install_flow;
mod publish_pipeline;
mod registry_cache;
mod support;
