//! objzip - Core Library
//!
//! The conversion request pipeline: resolve a request, fetch the source
//! archive, stage it in an isolated workspace, run the external converter and
//! package whatever it produced.

pub mod collect;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod invoke;
pub mod locate;
pub mod pipeline;
pub mod request;
pub mod workspace;

pub use collect::collect_output;
pub use config::PipelineConfig;
pub use error::{ConvertError, Result};
pub use extract::extract_archive;
pub use fetch::{ArchiveFetcher, HttpFetcher};
pub use invoke::{ConversionOutcome, Converter, ProcessConverter};
pub use locate::{locate_input, StagedInput};
pub use pipeline::{ConversionResult, Pipeline};
pub use request::{resolve, ConversionRequest, RequestSource};
pub use reqwest::Url;
pub use workspace::{Workspace, WorkspaceManager};
