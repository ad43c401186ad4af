pub mod command;
pub mod prompt;
pub mod structured_output;

pub use command::CommandSuggestionProvider;

use crate::errors::{AppError, AppResult};
use crate::models::{FolderProfile, ParaBucket, RestructureResponse};
use std::future::Future;
use std::pin::Pin;

pub type SuggestionFuture<'a> = Pin<Box<dyn Future<Output = AppResult<RestructureResponse>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub bucket: ParaBucket,
    pub profiles: Vec<FolderProfile>,
}

pub trait SuggestionProvider: Send + Sync {
    fn suggest<'a>(&'a self, request: &'a SuggestionRequest) -> SuggestionFuture<'a>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSuggestionProvider;

impl SuggestionProvider for UnconfiguredSuggestionProvider {
    fn suggest<'a>(&'a self, _request: &'a SuggestionRequest) -> SuggestionFuture<'a> {
        Box::pin(async {
            Err(AppError::Suggestion(
                "no suggestion command configured (set suggestion.command in config.yaml)".to_string(),
            ))
        })
    }
}
