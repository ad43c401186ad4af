use crate::errors::{AppError, AppResult};
use crate::models::BooleanResponse;
use crate::service::FolderService;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const COMMAND_NAMES: [&str; 10] = [
    "folder_contents_get",
    "folder_breadcrumb_get",
    "folder_tree_get",
    "folder_structure_analyze",
    "folder_merge_apply",
    "organized_files_save",
    "organized_files_list",
    "organized_file_get",
    "organized_file_delete",
    "organized_file_stats",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    #[serde(default)]
    pub id: Value,
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub id: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    fn success(id: Value, data: Value) -> Self {
        Self {
            id,
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(id: Value, error: impl std::fmt::Display) -> Self {
        Self {
            id,
            ok: false,
            data: None,
            error: Some(to_client_error(error)),
        }
    }
}

pub async fn dispatch(service: &FolderService, command: &str, payload: Value) -> AppResult<Value> {
    match command {
        "folder_contents_get" => respond(service.get_folder_contents(parse_payload(payload)?)?),
        "folder_breadcrumb_get" => respond(service.get_folder_breadcrumb(parse_payload(payload)?)?),
        "folder_tree_get" => respond(service.get_folder_tree(parse_payload(payload)?)?),
        "folder_structure_analyze" => respond(service.analyze_folder_structure(parse_payload(payload)?).await?),
        "folder_merge_apply" => respond(service.apply_merge(parse_payload(payload)?)?),
        "organized_files_save" => respond(service.save_organized_files(parse_payload(payload)?)?),
        "organized_files_list" => respond(service.list_organized_files(parse_payload(payload)?)?),
        "organized_file_get" => respond(service.get_organized_file(parse_payload(payload)?)?),
        "organized_file_delete" => respond(BooleanResponse {
            success: service.delete_organized_file(parse_payload(payload)?)?,
        }),
        "organized_file_stats" => respond(service.get_file_stats(parse_payload(payload)?)?),
        other => Err(AppError::NotFound(format!("Unknown command '{}'", other))),
    }
}

pub async fn handle_line(service: &FolderService, line: &str) -> Option<CommandResponse> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let request: CommandRequest = match serde_json::from_str(trimmed) {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(error = %error, "rejected malformed command line");
            return Some(CommandResponse::failure(
                Value::Null,
                AppError::Validation(format!("Malformed request: {}", error)),
            ));
        }
    };

    match dispatch(service, &request.command, request.payload).await {
        Ok(data) => Some(CommandResponse::success(request.id, data)),
        Err(error) => {
            tracing::warn!(command = %request.command, error = %error, "command failed");
            Some(CommandResponse::failure(request.id, error))
        }
    }
}

pub async fn serve<R, W>(service: &FolderService, reader: R, mut writer: W) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let Some(response) = handle_line(service, &line).await else {
            continue;
        };
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

pub fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}

fn parse_payload<T: DeserializeOwned>(payload: Value) -> AppResult<T> {
    serde_json::from_value(payload).map_err(|error| AppError::Validation(format!("Invalid payload: {}", error)))
}

fn respond<T: Serialize>(value: T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}
