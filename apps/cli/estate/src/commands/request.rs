use super::Context;
use crate::error::EstateError;

use estate_client::RequestOptions;
use estate_client::batch::run_sequential;

use log::info;
use serde_json::Value;

pub async fn get(
    context: &Context,
    path: &str,
    query: Vec<(String, String)>,
) -> Result<String, EstateError> {
    let client = context.client()?;
    let options = query
        .into_iter()
        .fold(RequestOptions::new(), |options, (key, value)| {
            options.query(key, value)
        });

    let body: Value = client.get(path, options).await?;
    serde_json::to_string_pretty(&body)
        .map_err(|e| EstateError::estate(format!("Failed to format response: {e}")))
}

/// Deletes run one after another; the report lists what was removed before a failure.
pub async fn delete_all(context: &Context, paths: Vec<String>) -> Result<String, EstateError> {
    let client = context.client()?;

    let report = run_sequential(paths, |path| {
        let client = client.clone();
        let path = path.clone();
        async move {
            client
                .delete::<Value>(&path, RequestOptions::new().require_auth())
                .await
                .map(|_| info!("Deleted {path}"))
        }
    })
    .await;

    let summary = report.summary();
    match report.failed {
        None => Ok(summary),
        Some((path, err)) => {
            let mut lines = vec![summary];
            lines.extend(report.applied.iter().map(|path| format!("deleted: {path}")));
            lines.push(format!("failed: {path}"));
            lines.extend(report.skipped.iter().map(|path| format!("skipped: {path}")));
            Err(EstateError::estate(format!(
                "{}\n{}",
                lines.join("\n"),
                err.user_message()
            )))
        }
    }
}
