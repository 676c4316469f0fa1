use super::Context;
use crate::cli::ExportArgs;
use crate::error::EstateError;

use estate_client::export::{DirectorySink, ExportMode, ExportOutcome};

pub async fn export(context: &Context, args: ExportArgs) -> Result<String, EstateError> {
    let exporter = context.client()?.exporter()?;
    let sink = DirectorySink::new(args.out_dir.unwrap_or_else(|| context.download_dir()));
    let mode = if args.view {
        ExportMode::View
    } else {
        ExportMode::Download
    };

    let outcome = exporter.export(&args.path, &args.query, mode, &sink).await?;
    Ok(match outcome {
        ExportOutcome::Saved { path, size, .. } => {
            format!("Saved {} ({size} bytes)", path.display())
        }
        ExportOutcome::Viewed { filename, size, .. } => {
            format!("Opened {filename} ({size} bytes)")
        }
    })
}
