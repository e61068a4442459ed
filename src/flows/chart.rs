use super::{DocumentPrompt, FlowContext};
use crate::contracts::ChartAnalysis;
use crate::media::MediaReference;
use crate::prompts;
use crate::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Extract the title, an interpretation and the underlying data table from
/// an image or document containing a chart.
pub async fn analyze_chart(
    ctx: &FlowContext,
    file: &MediaReference,
    cancel: &CancellationToken,
) -> Result<ChartAnalysis> {
    info!("Analyzing chart ({})", file.mime_type);

    let analysis: ChartAnalysis = ctx
        .generate_structured(
            DocumentPrompt {
                model: &ctx.models().analysis,
                system: prompts::CHART_SYSTEM,
                instructions: prompts::render(prompts::CHART_USER, &[]),
                file,
                schema: None,
            },
            cancel,
        )
        .await?;

    info!(
        "Chart '{}' analyzed: {} columns, {} rows",
        analysis.title,
        analysis.table.headers.len(),
        analysis.table.rows.len()
    );
    Ok(analysis)
}
