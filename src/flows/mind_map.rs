use super::{DocumentPrompt, FlowContext};
use crate::contracts::{MindMapNode, MIND_MAP_SCHEMA_DEPTH};
use crate::media::MediaReference;
use crate::prompts;
use crate::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Hierarchical mind map of a document, rooted at its central theme.
pub async fn generate_mind_map(
    ctx: &FlowContext,
    file: &MediaReference,
    cancel: &CancellationToken,
) -> Result<MindMapNode> {
    info!("Generating mind map ({})", file.mime_type);

    let depth = MIND_MAP_SCHEMA_DEPTH.to_string();
    let root: MindMapNode = ctx
        .generate_structured(
            DocumentPrompt {
                model: &ctx.models().analysis,
                system: prompts::MIND_MAP_SYSTEM,
                instructions: prompts::render(prompts::MIND_MAP_USER, &[("depth", depth.as_str())]),
                file,
                schema: None,
            },
            cancel,
        )
        .await?;

    info!(
        "Mind map '{}': {} nodes, {} levels",
        root.title,
        root.node_count(),
        root.depth()
    );
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerationClient;
    use crate::flows::test_support::{context, pdf};

    #[tokio::test]
    async fn test_generate_mind_map() {
        let mock = MockGenerationClient::new().with_text_response(
            r#"{
                "title": "Photosynthesis",
                "details": "How plants make food.",
                "subIdeas": [
                    { "title": "Light reactions", "details": "Happen in thylakoids.",
                      "subIdeas": [{ "title": "ATP", "details": "Energy carrier." }] },
                    { "title": "Calvin cycle", "details": "Fixes carbon." }
                ]
            }"#,
        );
        let ctx = context(&mock);

        let root = generate_mind_map(&ctx, &pdf(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(root.title, "Photosynthesis");
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.depth(), 3);
        assert!(root.sub_ideas[1].sub_ideas.is_empty());

        let request = &mock.requests()[0];
        let crate::models::PromptPart::Text(instructions) = &request.parts[0] else {
            panic!("expected instructions first");
        };
        assert!(instructions.contains("more than 4 levels"));
    }
}
