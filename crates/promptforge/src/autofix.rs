use crate::completion::CompletionClient;
use promptforge_core::prompt::{fix_system_prompt, fix_user_prompt, FixRequest};
use serde::Serialize;

/// Suggested patch returned to the preview.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FixOutput {
    pub patch: String,
    pub message: String,
}

/// Ask the model for a patch that resolves a runtime error.
///
/// Never fails: upstream errors come back as an empty patch with the reason
/// in the message.
pub async fn suggest_fix(client: &dyn CompletionClient, request: &FixRequest) -> FixOutput {
    log::info!("Received auto-fix request for file: {}", request.filename);

    match client
        .complete(&fix_system_prompt(request), &fix_user_prompt(request))
        .await
    {
        Ok(patch) if patch.trim().is_empty() => FixOutput {
            patch: String::new(),
            message: "No fix could be suggested by the AI.".to_string(),
        },
        Ok(patch) => FixOutput {
            patch,
            message: "Suggested fix generated.".to_string(),
        },
        Err(err) => {
            log::error!("Auto-fix error: {err}");
            FixOutput {
                patch: String::new(),
                message: format!("Auto-fix failed: {err}"),
            }
        }
    }
}
