use crate::error::ClientError;
use crate::models::{Material, PostDraft, PostStatus, PostType, Step};
use crate::splitter::{split_content, SplitContent};

/// A post typed as one block of free text.
#[derive(Debug, Clone, Default)]
pub struct QuickCreate {
    pub title: String,
    pub description: String,
    pub post_type: PostType,
    pub text: String,
    pub publish: bool,
}

impl QuickCreate {
    pub fn organize(&self) -> SplitContent {
        split_content(&self.text, self.post_type)
    }

    /// Builds a draft from the organized text. The result should be shown to
    /// the user for review; the split is a guess.
    pub fn into_draft(self) -> Result<PostDraft, ClientError> {
        if self.title.trim().is_empty() {
            return Err(ClientError::Validation("Title cannot be empty".to_string()));
        }

        let content = self.organize();
        if content.steps.is_empty() {
            return Err(ClientError::Validation(
                "Add at least one step".to_string(),
            ));
        }

        let mut draft = PostDraft::new(self.title.trim(), self.post_type);
        draft.description = self.description.trim().to_string();
        draft.status = if self.publish {
            PostStatus::Published
        } else {
            PostStatus::Draft
        };
        draft.materials = content.items.into_iter().map(Material::named).collect();
        for (i, instruction) in content.steps.into_iter().enumerate() {
            draft.add_step(Step {
                title: format!("Step {}", i + 1),
                instruction,
                ..Step::default()
            });
        }

        Ok(draft)
    }
}
