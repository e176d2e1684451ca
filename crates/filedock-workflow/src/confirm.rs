use async_trait::async_trait;

/// Asks the user to approve a destructive action.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Prompt shown before deleting `file_name`.
pub fn delete_prompt(file_name: &str) -> String {
    format!("Are you sure you want to delete \"{}\"?", file_name)
}
