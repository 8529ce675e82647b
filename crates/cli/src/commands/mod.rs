//! CLI Commands

pub mod airports;
pub mod distance;
pub mod run;

/// Result of a command that verified something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Passed
        } else {
            Outcome::Failed
        }
    }
}
