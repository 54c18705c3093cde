use crate::turn::ConversationTurn;
use crate::turn::Role;
use serde::Serialize;

/// Role vocabulary expected by the completion API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    User,
    Model,
}

impl ModelRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelRole::User => "user",
            ModelRole::Model => "model",
        }
    }
}

impl From<Role> for ModelRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ModelRole::User,
            Role::Assistant => ModelRole::Model,
        }
    }
}

/// A prior turn relabelled for the completion API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryTurn {
    pub role: ModelRole,
    pub text: String,
}

impl From<&ConversationTurn> for HistoryTurn {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role.into(),
            text: turn.content.clone(),
        }
    }
}

/// Select the history sent alongside the current question.
///
/// `prior` is every turn before the current one, oldest first. At most
/// `max_turns` of the most recent are kept, and the window is cut so it
/// starts on a user turn; without any user turn it is empty.
pub fn history_window(prior: &[ConversationTurn], max_turns: usize) -> Vec<HistoryTurn> {
    let recent = &prior[prior.len().saturating_sub(max_turns)..];
    let Some(first_user) = recent.iter().position(|turn| turn.role == Role::User) else {
        return Vec::new();
    };
    recent[first_user..].iter().map(HistoryTurn::from).collect()
}
