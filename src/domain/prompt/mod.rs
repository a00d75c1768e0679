// Prompt library domain
// Prompt groups hold the instruction content bound to agent roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One prompt body inside a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBody {
    pub text: String,
    pub functions: Vec<String>,
}

/// Canonical prompt record a group points at through `production_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub group_id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Named, categorised collection of prompt bodies
///
/// `(category, name)` identifies a group: there is never more than one
/// group for the same pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptGroup {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub prompts: Vec<PromptBody>,
    pub author_id: Uuid,
    pub author_name: String,
    pub production_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PromptGroup {
    /// Builds a group with a single default body and its linked canonical prompt
    pub fn with_default_prompt(
        category: &str,
        name: &str,
        author_id: Uuid,
        body: PromptBody,
    ) -> (Self, Prompt) {
        let now = Utc::now();
        let group_id = Uuid::new_v4();
        let prompt = Prompt {
            id: Uuid::new_v4(),
            group_id,
            text: body.text.clone(),
            author_id,
            created_at: now,
        };
        let group = Self {
            id: group_id,
            name: name.to_string(),
            category: category.to_string(),
            prompts: vec![body],
            author_id,
            author_name: "System".to_string(),
            production_id: Some(prompt.id),
            created_at: now,
        };
        (group, prompt)
    }

    pub fn summary(&self) -> PromptSummary {
        PromptSummary {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }
}

/// Name and category of a bound prompt group, as shown in status views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_group_links_its_production_prompt() {
        let author = Uuid::new_v4();
        let (group, prompt) = PromptGroup::with_default_prompt(
            "Architecture",
            "Architect Default",
            author,
            PromptBody {
                text: "Design the system".to_string(),
                functions: vec!["createDesign".to_string()],
            },
        );

        assert_eq!(group.production_id, Some(prompt.id));
        assert_eq!(prompt.group_id, group.id);
        assert_eq!(prompt.text, "Design the system");
        assert_eq!(group.prompts.len(), 1);
        assert_eq!(group.author_name, "System");
        assert_eq!(group.summary().category, "Architecture");
    }
}
