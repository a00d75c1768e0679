// Prompt templates and role prompt binding
//
// Role instructions are plain templates. PromptBinder makes sure each
// role has a default prompt group in the prompt library.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::capabilities::CapabilityTable;
use crate::domain::prompt::PromptBody;
use crate::domain::repositories::PromptRepository;
use crate::domain::swarm::value_objects::AgentRole;
use crate::errors::OrchestrationResult;

/// Default instructions of a role; `name` doubles as its prompt group name
pub struct PromptTemplate {
    pub name: String,
    pub system: String,
    pub user_template: String,
}

/// Replaces every `{key}` in `template` with its value; unknown keys stay as written
///
/// One left-to-right pass: substituted values are never scanned again, so a
/// value containing `{other}` is inserted verbatim.
pub fn render_placeholders(template: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let candidate = &rest[open + 1..];
        let token = candidate
            .find(|c| c == '{' || c == '}')
            .filter(|&end| candidate.as_bytes()[end] == b'}')
            .map(|end| &candidate[..end]);

        match token.and_then(|key| variables.get(key).map(|value| (key, value))) {
            Some((key, value)) => {
                rendered.push_str(value);
                rest = &candidate[key.len() + 1..];
            }
            None => {
                rendered.push('{');
                rest = candidate;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

pub mod library {
    use super::{PromptBinder, PromptTemplate};
    use crate::domain::swarm::value_objects::AgentRole;

    /// Default instructions for a pipeline role
    pub fn role_instructions(role: AgentRole) -> PromptTemplate {
        let (system, user_template) = match role {
            AgentRole::ProductManager => (
                "You are the product manager of a software project. \
                 Turn the stakeholder requirements into a clear product requirements document.",
                "Project: {project}\n\nRequirements:\n{requirements}\n\n\
                 Provide:\n\
                 1. Goals and non-goals\n\
                 2. User stories\n\
                 3. Acceptance criteria",
            ),
            AgentRole::Architect => (
                "You are the software architect of the project. \
                 Design a system that satisfies the product requirements document.",
                "PRD:\n{prd}\n\n\
                 Provide:\n\
                 1. Components and their responsibilities\n\
                 2. Data model\n\
                 3. Interfaces between components",
            ),
            AgentRole::Engineer => (
                "You are the engineer of the project. Implement the approved design.",
                "Design:\n{design}\n\nImplement the design and explain the key decisions.",
            ),
            AgentRole::QAEngineer => (
                "You are the QA engineer of the project. \
                 Verify the implementation against the product requirements.",
                "PRD:\n{prd}\n\nImplementation:\n{implementation}\n\n\
                 Write a test plan, run it, and report the findings.",
            ),
        };

        PromptTemplate {
            name: PromptBinder::group_name(role),
            system: system.to_string(),
            user_template: user_template.to_string(),
        }
    }
}

/// Finds or creates the default prompt group bound to a role
#[derive(Clone)]
pub struct PromptBinder {
    repository: Arc<dyn PromptRepository>,
}

impl PromptBinder {
    pub fn new(repository: Arc<dyn PromptRepository>) -> Self {
        Self { repository }
    }

    /// Name of the default group for `role`
    pub fn group_name(role: AgentRole) -> String {
        format!("{} Default", role)
    }

    /// Returns the id of `role`'s default group, creating it on first use
    ///
    /// Keyed by `(role category, "<role> Default")`, so binding the same role
    /// again returns the same group.
    pub async fn bind(
        &self,
        role: AgentRole,
        owner_id: Uuid,
        capabilities: &CapabilityTable,
    ) -> OrchestrationResult<Uuid> {
        let template = library::role_instructions(role);
        let body = PromptBody {
            text: format!("{}\n\n{}", template.system, template.user_template),
            functions: capabilities
                .declarations(role)
                .into_iter()
                .map(|d| d.name)
                .collect(),
        };

        let group_id = self
            .repository
            .find_or_create_group(role.prompt_category(), &template.name, owner_id, body)
            .await?;

        tracing::debug!(role = %role, group_id = %group_id, "bound role prompts");
        Ok(group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::InMemoryPromptRepository;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_substitutes_known_variables() {
        let template = library::role_instructions(AgentRole::Engineer);

        let rendered =
            render_placeholders(&template.user_template, &vars(&[("design", "three layers")]));
        assert!(rendered.contains("three layers"));
        assert!(!rendered.contains("{design}"));
    }

    #[test]
    fn substituted_values_are_not_rendered_again() {
        let variables = vars(&[
            ("code", "println!(\"{error}\")"),
            ("error", "panic at line 3"),
        ]);

        for _ in 0..50 {
            let rendered = render_placeholders("Code: {code}\nError: {error}", &variables);
            assert_eq!(
                rendered,
                "Code: println!(\"{error}\")\nError: panic at line 3"
            );
        }
    }

    #[test]
    fn braces_that_are_not_placeholders_survive() {
        let rendered = render_placeholders(
            "fn main() { let x = {n}; } {{n}} {n",
            &vars(&[("n", "1")]),
        );
        assert_eq!(rendered, "fn main() { let x = 1; } {1} {n");
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        let rendered = render_placeholders("Review:\n{code}", &HashMap::new());
        assert_eq!(rendered, "Review:\n{code}");
    }

    #[test]
    fn every_role_has_instructions() {
        for role in AgentRole::PIPELINE {
            let template = library::role_instructions(role);
            assert!(!template.system.is_empty());
            assert_eq!(template.name, PromptBinder::group_name(role));
        }
    }

    #[tokio::test]
    async fn binding_is_idempotent() {
        let repo = Arc::new(InMemoryPromptRepository::new());
        let binder = PromptBinder::new(repo.clone());
        let table = CapabilityTable::standard();

        let first = binder
            .bind(AgentRole::Architect, Uuid::new_v4(), &table)
            .await
            .unwrap();
        let second = binder
            .bind(AgentRole::Architect, Uuid::new_v4(), &table)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.group_count(), 1);
    }

    #[tokio::test]
    async fn distinct_roles_get_distinct_groups() {
        let repo = Arc::new(InMemoryPromptRepository::new());
        let binder = PromptBinder::new(repo.clone());
        let table = CapabilityTable::standard();
        let owner = Uuid::new_v4();

        let pm = binder.bind(AgentRole::ProductManager, owner, &table).await.unwrap();
        let qa = binder.bind(AgentRole::QAEngineer, owner, &table).await.unwrap();

        assert_ne!(pm, qa);
        let summaries = repo.find_summaries(&[pm, qa]).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].category, "Product Management");
        assert_eq!(summaries[1].name, "QAEngineer Default");
    }
}
