// Built-in agents and task templates for the conversation executor

use std::collections::BTreeMap;

use super::types::{AgentConfig, LlmOptions, Task};

/// The four stock agents, keyed by name
pub fn default_agents() -> BTreeMap<String, AgentConfig> {
    let agents = [
        (
            "coder",
            "Software Engineer",
            "You are an expert software engineer with deep knowledge of programming languages, \
             frameworks, and best practices. Your role is to write high-quality code, review code, \
             debug issues, and provide technical solutions.",
        ),
        (
            "reviewer",
            "Code Reviewer",
            "You are an experienced code reviewer who focuses on code quality, maintainability, \
             and best practices. Your role is to review code changes, identify potential issues, \
             and suggest improvements.",
        ),
        (
            "architect",
            "Software Architect",
            "You are a skilled software architect with expertise in system design, patterns, and \
             architecture best practices. Your role is to design scalable solutions, make \
             architectural decisions, and ensure system quality.",
        ),
        (
            "tester",
            "QA Engineer",
            "You are a thorough QA engineer who specializes in testing methodologies and quality \
             assurance. Your role is to write tests, identify bugs, and ensure software quality.",
        ),
    ];

    agents
        .into_iter()
        .map(|(name, role, system_message)| {
            (
                name.to_string(),
                AgentConfig {
                    name: name.to_string(),
                    role: role.to_string(),
                    system_message: system_message.to_string(),
                    llm_config: LlmOptions::default(),
                },
            )
        })
        .collect()
}

/// Common development workflows; `{placeholders}` come from task variables
pub fn task_templates() -> BTreeMap<String, Task> {
    let mut templates = BTreeMap::new();
    templates.insert(
        "codeReview".to_string(),
        Task::new(
            "reviewer",
            &[
                "Review the following code changes and provide feedback:\n{code}",
                "Summarize the key findings and recommendations from the review.",
            ],
        ),
    );
    templates.insert(
        "bugFix".to_string(),
        Task::new(
            "coder",
            &[
                "Analyze the following bug report and propose a solution:\n{bugReport}",
                "Implement the proposed fix and explain the changes.",
                "Write tests to verify the fix and prevent regression.",
            ],
        ),
    );
    templates.insert(
        "featureImplementation".to_string(),
        Task::new(
            "architect",
            &[
                "Design the architecture for the following feature:\n{featureSpec}",
                "Create a detailed implementation plan.",
                "Review and refine the implementation plan.",
            ],
        ),
    );
    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_agents_are_valid() {
        let agents = default_agents();
        assert_eq!(agents.len(), 4);
        for (name, config) in &agents {
            assert_eq!(name, &config.name);
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn every_template_initiator_is_a_default_agent() {
        let agents = default_agents();
        for (name, task) in task_templates() {
            assert!(agents.contains_key(&task.initiator), "{} initiator", name);
            assert!(!task.steps.is_empty());
        }
    }
}
