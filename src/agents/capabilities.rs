// Capability table: (role, function name) -> declaration + typed handler
//
// Built once when the registry is constructed; agent slots copy their
// declarations from here, dispatch always goes through the table.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::domain::swarm::agent_slot::{
    Dependency, FunctionDeclaration, FunctionParameter, FunctionParams,
};
use crate::domain::swarm::value_objects::{AgentRole, Artifact};

/// Handler run for a validated function call
pub type FunctionHandler = fn(&FunctionParams) -> Result<Value, String>;

pub struct Capability {
    pub declaration: FunctionDeclaration,
    pub artifact: Artifact,
    handler: FunctionHandler,
}

impl Capability {
    pub fn invoke(&self, params: &FunctionParams) -> Result<Value, String> {
        (self.handler)(params)
    }
}

#[derive(Default)]
pub struct CapabilityTable {
    entries: HashMap<(AgentRole, String), Capability>,
}

impl CapabilityTable {
    /// The functions each pipeline role ships with
    pub fn standard() -> Self {
        let mut table = Self::default();
        table.register(
            AgentRole::ProductManager,
            declare("createPRD", "requirements", "Write the product requirements document"),
            Artifact::Prd,
            create_prd,
        );
        table.register(
            AgentRole::Architect,
            declare("createDesign", "requirements", "Produce the system design"),
            Artifact::Design,
            create_design,
        );
        table.register(
            AgentRole::Engineer,
            declare("implement", "design", "Implement the approved design"),
            Artifact::Implementation,
            implement,
        );
        table.register(
            AgentRole::QAEngineer,
            declare("test", "implementation", "Test the implementation and report"),
            Artifact::TestReport,
            test_implementation,
        );
        table
    }

    /// Adds or replaces the handler for `(role, declaration.name)`
    pub fn register(
        &mut self,
        role: AgentRole,
        declaration: FunctionDeclaration,
        artifact: Artifact,
        handler: FunctionHandler,
    ) {
        self.entries.insert(
            (role, declaration.name.clone()),
            Capability {
                declaration,
                artifact,
                handler,
            },
        );
    }

    pub fn resolve(&self, role: AgentRole, function: &str) -> Option<&Capability> {
        self.entries.get(&(role, function.to_string()))
    }

    /// Declarations for `role`, sorted by name
    pub fn declarations(&self, role: AgentRole) -> Vec<FunctionDeclaration> {
        let mut declarations: Vec<_> = self
            .entries
            .iter()
            .filter(|((r, _), _)| *r == role)
            .map(|(_, cap)| cap.declaration.clone())
            .collect();
        declarations.sort_by(|a, b| a.name.cmp(&b.name));
        declarations
    }

    /// Predecessor outputs each role consumes
    pub fn dependencies(role: AgentRole) -> Vec<Dependency> {
        let needs = |role: AgentRole, keys: &[&str]| Dependency {
            role,
            required_output: keys.iter().map(|k| k.to_string()).collect(),
        };
        match role {
            AgentRole::ProductManager => vec![],
            AgentRole::Architect => vec![needs(AgentRole::ProductManager, &["prd"])],
            AgentRole::Engineer => vec![needs(AgentRole::Architect, &["design"])],
            AgentRole::QAEngineer => vec![
                needs(AgentRole::Engineer, &["implementation"]),
                needs(AgentRole::ProductManager, &["prd"]),
            ],
        }
    }
}

fn declare(name: &str, required: &str, description: &str) -> FunctionDeclaration {
    FunctionDeclaration {
        name: name.to_string(),
        parameters: vec![FunctionParameter {
            name: required.to_string(),
            param_type: "string".to_string(),
            required: true,
        }],
        description: description.to_string(),
    }
}

fn artifact_from(artifact: Artifact, params: &FunctionParams, key: &str) -> Result<Value, String> {
    let content = params
        .get(key)
        .ok_or_else(|| format!("parameter {} missing", key))?;
    Ok(json!({ "type": artifact.key(), "content": content }))
}

fn create_prd(params: &FunctionParams) -> Result<Value, String> {
    artifact_from(Artifact::Prd, params, "requirements")
}

fn create_design(params: &FunctionParams) -> Result<Value, String> {
    artifact_from(Artifact::Design, params, "requirements")
}

fn implement(params: &FunctionParams) -> Result<Value, String> {
    artifact_from(Artifact::Implementation, params, "design")
}

fn test_implementation(params: &FunctionParams) -> Result<Value, String> {
    artifact_from(Artifact::TestReport, params, "implementation")
}
