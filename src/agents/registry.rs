use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::capabilities::CapabilityTable;
use super::gather::{gather, IsolationPolicy};
use super::prompts::PromptBinder;
use crate::domain::swarm::agent_slot::{AgentSlot, FunctionParams};
use crate::domain::swarm::value_objects::{AgentRole, Artifact, LogLevel};
use crate::domain::swarm::LogEntry;
use crate::errors::{OrchestrationError, OrchestrationResult};

/// Slots for a new swarm plus the warnings raised while binding them
#[derive(Debug)]
pub struct BuiltSlots {
    pub slots: Vec<AgentSlot>,
    pub warnings: Vec<LogEntry>,
}

/// Result of a successful function call
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionOutput {
    pub artifact: Artifact,
    pub value: Value,
}

/// Builds agent slots and dispatches their functions
pub struct AgentSlotRegistry {
    binder: PromptBinder,
    capabilities: Arc<CapabilityTable>,
    fanout_limit: usize,
}

impl AgentSlotRegistry {
    pub fn new(binder: PromptBinder, capabilities: Arc<CapabilityTable>, fanout_limit: usize) -> Self {
        Self {
            binder,
            capabilities,
            fanout_limit,
        }
    }

    /// One slot per pipeline role, in pipeline order
    ///
    /// Prompt bindings run concurrently and independently: a role whose
    /// binding fails gets an empty prompt list and a warning entry, the
    /// other roles are unaffected.
    pub async fn build_slots(&self, owner_id: Uuid) -> BuiltSlots {
        let bindings = AgentRole::PIPELINE.into_iter().map(|role| {
            let binder = &self.binder;
            let capabilities = self.capabilities.as_ref();
            async move {
                binder
                    .bind(role, owner_id, capabilities)
                    .await
                    .map(|group_id| (role, group_id))
                    .map_err(|err| (role, err))
            }
        });

        let results = gather(bindings, self.fanout_limit, IsolationPolicy::ContinueOnError)
            .await
            .unwrap_or_else(|err| vec![Err(err)]);

        let mut warnings = Vec::new();
        let mut slots = Vec::with_capacity(AgentRole::PIPELINE.len());
        for (role, result) in AgentRole::PIPELINE.into_iter().zip(results) {
            let prompts = match result {
                Ok((_, group_id)) => vec![group_id],
                Err((_, err)) => {
                    tracing::warn!(role = %role, error = %err, "failed to load prompts, continuing without");
                    warnings.push(LogEntry::new(
                        LogLevel::Warning,
                        format!("Failed to load prompts for {}", role),
                        Some(role),
                    ));
                    Vec::new()
                }
            };
            slots.push(AgentSlot::new(
                role,
                self.capabilities.declarations(role),
                CapabilityTable::dependencies(role),
                prompts,
            ));
        }

        BuiltSlots { slots, warnings }
    }

    /// Validates and runs `function` on `slot`
    ///
    /// Undeclared functions and missing required parameters fail before
    /// anything on the slot changes. A failing handler puts the slot in
    /// `error`; nothing is retried.
    pub fn execute_function(
        &self,
        slot: &mut AgentSlot,
        function: &str,
        params: &FunctionParams,
    ) -> OrchestrationResult<FunctionOutput> {
        let unknown = || OrchestrationError::UnknownFunction {
            role: slot.role,
            function: function.to_string(),
        };

        let declaration = slot.function(function).ok_or_else(unknown)?;
        if let Some(param) = declaration.missing_parameter(params) {
            return Err(OrchestrationError::MissingParameter {
                function: function.to_string(),
                parameter: param.name.clone(),
            });
        }

        let capability = self
            .capabilities
            .resolve(slot.role, function)
            .ok_or_else(unknown)?;

        match capability.invoke(params) {
            Ok(value) => Ok(FunctionOutput {
                artifact: capability.artifact,
                value,
            }),
            Err(reason) => {
                slot.mark_error();
                Err(OrchestrationError::HandlerFailed {
                    function: function.to_string(),
                    reason,
                })
            }
        }
    }

    /// Runs `function` on `target` on behalf of `source`
    ///
    /// Only allowed when `source` declares a dependency on `target`'s role.
    pub fn collaborate(
        &self,
        source: &AgentSlot,
        target: &mut AgentSlot,
        function: &str,
        params: &FunctionParams,
    ) -> OrchestrationResult<FunctionOutput> {
        if !source.depends_on(target.role) {
            return Err(OrchestrationError::NoDependency {
                source_role: source.role,
                target_role: target.role,
            });
        }
        self.execute_function(target, function, params)
    }
}
