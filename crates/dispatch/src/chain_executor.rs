//! Sequential chain-step execution with argument substitution, per-step
//! provider/command dispatch, streaming and cancellation (C13).
//!
//! Structured the way the teacher's `RestWorker` drives one action job
//! (`action-workers/src/workers/rest_worker.rs`): a small struct wrapping
//! the collaborators it needs, a `tracing`-instrumented `run` entry point,
//! and explicit success/failure result logging — generalised here from one
//! job to a list of ordered steps, with the teacher's `run_next_concurrent`
//! analogue driven by `tokio::spawn` + join instead of a fixed worker pool.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use shared::config::DispatchConfig;
use shared::error::{Error, Result};
use shared::models::{ChainRunStatus, PromptType, Step};
use shared::DbPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model_provider::{ChatMessage, MessageContent};
use crate::repositories::{ChainRepository, ChainRunRepository, StepRepository, StepResponseRepository};

/// Recursion depth at which a sub-chain step is rejected (spec.md §4.13:
/// "recursion is permitted with a depth limit (reject > 16)").
pub const MAX_CHAIN_DEPTH: u32 = 16;

/// A single step's resolved textual output, substitutable into later
/// `{STEPk}` placeholders.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub step_number: i32,
    pub content: String,
}

/// What a step dispatch needs to actually produce output; implemented by
/// the call site that owns `ModelProvider`/`CommandRegistry` wiring
/// (`prompt_agent`), kept as a trait here so `ChainExecutor` does not
/// depend on those crates directly.
#[async_trait::async_trait]
pub trait StepDispatcher: Send + Sync {
    /// Runs one resolved step (its `{STEPk}`/predefined tokens already
    /// substituted into `prompt_args`) and returns its textual response.
    async fn dispatch(&self, tenant_id: Uuid, agent_name: &str, step: &Step, resolved_args: &HashMap<String, String>) -> Result<String>;
}

pub struct ChainExecutor<'a> {
    pool: &'a DbPool,
    dispatcher: Arc<dyn StepDispatcher>,
    config: &'a DispatchConfig,
}

impl<'a> ChainExecutor<'a> {
    pub fn new(pool: &'a DbPool, dispatcher: Arc<dyn StepDispatcher>, config: &'a DispatchConfig) -> Self {
        Self { pool, dispatcher, config }
    }

    /// Runs `chain_name` for `tenant_id`/`user_id` starting at `from_step`
    /// (1-indexed; callers retry failed runs by resuming from the failed
    /// step). Returns the final `ChainRunStatus` plus every `StepOutput`
    /// produced. Bounded by `chain_timeout_secs` (spec.md §5, default
    /// 900s); a timeout tags the run `failed` the same as any other step
    /// error.
    pub async fn run(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        chain_name: &str,
        from_step: i32,
        cancellation: CancellationToken,
    ) -> Result<(ChainRunStatus, Vec<StepOutput>)> {
        let chain_timeout = std::time::Duration::from_secs(self.config.chain_timeout_secs);
        match tokio::time::timeout(
            chain_timeout,
            self.run_depth(tenant_id, user_id, chain_name, from_step, cancellation, 0),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::internal("Chain failed to complete: timed out".to_string())),
        }
    }

    async fn run_depth(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        chain_name: &str,
        from_step: i32,
        cancellation: CancellationToken,
        depth: u32,
    ) -> Result<(ChainRunStatus, Vec<StepOutput>)> {
        if depth > MAX_CHAIN_DEPTH {
            return Err(Error::bad_request(format!(
                "chain recursion depth exceeded (limit {MAX_CHAIN_DEPTH})"
            )));
        }

        let chain = ChainRepository::find_by_tenant_and_name(self.pool, tenant_id, chain_name)
            .await?
            .ok_or_else(|| Error::not_found("Chain", chain_name.to_string()))?;
        let steps = StepRepository::list_for_chain(self.pool, chain.id).await?;

        let run = ChainRunRepository::create(self.pool, chain.id, tenant_id, user_id, from_step).await?;
        ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Running).await?;

        let mut outputs: HashMap<i32, String> = HashMap::new();
        let mut ordered: Vec<StepOutput> = Vec::new();
        let mut pending_concurrent: Option<tokio::task::JoinHandle<Result<(i32, String)>>> = None;

        for step in steps.iter().filter(|s| s.step_number >= from_step) {
            if cancellation.is_cancelled() {
                tracing::info!(chain_run_id = %run.id, step = step.step_number, "chain run cancelled");
                ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Cancelled).await?;
                return Ok((ChainRunStatus::Cancelled, ordered));
            }

            if let Some(handle) = pending_concurrent.take() {
                match handle.await {
                    Ok(Ok((num, content))) => {
                        outputs.insert(num, content.clone());
                        ordered.push(StepOutput { step_number: num, content });
                    }
                    Ok(Err(e)) => {
                        tracing::error!(chain_run_id = %run.id, error = %e, "concurrent step failed");
                        ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Failed).await?;
                        return Err(Error::internal(format!("Chain failed to complete: {e}")));
                    }
                    Err(join_err) => {
                        tracing::error!(chain_run_id = %run.id, error = %join_err, "concurrent step task panicked");
                        ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Failed).await?;
                        return Err(Error::internal("Chain failed to complete: step task panicked".to_string()));
                    }
                }
            }

            let resolved_args = Self::resolve_args(step, &chain.name, &outputs);

            let result = if step.prompt_type == PromptType::Chain {
                let sub_chain_name = resolved_args.get("chain_name").cloned().unwrap_or_default();
                Box::pin(self.run_depth(tenant_id, user_id, &sub_chain_name, 1, cancellation.clone(), depth + 1))
                    .await
                    .map(|(_, sub_outputs)| {
                        sub_outputs
                            .last()
                            .map(|o| o.content.clone())
                            .unwrap_or_default()
                    })
            } else {
                let step_timeout = std::time::Duration::from_secs(self.config.step_timeout_secs);
                match tokio::time::timeout(
                    step_timeout,
                    self.dispatcher.dispatch(tenant_id, &step.agent_name, step, &resolved_args),
                )
                .await
                {
                    Ok(r) => r,
                    Err(_) => Err(Error::internal("step timed out".to_string())),
                }
            };

            let content = match result {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(chain_run_id = %run.id, step = step.step_number, error = %e, "chain step failed");
                    ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Failed).await?;
                    return Err(Error::internal(format!("Chain failed to complete: {e}")));
                }
            };

            StepResponseRepository::insert_with_executor(self.pool, run.id, step.step_number, &content).await?;

            if step.run_next_concurrent {
                let next_step = steps
                    .iter()
                    .find(|s| s.step_number > step.step_number)
                    .cloned();
                if let Some(next) = next_step {
                    let dispatcher_args = Self::resolve_args(&next, &chain.name, &outputs);
                    outputs.insert(step.step_number, content.clone());
                    ordered.push(StepOutput { step_number: step.step_number, content });

                    let tenant_id = tenant_id;
                    let agent_name = next.agent_name.clone();
                    let next_clone = next.clone();
                    let dispatcher = self.dispatcher.clone();
                    let handle = tokio::spawn(async move {
                        dispatcher
                            .dispatch(tenant_id, &agent_name, &next_clone, &dispatcher_args)
                            .await
                            .map(|c| (next_clone.step_number, c))
                    });
                    pending_concurrent = Some(handle);
                    continue;
                }
            }

            outputs.insert(step.step_number, content.clone());
            ordered.push(StepOutput { step_number: step.step_number, content });
        }

        if let Some(handle) = pending_concurrent.take() {
            match handle.await {
                Ok(Ok((num, content))) => {
                    outputs.insert(num, content.clone());
                    ordered.push(StepOutput { step_number: num, content });
                }
                Ok(Err(e)) => {
                    ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Failed).await?;
                    return Err(Error::internal(format!("Chain failed to complete: {e}")));
                }
                Err(join_err) => {
                    ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Failed).await?;
                    return Err(Error::internal(format!("Chain failed to complete: {join_err}")));
                }
            }
        }

        ChainRunRepository::set_status(self.pool, run.id, ChainRunStatus::Completed).await?;
        Ok((ChainRunStatus::Completed, ordered))
    }

    /// Substitutes `{STEPk}` and the predefined tokens that this executor
    /// owns (`{agent_name}`, `{context}`, `{date}`) into every value of
    /// `step.prompt_args` (spec.md §4.13). `{COMMANDS}`/`{command_list}`
    /// are left untouched here — the `StepDispatcher` implementation
    /// (`prompt_agent`, which owns a `CommandRegistry`) substitutes those
    /// when it builds the provider request.
    fn resolve_args(step: &Step, chain_name: &str, outputs: &HashMap<i32, String>) -> HashMap<String, String> {
        let date = Utc::now().format("%Y-%m-%d").to_string();

        let mut resolved = HashMap::new();
        if let Some(map) = step.prompt_args.as_object() {
            for (key, value) in map {
                let Some(text) = value.as_str() else {
                    resolved.insert(key.clone(), value.to_string());
                    continue;
                };
                let mut substituted = text.to_string();
                for (step_number, content) in outputs {
                    substituted = substituted.replace(&format!("{{STEP{step_number}}}"), content);
                }
                substituted = substituted
                    .replace("{agent_name}", &step.agent_name)
                    .replace("{context}", chain_name)
                    .replace("{date}", &date);
                resolved.insert(key.clone(), substituted);
            }
        }
        resolved
    }
}

/// Extracts plain text from the last user message, for token substitution
/// sources that need it (e.g. a `Chain` step's `chain_name` argument
/// referencing `{STEPk}` of a prior `Prompt` step).
pub fn last_user_text(messages: &[ChatMessage]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role.eq_ignore_ascii_case("user"))
        .map(|m| match &m.content {
            MessageContent::Text(t) => t.clone(),
            other => other.as_text(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(number: i32, args: serde_json::Value) -> Step {
        Step {
            id: Uuid::new_v4(),
            chain_id: Uuid::new_v4(),
            step_number: number,
            agent_name: "Agent".to_string(),
            prompt_type: PromptType::Prompt,
            prompt_args: args,
            run_next_concurrent: false,
        }
    }

    #[test]
    fn substitutes_step_output_tokens() {
        let mut outputs = HashMap::new();
        outputs.insert(1, "hello world".to_string());
        let s = step(2, json!({ "prompt": "previous said: {STEP1}" }));

        let resolved = ChainExecutor::resolve_args(&s, "demo-chain", &outputs);
        assert_eq!(resolved.get("prompt").unwrap(), "previous said: hello world");
    }

    #[test]
    fn substitutes_predefined_tokens() {
        let s = step(1, json!({ "prompt": "You are {agent_name} in chain {context}" }));
        let resolved = ChainExecutor::resolve_args(&s, "demo-chain", &HashMap::new());
        assert_eq!(resolved.get("prompt").unwrap(), "You are Agent in chain demo-chain");
    }

    #[test]
    fn depth_limit_is_sixteen() {
        assert_eq!(MAX_CHAIN_DEPTH, 16);
    }
}
