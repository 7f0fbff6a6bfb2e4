//! Allow-listed tool dispatch: argument validation, a per-call deadline,
//! and uniform translation of every failure into a safe user-facing
//! sentence. No internal error detail ever leaves this module.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::llm::LanguageModelService;
use crate::runbooks::RunbookSearchTool;
use crate::search::SemanticSearchIndex;
use crate::worldtime::WorldTimeTool;

pub const WORLD_TIME_TOOL: &str = "worldtime.get_city_time";
pub const RUNBOOK_SEARCH_TOOL: &str = "runbooks.search";

const ALLOWED_TOOLS: &[&str] = &[WORLD_TIME_TOOL, RUNBOOK_SEARCH_TOOL];

const TIMEOUT_MESSAGE: &str = "Tool timed out. Try again with a simpler request.";
const FAILURE_MESSAGE: &str = "Tool failed safely. Try again.";

const MAX_CITY_CHARS: usize = 64;
const MAX_QUERY_CHARS: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolAction {
    Tool,
    Answer,
    Refuse,
}

/// One planned tool invocation. Built fresh per call, never reused.
#[derive(Clone, Debug)]
pub struct ToolPlan {
    pub action: ToolAction,
    pub tool_name: Option<String>,
    pub arguments: Map<String, Value>,
}

impl ToolPlan {
    pub fn tool(tool_name: &str, arguments: Map<String, Value>) -> Self {
        Self { action: ToolAction::Tool, tool_name: Some(tool_name.to_string()), arguments }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolExecutionResult {
    pub ok: bool,
    pub output: Option<String>,
    pub safe_message: String,
}

impl ToolExecutionResult {
    pub fn success(output: String) -> Self {
        Self { ok: true, output: Some(output), safe_message: String::new() }
    }

    pub fn fail(safe_message: &str) -> Self {
        Self { ok: false, output: None, safe_message: safe_message.to_string() }
    }
}

pub struct ToolRegistry {
    time: WorldTimeTool,
    runbooks: RunbookSearchTool,
}

impl ToolRegistry {
    pub fn new(llm: Arc<dyn LanguageModelService>, index: Arc<SemanticSearchIndex>) -> Self {
        Self { time: WorldTimeTool, runbooks: RunbookSearchTool::new(index, llm) }
    }

    /// Runs a plan under the given deadline. Never panics, never returns
    /// an error: every outcome is a `ToolExecutionResult`.
    pub async fn execute(&self, plan: &ToolPlan, timeout: Duration) -> ToolExecutionResult {
        if plan.action != ToolAction::Tool {
            return ToolExecutionResult::fail("Tool execution requested incorrectly.");
        }

        let Some(tool_name) = plan.tool_name.as_deref().filter(|name| !name.trim().is_empty())
        else {
            return ToolExecutionResult::fail("Missing tool name.");
        };

        if !ALLOWED_TOOLS.contains(&tool_name) {
            return ToolExecutionResult::fail("Tool not allowed.");
        }

        tracing::info!(tool = tool_name, "tool execution requested");

        match tokio::time::timeout(timeout, self.dispatch(tool_name, &plan.arguments)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(tool = tool_name, "tool timed out");
                ToolExecutionResult::fail(TIMEOUT_MESSAGE)
            }
        }
    }

    async fn dispatch(&self, tool_name: &str, arguments: &Map<String, Value>) -> ToolExecutionResult {
        match tool_name {
            WORLD_TIME_TOOL => self.exec_world_time(arguments),
            RUNBOOK_SEARCH_TOOL => self.exec_runbook_search(arguments).await,
            _ => ToolExecutionResult::fail("Tool not allowed."),
        }
    }

    fn exec_world_time(&self, arguments: &Map<String, Value>) -> ToolExecutionResult {
        let Some(city) = arguments.get("city").and_then(Value::as_str) else {
            return ToolExecutionResult::fail("Missing required argument: city");
        };
        if city.trim().is_empty() || city.chars().count() > MAX_CITY_CHARS {
            return ToolExecutionResult::fail("Invalid city.");
        }

        ToolExecutionResult::success(self.time.city_time(city))
    }

    async fn exec_runbook_search(&self, arguments: &Map<String, Value>) -> ToolExecutionResult {
        let Some(query) = arguments.get("query").and_then(Value::as_str) else {
            return ToolExecutionResult::fail("Missing required argument: query");
        };
        if query.trim().is_empty() || query.chars().count() > MAX_QUERY_CHARS {
            return ToolExecutionResult::fail("Invalid query.");
        }

        match self.runbooks.search(query).await {
            Ok(output) => ToolExecutionResult::success(output),
            Err(error) => {
                tracing::warn!(%error, "tool failed safely");
                ToolExecutionResult::fail(FAILURE_MESSAGE)
            }
        }
    }
}

/// Convenience for building single-argument plans.
pub fn string_args(key: &str, value: &str) -> Map<String, Value> {
    let mut arguments = Map::new();
    arguments.insert(key.to_string(), Value::String(value.to_string()));
    arguments
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use opsroute_core::corpus::seed_runbooks;

    use super::{
        string_args, ToolAction, ToolExecutionResult, ToolPlan, ToolRegistry, RUNBOOK_SEARCH_TOOL,
        WORLD_TIME_TOOL,
    };
    use crate::llm::stub::StubLanguageModel;
    use crate::search::SemanticSearchIndex;

    async fn registry_with(llm: StubLanguageModel) -> ToolRegistry {
        let llm = Arc::new(llm);
        let index = Arc::new(
            SemanticSearchIndex::build(seed_runbooks(), llm.as_ref())
                .await
                .expect("index build"),
        );
        ToolRegistry::new(llm, index)
    }

    fn timeout() -> Duration {
        Duration::from_millis(1500)
    }

    #[tokio::test]
    async fn unlisted_tool_is_rejected_before_execution() {
        let registry = registry_with(StubLanguageModel::new()).await;
        let plan = ToolPlan::tool("shell.exec", string_args("cmd", "rm -rf /"));

        let result = registry.execute(&plan, timeout()).await;
        assert_eq!(result, ToolExecutionResult::fail("Tool not allowed."));
    }

    #[tokio::test]
    async fn missing_tool_name_is_rejected() {
        let registry = registry_with(StubLanguageModel::new()).await;
        let plan = ToolPlan { action: ToolAction::Tool, tool_name: None, arguments: Default::default() };

        let result = registry.execute(&plan, timeout()).await;
        assert_eq!(result.safe_message, "Missing tool name.");
    }

    #[tokio::test]
    async fn non_tool_actions_never_execute() {
        let registry = registry_with(StubLanguageModel::new()).await;
        let plan = ToolPlan {
            action: ToolAction::Refuse,
            tool_name: Some(WORLD_TIME_TOOL.to_string()),
            arguments: Default::default(),
        };

        let result = registry.execute(&plan, timeout()).await;
        assert_eq!(result.safe_message, "Tool execution requested incorrectly.");
    }

    #[tokio::test]
    async fn world_time_arguments_are_validated() {
        let registry = registry_with(StubLanguageModel::new()).await;

        let missing = ToolPlan::tool(WORLD_TIME_TOOL, Default::default());
        let result = registry.execute(&missing, timeout()).await;
        assert_eq!(result.safe_message, "Missing required argument: city");

        let oversized = ToolPlan::tool(WORLD_TIME_TOOL, string_args("city", &"x".repeat(65)));
        let result = registry.execute(&oversized, timeout()).await;
        assert_eq!(result.safe_message, "Invalid city.");

        let blank = ToolPlan::tool(WORLD_TIME_TOOL, string_args("city", "   "));
        let result = registry.execute(&blank, timeout()).await;
        assert_eq!(result.safe_message, "Invalid city.");
    }

    #[tokio::test]
    async fn runbook_query_is_validated() {
        let registry = registry_with(StubLanguageModel::new()).await;

        let missing = ToolPlan::tool(RUNBOOK_SEARCH_TOOL, Default::default());
        let result = registry.execute(&missing, timeout()).await;
        assert_eq!(result.safe_message, "Missing required argument: query");

        let oversized = ToolPlan::tool(RUNBOOK_SEARCH_TOOL, string_args("query", &"q".repeat(501)));
        let result = registry.execute(&oversized, timeout()).await;
        assert_eq!(result.safe_message, "Invalid query.");
    }

    #[tokio::test]
    async fn world_time_succeeds_with_raw_output() {
        let registry = registry_with(StubLanguageModel::new()).await;
        let plan = ToolPlan::tool(WORLD_TIME_TOOL, string_args("city", "London"));

        let result = registry.execute(&plan, timeout()).await;
        assert!(result.ok);
        assert!(result.safe_message.is_empty());
        assert!(result.output.expect("output").ends_with(" in London."));
    }

    #[tokio::test]
    async fn slow_tool_hits_the_deadline() {
        let registry =
            registry_with(StubLanguageModel::new().with_embed_delay(Duration::from_millis(200)))
                .await;
        let plan = ToolPlan::tool(RUNBOOK_SEARCH_TOOL, string_args("query", "redis outage"));

        let result = registry.execute(&plan, Duration::from_millis(20)).await;
        assert_eq!(
            result.safe_message,
            "Tool timed out. Try again with a simpler request."
        );
        assert!(!result.ok);
    }

    #[tokio::test]
    async fn backend_failure_is_a_generic_safe_message() {
        // Index builds fine, then the embed backend goes away.
        let llm = Arc::new(StubLanguageModel::new());
        let index = Arc::new(
            SemanticSearchIndex::build(seed_runbooks(), llm.as_ref())
                .await
                .expect("index build"),
        );
        let failing = Arc::new(StubLanguageModel::new().with_failing_embeds());
        let registry = ToolRegistry::new(failing, index);

        let plan = ToolPlan::tool(RUNBOOK_SEARCH_TOOL, string_args("query", "redis"));
        let result = registry.execute(&plan, timeout()).await;
        assert_eq!(result.safe_message, "Tool failed safely. Try again.");
    }
}
