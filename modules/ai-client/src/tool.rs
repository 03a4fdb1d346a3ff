use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Static definition of a callable tool, as sent to the provider.
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A strongly-typed tool. Implementors describe their schema and execute
/// with a raw JSON value, since the wire format is JSON regardless of
/// provider.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn call(&self, input: Value) -> Result<Value>;
}

/// Object-safe wrapper so agents can hold a heterogeneous `Vec<Arc<dyn DynTool>>`.
#[async_trait]
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    async fn definition(&self) -> ToolDefinition;
    async fn call_json(&self, input: Value) -> Result<Value>;
}

pub struct ToolWrapper<T>(pub T);

#[async_trait]
impl<T: Tool> DynTool for ToolWrapper<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.0.name().to_string(),
            description: self.0.description().to_string(),
            parameters: self.0.parameters(),
        }
    }

    async fn call_json(&self, input: Value) -> Result<Value> {
        self.0.call(input).await
    }
}
