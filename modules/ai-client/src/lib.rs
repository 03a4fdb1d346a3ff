pub mod claude;
pub mod openai;
pub mod tool;
pub mod traits;
pub mod util;

pub use claude::Claude;
pub use openai::OpenAi;
pub use tool::{DynTool, Tool, ToolDefinition, ToolWrapper};
pub use traits::{Agent, EmbedAgent, Message, MessageRole, OutputBuilder, PromptBuilder};
