//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.
//! Each specialist agent is granted exactly one tool category.

use std::collections::HashMap;

use crate::core::{Result, ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::tools::data::{CleanTool, ClusterTool, EdaTool, VisualizeTool};

/// Registry of available tools
pub struct ToolRegistry {
    /// Tool definitions indexed by name
    definitions: HashMap<String, ToolDefinition>,
    /// Tool categories
    categories: HashMap<String, ToolCategory>,
    /// Data tools
    clean_tool: CleanTool,
    eda_tool: EdaTool,
    cluster_tool: ClusterTool,
    visualize_tool: VisualizeTool,
}

impl ToolRegistry {
    /// Create a new tool registry with the data analysis tools
    pub fn new() -> Self {
        let mut registry = Self {
            definitions: HashMap::new(),
            categories: HashMap::new(),
            clean_tool: CleanTool::new(),
            eda_tool: EdaTool::new(),
            cluster_tool: ClusterTool::new(),
            visualize_tool: VisualizeTool::new(),
        };

        registry.register_cleaning_tools();
        registry.register_clustering_tools();
        registry.register_visualization_tools();

        registry
    }

    /// Register the cleaning and EDA tools
    fn register_cleaning_tools(&mut self) {
        self.register(
            ToolDefinition::function(
                "clean_data",
                "Clean the dataset: handle null values, remove outliers, drop columns. \
                 Saves a new file with a '_cleaned' suffix and reports its path.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Exact path of the CSV file to clean"
                        },
                        "drop_null_thresh": {
                            "type": "number",
                            "description": "Drop columns with more than this fraction of nulls (default 0.5)"
                        },
                        "impute_num": {
                            "type": "string",
                            "description": "Numeric imputation strategy: 'median' or 'mean'"
                        },
                        "impute_cat": {
                            "type": "string",
                            "description": "Categorical imputation strategy: 'mode' or 'constant'"
                        },
                        "drop_columns": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Specific columns to drop"
                        },
                        "remove_outliers": {
                            "type": "boolean",
                            "description": "Apply IQR-based outlier removal (default true)"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            ToolCategory::Cleaning,
        );

        self.register(
            ToolDefinition::function(
                "perform_eda",
                "Perform exploratory data analysis: find high correlations and suggest \
                 columns to drop against multicollinearity.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Exact path of the CSV file to analyze"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            ToolCategory::Cleaning,
        );
    }

    /// Register the clustering tool
    fn register_clustering_tools(&mut self) {
        self.register(
            ToolDefinition::function(
                "perform_clustering",
                "Run K-Means clustering on the dataset, add 'Cluster', 'PCA1' and 'PCA2' \
                 columns, and save a new file with a '_clustered' suffix.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Exact path of the CSV file to cluster"
                        },
                        "columns": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Feature columns to cluster on (default: all numeric columns)"
                        },
                        "k": {
                            "type": "integer",
                            "description": "Number of clusters (default 3)"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            ToolCategory::Clustering,
        );
    }

    /// Register the visualization tool
    fn register_visualization_tools(&mut self) {
        self.register(
            ToolDefinition::function(
                "generate_visualization",
                "Prepare the 2D PCA cluster scatter plot from a clustered CSV file. \
                 Requires 'PCA1', 'PCA2' and 'Cluster' columns.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Exact path of the clustered CSV file"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            ToolCategory::Visualization,
        );
    }

    /// Register a tool definition
    pub fn register(&mut self, definition: ToolDefinition, category: ToolCategory) {
        let name = definition.function.name.clone();
        self.definitions.insert(name.clone(), definition);
        self.categories.insert(name, category);
    }

    /// Get all tool definitions
    pub fn all_definitions(&self) -> Vec<&ToolDefinition> {
        self.definitions.values().collect()
    }

    /// Get tool definitions by category
    pub fn definitions_by_category(&self, category: ToolCategory) -> Vec<&ToolDefinition> {
        self.definitions
            .iter()
            .filter(|(name, _)| self.categories.get(*name) == Some(&category))
            .map(|(_, def)| def)
            .collect()
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        match tool_call.name.as_str() {
            "clean_data" => self.clean_tool.execute(tool_call),
            "perform_eda" => self.eda_tool.execute(tool_call),
            "perform_clustering" => self.cluster_tool.execute(tool_call),
            "generate_visualization" => self.visualize_tool.execute(tool_call),
            _ => Ok(ToolResult::failure(
                &tool_call.name,
                format!("Unknown tool: {}", tool_call.name),
            )),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
