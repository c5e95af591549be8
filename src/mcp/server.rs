// MCP server implementation

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::indexer::SchemaIndexer;
use crate::mcp::tools;

/// JSON-RPC message
#[derive(Debug, Serialize, Deserialize)]
struct JsonRpcMessage {
    jsonrpc: String,
    id: Option<Value>,
    method: Option<String>,
    params: Option<Value>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Serialize, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    data: Option<Value>,
}

/// MCP tool definition
#[derive(Debug, Serialize, Deserialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: Value,
}

/// MCP server capabilities
#[derive(Debug, Serialize, Deserialize)]
struct ServerCapabilities {
    tools: Option<Value>,
}

/// MCP server info
#[derive(Debug, Serialize, Deserialize)]
struct ServerInfo {
    name: String,
    version: String,
}

/// MCP initialize result
#[derive(Debug, Serialize, Deserialize)]
struct InitializeResult {
    protocol_version: String,
    capabilities: ServerCapabilities,
    server_info: ServerInfo,
}

/// MCP server
pub struct McpServer {
    indexer: Arc<SchemaIndexer>,
    entry: PathBuf,
}

impl McpServer {
    pub fn new(indexer: Arc<SchemaIndexer>, entry: PathBuf) -> Self {
        Self { indexer, entry }
    }

    /// Run the MCP server
    pub async fn run(self) -> Result<()> {
        info!("Starting MCP server");

        let (tx, mut rx) = mpsc::unbounded_channel();

        // Stdin reads block, so they get their own thread
        tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();

            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if let Err(e) = tx.send(line) {
                            error!("Failed to send line to channel: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error reading from stdin: {}", e);
                        break;
                    }
                }
            }
        });

        // Main message processing loop
        while let Some(line) = rx.recv().await {
            if line.trim().is_empty() {
                continue;
            }
            debug!("Received: {}", line);

            match self.handle_message(&line).await {
                Ok(response) => {
                    if let Some(response) = response {
                        println!("{}", response);
                        io::stdout().flush()?;
                    }
                }
                Err(e) => {
                    error!("Error handling message: {}", e);
                    // Send error response
                    let error_response = json!({
                        "jsonrpc": "2.0",
                        "id": null,
                        "error": {
                            "code": -32603,
                            "message": format!("Internal error: {}", e)
                        }
                    });
                    println!("{}", error_response);
                    io::stdout().flush()?;
                }
            }
        }

        Ok(())
    }

    /// Handle a JSON-RPC message
    async fn handle_message(&self, message: &str) -> Result<Option<String>> {
        let msg: JsonRpcMessage = serde_json::from_str(message)?;

        // Notifications carry no id and get no response
        if msg.id.is_none() {
            debug!("Notification: {:?}", msg.method);
            return Ok(None);
        }

        match msg.method.as_deref() {
            Some("initialize") => {
                let result = InitializeResult {
                    protocol_version: "2024-11-05".to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(json!({})),
                    },
                    server_info: ServerInfo {
                        name: "schemagraph".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                };

                let response = json!({
                    "jsonrpc": "2.0",
                    "id": msg.id,
                    "result": result
                });

                Ok(Some(serde_json::to_string(&response)?))
            }

            Some("tools/list") => {
                let tools = self.list_tools();
                let response = json!({
                    "jsonrpc": "2.0",
                    "id": msg.id,
                    "result": { "tools": tools }
                });

                Ok(Some(serde_json::to_string(&response)?))
            }

            Some("tools/call") => {
                if let Some(params) = &msg.params {
                    let result = self.call_tool(params).await?;
                    let response = json!({
                        "jsonrpc": "2.0",
                        "id": msg.id,
                        "result": result
                    });

                    Ok(Some(serde_json::to_string(&response)?))
                } else {
                    let error = json!({
                        "jsonrpc": "2.0",
                        "id": msg.id,
                        "error": {
                            "code": -32602,
                            "message": "Invalid params"
                        }
                    });
                    Ok(Some(serde_json::to_string(&error)?))
                }
            }

            Some("shutdown") => {
                info!("Received shutdown request");
                let response = json!({
                    "jsonrpc": "2.0",
                    "id": msg.id,
                    "result": null
                });
                Ok(Some(serde_json::to_string(&response)?))
            }

            _ => {
                let error = json!({
                    "jsonrpc": "2.0",
                    "id": msg.id,
                    "error": {
                        "code": -32601,
                        "message": "Method not found"
                    }
                });
                Ok(Some(serde_json::to_string(&error)?))
            }
        }
    }

    /// List available tools
    fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "schema_definition".to_string(),
                description: "Find where a type or root operation field is declared".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Exact, case-sensitive symbol name"
                        }
                    },
                    "required": ["name"]
                }),
            },
            Tool {
                name: "schema_operations".to_string(),
                description: "List operations and fragments of the executable documents".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Only this operation, with its source text"
                        }
                    }
                }),
            },
            Tool {
                name: "schema_persisted".to_string(),
                description: "List persisted documents by content-addressed id".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "manifest": {
                            "type": "boolean",
                            "default": false,
                            "description": "Return document id to document text"
                        }
                    }
                }),
            },
            Tool {
                name: "schema_type_graph".to_string(),
                description: "Type relationships, or fields and edges of one type".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "description": "Restrict to one type"
                        },
                        "format": {
                            "type": "string",
                            "enum": ["json", "mermaid"],
                            "default": "json",
                            "description": "Output format"
                        }
                    }
                }),
            },
            Tool {
                name: "schema_rescan".to_string(),
                description: "Rebuild the index from the entry file".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            Tool {
                name: "schema_stats".to_string(),
                description: "Get index statistics".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        ]
    }

    /// Call a tool
    async fn call_tool(&self, params: &Value) -> Result<Value> {
        let tool_name = params["name"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing tool name"))?;
        let args: HashMap<String, Value> = params["arguments"]
            .as_object()
            .map(|args| args.clone().into_iter().collect())
            .unwrap_or_default();

        match tool_name {
            "schema_definition" => tools::definition(&self.indexer, &args).await,
            "schema_operations" => tools::operations(&self.indexer, &args).await,
            "schema_persisted" => tools::persisted(&self.indexer, &args).await,
            "schema_type_graph" => tools::type_graph(&self.indexer, &args).await,
            "schema_rescan" => tools::rescan(&self.indexer, &self.entry).await,
            "schema_stats" => tools::stats(&self.indexer, &args).await,
            _ => Err(anyhow::anyhow!("Unknown tool: {}", tool_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(Arc::new(SchemaIndexer::from_fs()), PathBuf::from("index.graphql"))
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["result"]["server_info"]["name"], "schemagraph");
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["result"]["tools"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .await
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["error"]["code"], -32601);
    }
}
