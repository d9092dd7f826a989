use crate::schema::{DisplayOptions, NodeSchema, PropertySchema, PropertyType};
use serde_json::json;
use std::collections::HashMap;

/// A representative subset of the real catalog (~500 node types in
/// production). Covers exactly the node families Pass 2 and Pass 5 need
/// to exercise: trigger, control-flow, HTTP, an AI agent and its
/// language-model/memory/tool/chain satellites.
pub fn embedded_nodes() -> Vec<NodeSchema> {
    vec![
        manual_trigger(),
        webhook(),
        chat_trigger(),
        http_request(),
        set_node(),
        if_node(),
        switch_node(),
        agent(),
        chain_llm(),
        lm_chat_open_ai(),
        memory_buffer_window(),
        tool_http_request(),
        tool_code(),
        tool_vector_store(),
        tool_workflow(),
        tool_calculator(),
    ]
}

fn manual_trigger() -> NodeSchema {
    NodeSchema {
        node_type: "manualTrigger",
        is_trigger: true,
        properties: vec![],
    }
}

fn webhook() -> NodeSchema {
    NodeSchema {
        node_type: "webhook",
        is_trigger: true,
        properties: vec![
            PropertySchema {
                name: "path",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "httpMethod",
                prop_type: PropertyType::Options,
                required: true,
                default: Some(json!("GET")),
                options: Some(vec!["GET", "POST", "PUT", "DELETE", "PATCH"]),
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "responseMode",
                prop_type: PropertyType::Options,
                required: false,
                default: Some(json!("onReceived")),
                options: Some(vec!["onReceived", "lastNode", "streaming"]),
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
        ],
    }
}

fn chat_trigger() -> NodeSchema {
    NodeSchema {
        node_type: "chatTrigger",
        is_trigger: true,
        properties: vec![PropertySchema {
            name: "responseMode",
            prop_type: PropertyType::Options,
            required: false,
            default: Some(json!("lastNode")),
            options: Some(vec!["lastNode", "streaming"]),
            numeric_range: None,
            resource_locator_modes: None,
            display_options: None,
        }],
    }
}

fn http_request() -> NodeSchema {
    NodeSchema {
        node_type: "httpRequest",
        is_trigger: false,
        properties: vec![
            PropertySchema {
                name: "url",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "method",
                prop_type: PropertyType::Options,
                required: false,
                default: Some(json!("GET")),
                options: Some(vec!["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD"]),
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "timeout",
                prop_type: PropertyType::Number,
                required: false,
                default: Some(json!(10000)),
                options: None,
                numeric_range: Some((0.0, 3_600_000.0)),
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "authentication",
                prop_type: PropertyType::ResourceLocator,
                required: false,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: Some(vec!["list", "id"]),
                display_options: None,
            },
        ],
    }
}

fn set_node() -> NodeSchema {
    NodeSchema {
        node_type: "set",
        is_trigger: false,
        properties: vec![PropertySchema {
            name: "mode",
            prop_type: PropertyType::Options,
            required: false,
            default: Some(json!("manual")),
            options: Some(vec!["manual", "raw"]),
            numeric_range: None,
            resource_locator_modes: None,
            display_options: None,
        }],
    }
}

fn if_node() -> NodeSchema {
    NodeSchema {
        node_type: "if",
        is_trigger: false,
        properties: vec![],
    }
}

fn switch_node() -> NodeSchema {
    NodeSchema {
        node_type: "switch",
        is_trigger: false,
        properties: vec![PropertySchema {
            name: "numberOfOutputs",
            prop_type: PropertyType::Number,
            required: false,
            default: Some(json!(4)),
            options: None,
            numeric_range: Some((1.0, 64.0)),
            resource_locator_modes: None,
            display_options: None,
        }],
    }
}

fn agent() -> NodeSchema {
    NodeSchema {
        node_type: "agent",
        is_trigger: false,
        properties: vec![
            PropertySchema {
                name: "promptType",
                prop_type: PropertyType::Options,
                required: false,
                default: Some(json!("auto")),
                options: Some(vec!["auto", "define"]),
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "text",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: Some(DisplayOptions {
                    show: HashMap::from([("promptType".to_string(), vec![json!("define")])]),
                    hide: HashMap::new(),
                }),
            },
            PropertySchema {
                name: "streamResponse",
                prop_type: PropertyType::Boolean,
                required: false,
                default: Some(json!(false)),
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
        ],
    }
}

fn chain_llm() -> NodeSchema {
    NodeSchema {
        node_type: "chainLlm",
        is_trigger: false,
        properties: vec![PropertySchema {
            name: "prompt",
            prop_type: PropertyType::String,
            required: true,
            default: None,
            options: None,
            numeric_range: None,
            resource_locator_modes: None,
            display_options: None,
        }],
    }
}

fn lm_chat_open_ai() -> NodeSchema {
    NodeSchema {
        node_type: "lmChatOpenAi",
        is_trigger: false,
        properties: vec![PropertySchema {
            name: "model",
            prop_type: PropertyType::String,
            required: true,
            default: None,
            options: None,
            numeric_range: None,
            resource_locator_modes: None,
            display_options: None,
        }],
    }
}

fn memory_buffer_window() -> NodeSchema {
    NodeSchema {
        node_type: "memoryBufferWindow",
        is_trigger: false,
        properties: vec![PropertySchema {
            name: "contextWindowLength",
            prop_type: PropertyType::Number,
            required: false,
            default: Some(json!(5)),
            options: None,
            numeric_range: Some((1.0, 100.0)),
            resource_locator_modes: None,
            display_options: None,
        }],
    }
}

fn tool_http_request() -> NodeSchema {
    NodeSchema {
        node_type: "toolHttpRequest",
        is_trigger: false,
        properties: vec![
            PropertySchema {
                name: "toolDescription",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "url",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
        ],
    }
}

fn tool_code() -> NodeSchema {
    NodeSchema {
        node_type: "toolCode",
        is_trigger: false,
        properties: vec![
            PropertySchema {
                name: "toolDescription",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "code",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
        ],
    }
}

fn tool_vector_store() -> NodeSchema {
    NodeSchema {
        node_type: "toolVectorStore",
        is_trigger: false,
        properties: vec![PropertySchema {
            name: "toolDescription",
            prop_type: PropertyType::String,
            required: true,
            default: None,
            options: None,
            numeric_range: None,
            resource_locator_modes: None,
            display_options: None,
        }],
    }
}

fn tool_workflow() -> NodeSchema {
    NodeSchema {
        node_type: "toolWorkflow",
        is_trigger: false,
        properties: vec![
            PropertySchema {
                name: "toolDescription",
                prop_type: PropertyType::String,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: None,
                display_options: None,
            },
            PropertySchema {
                name: "workflowId",
                prop_type: PropertyType::ResourceLocator,
                required: true,
                default: None,
                options: None,
                numeric_range: None,
                resource_locator_modes: Some(vec!["list", "id"]),
                display_options: None,
            },
        ],
    }
}

fn tool_calculator() -> NodeSchema {
    NodeSchema {
        node_type: "toolCalculator",
        is_trigger: false,
        properties: vec![],
    }
}
