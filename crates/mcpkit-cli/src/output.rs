//! Rendering of command results

use colored::Colorize;
use mcpkit_types::{Content, Prompt, PromptResult, Role, Tool};
use serde::Serialize;

/// What a command produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Tools(Vec<Tool>),
    Content(Vec<Content>),
    Prompts(Vec<Prompt>),
    Prompt(PromptResult),
}

impl Output {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable rendering, one line per item
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        match self {
            Self::Tools(tools) if tools.is_empty() => lines.push("No tools.".dimmed().to_string()),
            Self::Tools(tools) => {
                for tool in tools {
                    lines.push(describe(&tool.name, tool.description.as_deref()));
                }
            }
            Self::Content(content) => {
                for item in content {
                    lines.push(render_content(item));
                }
            }
            Self::Prompts(prompts) if prompts.is_empty() => {
                lines.push("No prompts.".dimmed().to_string())
            }
            Self::Prompts(prompts) => {
                for prompt in prompts {
                    lines.push(describe(&prompt.name, prompt.description.as_deref()));
                    for argument in &prompt.arguments {
                        let marker = if argument.required.unwrap_or(false) {
                            " (required)"
                        } else {
                            ""
                        };
                        lines.push(format!(
                            "    {}{}",
                            argument.name.cyan(),
                            marker.dimmed()
                        ));
                    }
                }
            }
            Self::Prompt(result) => {
                if let Some(description) = &result.description {
                    lines.push(description.dimmed().to_string());
                }
                for message in &result.messages {
                    let role = match message.role {
                        Role::User => "User".green(),
                        Role::Assistant => "Assistant".blue(),
                    };
                    lines.push(format!("{}: {}", role.bold(), render_content(&message.content)));
                }
            }
        }

        lines.join("\n")
    }
}

fn describe(name: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("{}  {}", name.green().bold(), description.dimmed()),
        None => name.green().bold().to_string(),
    }
}

fn render_content(content: &Content) -> String {
    match content.as_text() {
        Some(text) => text.to_string(),
        None => serde_json::to_string(content).unwrap_or_else(|_| "<unprintable content>".into()),
    }
}
