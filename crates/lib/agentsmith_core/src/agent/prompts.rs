//! Prompt text and the generated backend template.

use serde_json::json;

pub fn use_case(agent_idea: &str) -> String {
    format!(
        r#"Based on this agent idea: "{agent_idea}"

Generate a concise, specific use case description that captures the core functionality and required actions.
Focus on what the agent needs to DO, not what it is.

Examples:
- Agent idea: "Customer support agent that handles refunds and tracks orders on Hubspot"
  Use case: "process refunds, track order status, handle customer inquiries on Slack"
- Agent idea: "Social media manager that schedules posts on twitter"
  Use case: "schedule social media posts, analyze engagement metrics"

Generate only the use case description with a tool name, no explanations."#
    )
}

pub fn system_prompt(agent_idea: &str, tools: &[String]) -> String {
    format!(
        r#"Create a focused system prompt for an AI agent with this idea: "{agent_idea}"

The agent will have access to these tools: {tools}

Requirements:
- Be specific about the agent's role and capabilities
- Mention the available tools contextually
- Keep it concise but comprehensive
- Focus on helping the user effectively

Generate only the system prompt text."#,
        tools = tools.join(", ")
    )
}

pub fn frontend(agent_idea: &str, tools: &[String], system_prompt: &str) -> String {
    format!(
        r#"Create a complete HTML page for an AI agent interface based on this idea: "{agent_idea}"

Requirements:
1. A modern, clean HTML page with inline CSS and JavaScript
2. Password inputs with id="llmApiKey" and id="platformApiKey", and a textarea with id="prompt" whose placeholder fits the agent's purpose
3. A "Run Agent" button and a div with id="response" for the output
4. JavaScript that POSTs JSON to /api/execute-generated-agent with llmApiKey, platformApiKey, prompt, discoveredTools: {tools_json} and systemPrompt: {prompt_json}
5. Loading states, form validation, and distinct styling for connection-required errors, tool errors and other failures
6. A header with the agent's name: "{agent_idea}"

Generate only the complete HTML code with inline CSS and JavaScript. No explanations."#,
        tools_json = json!(tools),
        prompt_json = json!(system_prompt),
    )
}

/// Escape text for a JavaScript template literal.
fn template_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// Standalone backend route for the generated agent.
pub fn backend(
    agent_idea: &str,
    use_case: &str,
    tools: &[String],
    system_prompt: &str,
    model: &str,
) -> String {
    let upper: Vec<String> = tools.iter().map(|t| t.to_uppercase()).collect();
    format!(
        r#"import {{ NextRequest, NextResponse }} from "next/server";
import {{ generateText }} from "ai";
import {{ openai }} from "@ai-sdk/openai";
import {{ Composio }} from "@composio/core";
import {{ VercelProvider }} from "@composio/vercel";

// Agent: {idea_comment}
const TOOLS = {tools_json};
const SYSTEM_PROMPT = `{system_prompt}`;

export async function POST(req: NextRequest) {{
  try {{
    const {{ llmApiKey, platformApiKey, prompt, userId = "default" }} = await req.json();
    if (!llmApiKey || !platformApiKey || !prompt) {{
      return NextResponse.json({{ error: "Missing required fields" }}, {{ status: 400 }});
    }}

    const composio = new Composio({{ apiKey: platformApiKey, provider: new VercelProvider() }});
    const tools = await composio.tools.get(userId, {{ tools: TOOLS }});

    const {{ text }} = await generateText({{
      model: openai({model_json}),
      messages: [
        {{ role: "system", content: SYSTEM_PROMPT }},
        {{ role: "user", content: prompt }},
      ],
      tools,
      maxSteps: 5,
    }});

    return NextResponse.json({{
      response: text,
      success: true,
      metadata: {{ toolsUsed: TOOLS, useCase: {use_case_json}, timestamp: new Date().toISOString() }},
    }});
  }} catch (error) {{
    return NextResponse.json(
      {{ error: "Failed to execute agent", details: error instanceof Error ? error.message : "Unknown error", success: false }},
      {{ status: 500 }},
    );
  }}
}}
"#,
        idea_comment = agent_idea.replace(['\n', '\r'], " "),
        tools_json = json!(upper),
        system_prompt = template_literal(system_prompt),
        model_json = json!(model),
        use_case_json = json!(use_case),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_literal_escapes_interpolation() {
        assert_eq!(template_literal("a `b` ${c} \\"), "a \\`b\\` \\${c} \\\\");
    }

    #[test]
    fn backend_embeds_uppercased_tools_and_escaped_prompt() {
        let src = backend(
            "Inbox helper",
            "fetch \"emails\"",
            &["gmail_fetch_email".to_string()],
            "Use `tools` wisely ${now}",
            "gpt-4.1",
        );
        assert!(src.contains(r#"const TOOLS = ["GMAIL_FETCH_EMAIL"];"#));
        assert!(src.contains(r"Use \`tools\` wisely \${now}"));
        assert!(src.contains(r#"useCase: "fetch \"emails\"""#));
        assert!(src.contains(r#"openai("gpt-4.1")"#));
    }

    #[test]
    fn multi_line_idea_stays_inside_comment() {
        let src = backend("line one\nline two", "u", &[], "p", "m");
        assert!(src.contains("// Agent: line one line two"));
    }

    #[test]
    fn frontend_prompt_carries_tools_and_system_prompt() {
        let prompt = frontend("Idea", &["SLACK_SEND_MESSAGE".to_string()], "Be \"nice\"");
        assert!(prompt.contains(r#"discoveredTools: ["SLACK_SEND_MESSAGE"]"#));
        assert!(prompt.contains(r#"systemPrompt: "Be \"nice\"""#));
    }
}
