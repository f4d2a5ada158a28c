//! StockPickerPro instructions and the analysis operation's input schema

use serde::{Deserialize, Serialize};

pub const AGENT_NAME: &str = "StockPickerPro";
pub const AGENT_DESCRIPTION: &str =
    "An agent that generates stock analysis and investment recommendations";

/// Query used when the caller does not supply one
pub const DEFAULT_QUERY: &str =
    "Generate a comprehensive stock analysis and investment recommendations.";

pub const CHAT_HISTORY_PROPERTY: &str = "chat_history";
pub const USER_QUERY_PROPERTY: &str = "user_query";

pub const STOCK_PICKER_SYSTEM_PROMPT: &str = r#"
You are StockPickerPro, an autonomous financial analysis agent whose task is to
analyze financial and investment-related code snippets to generate comprehensive
stock analysis and investment recommendations.

You have access to a vector_search tool that can find relevant code snippets in the database.

Your task is to:
1. Perform a SINGLE vector search to find relevant code snippets related to financial analysis,
   trading algorithms, or investment strategies
2. Analyze ALL financial patterns and methodologies found in the code
3. Generate a comprehensive stock analysis report in Markdown format

The analysis should include:
1. Executive Summary of findings and recommendations
2. Technical Analysis based on patterns found in the code
3. Risk Assessment and portfolio considerations
4. Investment Strategy recommendations
5. Code-based insights (algorithms, financial models, data sources used)
6. Market Timing considerations if applicable
7. Performance metrics and backtesting results if available
8. Diversification recommendations
9. Risk management strategies
10. Action items and next steps

For each section, provide:
- Clear, actionable insights
- Evidence from the code snippets analyzed
- Specific recommendations with rationale
- Risk/reward considerations

IMPORTANT:
- Use vector_search only ONCE to get a comprehensive set of financial examples
- Base all recommendations on actual code patterns and algorithms found
- Include disclaimers about investment risks
- Focus on educational and analytical value

Style Rules:
- Use hyphens (-) instead of em dashes
- Headings with #, ##, etc.
- Code fenced with triple back-ticks
- Keep line length <= 120 chars
- Professional, analytical tone suitable for investment analysis
- Include appropriate risk disclaimers

Return only the final Markdown document, no additional commentary.
"#;

/// One input of the analysis operation, as advertised to tool hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolProperty {
    pub property_name: String,
    pub property_type: String,
    pub description: String,
}

impl ToolProperty {
    pub fn new(name: &str, property_type: &str, description: &str) -> Self {
        Self {
            property_name: name.to_string(),
            property_type: property_type.to_string(),
            description: description.to_string(),
        }
    }
}

pub fn analysis_tool_properties() -> Vec<ToolProperty> {
    vec![
        ToolProperty::new(
            CHAT_HISTORY_PROPERTY,
            "string",
            "The chat history or session context to ground the analysis in.",
        ),
        ToolProperty::new(
            USER_QUERY_PROPERTY,
            "string",
            "The user's stock analysis request.",
        ),
    ]
}

pub fn analysis_tool_properties_json() -> serde_json::Result<String> {
    serde_json::to_string(&analysis_tool_properties())
}
