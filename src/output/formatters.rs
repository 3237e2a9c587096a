use anyhow::Result;

use crate::pipeline::SummaryResult;
use crate::utils::extract_domain;

pub fn format_as_text(result: &SummaryResult) -> String {
    result.summary.clone()
}

pub fn format_as_json(result: &SummaryResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn format_as_markdown(result: &SummaryResult) -> String {
    let heading = result
        .title
        .clone()
        .or_else(|| extract_domain(&result.url))
        .unwrap_or_else(|| result.url.clone());

    let mut md = String::new();
    md.push_str("# ");
    md.push_str(&heading);
    md.push_str("\n\n");

    md.push_str(&format!(
        "> Source ({}): <{}>  \n> Model: {} · {}\n\n",
        result.source_kind,
        result.url,
        result.model,
        result.completed_at.format("%Y-%m-%d %H:%M UTC")
    ));

    md.push_str(result.summary.trim());
    md.push('\n');
    md
}
