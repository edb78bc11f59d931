use crate::models::ContentTemplate;
use anyhow::{Context, Result};
use minijinja::{Environment, Value};
use serde_json::json;

/// Values a content template can reference.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Renders stored content templates with MiniJinja.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_filter("truncate", truncate_function);
        env.add_filter("word_limit", word_limit_function);
        env.add_filter("strip_html", strip_html_function);

        Self { env }
    }

    pub fn render_str(&self, source: &str, context: &TemplateContext) -> Result<String> {
        let vars = json!({
            "title": context.title,
            "content": context.content,
            "url": context.url
        });

        let rendered = self
            .env
            .render_str(source, vars)
            .context("Failed to render template")?;

        Ok(rendered.trim().to_string())
    }

    /// Renders a template body and appends its hashtags as `#tag` words.
    pub fn render(&self, template: &ContentTemplate, context: &TemplateContext) -> Result<String> {
        let mut result = self.render_str(&template.body, context)?;

        let hashtags: Vec<String> = template
            .hashtags
            .iter()
            .map(|tag| tag.trim().trim_start_matches('#'))
            .filter(|tag| !tag.is_empty())
            .map(|tag| format!("#{}", tag))
            .collect();

        if !hashtags.is_empty() {
            result.push_str("\n\n");
            result.push_str(&hashtags.join(" "));
        }

        Ok(result)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncates to a character count, backing off to the last word boundary.
fn truncate_function(value: Value, length: Value) -> Result<Value, minijinja::Error> {
    let text = value.as_str().unwrap_or("");
    let max_len = length.as_i64().unwrap_or(100) as usize;

    if text.chars().count() <= max_len {
        return Ok(Value::from(text));
    }

    let truncated = text.chars().take(max_len).collect::<String>();
    let result = if truncated.ends_with(' ') {
        truncated.trim_end().to_string() + "..."
    } else if let Some(last_space) = truncated.rfind(' ') {
        truncated[..last_space].to_string() + "..."
    } else {
        truncated + "..."
    };

    Ok(Value::from(result))
}

fn word_limit_function(value: Value, limit: Value) -> Result<Value, minijinja::Error> {
    let text = value.as_str().unwrap_or("");
    let max_words = limit.as_i64().unwrap_or(10) as usize;

    let words: Vec<&str> = text.split_whitespace().collect();

    if words.len() <= max_words {
        return Ok(Value::from(text));
    }

    Ok(Value::from(words[..max_words].join(" ") + "..."))
}

fn strip_html_function(value: Value) -> Result<Value, minijinja::Error> {
    Ok(Value::from(strip_html(value.as_str().unwrap_or(""))))
}

const HTML_ENTITIES: [(&str, &str); 12] = [
    ("&nbsp;", " "),
    ("&#8211;", "–"),
    ("&#8216;", "‘"),
    ("&#8217;", "’"),
    ("&#8220;", "“"),
    ("&#8221;", "”"),
    ("&#8230;", "…"),
    ("&hellip;", "…"),
    ("&quot;", "\""),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
];

/// Drops markup from WordPress-style excerpts, keeping paragraph breaks.
pub fn strip_html(html: &str) -> String {
    let mut result = html.to_string();

    for tag in ["<br>", "<br/>", "<br />", "<p>", "</p>"] {
        result = result.replace(tag, "\n");
    }

    while let Some(start) = result.find('<') {
        if let Some(end) = result[start..].find('>') {
            result.replace_range(start..start + end + 1, "");
        } else {
            break;
        }
    }

    // `&amp;` goes last so escaped entities are not decoded twice.
    for (entity, text) in HTML_ENTITIES {
        result = result.replace(entity, text);
    }

    result
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
