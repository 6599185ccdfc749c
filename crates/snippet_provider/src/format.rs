use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{Snippet, SnippetFile, StringOrList};

/// Builds the snippets defined by the contents of a snippet file, one per
/// top-level member, in document order.
///
/// Blank content defines no snippets. `prefix` and `body` are kept when they
/// are a string or a list of strings; `description` only when it is a
/// string. Members whose value is not an object still produce a snippet, with
/// every field absent.
pub fn parse_snippets(content: &str, snippet_file: &Arc<SnippetFile>) -> Result<Vec<Snippet>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: Value = serde_json_lenient::from_str_lenient(content)?;
    let Value::Object(members) = document else {
        return Err(anyhow!("expected an object of snippets"));
    };

    Ok(members
        .into_iter()
        .map(|(name, definition)| {
            let definition = match definition {
                Value::Object(definition) => definition,
                _ => Map::new(),
            };
            Snippet {
                name,
                prefix: string_or_list(definition.get("prefix")),
                scope: vec![snippet_file.language.clone()],
                description: definition
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                body: string_or_list(definition.get("body")),
                snippet_file: snippet_file.clone(),
            }
        })
        .collect())
}

fn string_or_list(value: Option<&Value>) -> Option<StringOrList> {
    serde_json::from_value(value?.clone()).ok()
}
