//! YAML front matter at the top of a markdown document.

use ragmd_chunker::Metadata;
use serde_yaml::Value;

use crate::error::{LoaderError, Result};

const DELIMITER: &str = "---";

/// Split a leading `---` delimited block from the body.
///
/// Returns `(None, content)` when there is no front matter or it is never closed.
#[must_use]
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let Some(first_end) = content.find('\n') else {
        return (None, content);
    };
    if content[..first_end].trim_end() != DELIMITER {
        return (None, content);
    }

    let yaml_start = first_end + 1;
    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == DELIMITER || trimmed == "..." {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parse front matter into ordered string fields.
///
/// Scalars are stringified (`null` becomes an empty string), sequences and mappings
/// are rendered as compact JSON. A document that is not a mapping yields no fields.
pub fn parse_front_matter(yaml: &str, source: &str) -> Result<Metadata> {
    let value: Value = serde_yaml::from_str(yaml).map_err(|source_err| LoaderError::FrontMatter {
        path: source.to_string(),
        source: source_err,
    })?;

    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(Metadata::new()),
        other => {
            log::warn!(
                "{source}: front matter is not a mapping ({}), ignoring",
                kind_name(&other)
            );
            return Ok(Metadata::new());
        }
    };

    let mut fields = Metadata::with_capacity(mapping.len());
    for (key, value) in &mapping {
        fields.insert(stringify(key), stringify(value));
    }
    Ok(fields)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => stringify(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => match serde_json::to_string(value) {
            Ok(json) => json,
            Err(_) => serde_yaml::to_string(value)
                .map(|yaml| yaml.trim().to_string())
                .unwrap_or_default(),
        },
    }
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}
