//! Template substitution for step arguments and values.
//!
//! Templates use `{{ .Identifier }}` placeholders resolved against a
//! point-in-time snapshot of the scaffold context. Rendering is strict:
//! a reference to a name absent from the snapshot is an error, as is a
//! malformed placeholder. Strings without `{{` pass through unchanged.

use super::error::{Result, ScaffoldError};
use std::collections::HashMap;

/// Render `template` against `snapshot`.
pub fn render(template: &str, snapshot: &HashMap<String, String>) -> Result<String> {
    if !template.contains("{{") {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after.find("}}").ok_or_else(|| ScaffoldError::Template {
            template: template.to_string(),
            reason: "unterminated '{{'".to_string(),
        })?;

        let ident = parse_identifier(&after[..end]).map_err(|reason| ScaffoldError::Template {
            template: template.to_string(),
            reason,
        })?;

        let value = snapshot.get(ident).ok_or_else(|| ScaffoldError::Template {
            template: template.to_string(),
            reason: format!("unknown key '{ident}'"),
        })?;
        out.push_str(value);

        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Parse the inside of a placeholder: optional whitespace, a leading
/// dot, then an identifier of `[A-Za-z0-9_]`.
fn parse_identifier(expr: &str) -> std::result::Result<&str, String> {
    let expr = expr.trim();
    let ident = expr
        .strip_prefix('.')
        .ok_or_else(|| format!("expected '.Identifier', got '{expr}'"))?
        .trim();

    if ident.is_empty() {
        return Err("empty identifier".to_string());
    }
    if !ident
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(format!("invalid identifier '{ident}'"));
    }

    Ok(ident)
}
