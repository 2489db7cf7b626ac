//! Tool identifier → toolkit slug mapping.

/// Owning toolkit slug of a qualified tool identifier.
///
/// `GMAIL_FETCH_EMAIL` → `gmail`. Identifiers with a leading underscore and
/// at least three `_`-separated parts join the first two parts, so
/// `_21EMAIL_FETCH` (parts `["", "21EMAIL", "FETCH"]`) → `21email`.
pub fn extract_toolkit_slug(tool: &str) -> String {
    if tool.starts_with('_') {
        let parts: Vec<&str> = tool.split('_').collect();
        if parts.len() >= 3 {
            return format!("{}{}", parts[0], parts[1]).to_lowercase();
        }
    }
    tool.split('_').next().unwrap_or_default().to_lowercase()
}

/// Distinct toolkit slugs for `tools`, in first-seen order.
pub fn distinct_toolkit_slugs<S: AsRef<str>>(tools: &[S]) -> Vec<String> {
    let mut slugs: Vec<String> = Vec::new();
    for tool in tools {
        let slug = extract_toolkit_slug(tool.as_ref());
        if !slugs.contains(&slug) {
            slugs.push(slug);
        }
    }
    slugs
}
