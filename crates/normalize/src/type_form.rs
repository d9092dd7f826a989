/// Vendor-prefixed community-package form, e.g. `n8n-nodes-base.httpRequest`.
const CORE_PREFIX: &str = "n8n-nodes-base.";

/// Scoped official-package form, e.g. `@n8n/n8n-nodes-langchain.agent`.
const LANGCHAIN_SCOPED_PREFIX: &str = "@n8n/n8n-nodes-langchain.";

/// Unscoped package form some host versions emit for the same package,
/// e.g. `n8n-nodes-langchain.agent`.
const LANGCHAIN_PREFIX: &str = "n8n-nodes-langchain.";

/// Canonicalizes a node-type identifier to its short form.
///
/// The host emits three equivalent spellings of the same logical type: a
/// long vendor-prefixed form, a short form, and an official scoped-package
/// form. The catalog stores only the short form, so every lookup and
/// comparison must be normalized through this function first.
///
/// Unrecognized prefixes are returned unchanged (trimmed), on the
/// assumption that an unknown long form is itself already a short form
/// from a package this function doesn't know about yet — silently
/// dropping a prefix it doesn't recognize would be worse than a no-op.
pub fn normalize_type(type_str: &str) -> String {
    let trimmed = type_str.trim();
    if let Some(rest) = trimmed.strip_prefix(LANGCHAIN_SCOPED_PREFIX) {
        return rest.to_string();
    }
    if let Some(rest) = trimmed.strip_prefix(LANGCHAIN_PREFIX) {
        return rest.to_string();
    }
    if let Some(rest) = trimmed.strip_prefix(CORE_PREFIX) {
        return rest.to_string();
    }
    trimmed.to_string()
}
