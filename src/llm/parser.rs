//! Response parsing for LLM outputs.

/// Strips markdown code fences from a model reply.
///
/// Every literal "```sql" and "```" is removed, wherever it occurs, and the
/// result is trimmed. Anything else the model wrote is kept verbatim.
pub fn strip_code_fences(response: &str) -> String {
    response
        .trim()
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}
