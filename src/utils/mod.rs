// Utility functions

/// Reduce a client-supplied filename to a safe blob name: the final path
/// component, trimmed. Returns `None` when nothing usable remains.
pub fn sanitize_blob_name(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .trim();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        return None;
    }
    Some(name.to_string())
}

/// Content type for a stored blob: the type declared in the multipart
/// field when present, otherwise guessed from the filename extension.
pub fn content_type_for(filename: &str, declared: Option<&str>) -> String {
    match declared {
        Some(ct) if !ct.trim().is_empty() => ct.trim().to_string(),
        _ => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string(),
    }
}
