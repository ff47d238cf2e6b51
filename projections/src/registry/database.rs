//! Bundled reference database and the bulk text format.

/// Reference database compressed by the build script.
static REFERENCE_DATABASE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/reference.csv.lz4"));

/// Decompresses the bundled reference database. A corrupt database is logged and treated as empty.
pub(crate) fn reference_database() -> String {
    let bytes = match lz4_flex::decompress_size_prepended(REFERENCE_DATABASE) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::error!("Failed to decompress reference database: {err}");
            return String::new();
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::error!("Reference database is not valid UTF-8: {err}");
            String::new()
        }
    }
}

/// Iterates `identifier;parameters` records of bulk text. Blank lines and lines starting with `#` are skipped,
/// malformed lines are skipped with a warning.
pub(crate) fn records(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match line.split_once(';') {
            Some((id, parameters)) if !id.trim().is_empty() => Some((id.trim(), parameters.trim())),
            _ => {
                log::warn!("Skipping malformed coordinate system record '{line}'");
                None
            }
        })
}
