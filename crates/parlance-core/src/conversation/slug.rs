/// Canonical key for a context name: lowercase, ASCII, dash separated.
/// Blank names map to the default context `""`.
pub fn slugify_context(name: &str) -> String {
    ::slug::slugify(name.trim()).to_lowercase()
}
