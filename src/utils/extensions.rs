/// Returns true when `id` ends with one of `extensions`
///
/// Matching is a plain suffix test on the module id, so query strings or
/// virtual-module suffixes defeat it the same way they would in the host.
pub fn has_valid_extension<S: AsRef<str>>(id: &str, extensions: &[S]) -> bool {
    extensions
        .iter()
        .any(|extension| id.ends_with(extension.as_ref()))
}
