use std::collections::BTreeSet;

/// Lowercased alphanumeric runs of a title, deduplicated.
pub(crate) fn title_terms(title: &str) -> BTreeSet<String> {
    split_terms(title).collect()
}

/// Query terms in the order given. The last one is matched as a prefix.
pub(crate) fn query_terms(query: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in split_terms(query) {
        if !out.contains(&term) {
            out.push(term);
        }
    }
    out
}

fn split_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
}
