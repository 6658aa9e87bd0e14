//! Utility functions for working with label strings

/// Longest common literal prefix of a set of labels
pub(crate) fn common_prefix(labels: &[&str]) -> String {
    let Some((first, rest)) = labels.split_first() else {
        return String::new();
    };
    let mut end = 0;
    for (idx, ch) in first.char_indices() {
        let next = idx + ch.len_utf8();
        if rest.iter().all(|label| label.get(..next) == Some(&first[..next])) {
            end = next;
        } else {
            break;
        }
    }
    first[..end].to_string()
}
