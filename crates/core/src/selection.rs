use crate::types::{Candidate, WorkItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    All,
    /// Raw comma-separated, 1-based indices as typed by the operator.
    Subset(String),
}

impl SelectionMode {
    /// Interpret the answer to "ALL or specific videos?".
    pub fn parse(answer: &str) -> Self {
        let answer = answer.trim();
        if answer.eq_ignore_ascii_case("all") {
            SelectionMode::All
        } else {
            SelectionMode::Subset(answer.to_string())
        }
    }
}

/// Resolve the operator's selection into an ordered work list.
///
/// Subset indices keep the order they were typed in, duplicates included.
/// Tokens that are not numbers or fall outside `1..=len` are dropped
/// without complaint. Serials are assigned by position in the result.
pub fn resolve_selection(candidates: &[Candidate], mode: &SelectionMode) -> Vec<WorkItem> {
    let picked: Vec<&Candidate> = match mode {
        SelectionMode::All => candidates.iter().collect(),
        SelectionMode::Subset(raw) => raw
            .split(',')
            .filter_map(|token| token.trim().parse::<usize>().ok())
            .filter(|index| (1..=candidates.len()).contains(index))
            .map(|index| &candidates[index - 1])
            .collect(),
    };

    picked
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| WorkItem::new(i + 1, candidate))
        .collect()
}
