//! Order-preserving merge of catalog pages with similarity deduplication.
//!
//! Record lists are folded left to right into an accumulator. A candidate
//! is skipped when any record already accumulated is "similar" under
//! [`super::similarity`]; otherwise it is appended. The scan is quadratic
//! in page size, which stays small (two catalogs × one page each).

use crate::types::NormalizedRecord;

use super::similarity::Fingerprint;

/// Merge per-catalog record lists into one duplicate-free list.
///
/// `lists` must already be in source priority order: when two catalogs
/// return the same book, the record from the earlier list is kept.
pub fn merge<I>(lists: I) -> Vec<NormalizedRecord>
where
    I: IntoIterator<Item = Vec<NormalizedRecord>>,
{
    let mut merged = Vec::new();
    let mut seen = Vec::new();
    for list in lists {
        append_unseen(&mut merged, &mut seen, list);
    }
    merged
}

/// Append records from `incoming` that are not similar to anything in
/// `accumulated` (or to earlier records of `incoming`).
///
/// Returns how many records were appended. Used to grow a multi-page
/// result list without cross-page duplicates.
pub fn extend_unique(
    accumulated: &mut Vec<NormalizedRecord>,
    incoming: Vec<NormalizedRecord>,
) -> usize {
    let mut seen: Vec<Fingerprint> = accumulated.iter().map(Fingerprint::of).collect();
    append_unseen(accumulated, &mut seen, incoming)
}

fn append_unseen(
    accumulated: &mut Vec<NormalizedRecord>,
    seen: &mut Vec<Fingerprint>,
    incoming: Vec<NormalizedRecord>,
) -> usize {
    let before = accumulated.len();
    for candidate in incoming {
        let fingerprint = Fingerprint::of(&candidate);
        if seen.iter().any(|existing| existing.is_similar(&fingerprint)) {
            tracing::trace!(title = %candidate.title, source = %candidate.source, "duplicate skipped");
            continue;
        }
        seen.push(fingerprint);
        accumulated.push(candidate);
    }
    accumulated.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn make_record(title: &str, author: &str, source: Source) -> NormalizedRecord {
        NormalizedRecord::new(
            format!("{source}:{title}"),
            title,
            &[author.to_string()],
            source,
        )
        .expect("valid title")
    }

    #[test]
    fn unique_records_pass_through_in_order() {
        let merged = merge(vec![
            vec![
                make_record("Dune", "Frank Herbert", Source::GoogleBooks),
                make_record("Emma", "Jane Austen", Source::GoogleBooks),
            ],
            vec![make_record("Beloved", "Toni Morrison", Source::OpenLibrary)],
        ]);
        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma", "Beloved"]);
    }

    #[test]
    fn hobbit_duplicate_collapses_to_one() {
        let a = make_record("The Hobbit", "J.R.R. Tolkien", Source::GoogleBooks);
        let b = make_record("the hobbit", "Tolkien", Source::OpenLibrary);
        let merged = merge(vec![vec![a], vec![b]]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn earlier_list_wins() {
        let a = make_record("The Hobbit", "J.R.R. Tolkien", Source::GoogleBooks);
        let b = make_record("the hobbit", "Tolkien", Source::OpenLibrary);
        let merged = merge(vec![vec![a], vec![b]]);
        assert_eq!(merged[0].source, Source::GoogleBooks);
        assert_eq!(merged[0].title, "The Hobbit");
    }

    #[test]
    fn duplicates_within_one_list_removed() {
        let merged = merge(vec![vec![
            make_record("Foundation", "Isaac Asimov", Source::OpenLibrary),
            make_record("FOUNDATION", "Asimov", Source::OpenLibrary),
        ]]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn same_title_other_author_kept() {
        let merged = merge(vec![
            vec![make_record("Selected Poems", "Langston Hughes", Source::GoogleBooks)],
            vec![make_record("Selected Poems", "Emily Dickinson", Source::OpenLibrary)],
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(merge(Vec::<Vec<NormalizedRecord>>::new()).is_empty());
        assert!(merge(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn extend_unique_skips_records_from_earlier_pages() {
        let mut accumulated = vec![
            make_record("Dune", "Frank Herbert", Source::GoogleBooks),
            make_record("Children of Dune", "Frank Herbert", Source::GoogleBooks),
        ];
        let appended = extend_unique(
            &mut accumulated,
            vec![
                make_record("dune", "Herbert", Source::OpenLibrary),
                make_record("God Emperor of Dune", "Frank Herbert", Source::OpenLibrary),
            ],
        );
        assert_eq!(appended, 1);
        assert_eq!(accumulated.len(), 3);
        assert_eq!(accumulated[2].title, "God Emperor of Dune");
    }

    #[test]
    fn extend_unique_into_empty() {
        let mut accumulated = Vec::new();
        let appended = extend_unique(
            &mut accumulated,
            vec![make_record("Dune", "Frank Herbert", Source::GoogleBooks)],
        );
        assert_eq!(appended, 1);
    }
}
