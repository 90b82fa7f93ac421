//! Passage chunking: sources → overlapping multi-sentence retrieval units.
//!
//! Each source snippet is segmented into sentences, then expanded into every
//! 1–3 sentence window. The overlap is deliberate: retrieval can match a
//! claim against either a single precise sentence or its surrounding
//! context. Pure function of its input, so re-chunking the same sources
//! yields identical passages.

use crate::types::{Passage, Source};
use crosscheck_common::VerifyConfig;
use unicode_segmentation::UnicodeSegmentation;

/// Abbreviations whose trailing period UAX-29 treats as a sentence
/// terminator when the next word is capitalized.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "rev", "gen", "sen", "rep", "gov", "jr", "sr", "st", "no",
    "inc", "ltd", "co", "corp", "dept", "univ", "assn", "bros", "vs", "etc", "approx", "est",
    "e.g", "i.e", "u.s", "u.s.a", "u.k", "u.n", "d.c",
];

/// Split text into sentences, re-attaching segments that UAX-29 breaks
/// after common abbreviations ("Mr.", "U.S.A.", "Inc.").
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for seg in text.unicode_sentences() {
        let seg = seg.trim();
        if seg.is_empty() {
            continue;
        }
        if let Some(prev) = out.last_mut() {
            if ends_with_abbreviation(prev) {
                prev.push(' ');
                prev.push_str(seg);
                continue;
            }
        }
        out.push(seg.to_string());
    }
    out
}

fn ends_with_abbreviation(sentence: &str) -> bool {
    if !sentence.ends_with('.') {
        return false;
    }
    let last_word = sentence
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or(sentence);
    let stripped = last_word.trim_end_matches('.').to_lowercase();
    if stripped.is_empty() {
        return false;
    }
    // Single-letter initials ("Harry S. Truman") read as abbreviations too.
    if stripped.chars().count() == 1 && stripped.chars().all(|c| c.is_alphabetic()) {
        return true;
    }
    ABBREVIATIONS.contains(&stripped.as_str())
}

/// Derive overlapping passages from every source.
///
/// Sentences shorter than `cfg.min_sentence_len` are dropped as passage
/// material. A source whose snippet segments to nothing usable still emits
/// one whole-snippet passage when the raw snippet is long enough; empty or
/// whitespace-only snippets emit nothing. `source_index` is 1-based and
/// matches the `[n]` citation numbering used by the answer.
pub fn chunk_sources_into_passages(sources: &[Source], cfg: &VerifyConfig) -> Vec<Passage> {
    let mut passages = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        let source_index = i + 1;
        let snippet = source.snippet.trim();
        if snippet.is_empty() {
            continue;
        }

        let sentences: Vec<String> = split_sentences(snippet)
            .into_iter()
            .filter(|s| s.len() >= cfg.min_sentence_len)
            .collect();

        if sentences.is_empty() {
            if snippet.len() >= cfg.min_sentence_len {
                passages.push(Passage {
                    text: snippet.to_string(),
                    source_id: source.id.clone(),
                    source_index,
                    source_title: source.title.clone(),
                });
            }
            continue;
        }

        for j in 0..sentences.len() {
            for window in 1..=cfg.max_passage_window {
                if j + window > sentences.len() {
                    break;
                }
                passages.push(Passage {
                    text: sentences[j..j + window].join(" "),
                    source_id: source.id.clone(),
                    source_index,
                    source_title: source.title.clone(),
                });
            }
        }
    }

    passages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, snippet: &str) -> Source {
        Source {
            id: id.to_string(),
            title: format!("title-{id}"),
            url: format!("https://example.com/{id}"),
            snippet: snippet.to_string(),
            published_date: None,
        }
    }

    #[test]
    fn empty_source_list_yields_no_passages() {
        assert!(chunk_sources_into_passages(&[], &VerifyConfig::default()).is_empty());
    }

    #[test]
    fn abbreviations_stay_attached() {
        let sentences = split_sentences(
            "Mr. Smith joined Acme Inc. as chief executive. The board approved the move.",
        );
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("Mr. Smith"));
        assert!(sentences[0].contains("Acme Inc. as chief executive."));
    }

    #[test]
    fn initials_are_not_sentence_breaks() {
        let sentences =
            split_sentences("Harry S. Truman served two terms. He left office in 1953.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("Harry S. Truman"));
    }

    #[test]
    fn three_sentences_produce_all_window_sizes() {
        let s = source(
            "s1",
            "The first sentence is long enough. The second sentence is also long enough. \
             The third sentence rounds out the set.",
        );
        let passages = chunk_sources_into_passages(&[s], &VerifyConfig::default());
        // windows: 3x single, 2x pair, 1x triple
        assert_eq!(passages.len(), 6);
        assert!(passages.iter().all(|p| p.source_index == 1));
        let triple = passages
            .iter()
            .find(|p| p.text.contains("first") && p.text.contains("third"))
            .expect("triple window");
        assert!(!triple.text.contains('\n'));
    }

    #[test]
    fn short_sentences_are_dropped() {
        let s = source("s1", "Tiny. This sentence clears the minimum length bar easily.");
        let passages = chunk_sources_into_passages(&[s], &VerifyConfig::default());
        assert_eq!(passages.len(), 1);
        assert!(!passages[0].text.contains("Tiny"));
    }

    #[test]
    fn unsegmentable_snippet_falls_back_to_whole_snippet() {
        // Every individual sentence is under the minimum length, but the
        // snippet as a whole is usable.
        let s = source("s1", "Revenue up. Margins up. Guidance raised.");
        let passages = chunk_sources_into_passages(&[s], &VerifyConfig::default());
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "Revenue up. Margins up. Guidance raised.");
    }

    #[test]
    fn whitespace_snippet_yields_nothing() {
        let s = source("s1", "   \n  ");
        assert!(chunk_sources_into_passages(&[s], &VerifyConfig::default()).is_empty());
    }

    #[test]
    fn source_indices_are_one_based_and_bounded() {
        let sources = vec![
            source("a", "The first source has a single usable sentence."),
            source("b", "The second source also has a single usable sentence."),
        ];
        let passages = chunk_sources_into_passages(&sources, &VerifyConfig::default());
        assert!(passages
            .iter()
            .all(|p| p.source_index >= 1 && p.source_index <= sources.len()));
        assert!(passages.iter().any(|p| p.source_index == 2));
    }

    #[test]
    fn chunking_is_idempotent() {
        let sources = vec![source(
            "a",
            "The first sentence is long enough. The second sentence is also long enough.",
        )];
        let cfg = VerifyConfig::default();
        let first: Vec<String> = chunk_sources_into_passages(&sources, &cfg)
            .into_iter()
            .map(|p| p.text)
            .collect();
        let second: Vec<String> = chunk_sources_into_passages(&sources, &cfg)
            .into_iter()
            .map(|p| p.text)
            .collect();
        assert_eq!(first, second);
    }
}
