//! Property-based tests for prompt hashing and normalization

use chirality::prompt::{normalize_text, prompt_hash, text_hash};
use proptest::prelude::*;

/// Same inputs always hash the same; the digest is 32 bytes of hex.
#[test]
fn test_prompt_hash_is_pure() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<String>(), any::<String>()), |(system, user)| {
            let first = prompt_hash(&system, &user);
            let second = prompt_hash(&system, &user);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), 64);
            prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
            Ok(())
        })
        .unwrap();
}

/// Extra whitespace around and between words never changes the hash.
#[test]
fn test_prompt_hash_ignores_whitespace_layout() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let words = prop::collection::vec("[a-zA-Z0-9]{1,8}", 1..8);
    let gaps = prop::collection::vec("[ \t\n]{1,4}", 8);

    runner
        .run(&(words, gaps), |(words, gaps)| {
            let tidy = words.join(" ");
            let mut messy = gaps[0].clone();
            for (word, gap) in words.iter().zip(gaps.iter().cycle().skip(1)) {
                messy.push_str(word);
                messy.push_str(gap);
            }

            prop_assert_eq!(normalize_text(&messy), tidy.clone());
            prop_assert_eq!(prompt_hash(&messy, &messy), prompt_hash(&tidy, &tidy));
            prop_assert_eq!(text_hash(&messy), text_hash(&tidy));
            Ok(())
        })
        .unwrap();
}

/// Normalizing twice is the same as normalizing once.
#[test]
fn test_normalize_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |s| {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_system_and_user_are_not_interchangeable() {
    assert_ne!(prompt_hash("alpha", "beta"), prompt_hash("beta", "alpha"));
}
