//! Property-based tests for synthesis accumulation and protocol helpers

use ai_speech::providers::edge::protocol;
use ai_speech::{SynthesisChunk, VoiceSelector, collect_audio};
use bytes::Bytes;
use proptest::prelude::*;

fn chunk_strategy() -> impl Strategy<Value = SynthesisChunk> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..64)
            .prop_map(|data| SynthesisChunk::Audio(Bytes::from(data))),
        ("[a-z]{1,8}", any::<u64>(), any::<u64>()).prop_map(|(text, offset, duration)| {
            SynthesisChunk::WordBoundary {
                offset,
                duration,
                text,
            }
        }),
        ("[a-z ]{1,20}", any::<u64>()).prop_map(|(text, offset)| {
            SynthesisChunk::SentenceBoundary {
                offset,
                duration: 0,
                text,
            }
        }),
    ]
}

mod accumulation_tests {
    use super::*;

    proptest! {
        #[test]
        fn only_audio_accumulates_in_order(
            chunks in prop::collection::vec(chunk_strategy(), 0..32)
        ) {
            let expected: Vec<u8> = chunks
                .iter()
                .filter_map(|c| match c {
                    SynthesisChunk::Audio(data) => Some(data.to_vec()),
                    _ => None,
                })
                .flatten()
                .collect();

            let stream = Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)));
            let audio = futures::executor::block_on(collect_audio(stream)).unwrap();

            prop_assert_eq!(audio.data(), expected.as_slice());
        }
    }
}

mod text_split_tests {
    use super::*;

    proptest! {
        #[test]
        fn pieces_respect_limit_and_keep_words(text in "[a-zA-Zé ]{0,400}", limit in 8usize..64) {
            let pieces = protocol::split_text(&text, limit);

            for piece in &pieces {
                prop_assert!(piece.len() <= limit);
                prop_assert!(!piece.is_empty());
            }

            let rejoined: String = pieces.concat().split_whitespace().collect();
            let original: String = text.split_whitespace().collect();
            prop_assert_eq!(rejoined, original);
        }

        #[test]
        fn slice_ending_on_the_limit_stays_whole(
            head in prop::collection::vec("[a-z]{1,8}", 1..6),
            tail in prop::collection::vec("[a-z]{1,8}", 1..6),
        ) {
            let first = head.join(" ");
            let text = format!("{first} {}", tail.join(" "));

            let pieces = protocol::split_text(&text, first.len());

            prop_assert_eq!(pieces[0], first.as_str());
        }

        #[test]
        fn escaped_text_has_no_raw_markup(text in ".{0,100}") {
            let escaped = protocol::escape_xml(&text);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
            prop_assert!(!escaped.contains('\''));
        }
    }
}

mod voice_tests {
    use super::*;

    proptest! {
        #[test]
        fn any_name_resolves_to_a_listed_voice(name in ".{0,20}") {
            let selector = VoiceSelector::new();
            let resolved = selector.resolve(&name);

            prop_assert!(selector.voices().iter().any(|v| v.name == resolved));
        }
    }
}
