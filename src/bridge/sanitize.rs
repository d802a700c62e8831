//! Sanitizing of externally sourced text.
//!
//! Every function here is total and idempotent. Text from the platform
//! goes through [`strip_custom_emoji`] then [`collapse_unicode_emoji`];
//! anything that could ping accounts also goes through [`mask_mentions`].

use std::sync::LazyLock;

use fancy_regex::Regex;

/// Replacement for every astral-plane character.
pub const EMOJI_PLACEHOLDER: &str = "[emoji]";

/// Replacement for user, role and broadcast mentions.
pub const MENTION_PLACEHOLDER: &str = "[mention]";

/// Platform custom emoji (`<:name:id>` or animated `<a:name:id>`).
static CUSTOM_EMOJI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a?:(\w+):\d+>").expect("custom emoji pattern"));

/// User (`<@id>`, `<@!id>`), role (`<@&id>`) and broadcast mentions.
static MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@[!&]?\d+>|@everyone|@here").expect("mention pattern"));

/// Replace `<:name:id>` custom emoji tokens with `:name:`.
pub fn strip_custom_emoji(text: &str) -> String {
    replace_until_stable(text, &CUSTOM_EMOJI_PATTERN, ":$1:")
}

/// Replace every astral-plane code point with [`EMOJI_PLACEHOLDER`].
pub fn collapse_unicode_emoji(text: &str) -> String {
    if text.chars().all(|c| (c as u32) <= 0xFFFF) {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if (c as u32) > 0xFFFF {
            result.push_str(EMOJI_PLACEHOLDER);
        } else {
            result.push(c);
        }
    }
    result
}

/// Replace mention tokens with [`MENTION_PLACEHOLDER`].
pub fn mask_mentions(text: &str) -> String {
    replace_until_stable(text, &MENTION_PATTERN, MENTION_PLACEHOLDER)
}

/// Both emoji passes, in order.
pub fn sanitize_content(text: &str) -> String {
    collapse_unicode_emoji(&strip_custom_emoji(text))
}

/// Emoji passes followed by mention masking, for names shown to players.
pub fn sanitize_display_name(text: &str) -> String {
    mask_mentions(&sanitize_content(text))
}

// A replacement can splice a new token together from its neighbours, so
// repeat until nothing matches. Each match removes a `<` or `@` and the
// replacements contain neither, so the loop ends.
fn replace_until_stable(text: &str, pattern: &Regex, replacement: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = pattern.replace_all(&current, replacement).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_custom_emoji() {
        let input = "Hello <:pepega:123456789> world <a:animated:987654321>";
        assert_eq!(strip_custom_emoji(input), "Hello :pepega: world :animated:");
    }

    #[test]
    fn test_strip_custom_emoji_leaves_partial_tokens() {
        assert_eq!(strip_custom_emoji("<:name:>"), "<:name:>");
        assert_eq!(strip_custom_emoji("<:name:12"), "<:name:12");
    }

    #[test]
    fn test_strip_custom_emoji_spliced_token() {
        // Removing the inner token forms a new one around it
        let once = strip_custom_emoji("<<:a:1>5>");
        assert_eq!(once, ":a:");
        assert_eq!(strip_custom_emoji(&once), once);
    }

    #[test]
    fn test_collapse_unicode_emoji() {
        assert_eq!(collapse_unicode_emoji("gg 😀"), "gg [emoji]");
        assert_eq!(collapse_unicode_emoji("😀😂"), "[emoji][emoji]");
        // BMP text is untouched
        assert_eq!(collapse_unicode_emoji("café ☺ ü"), "café ☺ ü");
    }

    #[test]
    fn test_mask_mentions() {
        assert_eq!(mask_mentions("hi <@123>"), "hi [mention]");
        assert_eq!(mask_mentions("hi <@!123>"), "hi [mention]");
        assert_eq!(mask_mentions("ping <@&456> now"), "ping [mention] now");
        assert_eq!(mask_mentions("@everyone look"), "[mention] look");
        assert_eq!(mask_mentions("@here"), "[mention]");
        assert_eq!(mask_mentions("mail me at a@b.c"), "mail me at a@b.c");
    }

    #[test]
    fn test_mask_mentions_one_placeholder_per_token() {
        let masked = mask_mentions("<@1> <@&2> @everyone @here");
        assert_eq!(masked.matches(MENTION_PLACEHOLDER).count(), 4);
        assert!(!masked.contains('@'));
    }

    #[test]
    fn test_mask_mentions_spliced_token() {
        let once = mask_mentions("@every@hereone");
        assert!(!once.contains("@everyone"));
        assert_eq!(mask_mentions(&once), once);
    }

    #[test]
    fn test_empty_input_unchanged() {
        assert_eq!(strip_custom_emoji(""), "");
        assert_eq!(collapse_unicode_emoji(""), "");
        assert_eq!(mask_mentions(""), "");
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "plain text",
            "<:wave:1> hi 👋 <@42> @everyone",
            "<<:a:1>5> <@<@1>2>",
            "@@everyoneeveryone",
            "🎉🎉 <a:x:9> <@&7>",
        ];
        for sample in samples {
            let emoji = strip_custom_emoji(sample);
            assert_eq!(strip_custom_emoji(&emoji), emoji);

            let unicode = collapse_unicode_emoji(sample);
            assert_eq!(collapse_unicode_emoji(&unicode), unicode);

            let masked = mask_mentions(sample);
            assert_eq!(mask_mentions(&masked), masked);
        }
    }

    #[test]
    fn test_sanitize_display_name() {
        assert_eq!(sanitize_display_name("@everyone 😎"), "[mention] [emoji]");
        assert_eq!(sanitize_display_name("<:crown:1>King"), ":crown:King");
    }
}
