//! Platform reaction vocabulary.

use cleanstreak_core::ReactionKind;

/// Reaction on the roster message that joins (add) or leaves (remove).
pub const JOIN: &str = "\u{274c}"; // ❌

pub const CLEAN: &str = "\u{2705}"; // ✅
pub const CLOSE: &str = "\u{1f7e1}"; // 🟡
pub const RELAPSED: &str = "\u{1f534}"; // 🔴

/// The three affordances attached to every daily prompt, in display order.
pub const PROMPT_SET: [&str; 3] = [CLEAN, CLOSE, RELAPSED];

/// Map a raw platform emoji to a reaction kind. Anything unrecognized is
/// ignored upstream.
pub fn reaction_kind(emoji: &str) -> Option<ReactionKind> {
    match emoji {
        CLEAN => Some(ReactionKind::Clean),
        CLOSE => Some(ReactionKind::Close),
        RELAPSED => Some(ReactionKind::Relapsed),
        _ => None,
    }
}

pub fn emoji_for(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Clean => CLEAN,
        ReactionKind::Close => CLOSE,
        ReactionKind::Relapsed => RELAPSED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_emoji_map_to_kinds() {
        assert_eq!(reaction_kind(CLEAN), Some(ReactionKind::Clean));
        assert_eq!(reaction_kind(CLOSE), Some(ReactionKind::Close));
        assert_eq!(reaction_kind(RELAPSED), Some(ReactionKind::Relapsed));
    }

    #[test]
    fn unknown_emoji_are_none() {
        assert_eq!(reaction_kind("\u{1f389}"), None);
        assert_eq!(reaction_kind(JOIN), None);
        assert_eq!(reaction_kind(""), None);
    }

    #[test]
    fn mapping_round_trips() {
        for kind in [
            ReactionKind::Clean,
            ReactionKind::Close,
            ReactionKind::Relapsed,
        ] {
            assert_eq!(reaction_kind(emoji_for(kind)), Some(kind));
        }
    }
}
