//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::game::WordChainGame;
use crate::models::Room;

/// Validate that a game's state is internally consistent
pub fn assert_game_invariants(game: &WordChainGame) {
    if game.is_active() {
        debug_assert!(
            game.turn_order().len() >= 2,
            "active game with {} players",
            game.turn_order().len()
        );

        debug_assert!(
            game.current_turn_index() < game.turn_order().len(),
            "turn index {} out of range for {} players",
            game.current_turn_index(),
            game.turn_order().len()
        );

        for id in game.turn_order() {
            debug_assert!(
                game.scores().contains_key(id),
                "player {id} in turn order but has no score entry"
            );
        }

        debug_assert!(
            game.turn_deadline().is_some(),
            "active game without a turn deadline"
        );
    }

    // Accepted words are unique...
    for (i, word) in game.used_words().iter().enumerate() {
        debug_assert!(
            !game.used_words()[..i].contains(word),
            "word {word:?} accepted twice"
        );
    }

    // ...and chain pairwise in acceptance order.
    for pair in game.used_words().windows(2) {
        debug_assert_eq!(
            pair[0].chars().last(),
            pair[1].chars().next(),
            "accepted words {:?} -> {:?} break the chain",
            pair[0],
            pair[1]
        );
    }
}

/// Validate that a room's state is internally consistent
pub fn assert_room_invariants(room: &Room) {
    debug_assert!(
        !room.name.trim().is_empty(),
        "room {} has empty name",
        room.id
    );

    for (i, member) in room.members().iter().enumerate() {
        debug_assert!(
            !room.members()[..i].contains(member),
            "room {} lists member {member} twice",
            room.id
        );
    }

    if room.game.is_active() {
        for id in room.game.turn_order() {
            debug_assert!(
                room.is_member(*id),
                "room {} game includes non-member {id}",
                room.id
            );
        }
    }
}
