//! Word-chain game state machine.
//!
//! One `WordChainGame` is embedded in every room. All mutation goes
//! through `start`, `submit_word` and `remove_player`; every call runs to
//! completion and leaves the state consistent, whatever the input.
//!
//! Time is injected: callers pass `now` into every time-sensitive
//! operation. The turn deadline is only re-evaluated when the next
//! submission arrives, so a room that goes silent stays active until
//! someone speaks again.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::invariants::assert_game_invariants;

/// Seconds a player has to produce a word.
pub const TURN_SECONDS: i64 = 15;

/// Full passes through the turn order before a game ends normally.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Points awarded per character of an accepted word.
pub const POINTS_PER_CHAR: u32 = 10;

/// Why a game ended. The serialized names are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "duplicate word")]
    DuplicateWord,
    #[serde(rename = "chain violation")]
    ChainViolation,
    #[serde(rename = "rounds complete")]
    RoundsComplete,
    #[serde(rename = "insufficient players")]
    InsufficientPlayers,
}

/// Terminal outcome, shared by every end cause. The room survives; only
/// the game resets.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEnd {
    pub reason: EndReason,
    pub winner_id: Option<Uuid>,
    pub scores: HashMap<Uuid, u32>,
}

/// Rejected start request. No state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    AlreadyActive,
    NotEnoughPlayers,
}

/// Rejected submission. No state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    NotActive,
    NotYourTurn,
    EmptyWord,
}

/// Where play stands after an accepted word.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnAdvance {
    /// The next player is on the clock.
    Next,
    /// That word completed the final round.
    GameOver(GameEnd),
}

/// Result of a submission that mutated the game.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted {
        word: String,
        gained: u32,
        total: u32,
        /// Word failed the script/length policy but was accepted anyway;
        /// callers surface this as a warning.
        format_warning: bool,
        advance: TurnAdvance,
    },
    /// The submission terminated the game without a word being accepted:
    /// the deadline had passed, or the word was a duplicate or broke the
    /// chain.
    Ended {
        end: GameEnd,
        /// The offending word also failed the format policy; the warning
        /// still precedes the termination broadcast.
        format_warning: bool,
    },
}

/// Fallout of removing a player mid-game.
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// No running game, or the player was not in it.
    NotPlaying,
    /// Game continues; `turn_changed` asks for a fresh turn broadcast so
    /// everyone agrees on the active turn-holder.
    Continues { turn_changed: bool },
    Ended(GameEnd),
}

/// Script/length policy: at least two characters, Hangul syllables only.
/// Failing it warns but never rejects.
pub fn is_plausible_word(word: &str) -> bool {
    word.chars().count() >= 2 && word.chars().all(|c| matches!(c, '가'..='힣'))
}

/// The turn-based word-chain sub-state of a room.
#[derive(Debug, Clone)]
pub struct WordChainGame {
    is_active: bool,
    turn_order: Vec<Uuid>,
    current_turn_index: usize,
    last_word: Option<String>,
    /// Accepted words in chronological order; uniqueness is an invariant.
    used_words: Vec<String>,
    scores: HashMap<Uuid, u32>,
    /// Turn order as captured at game start. Never shrinks, unlike
    /// `turn_order`; gives deterministic winner iteration and names the
    /// participants after disconnects.
    starting_order: Vec<Uuid>,
    round: u32,
    max_rounds: u32,
    turn_deadline: Option<DateTime<Utc>>,
}

impl Default for WordChainGame {
    fn default() -> Self {
        Self::new()
    }
}

impl WordChainGame {
    pub fn new() -> Self {
        Self {
            is_active: false,
            turn_order: Vec::new(),
            current_turn_index: 0,
            last_word: None,
            used_words: Vec::new(),
            scores: HashMap::new(),
            starting_order: Vec::new(),
            round: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            turn_deadline: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn turn_order(&self) -> &[Uuid] {
        &self.turn_order
    }

    pub fn starting_order(&self) -> &[Uuid] {
        &self.starting_order
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }

    /// Connection whose turn it is, while a game is running.
    pub fn current_turn_id(&self) -> Option<Uuid> {
        if self.is_active {
            self.turn_order.get(self.current_turn_index).copied()
        } else {
            None
        }
    }

    pub fn last_word(&self) -> Option<&str> {
        self.last_word.as_deref()
    }

    pub fn used_words(&self) -> &[String] {
        &self.used_words
    }

    pub fn scores(&self) -> &HashMap<Uuid, u32> {
        &self.scores
    }

    pub fn score(&self, conn_id: Uuid) -> u32 {
        self.scores.get(&conn_id).copied().unwrap_or(0)
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn turn_deadline(&self) -> Option<DateTime<Utc>> {
        self.turn_deadline
    }

    /// Start a game for `members`, in their room-join order. The ordering
    /// is deliberately not randomized so it is reproducible.
    pub fn start(&mut self, members: &[Uuid], now: DateTime<Utc>) -> Result<(), StartError> {
        if self.is_active {
            return Err(StartError::AlreadyActive);
        }
        if members.len() < 2 {
            return Err(StartError::NotEnoughPlayers);
        }

        self.is_active = true;
        self.turn_order = members.to_vec();
        self.starting_order = members.to_vec();
        self.current_turn_index = 0;
        self.last_word = None;
        self.used_words.clear();
        self.scores = members.iter().map(|&id| (id, 0)).collect();
        self.round = 1;
        self.arm_deadline(now);

        assert_game_invariants(self);
        Ok(())
    }

    /// Process a word submission from `conn_id`.
    ///
    /// The pipeline, in order: active check, lazy deadline check, turn
    /// check, blank check, format soft-check, duplicate check, chain
    /// check, then scoring and turn advance. Rejections (`Err`) never
    /// mutate state; `Ok` outcomes always leave the invariants intact.
    pub fn submit_word(
        &mut self,
        conn_id: Uuid,
        raw_word: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, SubmitError> {
        if !self.is_active {
            return Err(SubmitError::NotActive);
        }

        if let Some(deadline) = self.turn_deadline {
            if now > deadline {
                return Ok(SubmitOutcome::Ended {
                    end: self.end(EndReason::Timeout),
                    format_warning: false,
                });
            }
        }

        if self.current_turn_id() != Some(conn_id) {
            return Err(SubmitError::NotYourTurn);
        }

        let word = raw_word.trim();
        if word.is_empty() {
            return Err(SubmitError::EmptyWord);
        }

        let format_warning = !is_plausible_word(word);

        if self.used_words.iter().any(|w| w == word) {
            return Ok(SubmitOutcome::Ended {
                end: self.end(EndReason::DuplicateWord),
                format_warning,
            });
        }

        if let Some(last) = &self.last_word {
            if last.chars().last() != word.chars().next() {
                return Ok(SubmitOutcome::Ended {
                    end: self.end(EndReason::ChainViolation),
                    format_warning,
                });
            }
        }

        let gained = word.chars().count() as u32 * POINTS_PER_CHAR;
        self.last_word = Some(word.to_string());
        self.used_words.push(word.to_string());
        let entry = self.scores.entry(conn_id).or_insert(0);
        *entry += gained;
        let total = *entry;

        self.current_turn_index = (self.current_turn_index + 1) % self.turn_order.len();
        if self.current_turn_index == 0 {
            self.round += 1;
        }
        let advance = if self.round > self.max_rounds {
            TurnAdvance::GameOver(self.end(EndReason::RoundsComplete))
        } else {
            self.arm_deadline(now);
            TurnAdvance::Next
        };

        assert_game_invariants(self);
        Ok(SubmitOutcome::Accepted {
            word: word.to_string(),
            gained,
            total,
            format_warning,
            advance,
        })
    }

    /// Remove a player who left or disconnected mid-game.
    ///
    /// Below two remaining players the game force-ends; otherwise the
    /// turn index is clamped back into range (wrapping to the first seat
    /// without a round increment) and the caller is told whether a fresh
    /// turn broadcast is needed.
    pub fn remove_player(&mut self, conn_id: Uuid, now: DateTime<Utc>) -> RemovalOutcome {
        if !self.is_active {
            return RemovalOutcome::NotPlaying;
        }
        let Some(idx) = self.turn_order.iter().position(|&id| id == conn_id) else {
            return RemovalOutcome::NotPlaying;
        };
        self.turn_order.remove(idx);

        if self.turn_order.len() < 2 {
            return RemovalOutcome::Ended(self.end(EndReason::InsufficientPlayers));
        }

        let turn_changed = idx <= self.current_turn_index;
        if idx < self.current_turn_index {
            // Same player keeps the turn; only the index shifts down.
            self.current_turn_index -= 1;
        } else if idx == self.current_turn_index {
            // The turn passes to the next seat; re-arm the clock so the
            // inheritor is not timed out by a stale deadline.
            if self.current_turn_index >= self.turn_order.len() {
                self.current_turn_index = 0;
            }
            self.arm_deadline(now);
        }

        assert_game_invariants(self);
        RemovalOutcome::Continues { turn_changed }
    }

    fn arm_deadline(&mut self, now: DateTime<Utc>) {
        self.turn_deadline = Some(now + Duration::seconds(TURN_SECONDS));
    }

    fn end(&mut self, reason: EndReason) -> GameEnd {
        self.is_active = false;
        self.turn_deadline = None;
        GameEnd {
            reason,
            winner_id: self.winner(),
            scores: self.scores.clone(),
        }
    }

    /// Strictly-highest score wins; ties go to the earliest seat in the
    /// game-start order.
    fn winner(&self) -> Option<Uuid> {
        let mut best: Option<(Uuid, u32)> = None;
        for &id in &self.starting_order {
            let score = self.score(id);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((id, score)),
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn started(n: usize) -> (WordChainGame, Vec<Uuid>, DateTime<Utc>) {
        let players = ids(n);
        let now = Utc::now();
        let mut game = WordChainGame::new();
        game.start(&players, now).unwrap();
        (game, players, now)
    }

    fn accept(game: &mut WordChainGame, who: Uuid, word: &str, now: DateTime<Utc>) -> SubmitOutcome {
        game.submit_word(who, word, now).unwrap()
    }

    #[test]
    fn test_start_requires_two_players() {
        let players = ids(1);
        let mut game = WordChainGame::new();
        assert_eq!(
            game.start(&players, Utc::now()),
            Err(StartError::NotEnoughPlayers)
        );
        assert!(!game.is_active());
    }

    #[test]
    fn test_start_rejects_running_game() {
        let (mut game, players, now) = started(2);
        assert_eq!(game.start(&players, now), Err(StartError::AlreadyActive));
    }

    #[test]
    fn test_start_seeds_state() {
        let (game, players, now) = started(3);
        assert!(game.is_active());
        assert_eq!(game.turn_order(), players.as_slice());
        assert_eq!(game.current_turn_id(), Some(players[0]));
        assert_eq!(game.round(), 1);
        assert_eq!(game.max_rounds(), DEFAULT_MAX_ROUNDS);
        assert!(game.last_word().is_none());
        assert!(game.used_words().is_empty());
        assert!(players.iter().all(|&p| game.score(p) == 0));
        assert_eq!(
            game.turn_deadline(),
            Some(now + Duration::seconds(TURN_SECONDS))
        );
    }

    // Scenario: [A, B], A opens with a two-character word.
    #[test]
    fn test_first_word_scores_and_advances() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        match accept(&mut game, a, "사과", now) {
            SubmitOutcome::Accepted {
                gained,
                total,
                format_warning,
                advance,
                ..
            } => {
                assert_eq!(gained, 20);
                assert_eq!(total, 20);
                assert!(!format_warning);
                assert_eq!(advance, TurnAdvance::Next);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(game.score(a), 20);
        assert_eq!(game.last_word(), Some("사과"));
        assert_eq!(game.current_turn_id(), Some(b));
        assert_eq!(game.round(), 1);
    }

    // Scenario continued: B chains correctly and the turn wraps.
    #[test]
    fn test_wrap_increments_round() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        accept(&mut game, a, "사과", now);
        accept(&mut game, b, "과일", now);

        assert_eq!(game.score(b), 20);
        assert_eq!(game.current_turn_id(), Some(a));
        assert_eq!(game.round(), 2);
    }

    // Scenario continued: A repeats a used word and the game ends.
    #[test]
    fn test_duplicate_word_ends_game() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        accept(&mut game, a, "사과", now);
        accept(&mut game, b, "과일", now);
        match accept(&mut game, a, "과일", now) {
            SubmitOutcome::Ended { end, .. } => {
                assert_eq!(end.reason, EndReason::DuplicateWord);
                // 20 points each; the tie goes to the earlier seat.
                assert_eq!(end.winner_id, Some(a));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!game.is_active());
        assert_eq!(game.used_words().len(), 2);
    }

    #[test]
    fn test_chain_violation_ends_game() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        accept(&mut game, a, "사과", now);
        match accept(&mut game, b, "포도", now) {
            SubmitOutcome::Ended { end, .. } => {
                assert_eq!(end.reason, EndReason::ChainViolation);
                // A scored, B did not; A wins outright.
                assert_eq!(end.winner_id, Some(a));
                assert_eq!(end.scores[&a], 20);
                assert_eq!(end.scores[&b], 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!game.is_active());
    }

    #[test]
    fn test_expired_deadline_ends_game_and_drops_word() {
        let (mut game, players, now) = started(2);
        let a = players[0];

        let late = now + Duration::seconds(TURN_SECONDS + 1);
        match game.submit_word(a, "사과", late).unwrap() {
            SubmitOutcome::Ended { end, format_warning } => {
                assert_eq!(end.reason, EndReason::Timeout);
                assert!(!format_warning);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // The late word was never processed.
        assert!(game.used_words().is_empty());
        assert_eq!(game.score(a), 0);
    }

    #[test]
    fn test_deadline_is_checked_lazily() {
        let (mut game, _, now) = started(2);
        // Nothing happens until somebody submits, however late.
        let long_after = now + Duration::seconds(600);
        assert!(game.is_active());
        let _ = game.submit_word(game.current_turn_id().unwrap(), "사과", long_after);
        assert!(!game.is_active());
    }

    #[test]
    fn test_out_of_turn_submission_changes_nothing() {
        let (mut game, players, now) = started(2);
        let b = players[1];

        assert_eq!(
            game.submit_word(b, "사과", now),
            Err(SubmitError::NotYourTurn)
        );
        assert!(game.last_word().is_none());
        assert_eq!(game.score(b), 0);
        assert_eq!(game.current_turn_id(), Some(players[0]));
    }

    #[test]
    fn test_blank_word_rejected() {
        let (mut game, players, now) = started(2);
        assert_eq!(
            game.submit_word(players[0], "   ", now),
            Err(SubmitError::EmptyWord)
        );
        assert!(game.is_active());
    }

    #[test]
    fn test_inactive_game_rejects_submission() {
        let mut game = WordChainGame::new();
        assert_eq!(
            game.submit_word(Uuid::new_v4(), "사과", Utc::now()),
            Err(SubmitError::NotActive)
        );
    }

    #[test]
    fn test_format_check_warns_but_accepts() {
        let (mut game, players, now) = started(2);

        match accept(&mut game, players[0], "apple", now) {
            SubmitOutcome::Accepted {
                format_warning,
                gained,
                ..
            } => {
                assert!(format_warning);
                assert_eq!(gained, 50);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(game.last_word(), Some("apple"));
    }

    #[test]
    fn test_single_syllable_word_warns() {
        let (mut game, players, now) = started(2);
        match accept(&mut game, players[0], "김", now) {
            SubmitOutcome::Accepted { format_warning, .. } => assert!(format_warning),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_rounds_complete_is_normal_termination() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        let script = [
            (a, "사과"),
            (b, "과일"),
            (a, "일곱"),
            (b, "곱창"),
            (a, "창문"),
        ];
        for (who, word) in script {
            match accept(&mut game, who, word, now) {
                SubmitOutcome::Accepted {
                    advance: TurnAdvance::Next,
                    ..
                } => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        match accept(&mut game, b, "문어", now) {
            SubmitOutcome::Accepted {
                advance: TurnAdvance::GameOver(end),
                ..
            } => {
                assert_eq!(end.reason, EndReason::RoundsComplete);
                // Three words of two syllables each, on both sides.
                assert_eq!(end.scores[&a], 60);
                assert_eq!(end.scores[&b], 60);
                assert_eq!(end.winner_id, Some(a));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!game.is_active());
    }

    #[test]
    fn test_higher_score_beats_seat_order() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        accept(&mut game, a, "사과", now);
        accept(&mut game, b, "과일나무", now); // 40 points
        let SubmitOutcome::Ended { end, .. } = accept(&mut game, a, "사과", now) else {
            panic!("duplicate should end the game");
        };
        assert_eq!(end.winner_id, Some(b));
    }

    #[test]
    fn test_removal_after_current_keeps_turn() {
        let (mut game, players, now) = started(3);
        let (a, c) = (players[0], players[2]);

        assert_eq!(
            game.remove_player(c, now),
            RemovalOutcome::Continues { turn_changed: false }
        );
        assert_eq!(game.current_turn_id(), Some(a));
        assert_eq!(game.turn_order().len(), 2);
        // Departed players keep their score entry for the final tally.
        assert!(game.scores().contains_key(&c));
    }

    #[test]
    fn test_removal_of_current_holder_passes_turn() {
        let (mut game, players, now) = started(3);
        let (a, b) = (players[0], players[1]);

        assert_eq!(
            game.remove_player(a, now),
            RemovalOutcome::Continues { turn_changed: true }
        );
        assert_eq!(game.current_turn_id(), Some(b));
    }

    #[test]
    fn test_removal_before_current_shifts_index() {
        let (mut game, players, now) = started(3);
        let (a, b) = (players[0], players[1]);

        accept(&mut game, a, "사과", now); // turn moves to b
        assert_eq!(
            game.remove_player(a, now),
            RemovalOutcome::Continues { turn_changed: true }
        );
        // Still b's turn, at the shifted index.
        assert_eq!(game.current_turn_id(), Some(b));
        assert_eq!(game.current_turn_index(), 0);
    }

    #[test]
    fn test_removal_of_last_seat_wraps_without_round_bump() {
        let (mut game, players, now) = started(3);
        let (a, b, c) = (players[0], players[1], players[2]);

        accept(&mut game, a, "사과", now);
        accept(&mut game, b, "과일", now);
        assert_eq!(game.current_turn_id(), Some(c));

        assert_eq!(
            game.remove_player(c, now),
            RemovalOutcome::Continues { turn_changed: true }
        );
        assert_eq!(game.current_turn_id(), Some(a));
        assert_eq!(game.round(), 1);
    }

    #[test]
    fn test_removal_below_two_players_force_ends() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        accept(&mut game, a, "사과", now);
        match game.remove_player(b, now) {
            RemovalOutcome::Ended(end) => {
                assert_eq!(end.reason, EndReason::InsufficientPlayers);
                assert_eq!(end.winner_id, Some(a));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!game.is_active());
    }

    #[test]
    fn test_removal_when_idle_is_ignored() {
        let mut game = WordChainGame::new();
        assert_eq!(
            game.remove_player(Uuid::new_v4(), Utc::now()),
            RemovalOutcome::NotPlaying
        );
    }

    #[test]
    fn test_new_game_after_end_resets_state() {
        let (mut game, players, now) = started(2);
        let (a, b) = (players[0], players[1]);

        accept(&mut game, a, "사과", now);
        let _ = accept(&mut game, b, "포도", now); // chain violation, game over

        game.start(&players, now).unwrap();
        assert!(game.is_active());
        assert!(game.used_words().is_empty());
        assert!(game.last_word().is_none());
        assert_eq!(game.score(a), 0);
        assert_eq!(game.round(), 1);
    }

    #[test]
    fn test_plausible_word_policy() {
        assert!(is_plausible_word("사과"));
        assert!(is_plausible_word("과일나무"));
        assert!(!is_plausible_word("김")); // too short
        assert!(!is_plausible_word("apple")); // wrong script
        assert!(!is_plausible_word("사과2")); // mixed script
    }
}
