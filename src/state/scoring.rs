//! Point scoring applied when a play session ends.

use crate::state::challenge::HintKind;

/// Bonus awarded when the game is won within `within_secs` seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBonus {
    /// Inclusive upper bound on the elapsed time.
    pub within_secs: u64,
    /// Points awarded for this tier.
    pub bonus: u32,
}

/// Tunable constants of a game: tries allowance and the scoring formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    /// Guesses a player may submit before losing.
    pub max_tries: u32,
    /// Flat bonus for winning.
    pub win_bonus: u32,
    /// Bonus per try left unused, counting the winning guess as used.
    pub per_try_bonus: u32,
    /// Hint count the hints bonus is measured against.
    pub hint_baseline: u32,
    /// Bonus per hint below the baseline.
    pub per_hint_bonus: u32,
    /// Revealed line count the lines bonus is measured against.
    pub line_baseline: u32,
    /// Bonus per line below the baseline, never negative overall.
    pub per_line_bonus: u32,
    /// Time tiers sorted by ascending `within_secs`; the first matching tier wins.
    pub time_bonuses: Vec<TimeBonus>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_tries: 3,
            win_bonus: 1000,
            per_try_bonus: 200,
            hint_baseline: HintKind::ALL.len() as u32,
            per_hint_bonus: 100,
            line_baseline: 5,
            per_line_bonus: 50,
            time_bonuses: vec![
                TimeBonus {
                    within_secs: 30,
                    bonus: 300,
                },
                TimeBonus {
                    within_secs: 60,
                    bonus: 200,
                },
                TimeBonus {
                    within_secs: 120,
                    bonus: 100,
                },
            ],
        }
    }
}

impl GameRules {
    /// Bonus for finishing after `elapsed_secs` seconds.
    pub fn time_bonus(&self, elapsed_secs: u64) -> u32 {
        self.time_bonuses
            .iter()
            .find(|tier| elapsed_secs <= tier.within_secs)
            .map(|tier| tier.bonus)
            .unwrap_or(0)
    }
}

/// Statistics of a finished session that feed the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInput {
    /// Whether the session ended in a win.
    pub won: bool,
    /// Guesses submitted, the winning one included.
    pub tries_used: u32,
    /// Distinct hints revealed.
    pub hints_used: u32,
    /// Lyric lines visible at the end.
    pub lines_revealed: u32,
    /// Whole seconds since the session started.
    pub time_elapsed_secs: u64,
}

/// Compute the final score of a finished session. A loss always scores zero.
pub fn compute_score(rules: &GameRules, input: &ScoreInput) -> u32 {
    if !input.won {
        return 0;
    }

    let mut total = i64::from(rules.win_bonus);
    total += (i64::from(rules.max_tries) - i64::from(input.tries_used))
        * i64::from(rules.per_try_bonus);
    total += (i64::from(rules.hint_baseline) - i64::from(input.hints_used))
        * i64::from(rules.per_hint_bonus);
    total += ((i64::from(rules.line_baseline) - i64::from(input.lines_revealed))
        * i64::from(rules.per_line_bonus))
    .max(0);
    total += i64::from(rules.time_bonus(input.time_elapsed_secs));

    u32::try_from(total.max(0)).unwrap_or(u32::MAX)
}
