/// The highest longest-streak across a set of habits, with every habit
/// that reaches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakLeaders {
    pub longest_streak: u32,
    pub habit_ids: Vec<i64>,
}

/// Reduce `(habit_id, longest_streak)` pairs to the leaders. Ties keep
/// input order. When every habit sits at 0 they are all returned.
pub fn streak_leaders<I>(streaks: I) -> StreakLeaders
where
    I: IntoIterator<Item = (i64, u32)>,
{
    let mut leaders = StreakLeaders::default();

    for (habit_id, streak) in streaks {
        if streak > leaders.longest_streak {
            leaders.longest_streak = streak;
            leaders.habit_ids.clear();
            leaders.habit_ids.push(habit_id);
        } else if streak == leaders.longest_streak {
            leaders.habit_ids.push(habit_id);
        }
    }

    leaders
}
