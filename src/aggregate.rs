use crate::models::{Check, ChecklistRow, Habit, HabitDayState, HeatCell};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Highest count with its own heat level; anything above shares the overflow level.
pub const MAX_GRADED_COUNT: u32 = 5;

/// Done checks per day across all habits. Every day of `window` is present.
pub fn daily_counts(checks: &[Check], window: &[NaiveDate]) -> BTreeMap<NaiveDate, u32> {
    let mut by_day: HashMap<NaiveDate, u32> = HashMap::new();
    for check in checks.iter().filter(|check| check.done) {
        let count = by_day.entry(check.day).or_default();
        *count = count.saturating_add(1);
    }
    window
        .iter()
        .map(|day| (*day, by_day.get(day).copied().unwrap_or(0)))
        .collect()
}

/// Heat level for a day's count: 0 is empty, 1..=5 grade up, above 5 clamps to 6.
pub fn heat_level(count: u32) -> u8 {
    // MAX_GRADED_COUNT + 1 fits in u8
    count.min(MAX_GRADED_COUNT + 1) as u8
}

/// `true` exactly where a done check exists for the habit on that day.
///
/// Built from the done-only bulk read, so an explicit un-check and a day that
/// was never touched both come out `false`.
pub fn per_habit_day_state(
    habits: &[Habit],
    checks: &[Check],
    window: &[NaiveDate],
) -> HabitDayState {
    let done: HashSet<(&str, NaiveDate)> = checks
        .iter()
        .filter(|check| check.done)
        .map(|check| (check.habit_id.as_str(), check.day))
        .collect();

    habits
        .iter()
        .map(|habit| {
            let days = window
                .iter()
                .map(|day| (*day, done.contains(&(habit.id.as_str(), *day))))
                .collect();
            (habit.id.clone(), days)
        })
        .collect()
}

/// One row per habit, cells in `window` order.
pub fn checklist_rows(
    habits: &[Habit],
    state: &HabitDayState,
    window: &[NaiveDate],
) -> Vec<ChecklistRow> {
    habits
        .iter()
        .map(|habit| {
            let days = state.get(&habit.id);
            let cells = window
                .iter()
                .map(|day| {
                    days.and_then(|days| days.get(day))
                        .copied()
                        .unwrap_or(false)
                })
                .collect();
            ChecklistRow {
                habit: habit.clone(),
                cells,
            }
        })
        .collect()
}

/// Fills a week grid from [`crate::calendar::last_n_days_as_weeks`] with counts.
pub fn heatmap(checks: &[Check], weeks: &[Vec<NaiveDate>]) -> Vec<Vec<HeatCell>> {
    let window: Vec<NaiveDate> = weeks.concat();
    let counts = daily_counts(checks, &window);
    weeks
        .iter()
        .map(|week| {
            week.iter()
                .map(|date| {
                    let count = counts.get(date).copied().unwrap_or(0);
                    HeatCell {
                        date: *date,
                        count,
                        level: heat_level(count),
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{HEATMAP_DAYS, HEATMAP_WEEKS, last_n_days_as_weeks_from};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn check(habit: &str, d: u32, done: bool) -> Check {
        Check {
            habit_id: habit.to_string(),
            day: day(d),
            done,
        }
    }

    fn habit(id: &str) -> Habit {
        Habit {
            id: id.to_string(),
            name: format!("habit {id}"),
            owner_id: "u1".to_string(),
        }
    }

    #[test]
    fn daily_counts_only_count_done_checks() {
        let checks = vec![check("h1", 1, true), check("h2", 1, true), check("h1", 2, false)];
        let counts = daily_counts(&checks, &[day(1), day(2)]);
        assert_eq!(counts, BTreeMap::from([(day(1), 2), (day(2), 0)]));
    }

    #[test]
    fn daily_counts_ignore_days_outside_the_window() {
        let checks = vec![check("h1", 5, true), check("h1", 1, true)];
        let counts = daily_counts(&checks, &[day(1)]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&day(1)], 1);
    }

    #[test]
    fn heat_levels_clamp_above_five() {
        let levels: Vec<u8> = [0, 1, 2, 3, 4, 5, 6, 100]
            .into_iter()
            .map(heat_level)
            .collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 4, 5, 6, 6]);
        let distinct: HashSet<u8> = levels.into_iter().collect();
        assert_eq!(distinct.len(), 7);
        assert_eq!(heat_level(u32::MAX), 6);
    }

    #[test]
    fn day_state_defaults_to_false() {
        let habits = vec![habit("h1"), habit("h2")];
        let checks = vec![check("h1", 1, true), check("h2", 2, false), check("h3", 1, true)];
        let state = per_habit_day_state(&habits, &checks, &[day(1), day(2)]);

        assert_eq!(state.len(), 2);
        assert!(state["h1"][&day(1)]);
        assert!(!state["h1"][&day(2)]);
        assert!(!state["h2"][&day(1)]);
        assert!(!state["h2"][&day(2)]);
    }

    #[test]
    fn checklist_rows_follow_window_order() {
        let habits = vec![habit("h1")];
        let window = [day(1), day(2), day(3)];
        let state = per_habit_day_state(&habits, &[check("h1", 3, true)], &window);
        let rows = checklist_rows(&habits, &state, &window);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec![false, false, true]);
    }

    #[test]
    fn heatmap_grid_matches_weeks() {
        let today = day(31);
        let weeks = last_n_days_as_weeks_from(today, HEATMAP_DAYS, HEATMAP_WEEKS);
        let checks: Vec<Check> = (0..7).map(|i| check(&format!("h{i}"), 31, true)).collect();
        let grid = heatmap(&checks, &weeks);

        assert_eq!(grid.len(), 52);
        let last = grid.last().and_then(|week| week.last()).unwrap();
        assert_eq!(last.date, today);
        assert_eq!(last.count, 7);
        assert_eq!(last.level, 6);
        assert_eq!(grid[0][0].count, 0);
    }
}
