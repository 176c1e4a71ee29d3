use super::dto::{DailyStats, MacroSlice, MacroSplit};
use crate::entries::dto::{ExerciseEntry, FoodEntry};

pub fn compute<'a>(
    food: impl IntoIterator<Item = &'a FoodEntry>,
    exercise: impl IntoIterator<Item = &'a ExerciseEntry>,
) -> DailyStats {
    let mut stats = food
        .into_iter()
        .fold(DailyStats::default(), |mut acc, e| {
            acc.calories_consumed += e.calories;
            acc.protein_g += e.protein_g;
            acc.carbs_g += e.carbs_g;
            acc.fat_g += e.fat_g;
            acc
        });
    stats.calories_burned = exercise.into_iter().map(|e| e.calories_burned).sum();
    stats
}

/// Calories left for the day. Goes negative once the budget is exceeded.
pub fn remaining_calories(calorie_target: i64, stats: &DailyStats) -> f64 {
    calorie_target as f64 - stats.calories_consumed + stats.calories_burned
}

/// Consumed share of the day's budget, capped at 1.0.
pub fn progress(calorie_target: i64, stats: &DailyStats) -> f64 {
    let budget = calorie_target as f64 + stats.calories_burned;
    if budget == 0.0 {
        return 0.0;
    }
    (stats.calories_consumed / budget).min(1.0)
}

pub fn macro_split(stats: &DailyStats) -> MacroSplit {
    let has_macro_data = stats.protein_g > 0.0 || stats.carbs_g > 0.0 || stats.fat_g > 0.0;
    let slices = if has_macro_data {
        vec![
            MacroSlice {
                name: "Protein",
                grams: stats.protein_g,
            },
            MacroSlice {
                name: "Carbs",
                grams: stats.carbs_g,
            },
            MacroSlice {
                name: "Fat",
                grams: stats.fat_g,
            },
        ]
    } else {
        vec![MacroSlice {
            name: "Empty",
            grams: 1.0,
        }]
    };
    MacroSplit {
        has_macro_data,
        slices,
    }
}
