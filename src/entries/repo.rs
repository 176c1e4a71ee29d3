use std::cmp::Reverse;
use std::collections::HashMap;

use bytes::Bytes;
use uuid::Uuid;

use super::dto::{ExerciseEntry, FoodEntry, LogEntry};

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub body: Bytes,
    pub content_type: String,
}

/// Append-only, in-memory log for the current session. Entries keep their
/// insertion order; nothing is ever updated or removed.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<LogEntry>,
    images: HashMap<Uuid, StoredImage>,
}

impl EntryStore {
    pub fn add_food(&mut self, entry: FoodEntry) {
        self.entries.push(LogEntry::Food(entry));
    }

    pub fn add_food_with_image(&mut self, entry: FoodEntry, image: StoredImage) {
        self.images.insert(entry.id, image);
        self.add_food(entry);
    }

    pub fn add_exercise(&mut self, entry: ExerciseEntry) {
        self.entries.push(LogEntry::Exercise(entry));
    }

    pub fn food(&self) -> impl Iterator<Item = &FoodEntry> + '_ {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Food(f) => Some(f),
            LogEntry::Exercise(_) => None,
        })
    }

    pub fn exercise(&self) -> impl Iterator<Item = &ExerciseEntry> + '_ {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Exercise(x) => Some(x),
            LogEntry::Food(_) => None,
        })
    }

    /// Newest first. The sort is stable, so entries sharing a millisecond
    /// stay in insertion order.
    pub fn list_combined_sorted(&self) -> Vec<LogEntry> {
        let mut out = self.entries.clone();
        out.sort_by_key(|e| Reverse(e.timestamp()));
        out
    }

    pub fn image(&self, food_id: Uuid) -> Option<&StoredImage> {
        self.images.get(&food_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;

    fn food(ts: i64, name: &str) -> FoodEntry {
        FoodEntry {
            id: Uuid::new_v4(),
            timestamp: ts,
            name: name.into(),
            calories: 100.0,
            protein_g: 1.0,
            carbs_g: 2.0,
            fat_g: 3.0,
            image_ref: None,
        }
    }

    fn exercise(ts: i64, activity: &str) -> ExerciseEntry {
        ExerciseEntry {
            id: Uuid::new_v4(),
            timestamp: ts,
            activity: activity.into(),
            duration_minutes: 30.0,
            calories_burned: 250.0,
        }
    }

    fn labels(entries: &[LogEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| match e {
                LogEntry::Food(f) => f.name.clone(),
                LogEntry::Exercise(x) => x.activity.clone(),
            })
            .collect()
    }

    #[test]
    fn combined_list_is_newest_first() {
        let mut store = EntryStore::default();
        store.add_food(food(10, "oats"));
        store.add_exercise(exercise(30, "run"));
        store.add_food(food(20, "salad"));

        let sorted = store.list_combined_sorted();
        assert_eq!(labels(&sorted), ["run", "salad", "oats"]);
        assert!(sorted.windows(2).all(|w| w[0].timestamp() >= w[1].timestamp()));
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let mut store = EntryStore::default();
        store.add_food(food(5, "first"));
        store.add_exercise(exercise(5, "second"));
        store.add_food(food(5, "third"));
        store.add_food(food(1, "old"));

        assert_eq!(
            labels(&store.list_combined_sorted()),
            ["first", "second", "third", "old"]
        );
    }

    #[test]
    fn split_views_and_images() {
        let mut store = EntryStore::default();
        let with_photo = food(1, "toast");
        let id = with_photo.id;
        store.add_food_with_image(
            with_photo,
            StoredImage {
                body: Bytes::from_static(b"\xff\xd8"),
                content_type: "image/jpeg".into(),
            },
        );
        store.add_exercise(exercise(2, "swim"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.food().count(), 1);
        assert_eq!(store.exercise().count(), 1);
        assert_eq!(store.image(id).map(|i| i.content_type.as_str()), Some("image/jpeg"));
        assert!(store.image(Uuid::new_v4()).is_none());
    }
}
