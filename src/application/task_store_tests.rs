#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::super::persistence::{Persistence, STORAGE_KEY};
    use super::super::task_store::TaskStore;
    use crate::domain::{
        category::{CategoryId, NewCategory},
        clock::ManualClock,
        storage::KeyValueStorage,
        store::Store,
        theme::Theme,
        todo::{NewTodo, TodoId, TodoPatch},
    };
    use crate::infrastructure::memory_storage::MemoryStorage;

    type TestStore = TaskStore<Arc<MemoryStorage>, Arc<ManualClock>>;

    fn open(storage: MemoryStorage) -> (Arc<MemoryStorage>, Arc<ManualClock>, TestStore, Arc<AtomicUsize>) {
        let storage = Arc::new(storage);
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
        let mut store = TaskStore::open(Persistence::with_clock(storage.clone(), clock.clone()));
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();
        store.subscribe(move |_| { counter.fetch_add(1, Ordering::SeqCst); });
        (storage, clock, store, renders)
    }

    fn persisted(storage: &MemoryStorage) -> Store {
        Store::decode(&storage.get_item(STORAGE_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn mutations_update_mirror_storage_and_listeners() {
        let (storage, _, mut store, renders) = open(MemoryStorage::new());
        assert_eq!(store.todos().len(), 3);
        assert_eq!(renders.load(Ordering::SeqCst), 0);

        let todo = store.add_todo(NewTodo::titled("Write report")).unwrap();
        assert_eq!(store.todos().last(), Some(&todo));
        assert_eq!(&persisted(&storage), store.snapshot());
        assert_eq!(renders.load(Ordering::SeqCst), 1);

        let category = store.add_category(NewCategory { name: "Reports".into(), color: "#123456".into() }).unwrap();
        let patch = TodoPatch { category_id: Some(Some(category.id.clone())), ..TodoPatch::default() };
        store.update_todo(&todo.id, patch).unwrap().unwrap();
        assert!(store.remove_category(&category.id).unwrap());

        assert!(store.snapshot().find_todo(&todo.id).unwrap().category_id.is_none());
        assert_eq!(&persisted(&storage), store.snapshot());
        assert_eq!(renders.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn not_found_outcomes_do_not_rerender() {
        let (_, _, mut store, renders) = open(MemoryStorage::new());
        let missing = TodoId::from("missing");
        assert!(store.update_todo(&missing, TodoPatch::completed(true)).unwrap().is_none());
        assert!(store.toggle_todo_completion(&missing).unwrap().is_none());
        assert!(!store.remove_todo(&missing).unwrap());
        assert!(!store.remove_category(&CategoryId::from("missing")).unwrap());
        assert_eq!(renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn quota_failure_does_not_advance_mirror() {
        let (storage, _, mut store, renders) = open(MemoryStorage::with_quota(4_000));
        let before = store.snapshot().clone();

        let big = NewTodo { description: "x".repeat(5_000), ..NewTodo::titled("huge") };
        let err = store.add_todo(big).unwrap_err();

        assert_eq!(err.code(), "QUOTA_EXCEEDED");
        assert_eq!(store.snapshot(), &before);
        assert_eq!(storage.get_item(STORAGE_KEY).unwrap(), None);
        assert_eq!(renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn toggle_twice_through_adapter() {
        let (_, clock, mut store, _) = open(MemoryStorage::new());
        let id = TodoId::from("todo-1");
        let original = store.snapshot().find_todo(&id).cloned().unwrap();
        clock.advance(Duration::milliseconds(10));
        store.toggle_todo_completion(&id).unwrap();
        clock.advance(Duration::milliseconds(10));
        let back = store.toggle_todo_completion(&id).unwrap().unwrap();
        assert_eq!(back.completed, original.completed);
        assert!(back.updated_at > original.updated_at);
        assert_eq!(store.snapshot().find_todo(&id), Some(&back));
    }

    #[test]
    fn clear_all_data_resets_mirror_to_seed() {
        let (storage, _, mut store, renders) = open(MemoryStorage::new());
        assert!(store.remove_todo(&TodoId::from("todo-1")).unwrap());
        assert_eq!(store.todos().len(), 2);

        store.clear_all_data().unwrap();
        assert_eq!(store.todos().len(), 3);
        assert_eq!(store.categories().len(), 5);
        assert_eq!(storage.get_item(STORAGE_KEY).unwrap(), None);
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn import_rejects_garbage_and_accepts_export() {
        let (_, _, mut store, renders) = open(MemoryStorage::new());
        let exported = store.export().unwrap();
        store.remove_todo(&TodoId::from("todo-2")).unwrap();
        let trimmed = store.snapshot().clone();

        assert!(store.import("[]").is_err());
        assert_eq!(store.snapshot(), &trimmed);

        store.import(&exported).unwrap();
        assert_eq!(store.todos().len(), 3);
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn theme_round_trip() {
        let (_, _, store, _) = open(MemoryStorage::new());
        assert_eq!(store.theme(), Theme::System);
        store.set_theme(Theme::Light).unwrap();
        assert_eq!(store.theme(), Theme::Light);
    }
}
