use chrono::NaiveDate;
use inventar_core::{
    Item, ItemFilter, ItemRepository, JsonItemRepository, RepoError, DEFAULT_OBJECT_TYPES,
};
use std::path::PathBuf;

fn store_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("inventar_fallback.json")
}

fn sample_item() -> Item {
    let mut item = Item::new("Laptop");
    item.manufacturer = "Dell".to_string();
    item.serial_number = "SN-2002".to_string();
    item.purchase_date = NaiveDate::from_ymd_opt(2023, 11, 30);
    item.custom_values
        .insert("Dockingstation".to_string(), "WD19".to_string());
    item
}

#[test]
fn fresh_store_is_created_and_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let repo = JsonItemRepository::open(&path).unwrap();
    assert!(path.exists());

    let types = repo.list_object_types().unwrap();
    for default in DEFAULT_OBJECT_TYPES {
        assert!(types.iter().any(|name| name == default), "{default}");
    }
}

#[test]
fn create_and_get_roundtrip_including_custom_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonItemRepository::open(store_path(&dir)).unwrap();

    let item = sample_item();
    let id = repo.create_item(&item).unwrap();

    let loaded = repo.get_item(id).unwrap().unwrap();
    assert_eq!(loaded.item, item);
}

#[test]
fn update_replaces_the_whole_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonItemRepository::open(store_path(&dir)).unwrap();
    let id = repo.create_item(&sample_item()).unwrap();

    let mut replacement = Item::new("Monitor");
    replacement
        .custom_values
        .insert("Zoll".to_string(), "24".to_string());
    repo.update_item(id, &replacement).unwrap();

    let loaded = repo.get_item(id).unwrap().unwrap();
    assert_eq!(loaded.item, replacement);
    assert!(!loaded.item.custom_values.contains_key("Dockingstation"));
}

#[test]
fn update_unknown_id_returns_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonItemRepository::open(store_path(&dir)).unwrap();
    let err = repo.update_item(7, &sample_item()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(7)));
}

#[test]
fn delete_is_permanent_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonItemRepository::open(store_path(&dir)).unwrap();
    let id = repo.create_item(&sample_item()).unwrap();

    repo.delete_item(id).unwrap();
    assert!(repo.get_item(id).unwrap().is_none());
    repo.delete_item(id).unwrap();
}

#[test]
fn ids_are_never_reused_even_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let first = {
        let mut repo = JsonItemRepository::open(&path).unwrap();
        let first = repo.create_item(&Item::new("Laptop")).unwrap();
        repo.delete_item(first).unwrap();
        first
    };

    let mut repo = JsonItemRepository::open(&path).unwrap();
    let second = repo.create_item(&Item::new("Monitor")).unwrap();
    assert!(second > first);
}

#[test]
fn mutations_survive_reopening_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let item = sample_item();
    let id = {
        let mut repo = JsonItemRepository::open(&path).unwrap();
        repo.create_item(&item).unwrap()
    };

    let repo = JsonItemRepository::open(&path).unwrap();
    let loaded = repo.get_item(id).unwrap().unwrap();
    assert_eq!(loaded.item, item);
}

#[test]
fn corrupt_document_surfaces_a_storage_fault() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    std::fs::write(&path, "{ not json").unwrap();

    let err = JsonItemRepository::open(&path).unwrap_err();
    assert!(err.is_storage_fault());
    assert!(matches!(err, RepoError::Document(_)));
}

#[test]
fn failed_commit_leaves_previous_state_intact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store").join("inventar_fallback.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut repo = JsonItemRepository::open(&path).unwrap();
    let id = repo.create_item(&sample_item()).unwrap();

    // Medium gone: the directory holding the document disappears.
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();

    let err = repo.create_item(&Item::new("Monitor")).unwrap_err();
    assert!(matches!(err, RepoError::Io(_)));

    // The in-memory state still answers from the last committed document.
    assert!(repo.get_item(id).unwrap().is_some());
    assert_eq!(repo.list_items(&ItemFilter::default()).unwrap().len(), 1);
}

#[test]
fn list_filter_semantics_match_the_shared_contract() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonItemRepository::open(store_path(&dir)).unwrap();

    let mut laptop = sample_item();
    laptop.current_owner = Some("Huber".to_string());
    repo.create_item(&laptop).unwrap();
    repo.create_item(&Item::new("Monitor")).unwrap();

    let filter = ItemFilter {
        manufacturer: Some("del".to_string()),
        ..ItemFilter::default()
    };
    let records = repo.list_items(&filter).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].item.manufacturer, "Dell");
}

#[test]
fn distinct_value_getters_skip_blank_fields() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonItemRepository::open(store_path(&dir)).unwrap();

    repo.create_item(&sample_item()).unwrap();
    repo.create_item(&Item::new("Monitor")).unwrap();

    assert_eq!(
        repo.distinct_manufacturers().unwrap(),
        vec!["Dell".to_string()]
    );
    assert!(repo.distinct_models().unwrap().is_empty());
    assert_eq!(
        repo.distinct_serial_numbers().unwrap(),
        vec!["SN-2002".to_string()]
    );
}

#[test]
fn object_type_registration_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonItemRepository::open(store_path(&dir)).unwrap();

    repo.register_object_type("Beamer").unwrap();
    repo.register_object_type("beamer").unwrap();

    let matches: Vec<_> = repo
        .list_object_types()
        .unwrap()
        .into_iter()
        .filter(|name| name.eq_ignore_ascii_case("beamer"))
        .collect();
    assert_eq!(matches, vec!["Beamer".to_string()]);
}
