use display_editor_core::db::open_db_in_memory;
use display_editor_core::{
    ConfigDocument, ConfigDocumentStore, DocumentId, DotPath, RegistryConfig, RegistryError,
    RegistryService, RequestFields, SqliteConfigStore, StoreResult, ValidationError,
};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::cell::Cell;

/// Counts write calls before delegating to the SQLite store.
struct CountingStore<'conn> {
    inner: SqliteConfigStore<'conn>,
    writes: Cell<usize>,
}

impl<'conn> CountingStore<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteConfigStore::try_new(conn).unwrap(),
            writes: Cell::new(0),
        }
    }

    fn bump(&self) {
        self.writes.set(self.writes.get() + 1);
    }
}

impl ConfigDocumentStore for CountingStore<'_> {
    fn current_document_id(&self) -> StoreResult<DocumentId> {
        self.inner.current_document_id()
    }

    fn load_document(&self, id: DocumentId) -> StoreResult<ConfigDocument> {
        self.inner.load_document(id)
    }

    fn set_field(&self, id: DocumentId, path: &DotPath, value: &Value) -> StoreResult<()> {
        self.bump();
        self.inner.set_field(id, path, value)
    }

    fn unset_field(&self, id: DocumentId, path: &DotPath) -> StoreResult<()> {
        self.bump();
        self.inner.unset_field(id, path)
    }

    fn move_field(&self, id: DocumentId, from: &DotPath, to: &DotPath) -> StoreResult<bool> {
        self.bump();
        self.inner.move_field(id, from, to)
    }
}

fn fields(value: Value) -> RequestFields {
    value.as_object().cloned().unwrap()
}

fn document_root(store: &CountingStore<'_>) -> Value {
    let id = store.current_document_id().unwrap();
    store.load_document(id).unwrap().root
}

#[test]
fn update_without_queries_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    let err = service
        .update_entry(&fields(json!({"name": "topbar", "prev_name": "topbar"})))
        .unwrap_err();

    match err {
        RegistryError::Validation(ValidationError::MissingFields(missing)) => {
            assert_eq!(missing.names(), vec!["queries"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.writes.get(), 0);
}

#[test]
fn update_reports_every_missing_field() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    let err = service.update_entry(&fields(json!({}))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing fields: name, prev_name, queries"
    );
    assert_eq!(store.writes.get(), 0);
}

#[test]
fn create_twice_keeps_one_empty_entry() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();
    service.install().unwrap();

    service.create_entry("foo").unwrap();
    service
        .update_entry(&fields(json!({
            "name": "foo",
            "prev_name": "foo",
            "queries": {"limit": 1},
        })))
        .unwrap();
    service.create_entry("foo").unwrap();

    let listing = service.list_entries("foo").unwrap();
    assert_eq!(listing.names, vec!["foo"]);
    assert_eq!(
        document_root(&store)["Modules"]["display_editor"]["Display-points"],
        json!({"foo": {}})
    );
}

#[test]
fn create_without_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    let err = service.create_entry("").unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Validation(ValidationError::MissingName)
    ));
    assert!(err.to_string().contains("no name specified"));

    let err = service.create_entry("a.b").unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Validation(ValidationError::InvalidName { .. })
    ));
    assert_eq!(store.writes.get(), 0);
}

#[test]
fn unusual_names_round_trip_exactly_through_create_list_and_fetch() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();
    let names = ["héllo wörld", "✓ done", "  ", "a/b?c=d", "Ünïcode-名前", "100%"];

    for name in names {
        service.create_entry(name).unwrap();
        let fetched = service.fetch_entry(name).unwrap();
        assert_eq!(fetched.name, name);
        assert_eq!(fetched.spec, json!({}));
    }

    let mut expected = names.map(str::to_string).to_vec();
    expected.sort();
    assert_eq!(service.list_entries("").unwrap().names, expected);
    let stored = document_root(&store)["Modules"]["display_editor"]["Display-points"].clone();
    for name in names {
        assert!(stored.get(name).is_some(), "{name:?} not stored verbatim");
    }
}

#[test]
fn names_with_backslash_or_control_characters_are_rejected_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    for name in ["a\\b", "x\\", "tab\there", "bell\u{7}"] {
        let err = service.create_entry(name).unwrap_err();
        assert!(
            matches!(err, RegistryError::Validation(ValidationError::InvalidName { .. })),
            "{name:?} gave {err}"
        );
        let err = service
            .update_entry(&fields(json!({"name": name, "prev_name": name, "queries": {}})))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::InvalidName { .. })
        ));
        assert!(matches!(
            service.fetch_entry(name),
            Err(RegistryError::NotFound(ref missing)) if missing == name
        ));
    }

    assert_eq!(store.writes.get(), 0);
    assert!(!service.list_entries("").unwrap().has_entries);
}

#[test]
fn fetch_of_unstorable_name_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    for name in ["", "a.b", "q\"x"] {
        let err = service.fetch_entry(name).unwrap_err();
        assert_eq!(err.to_string(), format!("can't find point named {name}"));
    }
}

#[test]
fn list_is_case_sensitive_substring_and_sorted() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();
    for name in ["alpha2", "Beta", "Alpha"] {
        service.create_entry(name).unwrap();
    }

    let filtered = service.list_entries("alpha").unwrap();
    assert!(filtered.has_entries);
    assert_eq!(filtered.names, vec!["alpha2"]);
    assert_eq!(filtered.search, "alpha");

    let all = service.list_entries("").unwrap();
    assert_eq!(all.names, vec!["Alpha", "Beta", "alpha2"]);

    let none = service.list_entries("gamma").unwrap();
    assert!(none.has_entries);
    assert!(none.names.is_empty());
}

#[test]
fn list_on_fresh_document_reports_no_entries() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    let listing = service.list_entries("").unwrap();
    assert!(!listing.has_entries);
    assert!(listing.names.is_empty());
}

#[test]
fn fetch_missing_entry_names_it() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    let err = service.fetch_entry("missing").unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(ref name) if name == "missing"));
    assert_eq!(err.to_string(), "can't find point named missing");

    service.create_entry("present").unwrap();
    assert!(matches!(
        service.fetch_entry("missing"),
        Err(RegistryError::NotFound(_))
    ));
}

#[test]
fn fetch_fresh_entry_returns_empty_spec() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();
    service.create_entry("sidebar").unwrap();

    let fetched = service.fetch_entry("sidebar").unwrap();
    assert_eq!(fetched.name, "sidebar");
    assert_eq!(fetched.spec, json!({}));
    assert_eq!(fetched.query_text, "{}");
}

#[test]
fn uninstall_removes_registry_until_next_create() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    service.install().unwrap();
    service.create_entry("x").unwrap();
    service.uninstall().unwrap();
    service.install().unwrap();

    let listing = service.list_entries("").unwrap();
    assert!(!listing.has_entries);
    assert_eq!(
        document_root(&store),
        json!({"Modules": {"display_editor": {}}})
    );

    service.create_entry("y").unwrap();
    assert_eq!(service.list_entries("").unwrap().names, vec!["y"]);
}

#[test]
fn uninstall_leaves_other_modules_alone() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();
    let id = store.current_document_id().unwrap();
    store
        .set_field(id, &DotPath::parse("Modules.blog").unwrap(), &json!({"on": true}))
        .unwrap();

    service.install().unwrap();
    service.create_entry("x").unwrap();
    service.uninstall().unwrap();

    assert_eq!(
        document_root(&store),
        json!({"Modules": {"blog": {"on": true}}})
    );
}

#[test]
fn update_with_new_name_leaves_previous_entry_behind() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();
    service.create_entry("old").unwrap();

    service
        .update_entry(&fields(json!({
            "name": "new",
            "prev_name": "old",
            "queries": {"sort": "-created"},
        })))
        .unwrap();

    assert_eq!(service.list_entries("").unwrap().names, vec!["new", "old"]);
    assert_eq!(
        document_root(&store)["Modules"]["display_editor"]["Display-points"]["new"],
        json!({"name": "new", "prev_name": "old", "queries": {"sort": "-created"}})
    );
}

#[test]
fn rename_moves_entry_and_rejects_unknown_source() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();
    service
        .update_entry(&fields(json!({
            "name": "old",
            "prev_name": "old",
            "queries": {"limit": 3},
        })))
        .unwrap();

    service.rename_entry("old", "new").unwrap();
    assert_eq!(service.list_entries("").unwrap().names, vec!["new"]);
    assert_eq!(service.fetch_entry("new").unwrap().spec, json!({"limit": 3}));

    let err = service.rename_entry("old", "newer").unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(ref name) if name == "old"));
}

#[test]
fn update_drops_unlisted_fields_and_keeps_values_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    service
        .update_entry(&fields(json!({
            "name": "feed",
            "prev_name": "feed",
            "queries": "{\"limit\": 5}",
            "_csrf": "token",
        })))
        .unwrap();

    assert_eq!(
        document_root(&store)["Modules"]["display_editor"]["Display-points"]["feed"],
        json!({"name": "feed", "prev_name": "feed", "queries": "{\"limit\": 5}"})
    );
}

#[test]
fn custom_registry_key_is_respected() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let config = RegistryConfig::from_json_str(r#"{"module_name": "points", "registry_key": "All"}"#)
        .unwrap();
    let service = RegistryService::new(&store, config).unwrap();

    service.create_entry("x").unwrap();
    assert_eq!(
        document_root(&store),
        json!({"Modules": {"points": {"All": {"x": {}}}}})
    );
}

#[test]
fn end_to_end_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let service = RegistryService::new(&store, RegistryConfig::default()).unwrap();

    service.install().unwrap();
    service.create_entry("topbar").unwrap();
    service
        .update_entry(&fields(json!({
            "name": "topbar",
            "prev_name": "topbar",
            "queries": {"limit": 5},
        })))
        .unwrap();

    let fetched = service.fetch_entry("topbar").unwrap();
    assert_eq!(fetched.spec, json!({"limit": 5}));
    assert_eq!(fetched.query_text, "{\n    \"limit\": 5\n}");
    assert_eq!(service.list_entries("top").unwrap().names, vec!["topbar"]);

    service.uninstall().unwrap();
    assert!(!service.list_entries("").unwrap().has_entries);
    assert_eq!(store.writes.get(), 4);
}
