// Tests for database functionality

use wikirace_core::data::{Database, EdgeStore};
use tempfile::TempDir;

fn create_test_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).unwrap();
    (temp_dir, db)
}

fn links(titles: &[&str]) -> Vec<String> {
    titles.iter().map(|t| t.to_string()).collect()
}

// ============================================================================
// Database Creation Tests
// ============================================================================

#[test]
fn test_database_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path);
    assert!(db.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_database_exists() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    assert!(!Database::exists(&db_path));

    let _db = Database::new(&db_path).unwrap();
    assert!(Database::exists(&db_path));
}

#[test]
fn test_database_drop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path).unwrap();
    drop(db);
    assert!(Database::exists(&db_path));

    Database::drop(&db_path).unwrap();
    assert!(!Database::exists(&db_path));
}

#[test]
fn test_drop_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("absent.db");

    assert!(Database::drop(&db_path).is_err());
}

#[test]
fn test_empty_database() {
    let (_temp_dir, db) = create_test_db();

    assert_eq!(db.record_count().unwrap(), 0);
    assert_eq!(db.persisted_edge_count().unwrap(), 0);
    assert_eq!(db.last_expanded_at().unwrap(), None);
    assert!(db.read_all().unwrap().is_empty());
}

// ============================================================================
// Expansion Record Tests
// ============================================================================

#[test]
fn test_write_and_read_record() {
    let (_temp_dir, db) = create_test_db();

    let created = db
        .write("Дружба", &links(&["Рим", "Любов", "Якопо Понтормо"]))
        .unwrap();
    assert!(created);

    let record = db.read("Дружба").unwrap().unwrap();
    assert_eq!(record.title, "Дружба");
    assert_eq!(record.links, links(&["Рим", "Любов", "Якопо Понтормо"]));
    assert!(record.expanded_at > 0);
}

#[test]
fn test_read_unknown_title() {
    let (_temp_dir, db) = create_test_db();

    assert!(db.read("Рим").unwrap().is_none());
}

#[test]
fn test_write_is_insert_once() {
    let (_temp_dir, db) = create_test_db();

    assert!(db.write("A", &links(&["B", "C"])).unwrap());
    assert!(!db.write("A", &links(&["D"])).unwrap());

    let record = db.read("A").unwrap().unwrap();
    assert_eq!(record.links, links(&["B", "C"]));
    assert_eq!(db.record_count().unwrap(), 1);
}

#[test]
fn test_empty_link_list_is_stored() {
    let (_temp_dir, db) = create_test_db();

    assert!(db.write("Dead end", &[]).unwrap());

    let record = db.read("Dead end").unwrap().unwrap();
    assert!(record.links.is_empty());
    assert_eq!(db.record_count().unwrap(), 1);
    assert_eq!(db.persisted_edge_count().unwrap(), 0);
}

#[test]
fn test_read_all_preserves_insertion_order() {
    let (_temp_dir, db) = create_test_db();

    db.write("C", &links(&["A"])).unwrap();
    db.write("A", &links(&["B"])).unwrap();
    db.write("B", &links(&["C", "A"])).unwrap();

    let titles: Vec<String> = db
        .read_all()
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
}

#[test]
fn test_counts_and_last_expanded() {
    let (_temp_dir, db) = create_test_db();

    db.write("A", &links(&["B", "C"])).unwrap();
    db.write("B", &links(&["C"])).unwrap();

    assert_eq!(db.record_count().unwrap(), 2);
    assert_eq!(db.persisted_edge_count().unwrap(), 3);

    let newest = db
        .read_all()
        .unwrap()
        .iter()
        .map(|r| r.expanded_at)
        .max();
    assert_eq!(db.last_expanded_at().unwrap(), newest);
}

#[test]
fn test_records_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    {
        let db = Database::new(&db_path).unwrap();
        db.write("Рим", &links(&["Італія"])).unwrap();
    }

    let db = Database::new(&db_path).unwrap();
    let record = db.read("Рим").unwrap().unwrap();
    assert_eq!(record.links, links(&["Італія"]));
}

#[test]
fn test_store_through_reference() {
    let db = Database::open_in_memory().unwrap();
    let store = &db;

    assert!(EdgeStore::write(&store, "A", &links(&["B"])).unwrap());
    assert!(EdgeStore::read(&store, "A").unwrap().is_some());
    assert_eq!(db.record_count().unwrap(), 1);
}

#[test]
fn test_schema_has_expansions_table() {
    let (_temp_dir, db) = create_test_db();

    let count: i64 = db
        .get_connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'expansions'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}
