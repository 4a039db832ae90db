// Tests for statistics computed over a stored link database

use wikirace_core::analytics::{Analytics, MAX_ROUTES, load_graph, summarize};
use wikirace_core::data::{Database, EdgeStore};

fn links(titles: &[&str]) -> Vec<String> {
    titles.iter().map(|t| t.to_string()).collect()
}

fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.write("Дружба", &links(&["Рим", "Любов", "Якопо Понтормо"]))
        .unwrap();
    db.write("Якопо Понтормо", &links(&["Рим", "Флоренція"]))
        .unwrap();
    db.write("Любов", &links(&["Дружба"])).unwrap();
    db
}

#[test]
fn test_summarize_counts() {
    let db = seeded();
    let summary = summarize(&db).unwrap();

    assert_eq!(summary.records, 3);
    assert_eq!(summary.nodes, 5);
    assert_eq!(summary.edges, 6);
    assert!(summary.last_expanded_at.is_some());

    assert_eq!(summary.top_out[0].title, "Дружба");
    assert_eq!(summary.top_out[0].degree, 3);
    assert_eq!(summary.top_in[0].title, "Рим");
    assert_eq!(summary.top_in[0].degree, 2);
}

#[test]
fn test_summarize_empty_database() {
    let db = Database::open_in_memory().unwrap();
    let summary = summarize(&db).unwrap();

    assert_eq!(summary.records, 0);
    assert_eq!(summary.nodes, 0);
    assert!(summary.top_out.is_empty());
    assert!(summary.last_expanded_at.is_none());
}

#[test]
fn test_average_from_stored_links() {
    let db = seeded();
    let graph = load_graph(&db).unwrap();
    let analytics = Analytics::new(&graph);

    // Флоренція via Якопо Понтормо; Рим is already first-level
    assert_eq!(analytics.average_second_level("Дружба"), 1.0);
}

#[test]
fn test_routes_from_stored_links() {
    let db = seeded();
    let graph = load_graph(&db).unwrap();
    let routes = Analytics::new(&graph).routes(2, MAX_ROUTES);

    assert!(routes.contains(&links(&["Дружба", "Якопо Понтормо", "Флоренція"])));
    assert!(routes.contains(&links(&["Любов", "Дружба", "Рим"])));
    for route in &routes {
        assert_eq!(route.len(), 3);
    }
}
