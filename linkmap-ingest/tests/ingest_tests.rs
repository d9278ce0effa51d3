// Feed-to-database tests for the ingest pipeline

use linkmap_core::model::{NodeRole, Seed};
use linkmap_core::{Database, GraphAssembler, LinkSource, SearchIndex};
use linkmap_ingest::{IngestError, IngestPipeline};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn feed() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let lines = [
        r#"{"url_from":"https://home.example/","url_from_id":1,"url_to":"https://docs.example/","url_to_id":2,"cnt":4,"title_to":"Docs"}"#,
        r#"{"url_from":"https://home.example/","url_from_id":1,"url_to":"https://docs.example/","url_to_id":2,"cnt":3}"#,
        r#"{"url_from":"https://home.example/","url_from_id":1,"url_to":"https://blog.example/","url_to_id":3,"cnt":1}"#,
        r#"{"url_from":"https://docs.example/","url_from_id":2,"url_to":"https://home.example/","url_to_id":1,"cnt":-4}"#,
        "",
    ];
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[tokio::test]
async fn test_ingest_file_into_database() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
    let file = feed();

    let outcome = IngestPipeline::new()
        .ingest_file(file.path(), 4)
        .await
        .unwrap();
    assert_eq!(outcome.summary.accepted, 3);
    assert_eq!(outcome.summary.rejected, 1);
    assert_eq!(outcome.summary.nodes, 3);
    assert_eq!(outcome.summary.edges, 2);

    outcome.persist(&db).unwrap();

    let docs = db.node_by_id(2).unwrap().unwrap();
    assert_eq!(docs.title, "Docs");
    assert_eq!(docs.weight, 7);

    // 1 -> 2 clears the threshold, 1 -> 3 does not
    let graph = GraphAssembler::new(&db).expand(&Seed::Id(1)).unwrap();
    assert_eq!(graph.node(1).unwrap().role, NodeRole::Seed);
    assert!(graph.contains_node(2));
    assert!(!graph.contains_node(3));

    let hits = SearchIndex::new(&db).search("docs").unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn test_ingest_twice_is_additive() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
    let file = feed();

    for _ in 0..2 {
        let outcome = IngestPipeline::new()
            .ingest_file(file.path(), 2)
            .await
            .unwrap();
        outcome.persist(&db).unwrap();
    }

    let edges = db.all_edges(0).unwrap();
    let home_docs = edges.iter().find(|e| e.from == 1 && e.to == 2).unwrap();
    assert_eq!(home_docs.weight, 14);
}

#[tokio::test]
async fn test_ingest_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = IngestPipeline::new()
        .ingest_file(&temp_dir.path().join("missing.jsonl"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Io(_)));
}
