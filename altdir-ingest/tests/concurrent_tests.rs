//! Integration tests for concurrent runs against one database file
//!
//! Each run opens its own pool, the way two CLI processes would.

mod helpers;

use altdir_common::db::init_database;
use altdir_ingest::models::{AlternativeCandidate, Batch, ProprietaryCandidate};
use altdir_ingest::RunSummary;
use helpers::*;
use tempfile::TempDir;

fn overlapping_batch() -> Batch {
    let proprietary: Vec<ProprietaryCandidate> = ["Slack", "GitHub", "Figma", "Notion", "Trello"]
        .iter()
        .map(|name| proprietary(name))
        .collect();

    let alternatives: Vec<AlternativeCandidate> = vec![
        alternative("Mattermost", &["chat"], &["slack"]),
        alternative("Rocket.Chat", &["chat"], &["slack"]),
        alternative("Gitea", &["git"], &["github"]),
        alternative("Forgejo", &["git"], &["github"]),
        alternative("Penpot", &["graphics"], &["figma"]),
        alternative("AppFlowy", &["office"], &["notion"]),
        alternative("Wekan", &[], &["trello"]),
        alternative("Focalboard", &[], &["trello", "notion"]),
    ];

    Batch {
        name: Some("overlap".to_string()),
        proprietary,
        alternatives,
    }
}

fn assert_complete(summary: &RunSummary) {
    assert!(!summary.has_failures(), "unexpected failures: {}", summary);
    assert_eq!(summary.proprietary_created + summary.proprietary_skipped, 5);
    assert_eq!(summary.alternatives_created + summary.alternatives_skipped, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_runs_create_each_record_once() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("shared.db");

    let pool_a = init_database(&db_path).await.unwrap();
    let pool_b = init_database(&db_path).await.unwrap();

    let mut executor_a = create_test_executor(&pool_a);
    let mut executor_b = create_test_executor(&pool_b);
    let batch = overlapping_batch();

    let (a, b) = tokio::join!(executor_a.run(&batch), executor_b.run(&batch));
    let a = a.unwrap();
    let b = b.unwrap();

    assert_complete(&a);
    assert_complete(&b);
    assert_eq!(a.proprietary_created + b.proprietary_created, 5);
    assert_eq!(a.alternatives_created + b.alternatives_created, 8);
    assert_eq!(a.categories_created + b.categories_created, 7);

    assert_eq!(count_rows(&pool_a, "proprietary_software").await, 5);
    assert_eq!(count_rows(&pool_a, "alternatives").await, 8);
    assert_eq!(count_rows(&pool_a, "categories").await, 7);
}

#[tokio::test]
async fn test_sequential_processes_share_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("shared.db");

    let first_pool = init_database(&db_path).await.unwrap();
    let first = create_test_executor(&first_pool)
        .run(&overlapping_batch())
        .await
        .unwrap();
    assert_eq!(first.alternatives_created, 8);
    first_pool.close().await;

    let second_pool = init_database(&db_path).await.unwrap();
    let second = create_test_executor(&second_pool)
        .run(&overlapping_batch())
        .await
        .unwrap();
    assert_eq!(second.total_created(), 0);
    assert_eq!(second.alternatives_skipped, 8);
}
