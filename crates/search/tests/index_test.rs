//! Flat index behaviour through the public API

use contextforge_common::models::{Chunk, IndexedChunk};
use contextforge_common::retrieval::Retriever;
use contextforge_common::AppError;
use contextforge_search::VectorIndex;
use proptest::prelude::*;
use std::sync::Arc;

fn sample_index() -> VectorIndex {
    let entries = vec![
        IndexedChunk {
            chunk: Chunk::new(0, 1, "Abstract", "We study compression."),
            embedding: vec![1.0, 0.0, 0.0],
        },
        IndexedChunk {
            chunk: Chunk::new(1, 4, "Method", "The pipeline has three steps."),
            embedding: vec![0.0, 1.0, 0.0],
        },
        IndexedChunk {
            chunk: Chunk::new(2, 6, "Results", "Accuracy reached 91%."),
            embedding: vec![0.0, 0.0, 1.0],
        },
    ];
    VectorIndex::build(entries, "test-model").unwrap()
}

#[test]
fn test_nearest_first_with_metadata() {
    let index = sample_index();
    let hits = index.search(&[0.1, 0.9, 0.0], 2).unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.chunk_id, 1);
    assert_eq!(hits[0].chunk.page, 4);
    assert_eq!(hits[0].chunk.section, "Method");
    assert_eq!(hits[0].rank, 1);
    assert!(hits[0].distance < hits[1].distance);
}

#[test]
fn test_k_capped_at_index_size() {
    let index = sample_index();
    assert_eq!(index.search(&[0.0, 0.0, 0.0], 50).unwrap().len(), 3);
    assert!(index.search(&[0.0, 0.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn test_usable_as_shared_retriever() {
    let retriever: Arc<dyn Retriever> = Arc::new(sample_index());
    let hits = retriever.search(&[0.0, 0.0, 1.0], 1).unwrap();
    assert_eq!(hits[0].chunk.text, "Accuracy reached 91%.");
    assert_eq!(hits[0].distance, 0.0);
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("index.json");

    let index = sample_index();
    index.save(&path).unwrap();

    let loaded = VectorIndex::load(&path).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.dimension(), 3);
    assert_eq!(loaded.model(), "test-model");
    assert_eq!(loaded.chunks(), index.chunks());
    assert_eq!(
        loaded.search(&[0.2, 0.1, 0.7], 3).unwrap(),
        index.search(&[0.2, 0.1, 0.7], 3).unwrap()
    );
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = VectorIndex::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, AppError::Internal { .. }));
}

#[test]
fn test_load_empty_index_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(&path, r#"{"dimension":3,"model":"m","chunks":[]}"#).unwrap();

    let err = VectorIndex::load(&path).unwrap_err();
    assert!(matches!(err, AppError::EmptyIndex { .. }));
}

proptest! {
    #[test]
    fn prop_results_sorted_and_ranked(
        vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 1..25),
        query in prop::collection::vec(-1.0f32..1.0, 4),
        k in 0usize..30,
    ) {
        let entries = vectors
            .into_iter()
            .enumerate()
            .map(|(i, embedding)| IndexedChunk {
                chunk: Chunk::new(i as u64, 1, "Unknown", "text"),
                embedding,
            })
            .collect::<Vec<_>>();
        let total = entries.len();
        let index = VectorIndex::build(entries, "m").unwrap();
        let hits = index.search(&query, k).unwrap();

        prop_assert_eq!(hits.len(), k.min(total));
        for (i, hit) in hits.iter().enumerate() {
            prop_assert_eq!(hit.rank, i + 1);
            prop_assert!(hit.distance >= 0.0);
            if i > 0 {
                prop_assert!(hits[i - 1].distance <= hit.distance);
            }
        }
    }
}
