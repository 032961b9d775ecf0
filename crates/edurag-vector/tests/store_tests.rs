use std::sync::Arc;

use edurag_core::traits::Embedder;
use edurag_core::types::Chunk;
use edurag_embed::HashEmbedder;
use edurag_vector::manifest::{Manifest, ManifestEntry};
use edurag_vector::schema::EMBEDDING_DIM;
use edurag_vector::{IndexStore, StoreError};
use tempfile::TempDir;

const DIM: usize = EMBEDDING_DIM as usize;

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts.iter().map(|t| Chunk::new(*t, "notes.txt")).collect()
}

fn embed(embedder: &HashEmbedder, chunks: &[Chunk]) -> Vec<Vec<f32>> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    embedder.embed_batch(&texts).expect("embed")
}

async fn store(tmp: &TempDir) -> IndexStore {
    IndexStore::open(tmp.path(), DIM).await.expect("open store")
}

#[tokio::test]
async fn empty_subject_returns_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp).await;
    let query = vec![0.1f32; DIM];
    assert!(store.search("history", &query, 3).await.unwrap().is_empty());
    assert!(store.load_or_create_texts("history").await.unwrap().is_empty());
    assert_eq!(store.count("history").await.unwrap(), 0);
    assert!(!store.contains("history").unwrap());
}

#[tokio::test]
async fn each_vector_finds_its_own_text() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp).await;
    let embedder = HashEmbedder::new(DIM);
    let items = chunks(&[
        "routers forward packets between networks",
        "photosynthesis converts light into chemical energy",
        "the mitochondria is the powerhouse of the cell",
        "binary search halves the interval each step",
    ]);
    let vectors = embed(&embedder, &items);
    assert_eq!(store.update("mixed", &vectors, &items).await.unwrap(), 4);

    for (i, v) in vectors.iter().enumerate() {
        let hits = store.search("mixed", v, 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, items[i].text);
        assert_eq!(hits[0].position, i);
        assert!(hits[0].distance.abs() < 1e-4, "self distance {}", hits[0].distance);
    }

    let all = store.search("mixed", &vectors[0], 10).await.unwrap();
    assert_eq!(all.len(), 4, "k larger than the index returns every row");
    assert!(all.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn updates_append_and_persist() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let first = chunks(&["tcp uses a three way handshake", "udp is connectionless"]);
    let second = chunks(&["ip addresses identify hosts", "dns maps names to addresses", "arp resolves mac addresses"]);
    {
        let store = store(&tmp).await;
        assert_eq!(store.update("computer_network", &embed(&embedder, &first), &first).await.unwrap(), 2);
        assert_eq!(store.update("computer_network", &embed(&embedder, &second), &second).await.unwrap(), 5);
    }

    let reopened = store(&tmp).await;
    assert_eq!(reopened.count("computer_network").await.unwrap(), 5);
    let texts = reopened.load_or_create_texts("computer_network").await.unwrap();
    let expected: Vec<String> = first.iter().chain(second.iter()).map(|c| c.text.clone()).collect();
    assert_eq!(texts, expected);

    let probe = embed(&embedder, &chunks(&["udp is connectionless"]));
    let hits = reopened.search("computer_network", &probe[0], 1).await.unwrap();
    assert_eq!(hits[0].text, "udp is connectionless");
    assert_eq!(reopened.subjects().unwrap(), vec!["computer_network".to_string()]);
    assert_eq!(reopened.corpus_hash("computer_network").unwrap(), None);
}

async fn version_of(store: &IndexStore, subject: &str) -> String {
    let handle = store.load_or_create(subject).await.unwrap();
    let index = handle.read().await;
    index.version().expect("subject has a version").to_string()
}

fn table_dir(tmp: &TempDir, subject: &str, version: &str) -> std::path::PathBuf {
    tmp.path().join(format!("{subject}__{version}.lance"))
}

#[tokio::test]
async fn replace_swaps_the_whole_subject() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp).await;
    let embedder = HashEmbedder::new(DIM);
    let first = chunks(&["old fact one", "old fact two"]);
    let second = chunks(&["newer fact"]);
    let third = chunks(&["newest fact"]);

    store.replace("physics", Some("hash-a"), &embed(&embedder, &first), &first).await.unwrap();
    let v1 = version_of(&store, "physics").await;
    store.replace("physics", Some("hash-b"), &embed(&embedder, &second), &second).await.unwrap();
    let v2 = version_of(&store, "physics").await;

    assert_eq!(store.load_or_create_texts("physics").await.unwrap(), vec!["newer fact".to_string()]);
    assert_eq!(store.corpus_hash("physics").unwrap().as_deref(), Some("hash-b"));
    assert!(table_dir(&tmp, "physics", &v1).exists(), "the replaced version is kept for readers still on it");

    store.replace("physics", Some("hash-c"), &embed(&embedder, &third), &third).await.unwrap();
    let v3 = version_of(&store, "physics").await;
    assert!(!table_dir(&tmp, "physics", &v1).exists(), "older versions are pruned");
    assert!(table_dir(&tmp, "physics", &v2).exists());
    assert!(table_dir(&tmp, "physics", &v3).exists());

    // A second process sees the same state.
    let other = IndexStore::open(tmp.path(), DIM).await.unwrap();
    assert_eq!(other.load_or_create_texts("physics").await.unwrap(), vec!["newest fact".to_string()]);
}

#[tokio::test]
async fn pruning_leaves_similarly_named_subjects_alone() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp).await;
    let embedder = HashEmbedder::new(DIM);
    let items = chunks(&["neighbour"]);
    store.replace("math__v1", None, &embed(&embedder, &items), &items).await.unwrap();
    store.replace("math_", None, &embed(&embedder, &items), &items).await.unwrap();
    for _ in 0..3 {
        store.replace("math", None, &embed(&embedder, &items), &items).await.unwrap();
    }

    assert_eq!(store.count("math__v1").await.unwrap(), 1);
    assert_eq!(store.count("math_").await.unwrap(), 1);
    assert!(table_dir(&tmp, "math__v1", &version_of(&store, "math__v1").await).exists());
    assert!(table_dir(&tmp, "math_", &version_of(&store, "math_").await).exists());
}

#[tokio::test]
async fn rebuild_in_another_process_keeps_readers_working() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let server = store(&tmp).await;
    let indexer = store(&tmp).await;

    let old = chunks(&["old"]);
    indexer.replace("math", Some("h1"), &embed(&embedder, &old), &old).await.unwrap();
    let query = embed(&embedder, &old).remove(0);
    assert_eq!(server.search("math", &query, 1).await.unwrap()[0].text, "old");

    // The server keeps its handle while the indexer rebuilds twice.
    for (hash, text) in [("h2", "new"), ("h3", "newest")] {
        let items = chunks(&[text]);
        indexer.replace("math", Some(hash), &embed(&embedder, &items), &items).await.unwrap();
        let hits = server.search("math", &query, 1).await.unwrap();
        assert_eq!(hits[0].text, text);
    }
    assert_eq!(server.load_or_create_texts("math").await.unwrap(), vec!["newest".to_string()]);
    assert_eq!(server.count("math").await.unwrap(), 1);
}

#[tokio::test]
async fn wrong_vector_width_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    {
        let narrow = IndexStore::open(tmp.path(), 8).await.unwrap();
        let items = chunks(&["eight wide"]);
        narrow.update("geography", &[vec![0.5; 8]], &items).await.unwrap();
    }

    let store = store(&tmp).await;
    let err = store.load_or_create("geography").await.unwrap_err();
    match err {
        StoreError::Corrupt { subject, reason } => {
            assert_eq!(subject, "geography");
            assert!(reason.contains("8-d"), "{reason}");
        }
        other => panic!("expected a corrupt subject, got {other}"),
    }
    // The failed load is not cached; other subjects keep working.
    assert!(store.load_or_create("geography").await.is_err());
    assert_eq!(store.count("history").await.unwrap(), 0);
}

#[tokio::test]
async fn mismatched_input_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp).await;
    let items = chunks(&["a", "b"]);

    let err = store.update("math", &[vec![0.0; DIM]], &items).await.unwrap_err();
    assert!(matches!(err, StoreError::LengthMismatch { vectors: 1, chunks: 2 }));

    let err = store.update("math", &[vec![0.0; 8], vec![0.0; DIM]], &items).await.unwrap_err();
    assert!(matches!(err, StoreError::DimensionMismatch { expected: DIM, actual: 8 }));

    let err = store.search("math", &[0.0; 3], 1).await.unwrap_err();
    assert!(matches!(err, StoreError::DimensionMismatch { .. }));

    let err = store.update("../escape", &[], &[]).await.unwrap_err();
    assert!(matches!(err, StoreError::Subject(_)));
    assert_eq!(store.count("math").await.unwrap(), 0);
}

#[tokio::test]
async fn corrupt_subject_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let items = chunks(&["healthy subject text"]);
    {
        let store = store(&tmp).await;
        store.update("biology", &embed(&embedder, &items), &items).await.unwrap();
    }

    // Point a second subject at a table that does not exist.
    let path = Manifest::path_in(tmp.path());
    let mut manifest = Manifest::load(&path).unwrap();
    manifest.subjects.insert(
        "chemistry".into(),
        ManifestEntry { version: "v0".into(), corpus_hash: None, chunks: 3, updated_at: chrono::Utc::now() },
    );
    manifest.save(&path).unwrap();

    let store = store(&tmp).await;
    let query = embed(&embedder, &items).remove(0);
    let err = store.search("chemistry", &query, 1).await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { ref subject, .. } if subject == "chemistry"));
    assert_eq!(store.search("biology", &query, 1).await.unwrap()[0].text, "healthy subject text");

    // A rebuild recovers the corrupt subject.
    store.replace("chemistry", None, &embed(&embedder, &items), &items).await.unwrap();
    assert_eq!(store.count("chemistry").await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_first_access_shares_one_handle() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(store(&tmp).await);
    let embedder = HashEmbedder::new(DIM);
    let items = chunks(&["shared"]);
    store.update("art", &embed(&embedder, &items), &items).await.unwrap();
    store.evict("art").await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move { store.load_or_create("art").await.unwrap() }));
    }
    let mut handles = Vec::new();
    for t in tasks {
        handles.push(t.await.unwrap());
    }
    assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(handles[0].read().await.count(), 1);
}

#[tokio::test]
async fn searches_and_updates_interleave_safely() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(store(&tmp).await);
    let embedder = Arc::new(HashEmbedder::new(DIM));

    let mut tasks = Vec::new();
    for i in 0..4 {
        let store = Arc::clone(&store);
        let embedder = Arc::clone(&embedder);
        tasks.push(tokio::spawn(async move {
            let items = vec![Chunk::new(format!("writer {i} chunk"), "w.txt")];
            let vectors = embed(&embedder, &items);
            store.update("music", &vectors, &items).await.unwrap();
            store.search("music", &vectors[0], 2).await.unwrap().len()
        }));
    }
    for t in tasks {
        assert!(t.await.unwrap() >= 1);
    }
    assert_eq!(store.count("music").await.unwrap(), 4);
    let texts = store.load_or_create_texts("music").await.unwrap();
    assert_eq!(texts.len(), 4);
}
