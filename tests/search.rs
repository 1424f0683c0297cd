mod common;

use common::{FakeEmbedder, FakeIndex, Workspace};
use facesearch::types::{HitLocation, ImageSource, Pixels, SearchOutcome};
use facesearch::{Error, IngestionPipeline, SearchRequest, SearchService, SearchTarget};
use rstest::{fixture, rstest};

/// An ingested folder of three single-face images
struct Ingested {
    ws: Workspace,
    index: FakeIndex,
    collection_id: String,
}

#[fixture]
async fn ingested() -> Ingested {
    let mut ws = Workspace::new();
    ws.write("alice.jpg", "1,0,0\n");
    ws.write("bob.jpg", "0,1,0\n");
    ws.write("carol.jpg", "0,0,1\n");
    let index = FakeIndex::default();
    let report = IngestionPipeline::new(&FakeEmbedder, &index).ingest(&mut ws.store, &ws.images).await.unwrap();
    Ingested { ws, index, collection_id: report.collection_id }
}

fn request(target: SearchTarget, image: impl Into<ImageSource>, limit: usize) -> SearchRequest {
    SearchRequest { target, image: image.into(), limit, store_query_as: None }
}

fn by_folder(ws: &Workspace) -> SearchTarget {
    SearchTarget::Folder(ws.images.to_string_lossy().into_owned())
}

#[rstest]
#[tokio::test]
async fn test_search_finds_matching_face(#[future] ingested: Ingested) {
    let Ingested { ws, index, collection_id } = ingested.await;
    let query = ws.query("0,0.9,0.1\n");

    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), query, 1))
        .await
        .unwrap();
    assert_eq!(results.collection_id, collection_id);
    let hits = results.outcome.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].rank, 1);
    assert_eq!(hits[0].source_image, "bob.jpg");
    assert_eq!(hits[0].location, HitLocation::Resolved(ws.images.canonicalize().unwrap().join("bob.jpg")));
}

#[rstest]
#[tokio::test]
async fn test_first_face_of_query_is_used(#[future] ingested: Ingested) {
    let Ingested { ws, index, .. } = ingested.await;
    let query = ws.query("0,1,0\n1,0,0\n");

    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), query, 1))
        .await
        .unwrap();
    assert_eq!(results.outcome.hits()[0].source_image, "bob.jpg");
}

#[rstest]
#[tokio::test]
async fn test_hits_are_ordered(#[future] ingested: Ingested) {
    let Ingested { ws, index, collection_id } = ingested.await;
    let query = ws.query("0.2,0.5,0.3\n");

    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(SearchTarget::Collection(collection_id), query, 10))
        .await
        .unwrap();
    let names = results.outcome.hits().iter().map(|h| h.source_image.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["bob.jpg", "carol.jpg", "alice.jpg"]);
    let scores = results.outcome.hits().iter().map(|h| h.score).collect::<Vec<_>>();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[rstest]
#[case(0, 1)]
#[case(2, 2)]
#[case(1000, 3)]
#[tokio::test]
async fn test_limit_is_clamped(#[future] ingested: Ingested, #[case] limit: usize, #[case] expected: usize) {
    let Ingested { ws, index, .. } = ingested.await;
    let query = ws.query("1,1,1\n");
    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), query, limit))
        .await
        .unwrap();
    assert_eq!(results.outcome.hits().len(), expected);
}

#[rstest]
#[tokio::test]
async fn test_no_face_in_query(#[future] ingested: Ingested) {
    let Ingested { ws, index, .. } = ingested.await;
    let query = ws.query("");
    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), query, 5))
        .await
        .unwrap();
    assert!(matches!(results.outcome, SearchOutcome::NoFaceDetected));
    assert!(results.outcome.hits().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_query_embedding_failure(#[future] ingested: Ingested) {
    let Ingested { ws, index, .. } = ingested.await;
    let query = ws.query("!unreadable");
    let err = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), query, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QueryEmbedding(_)));
}

#[tokio::test]
async fn test_unknown_folder() {
    let ws = Workspace::new();
    let index = FakeIndex::default();
    let query = ws.query("1,0,0\n");
    let err = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), query, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCollection(_)));
    assert_eq!(index.collection_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_search_in_missing_collection(#[future] ingested: Ingested) {
    let Ingested { ws, index, .. } = ingested.await;
    let query = ws.query("1,0,0\n");
    let err = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(SearchTarget::Collection("19700101000000".to_string()), query, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Search { ref collection, .. } if collection == "19700101000000"));
}

#[rstest]
#[tokio::test]
async fn test_deleted_image_is_flagged(#[future] ingested: Ingested) {
    let Ingested { ws, index, .. } = ingested.await;
    std::fs::remove_file(ws.images.join("alice.jpg")).unwrap();
    let query = ws.query("1,0,0\n");
    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), query, 1))
        .await
        .unwrap();
    let hit = &results.outcome.hits()[0];
    assert_eq!(hit.source_image, "alice.jpg");
    assert!(matches!(hit.location, HitLocation::Missing(_)));
}

#[rstest]
#[tokio::test]
async fn test_old_collection_stays_queryable(#[future] ingested: Ingested) {
    let Ingested { mut ws, index, collection_id: old } = ingested.await;
    let report = IngestionPipeline::new(&FakeEmbedder, &index).ingest(&mut ws.store, &ws.images).await.unwrap();
    assert_ne!(report.collection_id, old);

    let query = ws.query("0,0,1\n");
    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(SearchTarget::Collection(old.clone()), query, 1))
        .await
        .unwrap();
    assert_eq!(results.collection_id, old);
    let hit = &results.outcome.hits()[0];
    assert_eq!(hit.source_image, "carol.jpg");
    // no folder is bound to it anymore
    assert_eq!(hit.location, HitLocation::Unmapped);
}

#[rstest]
#[tokio::test]
async fn test_store_query_face(#[future] ingested: Ingested) {
    let Ingested { ws, index, collection_id } = ingested.await;
    let mut req = request(by_folder(&ws), ws.query("1,0,0\n"), 5);
    req.store_query_as = Some("query.jpg".to_string());

    let results = SearchService::new(&FakeEmbedder, &index).search(&ws.store, req).await.unwrap();
    assert!(results.query_store_error.is_none());
    assert_eq!(index.records(&collection_id).len(), 4);
    // stored before searching, so the query matches itself
    assert!(results.outcome.hits().iter().any(|h| h.source_image == "query.jpg"));
}

#[rstest]
#[tokio::test]
async fn test_search_with_pixels(#[future] ingested: Ingested) {
    let Ingested { ws, index, .. } = ingested.await;
    let pixels = Pixels { width: 1, height: 1, data: vec![0, 0, 3] };
    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), ImageSource::Pixels(pixels), 1))
        .await
        .unwrap();
    assert_eq!(results.outcome.hits()[0].source_image, "carol.jpg");

    let empty = Pixels { width: 0, height: 0, data: vec![] };
    let results = SearchService::new(&FakeEmbedder, &index)
        .search(&ws.store, request(by_folder(&ws), ImageSource::Pixels(empty), 1))
        .await
        .unwrap();
    assert!(matches!(results.outcome, SearchOutcome::NoFaceDetected));
}
