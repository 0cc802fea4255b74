//! Pipeline integration tests
//!
//! Drives resolution, reconciliation and publishing end to end against
//! an in-memory store and a scripted catalog.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use chartsync_server::db;
use chartsync_server::models::{
    ChartEntry, Correction, MissedTrack, ResolveSummary, ResolvedAlias, ResolvedTrack,
};
use chartsync_server::pipeline::{genre_archive, publisher, reconciler};
use chartsync_server::pipeline::resolver::{ResolutionEngine, ResolverLimits};
use chartsync_server::services::chart_client::ChartClient;
use chartsync_server::types::Catalog;

use common::{chart_date, credential, test_pool, ScriptedCatalog};

fn entry(rank: i64, title: &str, artist: &str) -> ChartEntry {
    ChartEntry {
        rank,
        title: title.to_string(),
        artist: artist.to_string(),
    }
}

fn correction(rank: i64, date: NaiveDate) -> Correction {
    Correction {
        rank,
        missed_title: "어떤 노래".to_string(),
        missed_artist: "어떤 가수".to_string(),
        title: "Some Song".to_string(),
        artist: "Some Artist".to_string(),
        date,
    }
}

#[tokio::test]
async fn resolves_normalized_entries_against_the_catalog() {
    let pool = test_pool().await;
    let catalog = Arc::new(ScriptedCatalog::new().with_match("Song", "IU", "spotify:track:song"));
    let engine =
        ResolutionEngine::new(pool.clone(), Arc::clone(&catalog) as Arc<dyn Catalog>, ResolverLimits::default());

    // Raw chart strings carry the decorations normalization strips
    let entries = vec![entry(1, "Song (Live ver.)", "아이유 (IU)")];
    let summary = engine.resolve_batch(&entries, chart_date(), &credential()).await;

    assert_eq!(summary, ResolveSummary { resolved: 1, missed: 0 });

    let resolved = db::resolved::list_resolved_tracks(&pool, chart_date()).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].rank, 1);
    assert_eq!(resolved[0].uri, "spotify:track:song");
    // Stored names are the catalog's canonical forms
    assert_eq!(resolved[0].title, "Song");
    assert_eq!(resolved[0].artist, "IU");

    assert!(db::missed::list_missed_tracks(&pool, chart_date()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unmatched_entries_are_recorded_as_missed() {
    let pool = test_pool().await;
    let catalog = Arc::new(ScriptedCatalog::new());
    let engine =
        ResolutionEngine::new(pool.clone(), Arc::clone(&catalog) as Arc<dyn Catalog>, ResolverLimits::default());

    let entries = vec![entry(4, "숨겨진 노래 (feat. 아무개)", "무명가수")];
    let summary = engine.resolve_batch(&entries, chart_date(), &credential()).await;

    assert_eq!(summary, ResolveSummary { resolved: 0, missed: 1 });

    let missed = db::missed::list_missed_tracks(&pool, chart_date()).await.unwrap();
    assert_eq!(missed.len(), 1);
    assert_eq!(missed[0].rank, 4);
    // Missed rows hold the normalized strings the failed search used
    assert_eq!(missed[0].title, "숨겨진 노래");
    assert_eq!(missed[0].artist, "무명가수");

    assert!(db::resolved::list_resolved_tracks(&pool, chart_date()).await.unwrap().is_empty());
}

#[tokio::test]
async fn every_rank_lands_in_exactly_one_table() {
    let pool = test_pool().await;
    let catalog = Arc::new(
        ScriptedCatalog::new()
            .with_match("One", "A", "spotify:track:1")
            .with_match("Three", "C", "spotify:track:3")
            .with_match("Five", "E", "spotify:track:5"),
    );
    let engine =
        ResolutionEngine::new(pool.clone(), Arc::clone(&catalog) as Arc<dyn Catalog>, ResolverLimits::default());

    let entries = vec![
        entry(1, "One", "A"),
        entry(2, "Two", "B"),
        entry(3, "Three", "C"),
        entry(4, "Four", "D"),
        entry(5, "Five", "E"),
    ];
    let summary = engine.resolve_batch(&entries, chart_date(), &credential()).await;

    assert_eq!(summary, ResolveSummary { resolved: 3, missed: 2 });

    let resolved = db::resolved::list_resolved_tracks(&pool, chart_date()).await.unwrap();
    let missed = db::missed::list_missed_tracks(&pool, chart_date()).await.unwrap();
    assert_eq!(resolved.len() + missed.len(), entries.len());

    for rank in 1..=5 {
        let in_resolved = resolved.iter().any(|t| t.rank == rank);
        let in_missed = missed.iter().any(|t| t.rank == rank);
        assert!(in_resolved ^ in_missed, "rank {} must land in exactly one table", rank);
    }

    // One catalog search per entry
    assert_eq!(catalog.search_count(), 5);
}

#[tokio::test]
async fn alias_cache_resolves_entries_the_catalog_cannot() {
    let pool = test_pool().await;

    // A correction from an earlier day left this alias behind
    db::aliases::upsert_alias(
        &pool,
        &ResolvedAlias {
            missed_title: "밤양갱".to_string(),
            missed_artist: "비비".to_string(),
            title: "Bam Yang Gang".to_string(),
            artist: "BIBI".to_string(),
            uri: "spotify:track:bam".to_string(),
        },
    )
    .await
    .unwrap();

    let catalog = Arc::new(ScriptedCatalog::new());
    let engine =
        ResolutionEngine::new(pool.clone(), Arc::clone(&catalog) as Arc<dyn Catalog>, ResolverLimits::default());

    let summary = engine
        .resolve_batch(&[entry(9, "밤양갱", "비비")], chart_date(), &credential())
        .await;

    assert_eq!(summary, ResolveSummary { resolved: 1, missed: 0 });

    let resolved = db::resolved::list_resolved_tracks(&pool, chart_date()).await.unwrap();
    assert_eq!(resolved[0].uri, "spotify:track:bam");
    assert_eq!(resolved[0].title, "Bam Yang Gang");
    assert!(db::missed::list_missed_tracks(&pool, chart_date()).await.unwrap().is_empty());

    // The search still ran once; the alias covered its miss
    assert_eq!(catalog.search_count(), 1);
}

#[tokio::test]
async fn alias_resolution_is_stable_across_days() {
    let pool = test_pool().await;
    db::aliases::upsert_alias(
        &pool,
        &ResolvedAlias {
            missed_title: "밤양갱".to_string(),
            missed_artist: "비비".to_string(),
            title: "Bam Yang Gang".to_string(),
            artist: "BIBI".to_string(),
            uri: "spotify:track:bam".to_string(),
        },
    )
    .await
    .unwrap();

    let catalog = Arc::new(ScriptedCatalog::new());
    let engine =
        ResolutionEngine::new(pool.clone(), Arc::clone(&catalog) as Arc<dyn Catalog>, ResolverLimits::default());

    let monday = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();

    for day in [monday, tuesday] {
        let summary = engine
            .resolve_batch(&[entry(9, "밤양갱", "비비")], day, &credential())
            .await;
        assert_eq!(summary, ResolveSummary { resolved: 1, missed: 0 });
    }

    let monday_rows = db::resolved::list_resolved_tracks(&pool, monday).await.unwrap();
    let tuesday_rows = db::resolved::list_resolved_tracks(&pool, tuesday).await.unwrap();
    assert_eq!(monday_rows[0].uri, tuesday_rows[0].uri);
}

#[tokio::test]
async fn reingesting_a_date_keeps_the_first_resolutions() {
    let pool = test_pool().await;

    let first = Arc::new(ScriptedCatalog::new().with_match("One", "A", "spotify:track:old"));
    let engine = ResolutionEngine::new(pool.clone(), Arc::clone(&first) as Arc<dyn Catalog>, ResolverLimits::default());
    engine
        .resolve_batch(&[entry(1, "One", "A")], chart_date(), &credential())
        .await;

    // Retriggered run answers differently for the same slot
    let second = Arc::new(ScriptedCatalog::new().with_match("One", "A", "spotify:track:new"));
    let engine =
        ResolutionEngine::new(pool.clone(), Arc::clone(&second) as Arc<dyn Catalog>, ResolverLimits::default());
    engine
        .resolve_batch(&[entry(1, "One", "A")], chart_date(), &credential())
        .await;

    let resolved = db::resolved::list_resolved_tracks(&pool, chart_date()).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].uri, "spotify:track:old");
}

#[tokio::test]
async fn correction_migrates_missed_to_resolved_and_records_alias() {
    let pool = test_pool().await;

    // Day one: the entry misses
    let miss_catalog = Arc::new(ScriptedCatalog::new());
    let engine =
        ResolutionEngine::new(pool.clone(), Arc::clone(&miss_catalog) as Arc<dyn Catalog>, ResolverLimits::default());
    engine
        .resolve_batch(&[entry(7, "어떤 노래", "어떤 가수")], chart_date(), &credential())
        .await;
    assert_eq!(db::missed::count_missed_tracks(&pool, chart_date()).await.unwrap(), 1);

    // An operator supplies corrected names the catalog recognizes
    let fix_catalog =
        ScriptedCatalog::new().with_match("Some Song", "Some Artist", "spotify:track:fixed");
    let outcome = reconciler::apply_corrections(
        &pool,
        &fix_catalog,
        &[correction(7, chart_date())],
        &credential(),
    )
    .await;
    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.skipped, 0);

    // The row moved
    assert_eq!(db::missed::count_missed_tracks(&pool, chart_date()).await.unwrap(), 0);
    let resolved = db::resolved::list_resolved_tracks(&pool, chart_date()).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].rank, 7);
    assert_eq!(resolved[0].uri, "spotify:track:fixed");

    // The alias remembers the original missed pair
    let alias = db::aliases::find_alias(&pool, "어떤 노래", "어떤 가수")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alias.uri, "spotify:track:fixed");

    // A later ingestion of the same raw entry resolves through the
    // alias even though the catalog still has no match for it
    let next_day = chart_date().succ_opt().unwrap();
    let summary = engine
        .resolve_batch(&[entry(3, "어떤 노래", "어떤 가수")], next_day, &credential())
        .await;
    assert_eq!(summary, ResolveSummary { resolved: 1, missed: 0 });
    let next = db::resolved::list_resolved_tracks(&pool, next_day).await.unwrap();
    assert_eq!(next[0].uri, "spotify:track:fixed");
}

#[tokio::test]
async fn unconfirmed_correction_leaves_the_missed_row() {
    let pool = test_pool().await;

    db::missed::insert_missed_track(
        &pool,
        &MissedTrack {
            rank: 2,
            title: "어떤 노래".to_string(),
            artist: "어떤 가수".to_string(),
            date: chart_date(),
        },
    )
    .await
    .unwrap();

    // The catalog still cannot confirm the corrected names
    let catalog = ScriptedCatalog::new();
    let outcome = reconciler::apply_corrections(
        &pool,
        &catalog,
        &[correction(2, chart_date())],
        &credential(),
    )
    .await;

    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(db::missed::count_missed_tracks(&pool, chart_date()).await.unwrap(), 1);
    assert!(db::aliases::find_alias(&pool, "어떤 노래", "어떤 가수")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn failed_correction_rolls_back_every_write() {
    let pool = test_pool().await;
    let date = chart_date();

    // The slot already resolved through another path...
    db::resolved::insert_resolved_track(
        &pool,
        &ResolvedTrack {
            rank: 7,
            title: "Existing".to_string(),
            artist: "Winner".to_string(),
            uri: "spotify:track:existing".to_string(),
            date,
        },
    )
    .await
    .unwrap();

    // ...while its missed row is still around
    db::missed::insert_missed_track(
        &pool,
        &MissedTrack {
            rank: 7,
            title: "어떤 노래".to_string(),
            artist: "어떤 가수".to_string(),
            date,
        },
    )
    .await
    .unwrap();

    let catalog =
        ScriptedCatalog::new().with_match("Some Song", "Some Artist", "spotify:track:late");
    let outcome =
        reconciler::apply_corrections(&pool, &catalog, &[correction(7, date)], &credential()).await;

    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.skipped, 1);

    // All three writes rolled back: missed row intact, no alias, first
    // resolution kept
    assert_eq!(db::missed::count_missed_tracks(&pool, date).await.unwrap(), 1);
    assert!(db::aliases::find_alias(&pool, "어떤 노래", "어떤 가수")
        .await
        .unwrap()
        .is_none());
    let resolved = db::resolved::list_resolved_tracks(&pool, date).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].uri, "spotify:track:existing");
}

#[tokio::test]
async fn resubmitted_correction_is_a_noop() {
    let pool = test_pool().await;
    let date = chart_date();

    db::missed::insert_missed_track(
        &pool,
        &MissedTrack {
            rank: 7,
            title: "어떤 노래".to_string(),
            artist: "어떤 가수".to_string(),
            date,
        },
    )
    .await
    .unwrap();

    let catalog =
        ScriptedCatalog::new().with_match("Some Song", "Some Artist", "spotify:track:fixed");

    let first =
        reconciler::apply_corrections(&pool, &catalog, &[correction(7, date)], &credential()).await;
    assert_eq!(first.applied, 1);

    // The duplicate rolls back against the now-resolved slot
    let second =
        reconciler::apply_corrections(&pool, &catalog, &[correction(7, date)], &credential()).await;
    assert_eq!(second.applied, 0);
    assert_eq!(second.skipped, 1);

    // The store still reflects exactly one application
    assert_eq!(db::resolved::count_resolved_tracks(&pool, date).await.unwrap(), 1);
    let alias = db::aliases::find_alias(&pool, "어떤 노래", "어떤 가수")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alias.uri, "spotify:track:fixed");
}

#[tokio::test]
async fn publish_reports_counts_and_submits_uris_in_rank_order() {
    let pool = test_pool().await;
    let date = chart_date();

    for (rank, uri) in [(2, "spotify:track:b"), (1, "spotify:track:a"), (3, "spotify:track:c")] {
        db::resolved::insert_resolved_track(
            &pool,
            &ResolvedTrack {
                rank,
                title: format!("Title {}", rank),
                artist: format!("Artist {}", rank),
                uri: uri.to_string(),
                date,
            },
        )
        .await
        .unwrap();
    }
    db::missed::insert_missed_track(
        &pool,
        &MissedTrack {
            rank: 4,
            title: "놓친 곡".to_string(),
            artist: "가수".to_string(),
            date,
        },
    )
    .await
    .unwrap();

    let catalog = Arc::new(ScriptedCatalog::new());
    let summary = publisher::publish(
        &pool,
        Arc::clone(&catalog) as Arc<dyn Catalog>,
        date,
        "playlist-77".to_string(),
        credential(),
    )
    .await
    .unwrap();

    assert_eq!(summary.added, 3);
    assert_eq!(summary.missed, 1);

    // The mutation runs detached; wait for it to land
    let added = wait_for_added(&catalog, 1).await;
    let (playlist, uris) = &added[0];
    assert_eq!(playlist, "playlist-77");
    assert_eq!(uris, &["spotify:track:a", "spotify:track:b", "spotify:track:c"]);
}

#[tokio::test]
async fn publish_with_nothing_resolved_submits_nothing() {
    let pool = test_pool().await;
    let catalog = Arc::new(ScriptedCatalog::new());

    let summary = publisher::publish(
        &pool,
        Arc::clone(&catalog) as Arc<dyn Catalog>,
        chart_date(),
        "playlist-77".to_string(),
        credential(),
    )
    .await
    .unwrap();

    assert_eq!(summary.added, 0);
    assert_eq!(summary.missed, 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(catalog.added.lock().await.is_empty());
}

#[tokio::test]
async fn genre_archive_survives_an_unreachable_source() {
    let pool = test_pool().await;
    // Nothing listens on the discard port; every genre fetch fails
    let charts = Arc::new(ChartClient::new("http://127.0.0.1:9").unwrap());

    let stored = genre_archive::archive_genre_charts(&pool, charts, chart_date())
        .await
        .unwrap();

    assert_eq!(stored, 0);
    assert_eq!(db::genres::count_genre_tracks(&pool, chart_date()).await.unwrap(), 0);
}

async fn wait_for_added(catalog: &ScriptedCatalog, expected: usize) -> Vec<(String, Vec<String>)> {
    for _ in 0..100 {
        {
            let added = catalog.added.lock().await;
            if added.len() >= expected {
                return added.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("playlist mutation never arrived");
}
