//! Cache lifecycle across sessions: persistence, manifest recovery and
//! failure isolation of forced regenerations.

use iconforge_cache::{
    icon_file_name, AssetKey, AssetPreviewCache, CacheConfig, ProjectAssetIndex, Status,
    TickOutcome, CACHE_FORMAT_VERSION, MANIFEST_FILE,
};
use iconforge_scene::GltfSceneComposer;
use iconforge_tests::{CountingRenderer, FailingRenderer, ProjectFixture};
use pretty_assertions::assert_eq;
use std::fs;

fn open(project: &ProjectFixture) -> AssetPreviewCache {
    let mut cache = AssetPreviewCache::new(
        Box::new(ProjectAssetIndex::new(project.path())),
        Box::new(GltfSceneComposer::new()),
        CacheConfig {
            thumbnail_size: 32,
            min_tick_interval_ms: 0,
            ..CacheConfig::default()
        },
    );
    cache.initialize(project.path());
    cache
}

fn drain(cache: &mut AssetPreviewCache, renderer: &mut CountingRenderer) -> Vec<TickOutcome> {
    cache.on_assets_changed(None);
    let mut outcomes = Vec::new();
    while !cache.is_idle() {
        outcomes.push(cache.tick(renderer));
    }
    outcomes
}

fn populated_project() -> ProjectFixture {
    let project = ProjectFixture::new();
    project.add_texture("textures/rock.png", 16, 16, [120, 110, 100, 255]);
    project.add_gltf_cube("models/barrel.gltf", 0.5);
    project
}

#[test]
fn test_manifest_on_disk_after_shutdown() {
    let project = populated_project();
    let mut cache = open(&project);
    drain(&mut cache, &mut CountingRenderer::new());
    cache.shutdown();
    assert!(!cache.is_initialized());

    let manifest = project.read_manifest().expect("manifest written on shutdown");
    assert_eq!(manifest["version"], CACHE_FORMAT_VERSION);
    let entries = manifest["entries"].as_object().unwrap();
    assert_eq!(entries.len(), 2);

    let rock = &entries["textures/rock.png"];
    assert_eq!(rock["assetType"], "Texture");
    assert_eq!(
        rock["iconFile"],
        icon_file_name(&AssetKey::new("textures/rock.png")).as_str()
    );
    let hash = rock["sourceHash"].as_str().unwrap();
    assert!(hash.starts_with(&format!("{}:Texture:", CACHE_FORMAT_VERSION)), "{}", hash);
    assert_eq!(entries["models/barrel.gltf"]["assetType"], "Model");

    for entry in entries.values() {
        let file = project.cache_dir().join(entry["iconFile"].as_str().unwrap());
        assert!(file.is_file(), "missing {}", file.display());
    }
}

#[test]
fn test_restart_serves_icons_without_rendering() {
    let project = populated_project();
    let mut first = open(&project);
    let mut renderer = CountingRenderer::new();
    drain(&mut first, &mut renderer);
    assert_eq!(renderer.total_calls(), 2);
    first.shutdown();

    let mut second = open(&project);
    let mut renderer = CountingRenderer::new();
    assert!(second.try_get_icon("textures/rock.png").is_some());
    assert!(second.try_get_icon("MODELS/Barrel.gltf").is_some());

    let outcomes = drain(&mut second, &mut renderer);
    assert!(outcomes.iter().all(|o| matches!(o, TickOutcome::CacheHit(_))), "{:?}", outcomes);
    assert_eq!(renderer.total_calls(), 0);
    assert_eq!(second.stats().total_generated, 0);
}

#[test]
fn test_edited_asset_is_regenerated_after_restart() {
    let project = populated_project();
    let mut first = open(&project);
    drain(&mut first, &mut CountingRenderer::new());
    first.shutdown();

    project.add_texture("textures/rock.png", 16, 16, [10, 20, 200, 255]);

    let mut second = open(&project);
    assert!(second.try_get_icon("textures/rock.png").is_none());
    assert_eq!(second.status("textures/rock.png"), Status::Queued);

    let mut renderer = CountingRenderer::new();
    let outcomes = drain(&mut second, &mut renderer);
    assert_eq!(
        outcomes,
        vec![
            TickOutcome::CacheHit(AssetKey::new("models/barrel.gltf")),
            TickOutcome::Generated(AssetKey::new("textures/rock.png")),
        ]
    );
    assert_eq!(renderer.total_calls(), 1);
    let icon = second.try_get_icon("textures/rock.png").unwrap();
    let center = icon.get_pixel(16, 16).0;
    assert!(center[2] > 150, "{:?}", center);
}

#[test]
fn test_format_version_change_regenerates_everything() {
    let project = populated_project();
    let mut first = open(&project);
    drain(&mut first, &mut CountingRenderer::new());
    first.shutdown();

    let path = project.cache_dir().join(MANIFEST_FILE);
    let mut manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    manifest["version"] = serde_json::json!(CACHE_FORMAT_VERSION + 1);
    fs::write(&path, manifest.to_string()).unwrap();

    let mut second = open(&project);
    assert!(second.manifest().unwrap().is_empty());
    let mut renderer = CountingRenderer::new();
    let outcomes = drain(&mut second, &mut renderer);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| matches!(o, TickOutcome::Generated(_))));
    assert_eq!(renderer.total_calls(), 2);
}

#[test]
fn test_corrupt_manifest_is_treated_as_empty() {
    let project = populated_project();
    fs::create_dir_all(project.cache_dir()).unwrap();
    fs::write(project.cache_dir().join(MANIFEST_FILE), b"{ \"version\": 1, \"entr").unwrap();

    let mut cache = open(&project);
    assert!(cache.is_initialized());
    assert!(cache.manifest().unwrap().is_empty());

    let outcomes = drain(&mut cache, &mut CountingRenderer::new());
    assert_eq!(outcomes.len(), 2);
    cache.shutdown();

    let manifest = project.read_manifest().expect("manifest rewritten");
    assert_eq!(manifest["entries"].as_object().unwrap().len(), 2);
}

#[test]
fn test_failed_forced_regeneration_keeps_previous_thumbnail() {
    let project = populated_project();
    let mut cache = open(&project);
    drain(&mut cache, &mut CountingRenderer::new());

    let key = AssetKey::new("models/barrel.gltf");
    let icon_path = project.cache_dir().join(icon_file_name(&key));
    let before = fs::read(&icon_path).unwrap();
    let entry_before = cache.manifest().unwrap().get(&key).cloned().unwrap();

    assert!(cache.regenerate_icon("models/barrel.gltf"));
    let mut failing = FailingRenderer::default();
    assert_eq!(cache.tick(&mut failing), TickOutcome::Failed(key.clone()));
    assert_eq!(failing.calls, 1);

    assert_eq!(fs::read(&icon_path).unwrap(), before);
    assert_eq!(cache.manifest().unwrap().get(&key), Some(&entry_before));
    assert_eq!(cache.status("models/barrel.gltf"), Status::Failed);
    // The previously loaded icon stays usable while the failure is reported.
    assert!(cache.try_get_icon("models/barrel.gltf").is_some());

    let partials: Vec<_> = fs::read_dir(project.cache_dir())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(partials.is_empty(), "{:?}", partials);
}
