mod common;

use common::{ApiFetcher, Page, READY_CALLBACK, WATCH_URL};
use dom::Window;
use futures::future::join_all;
use networking::{LoadError, ResourceManager};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use youtube_media::{LifecycleState, PlayerConfig, PlayerCoordinator, PlayerError};

#[tokio::test]
async fn test_concurrent_loads_request_script_once() {
    let page = Page::new();
    let videos: Vec<_> = (0..5).map(|_| page.video(WATCH_URL)).collect();

    let results = join_all(videos.iter().map(|v| v.load())).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(page.loader.loads(), 1);
    assert_eq!(page.factory.creates(), 5);
    assert!(videos.iter().all(|v| v.state() == LifecycleState::Ready));
}

#[tokio::test]
async fn test_later_loads_reuse_resolved_gate() {
    let page = Page::new();
    let first = page.video(WATCH_URL);
    first.load().await.unwrap();

    let second = page.video(WATCH_URL);
    second.load().await.unwrap();
    assert_eq!(page.loader.loads(), 1);
    assert!(!page.window.has_global_callback(READY_CALLBACK));
}

#[tokio::test]
async fn test_script_failure_reaches_every_instance() {
    let page = Page::new();
    *page.loader.fail.lock() = Some(LoadError::Http {
        status: 404,
        message: "Not Found".into(),
    });
    let a = page.video(WATCH_URL);
    let b = page.video(WATCH_URL);

    let (ra, rb) = futures::join!(a.load(), b.load());
    let expected = PlayerError::ScriptLoad(LoadError::Http {
        status: 404,
        message: "Not Found".into(),
    });
    assert_eq!(ra.unwrap_err(), expected);
    assert_eq!(rb.unwrap_err(), expected);
    assert_eq!(page.loader.loads(), 1);
    assert_eq!(page.factory.creates(), 0);

    assert_eq!(a.state(), LifecycleState::Unloaded);
    assert_eq!(a.error(), Some(expected));
    let container = a.container().unwrap();
    assert!(!page.has_class(container, "video-loading"));
}

#[tokio::test]
async fn test_failed_load_can_be_retried() {
    let page = Page::new();
    *page.loader.fail.lock() = Some(LoadError::Timeout);
    let video = page.video(WATCH_URL);
    assert!(video.load().await.is_err());

    *page.loader.fail.lock() = None;
    video.load().await.unwrap();
    assert_eq!(page.loader.loads(), 2);
    assert_eq!(video.state(), LifecycleState::Ready);
    assert_eq!(page.children(video.container().unwrap()).len(), 2);
}

#[tokio::test]
async fn test_occupied_ready_callback_fails_load() {
    let page = Page::new();
    page.window.install_global_callback(READY_CALLBACK, Arc::new(|| {}));
    let video = page.video(WATCH_URL);

    let err = video.load().await.unwrap_err();
    assert_eq!(err, PlayerError::ReadyCallbackOccupied(READY_CALLBACK.to_string()));
    assert_eq!(page.loader.loads(), 0);
    assert!(page.window.has_global_callback(READY_CALLBACK));
}

#[tokio::test]
async fn test_custom_ready_callback_name() {
    let page = Page::with_config(PlayerConfig::default().with_ready_callback("onApiReady"));
    page.loader.fire_ready.store(false, Ordering::SeqCst);
    let video = page.video(WATCH_URL);

    let mut load = video.load();
    assert!(futures::poll!(&mut load).is_pending());
    assert!(page.window.has_global_callback("onApiReady"));

    page.window.invoke_global_callback("onApiReady");
    load.await.unwrap();
    assert!(video.is_ready());
}

#[tokio::test]
async fn test_script_tag_survives_until_last_instance_destroyed() {
    common::init_tracing();
    let window = Window::blank();
    let fetcher = ApiFetcher::new(&window);
    let manager = Arc::new(ResourceManager::new(Arc::clone(&window), fetcher.clone()));
    let factory = common::FakeFactory::new();
    let coordinator = PlayerCoordinator::new(Arc::clone(&window), manager.clone(), factory.clone());
    let script_url = coordinator.config().script_url.clone();
    let tags = || window.document.read().scripts_with_src(&script_url).len();

    let videos: Vec<_> = (0..3)
        .map(|_| {
            let element = {
                let mut doc = window.document.write();
                let node = doc.create_element("video");
                doc.tree.get_element_mut(node).unwrap().set_attribute("src", WATCH_URL);
                doc.append_to_body(node);
                node
            };
            coordinator.create_video(element)
        })
        .collect();

    let results = join_all(videos.iter().map(|v| v.load())).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(tags(), 1);

    videos[0].destroy().await;
    assert_eq!(tags(), 1);
    videos[1].destroy().await;
    assert_eq!(tags(), 1);
    videos[2].destroy().await;
    assert_eq!(tags(), 0);
    assert!(!manager.is_tracked(&script_url));
    assert!(!coordinator.script_requested());
}

#[tokio::test]
async fn test_new_session_after_teardown_loads_again() {
    let page = Page::new();
    let first = page.video(WATCH_URL);
    assert_eq!(first.id(), 1);
    first.load().await.unwrap();
    first.destroy().await;
    assert_eq!(page.loader.unloads(), 1);

    let second = page.video(WATCH_URL);
    assert_eq!(second.id(), 1);
    second.load().await.unwrap();
    assert_eq!(page.loader.loads(), 2);
    assert!(page.window.document.read().get_element_by_id("vplayer1-container").is_some());
}

#[tokio::test]
async fn test_dropped_disconnect_still_releases_gate() {
    let page = Page::new();
    let first = page.video(WATCH_URL);
    first.load().await.unwrap();

    drop(first.disconnected());
    assert_eq!(first.state(), LifecycleState::Destroyed);
    assert!(!page.coordinator.script_requested());
    assert!(!page.window.has_global_callback(READY_CALLBACK));
    assert_eq!(page.loader.unloads(), 0);

    let second = page.video(WATCH_URL);
    assert_eq!(second.id(), 1);
    second.load().await.unwrap();
    assert_eq!(page.loader.loads(), 2);
}
