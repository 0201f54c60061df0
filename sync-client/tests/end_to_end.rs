//! Primary and companion wired together over the in-memory mesh.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use wearsync_client::{
    LocalUpdateEvent, MemoryIcons, MemoryWeatherSource, MockNetwork, MockTransport, SyncConfig,
    SyncNode, WeatherRecord,
};
use wearsync_core::WeatherIcon;
use wearsync_types::{SnapshotRecord, SyncPath};

struct Mesh {
    network: MockNetwork,
    source: Arc<MemoryWeatherSource>,
    phone: SyncNode<MockTransport>,
}

async fn mesh(metric: bool, icon: &[u8]) -> Mesh {
    let network = MockNetwork::new();
    let source = Arc::new(MemoryWeatherSource::new("Mountain View").with_metric(metric));
    let icons = MemoryIcons::new().with_icon(WeatherIcon::Clear, icon.to_vec());
    let phone = SyncNode::start_primary(
        network.add_node("phone", "Phone"),
        SyncConfig::default(),
        source.clone(),
        Arc::new(icons),
    )
    .await
    .unwrap();
    Mesh {
        network,
        source,
        phone,
    }
}

async fn companion(network: &MockNetwork) -> SyncNode<MockTransport> {
    SyncNode::start_companion(network.add_node("watch", "Watch"), SyncConfig::default())
        .await
        .unwrap()
}

async fn next_update(rx: &mut broadcast::Receiver<LocalUpdateEvent>) -> LocalUpdateEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no update delivered")
        .unwrap()
}

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn imperial_snapshot_arrives_converted() {
    let mesh = mesh(false, b"PNGDATA").await;
    let watch = companion(&mesh.network).await;
    let mut updates = watch.subscribe_updates();

    mesh.source.insert_today(WeatherRecord::new(800, -5.0, -10.0));
    mesh.phone.publish_now().await.unwrap();

    let update = next_update(&mut updates).await;
    assert_eq!(update.high_temp, 23.0);
    assert_eq!(update.low_temp, 14.0);
    assert_eq!(update.icon_bytes, b"PNGDATA");
}

#[tokio::test]
async fn request_triggers_exactly_one_publish() {
    let mesh = mesh(true, b"PNGDATA").await;
    mesh.source.insert_today(WeatherRecord::new(800, 21.0, 9.0));

    let watch = companion(&mesh.network).await;
    let mut updates = watch.subscribe_updates();
    watch.request_weather();

    let update = next_update(&mut updates).await;
    assert_eq!(update.high_temp, 21.0);
    settle().await;

    assert_eq!(mesh.network.sent_messages().len(), 1);
    assert_eq!(mesh.network.put_requests().len(), 1);
}

#[tokio::test]
async fn request_fans_out_and_isolates_failures() {
    let network = MockNetwork::new();
    let mut primaries = Vec::new();
    for id in ["phone", "tablet", "laptop"] {
        let source = Arc::new(MemoryWeatherSource::new("Oslo"));
        source.insert_today(WeatherRecord::new(600, -2.0, -9.0));
        primaries.push(
            SyncNode::start_primary(
                network.add_node(id, id),
                SyncConfig::default(),
                source,
                Arc::new(MemoryIcons::placeholder()),
            )
            .await
            .unwrap(),
        );
    }
    network.reject_messages_to("tablet");

    let watch = companion(&network).await;
    let report = watch.request_weather().await.unwrap().unwrap();
    assert_eq!(report.issued(), 3);

    let outcomes = report.settle().await;
    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.result.is_err())
        .map(|o| o.peer.id.as_str())
        .collect();
    assert_eq!(failed, ["tablet"]);
    assert_eq!(network.sent_messages().len(), 2);
}

#[tokio::test]
async fn no_source_data_means_no_write_and_no_update() {
    let mesh = mesh(true, b"PNGDATA").await;
    let watch = companion(&mesh.network).await;
    let mut updates = watch.subscribe_updates();

    let report = watch.request_weather().await.unwrap().unwrap();
    report.settle().await;
    settle().await;

    assert!(mesh.network.put_requests().is_empty());
    assert!(updates.try_recv().is_err());
}

#[tokio::test]
async fn last_publish_wins() {
    let mesh = mesh(true, b"PNGDATA").await;
    let watch = companion(&mesh.network).await;
    let mut updates = watch.subscribe_updates();

    mesh.source.insert_today(WeatherRecord::new(800, 10.0, 1.0));
    mesh.phone.publish_now().await.unwrap();
    mesh.source.insert_today(WeatherRecord::new(800, 12.0, 3.0));
    mesh.phone.publish_now().await.unwrap();

    let item = mesh.network.data_item(SyncPath::Weather).unwrap();
    let record = SnapshotRecord::from_bytes(&item.payload).unwrap();
    assert_eq!(record.high_temp, 12.0);

    assert_eq!(next_update(&mut updates).await.high_temp, 10.0);
    assert_eq!(next_update(&mut updates).await.high_temp, 12.0);
}

#[tokio::test]
async fn companion_without_reachable_primary_stays_quiet() {
    let mesh = mesh(true, b"PNGDATA").await;
    mesh.source.insert_today(WeatherRecord::new(800, 21.0, 9.0));
    mesh.network.set_reachable("phone", false);

    let watch = companion(&mesh.network).await;
    let report = watch.request_weather().await.unwrap().unwrap();

    assert_eq!(report.issued(), 0);
    assert!(mesh.network.sent_messages().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn startup_request_is_not_lost_across_threads() {
    let mesh = mesh(false, b"PNGDATA").await;
    mesh.source.insert_today(WeatherRecord::new(800, -5.0, -10.0));

    let watch = companion(&mesh.network).await;
    let mut updates = watch.subscribe_updates();
    watch.request_weather();

    let update = next_update(&mut updates).await;
    assert_eq!(update.high_temp, 23.0);
    assert_eq!(update.icon_bytes, b"PNGDATA");
}
