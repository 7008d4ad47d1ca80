//! Contract Test: Engine Dispatch
//!
//! Verifies how the engine turns events and requests into outbound messages.
//!
//! Constraints verified:
//! - Initial snapshot first, when enabled
//! - One topology event → one broadcast message, in event order
//! - Queries are answered with their correlation id
//! - Failures become `error` messages instead of stopping the engine
//! - The initial snapshot is complete even when larger than the channel
//! - A full outbound channel drops live messages instead of blocking
//! - Shutdown is clean, answers in-flight queries and closes the channel

mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_test::assert_ok;

use topoview_core::messages::DetailClass;
use topoview_core::model::{
    ConnectPoint, ControllerNode, Device, DeviceEventType, DeviceId, Event, NodeId, NodeState,
    TopologyEvent,
};
use topoview_core::{ClientRequest, Error, MessageKind, TopologyViewEngine, ViewConfig};

fn config(send_initial_snapshot: bool) -> ViewConfig {
    let mut config = ViewConfig::new();
    config.engine.send_initial_snapshot = send_initial_snapshot;
    config
}

#[tokio::test]
async fn initial_snapshot_precedes_live_events() {
    let topology = topology();
    topology.add_device(Device::new(S1), ports(2)).await;
    let (messages, _) = messages_for(&topology);
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config(true)).unwrap();

    let (_requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    assert_eq!(next_message(&mut outbound).await.kind, MessageKind::AddInstance);
    let device = next_message(&mut outbound).await;
    assert_eq!(device.kind, MessageKind::AddDevice);
    assert_eq!(device.payload["id"], json!(S1));

    // Subscribed before the snapshot was sent, so this is not lost
    topology.add_device(Device::new(S2), Vec::new()).await;
    let live = next_message(&mut outbound).await;
    assert_eq!(live.kind, MessageKind::AddDevice);
    assert_eq!(live.payload["id"], json!(S2));

    assert_ok!(topology.set_device_available(&DeviceId::new(S2), false).await);
    let update = next_message(&mut outbound).await;
    assert_eq!(update.kind, MessageKind::UpdateDevice);
    assert_eq!(update.payload["online"], json!(false));

    assert_ok!(topology.remove_device(&DeviceId::new(S2)).await);
    assert_eq!(next_message(&mut outbound).await.kind, MessageKind::RemoveDevice);

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn disabled_snapshot_sends_nothing_until_an_event() {
    let topology = topology();
    topology.add_device(Device::new(S1), ports(2)).await;
    let (messages, _) = messages_for(&topology);
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config(false)).unwrap();

    let (_requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    assert_quiet(&mut outbound).await;

    topology.add_link(link(S1, 1, S2, 1)).await;
    let message = next_message(&mut outbound).await;
    assert_eq!(message.kind, MessageKind::AddLink);
    assert!(message.is_broadcast());

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn queries_are_answered_with_their_correlation_id() {
    let topology = topology();
    topology.add_device(named_switch(S1, "s1"), ports(3)).await;
    let (messages, _) = messages_for(&topology);
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config(false)).unwrap();

    let (requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    requests_tx
        .send(ClientRequest::RequestDetails {
            sid: 42,
            id: S1.to_string(),
            class: DetailClass::Device,
        })
        .unwrap();
    let reply = next_message(&mut outbound).await;
    assert_eq!(reply.kind, MessageKind::ShowDetails);
    assert_eq!(reply.correlation_id, Some(42));
    assert_eq!(reply.payload["props"]["Ports"], json!("3"));

    requests_tx
        .send(ClientRequest::RequestTraffic {
            sid: 43,
            classes: Vec::new(),
        })
        .unwrap();
    let reply = next_message(&mut outbound).await;
    assert_eq!(reply.kind, MessageKind::ShowTraffic);
    assert_eq!(reply.correlation_id, Some(43));
    assert_eq!(reply.payload, json!({ "paths": [] }));

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn meta_update_is_applied_before_later_events() {
    let topology = topology();
    topology.add_device(Device::new(S1), Vec::new()).await;
    let (messages, _) = messages_for(&topology);
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config(false)).unwrap();

    let (requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    requests_tx
        .send(ClientRequest::UpdateMeta {
            id: S1.to_string(),
            memento: memento(json!({ "x": 300, "y": 150 })),
        })
        .unwrap();
    // Requests are taken in order; once this is answered the update is stored
    requests_tx
        .send(ClientRequest::RequestDetails {
            sid: 1,
            id: S1.to_string(),
            class: DetailClass::Device,
        })
        .unwrap();
    assert_eq!(next_message(&mut outbound).await.kind, MessageKind::ShowDetails);

    assert_ok!(topology.set_device_available(&DeviceId::new(S1), false).await);
    let update = next_message(&mut outbound).await;
    assert_eq!(update.kind, MessageKind::UpdateDevice);
    assert_eq!(update.payload["metaUi"], json!({ "x": 300, "y": 150 }));

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn failures_become_error_messages_and_the_engine_keeps_going() {
    let topology = topology();
    let (messages, _) = messages_for(&topology);
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config(false)).unwrap();

    let (requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    requests_tx
        .send(ClientRequest::RequestDetails {
            sid: 7,
            id: "of:00000000000000ff".to_string(),
            class: DetailClass::Device,
        })
        .unwrap();
    let error = next_message(&mut outbound).await;
    assert_eq!(error.kind, MessageKind::Message);
    assert_eq!(error.correlation_id, Some(7));
    assert_eq!(error.payload["severity"], json!("error"));
    assert!(
        error.payload["message"]
            .as_str()
            .is_some_and(|text| text.contains("of:00000000000000ff"))
    );

    // Still serving
    topology.add_device(Device::new(S3), Vec::new()).await;
    assert_eq!(next_message(&mut outbound).await.kind, MessageKind::AddDevice);

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn events_are_translated_in_arrival_order() {
    let topology = topology();
    let (messages, _) = messages_for(&topology);
    let (source, events_tx) = ControlledEventSource::new();
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(source), &config(false)).unwrap();

    let (_requests_tx, requests) = request_channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(requests, None).await });

    let sequence = [
        DeviceEventType::DeviceAdded,
        DeviceEventType::PortAdded,
        DeviceEventType::DeviceRemoved,
    ];
    for event_type in sequence {
        let event = Event::new(event_type, Device::new(S1));
        events_tx.send(TopologyEvent::Device(event)).unwrap();
    }

    let mut kinds = Vec::new();
    for _ in 0..sequence.len() {
        kinds.push(next_message(&mut outbound).await.kind);
    }
    assert_eq!(
        kinds,
        vec![
            MessageKind::AddDevice,
            MessageKind::UpdateDevice,
            MessageKind::RemoveDevice
        ]
    );

    // The event source ending stops the engine
    drop(events_tx);
    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("engine stops when the event source ends");
    assert_ok!(result.unwrap());
}

#[tokio::test]
async fn snapshot_larger_than_the_channel_arrives_complete() {
    let topology = topology();
    for n in 1..=50 {
        topology
            .add_device(Device::new(format!("of:{:016x}", n)), Vec::new())
            .await;
    }
    let (messages, _) = messages_for(&topology);
    let mut config = config(true);
    config.engine.outbound_channel_capacity = 8;
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config).unwrap();

    let (_requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    // Local node plus fifty devices
    let mut kinds = Vec::new();
    for _ in 0..51 {
        kinds.push(next_message(&mut outbound).await.kind);
    }
    assert_eq!(kinds[0], MessageKind::AddInstance);
    assert!(kinds[1..].iter().all(|kind| *kind == MessageKind::AddDevice));

    // Live events follow once the snapshot is through
    topology.add_link(link(S1, 1, S2, 1)).await;
    assert_eq!(next_message(&mut outbound).await.kind, MessageKind::AddLink);

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn shutdown_during_a_blocked_snapshot_is_clean() {
    let topology = topology();
    for id in [S1, S2, S3] {
        topology.add_device(Device::new(id), Vec::new()).await;
    }
    let (messages, _) = messages_for(&topology);
    let mut config = config(true);
    config.engine.outbound_channel_capacity = 1;
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config).unwrap();

    let (_requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    // Nobody reads, so the snapshot waits after its first message
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("engine stops while the snapshot waits");
    assert_ok!(result.unwrap());

    assert_eq!(next_message(&mut outbound).await.kind, MessageKind::AddInstance);
    assert!(outbound.recv().await.is_none());
}

#[tokio::test]
async fn full_outbound_channel_drops_live_events_instead_of_blocking() {
    let topology = topology();
    let (messages, _) = messages_for(&topology);
    let (source, events_tx) = ControlledEventSource::new();
    let mut config = config(false);
    config.engine.outbound_channel_capacity = 1;
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(source), &config).unwrap();

    let (_requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    // Three events into a channel of one, nobody reading
    for id in [S1, S2, S3] {
        let event = Event::new(DeviceEventType::DeviceAdded, Device::new(id));
        events_tx.send(TopologyEvent::Device(event)).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());

    let first = next_message(&mut outbound).await;
    assert_eq!(first.kind, MessageKind::AddDevice);
    assert_eq!(first.payload["id"], json!(S1));
    assert!(outbound.recv().await.is_none(), "only one message fits");
}

#[tokio::test]
async fn end_of_requests_stops_the_engine_after_pending_replies() {
    let topology = topology();
    topology.add_device(named_switch(S1, "s1"), ports(2)).await;
    let (messages, _) = messages_for(&topology);
    let mut config = config(false);
    config.engine.stop_on_request_end = true;
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config).unwrap();

    let (requests_tx, requests) = request_channel();
    requests_tx
        .send(ClientRequest::RequestDetails {
            sid: 3,
            id: S1.to_string(),
            class: DetailClass::Device,
        })
        .unwrap();
    drop(requests_tx);

    let handle = tokio::spawn(async move { engine.run_with_shutdown(requests, None).await });
    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("engine stops when the request stream ends");
    assert_ok!(result.unwrap());

    let reply = next_message(&mut outbound).await;
    assert_eq!(reply.kind, MessageKind::ShowDetails);
    assert_eq!(reply.correlation_id, Some(3));
    assert!(outbound.recv().await.is_none());
}

#[tokio::test]
async fn end_of_requests_is_ignored_by_default() {
    let topology = topology();
    let (messages, _) = messages_for(&topology);
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config(false)).unwrap();

    let (requests_tx, requests) = request_channel();
    drop(requests_tx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });

    // Still broadcasting after the request stream is gone
    assert_quiet(&mut outbound).await;
    topology.add_device(Device::new(S1), Vec::new()).await;
    assert_eq!(next_message(&mut outbound).await.kind, MessageKind::AddDevice);

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn removals_and_state_changes_reach_the_client() {
    let topology = topology();
    let remote = ControllerNode::new("node-2", ip("10.0.0.2"));
    topology.add_node(remote.clone(), NodeState::Active).await;
    topology.add_device(Device::new(S1), Vec::new()).await;
    topology.add_device(Device::new(S2), Vec::new()).await;
    topology.add_link(link(S1, 1, S2, 1)).await;
    let attached = host("00:00:00:00:00:0a", S1, 3, &["10.0.0.10"]);
    let host_id = attached.id.clone();
    topology.add_host(attached).await;
    let (messages, _) = messages_for(&topology);
    let (engine, mut outbound) =
        TopologyViewEngine::new(messages, Box::new(topology.clone()), &config(false)).unwrap();

    let (_requests_tx, requests) = request_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        engine.run_with_shutdown(requests, Some(shutdown_rx)).await
    });
    // Let the engine subscribe before mutating
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_ok!(topology.remove_host(&host_id).await);
    let message = next_message(&mut outbound).await;
    assert_eq!(message.kind, MessageKind::RemoveHost);
    assert_eq!(message.payload["id"], json!(host_id.to_string()));

    let src = ConnectPoint::device(&DeviceId::new(S1), 1);
    let dst = ConnectPoint::device(&DeviceId::new(S2), 1);
    assert_ok!(topology.remove_link(&src, &dst).await);
    let message = next_message(&mut outbound).await;
    assert_eq!(message.kind, MessageKind::RemoveLink);
    assert_eq!(
        message.payload["id"],
        json!("of:0000000000000001/1-of:0000000000000002/1")
    );

    topology.add_node(remote.clone(), NodeState::Inactive).await;
    let message = next_message(&mut outbound).await;
    assert_eq!(message.kind, MessageKind::UpdateInstance);
    assert_eq!(message.payload["online"], json!(false));

    assert_ok!(topology.remove_node(&NodeId::new("node-2")).await);
    let message = next_message(&mut outbound).await;
    assert_eq!(message.kind, MessageKind::RemoveInstance);
    assert_eq!(message.payload["id"], json!("node-2"));

    // Unknown entities are reported to the caller, not published
    assert!(matches!(
        topology.remove_host(&host_id).await,
        Err(Error::NotFound(_))
    ));
    assert_quiet(&mut outbound).await;

    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test]
async fn invalid_configuration_is_rejected() {
    let topology = topology();
    let (messages, _) = messages_for(&topology);
    let mut config = ViewConfig::new();
    config.display.link_width = 0;

    let Err(err) = TopologyViewEngine::new(messages, Box::new(topology), &config) else {
        panic!("zero link width must be rejected");
    };
    assert!(matches!(err, Error::Config(_)));
}
