//! Test doubles and fixtures shared by the contract tests
//!
//! Most tests drive a real `MemoryTopology`; the doubles here cover what it
//! cannot do on its own: emitting arbitrary events, failing, and counting
//! calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use topoview_core::error::{Error, Result};
use topoview_core::model::{
    Annotations, ConnectPoint, ControllerNode, Device, DeviceId, Host, HostId, HostLocation, Link,
    Load, Port, PortNumber, TopologyEvent,
};
use topoview_core::traits::{EventStream, HostService, StatisticService, TopologyEventSource};
use topoview_core::{
    ClientRequest, MemoryMetaUiStore, MemoryTopology, OutboundMessage, RequestStream,
    ServiceDirectory, TopologyViewMessages,
};

pub const LOCAL_NODE: &str = "node-1";
pub const S1: &str = "of:0000000000000001";
pub const S2: &str = "of:0000000000000002";
pub const S3: &str = "of:0000000000000003";

pub fn ip(text: &str) -> IpAddr {
    text.parse().expect("valid IP literal")
}

pub fn local_node() -> ControllerNode {
    ControllerNode::new(LOCAL_NODE, ip("10.0.0.1"))
}

/// Empty topology with only the local node
pub fn topology() -> MemoryTopology {
    MemoryTopology::new(local_node())
}

/// Message factory over `topology` with a fresh meta-UI store
pub fn messages_for(topology: &MemoryTopology) -> (TopologyViewMessages, MemoryMetaUiStore) {
    let store = MemoryMetaUiStore::new();
    let messages = TopologyViewMessages::new(
        ServiceDirectory::from_model(Arc::new(topology.clone())),
        Arc::new(store.clone()),
    );
    (messages, store)
}

pub fn ports(count: u64) -> Vec<Port> {
    (1..=count)
        .map(|n| Port {
            number: PortNumber(n),
            enabled: true,
        })
        .collect()
}

/// Switch with a friendly name and a known position
pub fn named_switch(id: &str, name: &str) -> Device {
    let mut device = Device::new(id);
    device.manufacturer = "Nicira, Inc.".to_string();
    device.hw_version = "Open vSwitch".to_string();
    device.sw_version = "2.0.1".to_string();
    device.serial_number = "None".to_string();
    device.chassis_id = topoview_core::model::ChassisId(1);
    device.with_annotations(
        Annotations::new()
            .with("name", name)
            .with("latitude", "37.4")
            .with("longitude", "-122.1"),
    )
}

pub fn link(src: &str, src_port: u64, dst: &str, dst_port: u64) -> Link {
    Link::new(
        ConnectPoint::device(&DeviceId::new(src), src_port),
        ConnectPoint::device(&DeviceId::new(dst), dst_port),
    )
}

/// Untagged host attached to `device`/`port`
pub fn host(mac: &str, device: &str, port: u64, ips: &[&str]) -> Host {
    ips.iter().fold(
        Host::new(mac, HostLocation::new(device, port)),
        |host, addr| host.with_ip(ip(addr)),
    )
}

pub fn memento(value: serde_json::Value) -> topoview_core::MetaUi {
    value.as_object().cloned().expect("memento is a JSON object")
}

/// Serialize anything to a JSON value
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).expect("serializable")
}

/// Receive the next outbound message or give up after a second
pub async fn next_message(rx: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("message within timeout")
        .expect("outbound channel open")
}

/// Assert nothing arrives for a short while
pub async fn assert_quiet(rx: &mut mpsc::Receiver<OutboundMessage>) {
    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "unexpected message: {:?}", result);
}

/// Formatted log output collected while installed as the thread's subscriber
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route warnings and errors on this thread into the capture
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Number of occurrences of `needle` in the captured output
    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Client request stream fed by the test
pub fn request_channel() -> (mpsc::UnboundedSender<ClientRequest>, RequestStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Box::pin(UnboundedReceiverStream::new(rx)))
}

/// An event source the test pushes events into directly
pub struct ControlledEventSource {
    engine_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<TopologyEvent>>>,
}

impl ControlledEventSource {
    pub fn new() -> (Self, mpsc::UnboundedSender<TopologyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            engine_rx: std::sync::Mutex::new(Some(rx)),
        };
        (source, tx)
    }
}

impl TopologyEventSource for ControlledEventSource {
    fn watch(&self) -> EventStream {
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Host service whose backend is down
pub struct FailingHostService;

#[async_trait::async_trait]
impl HostService for FailingHostService {
    async fn host(&self, _host_id: &HostId) -> Result<Host> {
        Err(Error::service("host", "inventory unavailable"))
    }

    async fn hosts(&self) -> Result<Vec<Host>> {
        Err(Error::service("host", "inventory unavailable"))
    }
}

/// Statistic service answering from a fixed table and counting lookups
#[derive(Clone, Default)]
pub struct CountingStatistics {
    loads: Arc<std::sync::Mutex<HashMap<String, Load>>>,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lookup fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn set(&self, link: &Link, load: Load) {
        self.loads.lock().unwrap().insert(link.compact_id(), load);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StatisticService for CountingStatistics {
    async fn load(&self, link: &Link) -> Result<Option<Load>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::service("statistics", "collector timed out"));
        }
        Ok(self.loads.lock().unwrap().get(&link.compact_id()).copied())
    }
}
