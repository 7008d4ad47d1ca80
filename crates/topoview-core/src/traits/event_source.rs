// # Topology Event Source Trait
//
// Defines where the viewer's change notifications come from.
//
// ## Usage
//
// ```rust,ignore
// use topoview_core::TopologyEventSource;
// use tokio_stream::StreamExt;
//
// let mut events = source.watch();
// while let Some(event) = events.next().await {
//     println!("topology changed: {:?}", event);
// }
// ```

use std::pin::Pin;
use tokio_stream::Stream;

use crate::model::TopologyEvent;

/// Boxed stream of topology events
pub type EventStream = Pin<Box<dyn Stream<Item = TopologyEvent> + Send + 'static>>;

/// Trait for topology event sources
///
/// # Behavior
///
/// - Only changes that happen after `watch()` returns are delivered
/// - Each call returns an independent subscription
/// - Dropping the stream unsubscribes
pub trait TopologyEventSource: Send + Sync {
    /// Subscribe to topology changes
    fn watch(&self) -> EventStream;
}
