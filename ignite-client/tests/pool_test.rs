//! Node pool selection, failover and handshake negotiation against mock nodes.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{closed_port, empty_handler, MockNode, MockOptions};
use ignite_client::connection::{ConnectOptions, NodePool, NodeState, SelectionPolicy};
use ignite_client::{IgniteError, NodeAddress, ProtocolVersion};
use ignite_core::protocol::{Request, OP_HEARTBEAT};

fn options() -> ConnectOptions {
    ConnectOptions::new(ProtocolVersion::LATEST).with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn test_sequential_connects_first_node_only() {
    let a = MockNode::start(empty_handler()).await;
    let b = MockNode::start(empty_handler()).await;

    let mut pool = NodePool::new(options(), SelectionPolicy::Sequential);
    pool.connect(&[a.address(), b.address()]).await.unwrap();

    assert_eq!(pool.protocol_version(), Some(ProtocolVersion::LATEST));
    assert_eq!(pool.current_index(), 0);
    assert_eq!(pool.endpoints()[0].state().await, NodeState::Alive);
    assert_eq!(pool.endpoints()[1].state().await, NodeState::Dead);
    assert!(b.handshakes().is_empty());

    let selected = pool.select().await.unwrap();
    assert_eq!(selected.address(), &a.address());
}

#[tokio::test]
async fn test_sequential_skips_unreachable_first_node() {
    let b = MockNode::start(empty_handler()).await;
    let dead = NodeAddress::new("127.0.0.1", closed_port().await);

    let mut pool = NodePool::new(options(), SelectionPolicy::Sequential);
    pool.connect(&[dead, b.address()]).await.unwrap();
    assert_eq!(pool.current_index(), 1);
}

#[tokio::test]
async fn test_three_node_failover() {
    let node1 = MockNode::start(empty_handler()).await;
    let node2 = MockNode::start(empty_handler()).await;
    let node3 = MockNode::start(empty_handler()).await;
    let addresses = [node1.address(), node2.address(), node3.address()];

    let mut pool = NodePool::new(options(), SelectionPolicy::Sequential);
    pool.connect(&addresses).await.unwrap();
    let first = pool.select().await.unwrap();
    assert_eq!(first.address(), &addresses[0]);

    node1.shutdown().await;
    node2.shutdown().await;

    // the broken connection is only noticed by a request
    let err = first.request(&Request::new(OP_HEARTBEAT)).await.unwrap_err();
    assert!(err.is_connection_fatal());
    assert_eq!(first.state().await, NodeState::Dead);

    let selected = pool.select().await.unwrap();
    assert_eq!(selected.address(), &addresses[2]);
    assert_eq!(pool.current_index(), 2);
    selected.request(&Request::new(OP_HEARTBEAT)).await.unwrap();

    node3.shutdown().await;
    let _ = selected.request(&Request::new(OP_HEARTBEAT)).await;
    let err = pool.select().await.unwrap_err();
    assert!(matches!(err, IgniteError::Reconnect(_)));
}

#[tokio::test]
async fn test_partition_aware_connects_every_node() {
    let a = MockNode::start(empty_handler()).await;
    let b = MockNode::start(empty_handler()).await;
    let dead = NodeAddress::new("127.0.0.1", closed_port().await);

    let mut pool = NodePool::new(options(), SelectionPolicy::PartitionAware);
    pool.connect(&[a.address(), dead, b.address()]).await.unwrap();

    assert_eq!(pool.effective_policy(), SelectionPolicy::PartitionAware);
    assert!(pool.endpoints()[0].is_alive().await);
    assert!(!pool.endpoints()[1].is_alive().await);
    assert!(pool.endpoints()[2].is_alive().await);

    for _ in 0..10 {
        let selected = pool.select().await.unwrap();
        assert!(selected.is_alive().await);
        assert_ne!(selected.address(), pool.endpoints()[1].address());
    }

    let by_uuid = pool.node_by_uuid(&b.node_uuid()).await.unwrap();
    assert!(Arc::ptr_eq(&by_uuid, &pool.endpoints()[2]));
}

#[tokio::test]
async fn test_partition_aware_reconnects_when_none_alive() {
    let a = MockNode::start(empty_handler()).await;
    let mut pool = NodePool::new(options(), SelectionPolicy::PartitionAware);
    pool.connect(&[a.address()]).await.unwrap();

    pool.endpoints()[0].close().await;
    let selected = pool.select().await.unwrap();
    assert!(selected.is_alive().await);

    a.shutdown().await;
    pool.endpoints()[0].close().await;
    assert!(matches!(pool.select().await, Err(IgniteError::Reconnect(_))));
}

#[tokio::test]
async fn test_handshake_falls_back_to_server_version() {
    let node = MockNode::start_with(MockOptions {
        max_version: ProtocolVersion::V1_4_0,
        ..Default::default()
    })
    .await;

    let mut pool = NodePool::new(options(), SelectionPolicy::PartitionAware);
    pool.connect(&[node.address()]).await.unwrap();

    assert_eq!(
        node.handshakes(),
        vec![ProtocolVersion::V1_7_0, ProtocolVersion::V1_4_0]
    );
    assert_eq!(pool.protocol_version(), Some(ProtocolVersion::V1_4_0));
    assert_eq!(
        pool.endpoints()[0].node_uuid().await,
        Some(node.node_uuid())
    );
    assert_eq!(pool.effective_policy(), SelectionPolicy::PartitionAware);
}

#[tokio::test]
async fn test_old_server_disables_partition_awareness() {
    let old = ProtocolVersion::new(1, 3, 0);
    let a = MockNode::start_with(MockOptions {
        max_version: old,
        ..Default::default()
    })
    .await;
    let b = MockNode::start_with(MockOptions {
        max_version: old,
        ..Default::default()
    })
    .await;

    let mut pool = NodePool::new(options(), SelectionPolicy::PartitionAware);
    pool.connect(&[a.address(), b.address()]).await.unwrap();

    assert_eq!(pool.protocol_version(), Some(old));
    assert_eq!(pool.effective_policy(), SelectionPolicy::Sequential);
    assert!(pool.endpoints()[0].node_uuid().await.is_none());

    // sequential from the first handshake on: the second node is never opened
    assert!(b.handshakes().is_empty());
    assert_eq!(pool.endpoints()[1].state().await, NodeState::Dead);

    // pre-1.4 response header: status code instead of flags
    let selected = pool.select().await.unwrap();
    let response = selected.request(&Request::new(OP_HEARTBEAT)).await.unwrap();
    assert!(response.is_success());
    assert!(response.topology_version().is_none());
}

#[tokio::test]
async fn test_handshake_rejected_below_minimum() {
    let node = MockNode::start_with(MockOptions {
        max_version: ProtocolVersion::new(1, 1, 0),
        ..Default::default()
    })
    .await;

    let mut pool = NodePool::new(options(), SelectionPolicy::Sequential);
    let err = pool.connect(&[node.address()]).await.unwrap_err();
    assert!(matches!(err, IgniteError::Reconnect(_)));
    assert_eq!(node.handshakes(), vec![ProtocolVersion::V1_7_0]);
}
