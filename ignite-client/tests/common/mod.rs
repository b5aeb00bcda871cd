//! Mock Ignite node for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ignite_client::{ClientConfig, NodeAddress, ProtocolVersion, TopologyVersion};
use ignite_core::protocol::{
    OP_GET_BINARY_TYPE, OP_PUT_BINARY_TYPE, RESPONSE_FLAG_ERROR, RESPONSE_FLAG_TOPOLOGY_CHANGED,
    TC_BYTE_ARRAY,
};
use ignite_core::serialization::{write_string_object, write_uuid_object};
use ignite_core::{DataOutput, ObjectDataOutput};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// What the mock answers to one request.
pub enum Reply {
    /// Success with this payload.
    Ok(Vec<u8>),
    /// Failure status with a message.
    Error(i32, String),
}

/// Request handler: op code and payload in, reply out.
pub type Handler = Arc<dyn Fn(i16, &[u8]) -> Reply + Send + Sync>;

/// Handler answering every request with an empty success.
pub fn empty_handler() -> Handler {
    Arc::new(|_, _| Reply::Ok(Vec::new()))
}

/// Handler that stores registered types and serves them back.
pub fn type_store_handler() -> Handler {
    let store: Arc<Mutex<HashMap<i32, Vec<u8>>>> = Arc::default();
    Arc::new(move |op, payload| match op {
        OP_PUT_BINARY_TYPE => {
            let type_id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            store.lock().unwrap().insert(type_id, payload.to_vec());
            Reply::Ok(Vec::new())
        }
        OP_GET_BINARY_TYPE => {
            let type_id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            match store.lock().unwrap().get(&type_id) {
                Some(body) => {
                    let mut reply = vec![1u8];
                    reply.extend_from_slice(body);
                    Reply::Ok(reply)
                }
                None => Reply::Ok(vec![0u8]),
            }
        }
        _ => Reply::Ok(Vec::new()),
    })
}

/// Mock node settings.
#[derive(Clone)]
pub struct MockOptions {
    /// Highest version the node accepts; higher offers are rejected with it.
    pub max_version: ProtocolVersion,
    /// Topology version announced in every response header.
    pub topology: Option<TopologyVersion>,
    /// Node id sent in handshakes.
    pub node_uuid: Uuid,
    /// Request handler.
    pub handler: Handler,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            max_version: ProtocolVersion::LATEST,
            topology: None,
            node_uuid: Uuid::new_v4(),
            handler: empty_handler(),
        }
    }
}

/// A TCP server that speaks enough of the protocol for client tests.
pub struct MockNode {
    address: NodeAddress,
    node_uuid: Uuid,
    ops: Arc<Mutex<Vec<i16>>>,
    handshakes: Arc<Mutex<Vec<ProtocolVersion>>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    accept: JoinHandle<()>,
}

impl MockNode {
    /// Starts a node answering every request with `handler`.
    pub async fn start(handler: Handler) -> Self {
        Self::start_with(MockOptions {
            handler,
            ..Default::default()
        })
        .await
    }

    /// Starts a node with explicit options.
    pub async fn start_with(options: MockOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let node_uuid = options.node_uuid;
        let ops: Arc<Mutex<Vec<i16>>> = Arc::default();
        let handshakes: Arc<Mutex<Vec<ProtocolVersion>>> = Arc::default();
        let tasks: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::default();

        let accept = {
            let ops = Arc::clone(&ops);
            let handshakes = Arc::clone(&handshakes);
            let tasks = Arc::clone(&tasks);
            tokio::spawn(async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let session = Session {
                        node_uuid,
                        options: options.clone(),
                        ops: Arc::clone(&ops),
                        handshakes: Arc::clone(&handshakes),
                    };
                    let task = tokio::spawn(session.run(socket));
                    tasks.lock().unwrap().push(task);
                }
            })
        };

        Self {
            address: NodeAddress::new("127.0.0.1", port),
            node_uuid,
            ops,
            handshakes,
            tasks,
            accept,
        }
    }

    /// Address clients connect to.
    pub fn address(&self) -> NodeAddress {
        self.address.clone()
    }

    /// Node id sent in handshakes.
    pub fn node_uuid(&self) -> Uuid {
        self.node_uuid
    }

    /// Op codes received so far.
    pub fn ops(&self) -> Vec<i16> {
        self.ops.lock().unwrap().clone()
    }

    /// Number of requests received with `op`.
    pub fn count(&self, op: i16) -> usize {
        self.ops().iter().filter(|o| **o == op).count()
    }

    /// Versions offered in handshakes so far.
    pub fn handshakes(&self) -> Vec<ProtocolVersion> {
        self.handshakes.lock().unwrap().clone()
    }

    /// Stops listening and drops every open connection.
    pub async fn shutdown(self) {
        self.accept.abort();
        let _ = self.accept.await;
        let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            task.abort();
            let _ = task.await;
        }
    }
}

struct Session {
    node_uuid: Uuid,
    options: MockOptions,
    ops: Arc<Mutex<Vec<i16>>>,
    handshakes: Arc<Mutex<Vec<ProtocolVersion>>>,
}

async fn read_frame(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let len = socket.read_i32_le().await.ok()?;
    let mut body = vec![0u8; len as usize];
    socket.read_exact(&mut body).await.ok()?;
    Some(body)
}

async fn write_frame(socket: &mut TcpStream, body: &[u8]) -> Option<()> {
    let mut frame = (body.len() as i32).to_le_bytes().to_vec();
    frame.extend_from_slice(body);
    socket.write_all(&frame).await.ok()
}

impl Session {
    async fn run(self, mut socket: TcpStream) {
        let Some(hello) = read_frame(&mut socket).await else {
            return;
        };
        let short = |at: usize| i16::from_le_bytes([hello[at], hello[at + 1]]);
        let offered = ProtocolVersion::new(short(1), short(3), short(5));
        self.handshakes.lock().unwrap().push(offered);

        let mut out = ObjectDataOutput::new();
        if offered > self.options.max_version {
            let max = self.options.max_version;
            out.write_bool(false).unwrap();
            out.write_short(max.major).unwrap();
            out.write_short(max.minor).unwrap();
            out.write_short(max.patch).unwrap();
            write_string_object(&mut out, Some("unsupported version")).unwrap();
            if offered.has_feature_flags() {
                out.write_int(1001).unwrap();
            }
            let _ = write_frame(&mut socket, out.as_bytes()).await;
            return;
        }

        out.write_bool(true).unwrap();
        if offered.has_feature_flags() {
            out.write_ubyte(TC_BYTE_ARRAY).unwrap();
            out.write_int(0).unwrap();
        }
        if offered.has_response_flags() {
            write_uuid_object(&mut out, Some(&self.node_uuid)).unwrap();
        }
        if write_frame(&mut socket, out.as_bytes()).await.is_none() {
            return;
        }

        while let Some(frame) = read_frame(&mut socket).await {
            let op = i16::from_le_bytes([frame[0], frame[1]]);
            let request_id = &frame[2..10];
            self.ops.lock().unwrap().push(op);
            let reply = (self.options.handler)(op, &frame[10..]);

            let mut out = ObjectDataOutput::new();
            out.write_bytes(request_id).unwrap();
            if offered.has_response_flags() {
                let mut flags = 0;
                if self.options.topology.is_some() {
                    flags |= RESPONSE_FLAG_TOPOLOGY_CHANGED;
                }
                if matches!(reply, Reply::Error(..)) {
                    flags |= RESPONSE_FLAG_ERROR;
                }
                out.write_short(flags).unwrap();
                if let Some(topology) = self.options.topology {
                    out.write_long(topology.major).unwrap();
                    out.write_int(topology.minor).unwrap();
                }
                match &reply {
                    Reply::Ok(payload) => out.write_bytes(payload).unwrap(),
                    Reply::Error(status, message) => {
                        out.write_int(*status).unwrap();
                        write_string_object(&mut out, Some(message.as_str())).unwrap();
                    }
                }
            } else {
                match &reply {
                    Reply::Ok(payload) => {
                        out.write_int(0).unwrap();
                        out.write_bytes(payload).unwrap();
                    }
                    Reply::Error(status, message) => {
                        out.write_int(*status).unwrap();
                        write_string_object(&mut out, Some(message.as_str())).unwrap();
                    }
                }
            }
            if write_frame(&mut socket, out.as_bytes()).await.is_none() {
                return;
            }
        }
    }
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Config pointing at `addresses` with a short timeout.
pub fn config_for(addresses: &[NodeAddress], partition_aware: bool) -> ClientConfig {
    ClientConfig::builder()
        .addresses(addresses.iter().cloned())
        .partition_aware(partition_aware)
        .connection_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}
