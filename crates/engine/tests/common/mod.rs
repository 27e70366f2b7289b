//! In-memory remote store used by the engine integration tests.
//!
//! Implements both host seams. Certified reads are the JSON of the
//! requested leaves behind a fixed root marker, which the verifier checks.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use stowage_engine::{EngineConfig, TransferEngine};
use stowage_protocol::{
    AssetMeta, AssetMetaReply, BoxState, CallHandle, ChunkData, ChunkReply, ChunkRequest, FilePut,
    KeyRequest, ObjectKind, PageRequest, PutReply, ShareRequest, StoreError, StoreMethod,
    TransferKey, UnitReply, VisibilityRequest, decode_reply, encode_args,
};
use stowage_remote::{
    CallChannel, CertificateVerifier, CertifiedBlob, RemoteFuture, StatePath, StoreClient,
    TransportError, VerifiedState,
};

const ROOT_MARKER: &[u8] = b"memory-root:";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub meta: AssetMeta,
    pub chunks: BTreeMap<u64, Vec<u8>>,
}

impl StoredObject {
    fn is_complete(&self) -> bool {
        self.chunks.len() as u64 == self.meta.chunk_count
    }
}

/// Status leaves recorded for one call handle.
#[derive(Debug, Clone)]
enum CallStatus {
    Replied(Vec<u8>),
    Rejected { code: u64, message: String },
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<TransferKey, StoredObject>,
    statuses: HashMap<Vec<u8>, CallStatus>,
    next_handle: u64,
    used_bytes: u64,
    balance: u128,
    shares: HashSet<(TransferKey, String)>,
    /// Puts accepted by the channel but never executed.
    lost_puts: HashMap<u64, u32>,
    /// Puts refused by the channel itself.
    failing_puts: HashMap<u64, u32>,
    /// Puts the store rejects without executing.
    rejected_puts: HashMap<u64, u32>,
    /// Puts that execute but reply with a store error.
    refused_puts: HashMap<u64, (u32, StoreError)>,
    failing_reads: u32,
    puts: Vec<(TransferKey, u64)>,
    calls: Vec<StoreMethod>,
    queries: Vec<StoreMethod>,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let inner = Inner {
            balance: 1_000_000_000_000_000,
            ..Inner::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn client(&self) -> StoreClient {
        let store = Arc::new(self.clone());
        StoreClient::new(store.clone(), store)
    }

    pub fn engine(&self, config: EngineConfig) -> TransferEngine {
        TransferEngine::new(self.client(), config)
    }

    // -- fault injection --------------------------------------------------

    /// The next `times` puts of chunk `order` are accepted but lost.
    pub fn lose_put(&self, order: u64, times: u32) {
        self.inner.lock().unwrap().lost_puts.insert(order, times);
    }

    /// The next `times` puts of chunk `order` fail at the channel.
    pub fn fail_put(&self, order: u64, times: u32) {
        self.inner.lock().unwrap().failing_puts.insert(order, times);
    }

    /// The next `times` puts of chunk `order` are rejected by the store.
    pub fn reject_put(&self, order: u64, times: u32) {
        self.inner.lock().unwrap().rejected_puts.insert(order, times);
    }

    /// The next `times` puts of chunk `order` reply with `error`.
    pub fn refuse_put(&self, order: u64, times: u32, error: StoreError) {
        self.inner
            .lock()
            .unwrap()
            .refused_puts
            .insert(order, (times, error));
    }

    /// The next `times` chunk reads fail at the channel.
    pub fn fail_reads(&self, times: u32) {
        self.inner.lock().unwrap().failing_reads = times;
    }

    pub fn set_balance(&self, balance: u128) {
        self.inner.lock().unwrap().balance = balance;
    }

    pub fn set_used_bytes(&self, used: u64) {
        self.inner.lock().unwrap().used_bytes = used;
    }

    pub fn insert_object(&self, meta: AssetMeta, chunks: Vec<Vec<u8>>) {
        let chunks = chunks
            .into_iter()
            .enumerate()
            .map(|(i, c)| (i as u64, c))
            .collect();
        self.inner
            .lock()
            .unwrap()
            .objects
            .insert(meta.key.clone(), StoredObject { meta, chunks });
    }

    // -- inspection -------------------------------------------------------

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(&TransferKey::from(key))
            .cloned()
    }

    /// Accepted puts per chunk order for `key`.
    pub fn put_counts(&self, key: &TransferKey) -> Vec<u32> {
        let inner = self.inner.lock().unwrap();
        let mut counts: Vec<u32> = Vec::new();
        for (k, order) in &inner.puts {
            if k != key {
                continue;
            }
            let order = *order as usize;
            if counts.len() <= order {
                counts.resize(order + 1, 0);
            }
            counts[order] += 1;
        }
        counts
    }

    pub fn put_total(&self) -> usize {
        self.inner.lock().unwrap().puts.len()
    }

    pub fn remote_calls(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.calls.len() + inner.queries.len()
    }

    pub fn calls(&self) -> Vec<StoreMethod> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn is_shared(&self, key: &str, to: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .shares
            .contains(&(TransferKey::from(key), to.to_string()))
    }
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    encode_args(value).unwrap()
}

fn leb128(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

impl Inner {
    fn issue_handle(&mut self) -> CallHandle {
        self.next_handle += 1;
        CallHandle::new(self.next_handle.to_be_bytes().to_vec())
    }

    fn reply(&mut self, handle: &CallHandle, reply: Vec<u8>) {
        self.statuses
            .insert(handle.as_bytes().to_vec(), CallStatus::Replied(reply));
    }

    fn reject(&mut self, handle: &CallHandle, code: u64, message: &str) {
        self.statuses.insert(
            handle.as_bytes().to_vec(),
            CallStatus::Rejected {
                code,
                message: message.into(),
            },
        );
    }

    fn take_fault(faults: &mut HashMap<u64, u32>, order: u64) -> bool {
        match faults.get_mut(&order) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    fn put(&mut self, put: FilePut) -> Result<CallHandle, TransportError> {
        let order = put.chunk.order;
        if Self::take_fault(&mut self.failing_puts, order) {
            return Err(TransportError::ChannelUnavailable("connection reset".into()));
        }
        self.puts.push((put.chunk.key.clone(), order));
        let handle = self.issue_handle();
        if Self::take_fault(&mut self.lost_puts, order) {
            return Ok(handle);
        }
        if Self::take_fault(&mut self.rejected_puts, order) {
            self.reject(&handle, 5, "chunk rejected by store");
            return Ok(handle);
        }
        let refusal = match self.refused_puts.get_mut(&order) {
            Some((n, error)) if *n > 0 => {
                *n -= 1;
                Some(error.clone())
            }
            _ => None,
        };
        if let Some(error) = refusal {
            self.reply(&handle, encode(&PutReply::Err(error)));
            return Ok(handle);
        }

        let chunk = put.chunk;
        let object = self
            .objects
            .entry(chunk.key.clone())
            .or_insert_with(|| StoredObject {
                meta: AssetMeta {
                    key: chunk.key.clone(),
                    kind: put.kind,
                    tier: put.tier,
                    file_name: chunk.file_name.clone(),
                    media_type: chunk.media_type.clone(),
                    total_size: chunk.total_size,
                    chunk_count: chunk.total_chunks,
                    is_private: chunk.is_private,
                    wrapped_key: None,
                },
                chunks: BTreeMap::new(),
            });
        if chunk.wrapped_key.is_some() {
            object.meta.wrapped_key = chunk.wrapped_key;
        }
        let len = chunk.data.len() as u64;
        if object.chunks.insert(order, chunk.data).is_none() {
            self.used_bytes += len;
        }
        self.reply(&handle, encode(&PutReply::Ok(())));
        Ok(handle)
    }

    fn visible(&self, key: &TransferKey) -> Option<&StoredObject> {
        self.objects.get(key).filter(|o| o.is_complete())
    }

    fn update(&mut self, method: StoreMethod, args: &[u8]) -> UnitReply {
        match method {
            StoreMethod::DeleteFile => {
                let req: KeyRequest = decode_reply(args).unwrap();
                match self.objects.remove(&req.key) {
                    Some(_) => Ok(()),
                    None => Err(StoreError::FileKeyErr),
                }
            }
            StoreMethod::ClearAll => {
                self.objects.clear();
                self.used_bytes = 0;
                Ok(())
            }
            StoreMethod::SetVisibility => {
                let req: VisibilityRequest = decode_reply(args).unwrap();
                let object = self.objects.get_mut(&req.key).ok_or(StoreError::FileKeyErr)?;
                object.meta.is_private = req.is_private;
                Ok(())
            }
            StoreMethod::AddPrivateShare => {
                let req: ShareRequest = decode_reply(args).unwrap();
                if !self.objects.contains_key(&req.key) {
                    return Err(StoreError::FileKeyErr);
                }
                if !self.shares.insert((req.key, req.to)) {
                    return Err(StoreError::SharedRepeat);
                }
                Ok(())
            }
            StoreMethod::RemovePrivateShare => {
                let req: ShareRequest = decode_reply(args).unwrap();
                self.shares.remove(&(req.key, req.to));
                Ok(())
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    fn query(&mut self, method: StoreMethod, args: &[u8]) -> Result<Vec<u8>, TransportError> {
        Ok(match method {
            StoreMethod::BoxState => encode(&BoxState {
                memory_size: self.used_bytes,
                stable_memory_size: 0,
                balance: self.balance,
            }),
            StoreMethod::GetAssetMeta => {
                let req: KeyRequest = decode_reply(args).unwrap();
                let reply: AssetMetaReply = self
                    .visible(&req.key)
                    .filter(|o| req.kind.is_none_or(|kind| o.meta.kind == kind))
                    .map(|o| o.meta.clone())
                    .ok_or(StoreError::FileKeyErr);
                encode(&reply)
            }
            StoreMethod::GetPlain | StoreMethod::GetCipher => {
                if self.failing_reads > 0 {
                    self.failing_reads -= 1;
                    return Err(TransportError::ChannelUnavailable("read timed out".into()));
                }
                let req: ChunkRequest = decode_reply(args).unwrap();
                let reply: ChunkReply = match self.visible(&req.key) {
                    None => Err(StoreError::FileKeyErr),
                    Some(o) => o
                        .chunks
                        .get(&req.order)
                        .map(|data| ChunkData {
                            order: req.order,
                            data: data.clone(),
                        })
                        .ok_or(StoreError::FlagErr),
                };
                encode(&reply)
            }
            StoreMethod::GetPageFiles => {
                let req: PageRequest = decode_reply(args).unwrap();
                let page: Vec<AssetMeta> = self
                    .objects
                    .values()
                    .filter(|o| o.is_complete() && o.meta.kind == req.kind)
                    .map(|o| o.meta.clone())
                    .skip(req.page_size as usize * req.page_index as usize)
                    .take(req.page_size as usize)
                    .collect();
                encode(&page)
            }
            StoreMethod::GetFileNums => {
                let kind: ObjectKind = decode_reply(args).unwrap();
                let count = self
                    .objects
                    .values()
                    .filter(|o| o.is_complete() && o.meta.kind == kind)
                    .count() as u64;
                encode(&count)
            }
            other => panic!("unexpected query {other:?}"),
        })
    }
}

impl CallChannel for MemoryStore {
    fn call(&self, method: StoreMethod, args: Vec<u8>) -> RemoteFuture<'_, CallHandle> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(method);
        let result = match method {
            StoreMethod::Put => inner.put(decode_reply(&args).unwrap()),
            _ => {
                let reply = inner.update(method, &args);
                let handle = inner.issue_handle();
                inner.reply(&handle, encode(&reply));
                Ok(handle)
            }
        };
        Box::pin(async move { result })
    }

    fn query(&self, method: StoreMethod, args: Vec<u8>) -> RemoteFuture<'_, Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(method);
        let result = inner.query(method, &args);
        Box::pin(async move { result })
    }

    fn read_state(&self, paths: Vec<StatePath>) -> RemoteFuture<'_, CertifiedBlob> {
        let inner = self.inner.lock().unwrap();
        let leaves: Vec<(Vec<Vec<u8>>, Vec<u8>)> = paths
            .iter()
            .filter_map(|path| {
                let [_, handle, leaf] = path.labels() else {
                    return None;
                };
                let value = match (inner.statuses.get(handle)?, leaf.as_slice()) {
                    (CallStatus::Replied(_), b"status") => b"replied".to_vec(),
                    (CallStatus::Replied(reply), b"reply") => reply.clone(),
                    (CallStatus::Rejected { .. }, b"status") => b"rejected".to_vec(),
                    (CallStatus::Rejected { code, .. }, b"reject_code") => leb128(*code),
                    (CallStatus::Rejected { message, .. }, b"reject_message") => {
                        message.as_bytes().to_vec()
                    }
                    _ => return None,
                };
                Some((path.labels().to_vec(), value))
            })
            .collect();
        let mut blob = ROOT_MARKER.to_vec();
        blob.extend(serde_json::to_vec(&leaves).unwrap());
        Box::pin(async move { Ok(CertifiedBlob::new(blob)) })
    }
}

impl CertificateVerifier for MemoryStore {
    fn verify(&self, blob: &CertifiedBlob) -> Result<VerifiedState, TransportError> {
        let body = blob
            .as_bytes()
            .strip_prefix(ROOT_MARKER)
            .ok_or_else(|| TransportError::Certificate("untrusted root".into()))?;
        let leaves: Vec<(Vec<Vec<u8>>, Vec<u8>)> = serde_json::from_slice(body)
            .map_err(|e| TransportError::Certificate(e.to_string()))?;
        Ok(VerifiedState::from_leaves(
            leaves
                .into_iter()
                .map(|(labels, value)| (StatePath::new(labels), value)),
        ))
    }
}

/// Engine config for tests: small chunks so objects span several.
pub fn small_chunks(chunk_size: usize) -> EngineConfig {
    EngineConfig {
        chunk_size,
        ..EngineConfig::default()
    }
}
