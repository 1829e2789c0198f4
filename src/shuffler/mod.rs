//! Distributed shuffler (spec.md §4.H): N peer workers repartition a global
//! item stream so each worker's output holds exactly the items whose
//! key-shard equals that worker's canonical shard id.

mod wire;

use std::collections::HashMap;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::codec::Codec;
use crate::error::PipeError;
use crate::hash::strong_hash64;
use crate::host_port::HostPort;
use crate::pipe::asynch::{AsyncPipe, Listener, ListenerSet};
use crate::pipe::SyncPipe;
use wire::Frame;

/// Identity key extractor for byte-payload shufflers (spec.md §4.H:
/// "optional keyExtractor (default: identity bytes)").
pub fn identity_key(item: &Vec<u8>) -> Vec<u8> {
    item.clone()
}

pub struct ShufflerConfig {
    pub self_addr: HostPort,
    pub workers: Vec<HostPort>,
    pub frame_max_bytes: usize,
    /// Cumulative deadline for outbound connection retries (spec.md §4.H:
    /// "retrying ... until accepted or until a cumulative deadline elapses
    /// (→ Timeout)").
    pub connect_deadline: Duration,
}

pub struct Shuffler<T: Clone + Send + Sync + 'static> {
    self_addr: HostPort,
    sorted_workers: Vec<HostPort>,
    own_shard: usize,
    frame_max_bytes: usize,
    connect_deadline: Duration,
    codec: Arc<dyn Codec<T>>,
    key_extractor: Arc<dyn Fn(&T) -> Vec<u8> + Send + Sync>,
    upstream: Mutex<Option<Box<dyn SyncPipe<Item = T>>>>,
    listeners: Arc<ListenerSet<T>>,
    cancelled: Arc<AtomicBool>,
    sockets: Arc<Mutex<Vec<TcpStream>>>,
    coordinator: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + Sync + 'static> Shuffler<T> {
    pub fn new(
        upstream: Box<dyn SyncPipe<Item = T>>,
        config: ShufflerConfig,
        codec: Arc<dyn Codec<T>>,
        key_extractor: Arc<dyn Fn(&T) -> Vec<u8> + Send + Sync>,
    ) -> Result<Arc<Self>, PipeError> {
        let sorted_workers = {
            let mut w = config.workers.clone();
            w.sort();
            w
        };
        let own_shard = sorted_workers
            .iter()
            .position(|hp| hp == &config.self_addr)
            .ok_or_else(|| PipeError::validation("self_addr is not a member of workers"))?;

        Ok(Arc::new(Self {
            self_addr: config.self_addr,
            sorted_workers,
            own_shard,
            frame_max_bytes: config.frame_max_bytes,
            connect_deadline: config.connect_deadline,
            codec,
            key_extractor,
            upstream: Mutex::new(Some(upstream)),
            listeners: Arc::new(ListenerSet::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
            sockets: Arc::new(Mutex::new(Vec::new())),
            coordinator: Mutex::new(None),
        }))
    }

    fn run_inbound_reader(
        mut stream: TcpStream,
        codec: Arc<dyn Codec<T>>,
        listeners: Arc<ListenerSet<T>>,
        cancelled: Arc<AtomicBool>,
    ) {
        loop {
            match wire::read_frame(&mut stream) {
                Ok(Frame::Data(bytes)) => match codec.decode(&bytes) {
                    Ok(item) => listeners.notify_item(item),
                    Err(e) => {
                        listeners.notify_error(e);
                        cancelled.store(true, Ordering::Release);
                        return;
                    }
                },
                Ok(Frame::EndOk) => return,
                Ok(Frame::EndErr(message)) => {
                    listeners.notify_error(PipeError::io(message));
                    cancelled.store(true, Ordering::Release);
                    return;
                }
                Err(e) => {
                    if cancelled.load(Ordering::Acquire) {
                        return;
                    }
                    listeners.notify_error(e);
                    cancelled.store(true, Ordering::Release);
                    return;
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_drain(
        upstream: Box<dyn SyncPipe<Item = T>>,
        mut outbound: HashMap<usize, TcpStream>,
        own_shard: usize,
        shard_count: usize,
        frame_max_bytes: usize,
        codec: Arc<dyn Codec<T>>,
        key_extractor: Arc<dyn Fn(&T) -> Vec<u8> + Send + Sync>,
        listeners: Arc<ListenerSet<T>>,
        cancelled: Arc<AtomicBool>,
    ) {
        let mut upstream = upstream;
        if let Err(e) = upstream.start() {
            listeners.notify_error(e);
            cancelled.store(true, Ordering::Release);
            let _ = upstream.close();
            return;
        }

        loop {
            if cancelled.load(Ordering::Acquire) {
                break;
            }
            match upstream.next() {
                Ok(Some(item)) => {
                    let key = key_extractor(&item);
                    let shard = (strong_hash64(&key) % shard_count as u64) as usize;
                    if shard == own_shard {
                        listeners.notify_item(item);
                        continue;
                    }
                    let Some(stream) = outbound.get_mut(&shard) else { continue };
                    let encoded = match codec.encode(&item) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            listeners.notify_error(e);
                            cancelled.store(true, Ordering::Release);
                            break;
                        }
                    };
                    if frame_max_bytes > 0 && encoded.len() > frame_max_bytes {
                        listeners.notify_error(PipeError::excessive_resources(format!(
                            "encoded item ({} bytes) exceeds frame_max_bytes ({})",
                            encoded.len(),
                            frame_max_bytes
                        )));
                        cancelled.store(true, Ordering::Release);
                        break;
                    }
                    if let Err(e) = wire::write_frame(stream, &Frame::Data(encoded)) {
                        listeners.notify_error(e);
                        cancelled.store(true, Ordering::Release);
                        break;
                    }
                }
                Ok(None) => {
                    for stream in outbound.values_mut() {
                        let _ = wire::write_frame(stream, &Frame::EndOk);
                        let _ = stream.shutdown(std::net::Shutdown::Write);
                    }
                    let _ = upstream.close();
                    return;
                }
                Err(e) => {
                    for stream in outbound.values_mut() {
                        let _ = wire::write_frame(stream, &Frame::EndErr(e.to_string()));
                    }
                    listeners.notify_error(e);
                    cancelled.store(true, Ordering::Release);
                    break;
                }
            }
        }
        let _ = upstream.close();
    }
}

impl<T: Clone + Send + Sync + 'static> AsyncPipe<T> for Shuffler<T> {
    fn start(&self) -> Result<(), PipeError> {
        let peer_count = self.sorted_workers.len() - 1;
        let listener = TcpListener::bind((self.self_addr.host.as_str(), self.self_addr.port))?;
        listener.set_nonblocking(true)?;

        let own_shard = self.own_shard;
        let shard_count = self.sorted_workers.len();
        let peers: Vec<HostPort> = self
            .sorted_workers
            .iter()
            .enumerate()
            .filter(|(shard, _)| *shard != own_shard)
            .map(|(_, hp)| hp.clone())
            .collect();
        let peer_shards: Vec<usize> = (0..shard_count).filter(|&s| s != own_shard).collect();

        let upstream = self.upstream.lock().take().ok_or_else(|| PipeError::internal("start called twice"))?;
        let codec = self.codec.clone();
        let key_extractor = self.key_extractor.clone();
        let listeners = self.listeners.clone();
        let cancelled = self.cancelled.clone();
        let sockets = self.sockets.clone();
        let frame_max_bytes = self.frame_max_bytes;
        let connect_deadline = self.connect_deadline;
        let self_shard_for_dial = own_shard;

        let coordinator = std::thread::spawn(move || {
            // Accept `peer_count` inbound connections, one dedicated reader
            // thread each, without ever blocking longer than a short poll
            // interval so `close()` can interrupt promptly.
            let reader_cancelled = cancelled.clone();
            let reader_listeners = listeners.clone();
            let reader_codec = codec.clone();
            let reader_sockets = sockets.clone();
            let acceptor = std::thread::spawn(move || -> Vec<JoinHandle<()>> {
                let mut handles = Vec::with_capacity(peer_count);
                let mut accepted = 0;
                while accepted < peer_count {
                    if reader_cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    match listener.accept() {
                        Ok((mut stream, _addr)) => {
                            stream.set_nonblocking(false).ok();
                            if wire::write_handshake(&mut stream, own_shard as u32).is_err() {
                                continue;
                            }
                            if wire::read_handshake(&mut stream).is_err() {
                                continue;
                            }
                            reader_sockets.lock().push(stream.try_clone().expect("tcp stream clone"));
                            accepted += 1;
                            let listeners = reader_listeners.clone();
                            let codec = reader_codec.clone();
                            let cancelled = reader_cancelled.clone();
                            handles.push(std::thread::spawn(move || {
                                Self::run_inbound_reader(stream, codec, listeners, cancelled)
                            }));
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(10));
                        }
                        Err(_) => break,
                    }
                }
                handles
            });

            // Dial every peer with a different shard id, concurrently.
            let dial_handles: Vec<JoinHandle<Result<(usize, TcpStream), PipeError>>> = peers
                .into_iter()
                .zip(peer_shards)
                .map(|(peer, shard)| {
                    let cancelled = cancelled.clone();
                    std::thread::spawn(move || {
                        let deadline = Instant::now() + connect_deadline;
                        let mut backoff = Duration::from_millis(10);
                        loop {
                            match TcpStream::connect((peer.host.as_str(), peer.port)) {
                                Ok(mut stream) => {
                                    wire::write_handshake(&mut stream, self_shard_for_dial as u32)?;
                                    wire::read_handshake(&mut stream)?;
                                    return Ok((shard, stream));
                                }
                                Err(e) => {
                                    if cancelled.load(Ordering::Acquire) {
                                        return Err(PipeError::io("shuffler cancelled during connect"));
                                    }
                                    let now = Instant::now();
                                    if now >= deadline {
                                        return Err(PipeError::timeout(format!(
                                            "timed out connecting to {peer}: {e}"
                                        )));
                                    }
                                    std::thread::sleep(backoff.min(deadline - now));
                                    backoff = (backoff * 2).min(Duration::from_millis(500));
                                }
                            }
                        }
                    })
                })
                .collect();

            let mut outbound = HashMap::new();
            let mut dial_failed = false;
            for handle in dial_handles {
                match handle.join() {
                    Ok(Ok((shard, stream))) => {
                        sockets.lock().push(stream.try_clone().expect("tcp stream clone"));
                        outbound.insert(shard, stream);
                    }
                    Ok(Err(e)) => {
                        listeners.notify_error(e);
                        cancelled.store(true, Ordering::Release);
                        dial_failed = true;
                    }
                    Err(_) => {
                        listeners.notify_error(PipeError::internal("dial thread panicked"));
                        cancelled.store(true, Ordering::Release);
                        dial_failed = true;
                    }
                }
            }

            let reader_handles = acceptor.join().unwrap_or_default();

            if !dial_failed {
                Self::run_drain(
                    upstream,
                    outbound,
                    own_shard,
                    shard_count,
                    frame_max_bytes,
                    codec,
                    key_extractor,
                    listeners.clone(),
                    cancelled.clone(),
                );
            }

            for handle in reader_handles {
                let _ = handle.join();
            }

            if !listeners.is_terminated() {
                listeners.notify_done();
            }
        });

        *self.coordinator.lock() = Some(coordinator);
        Ok(())
    }

    fn add_listener(&self, listener: Arc<dyn Listener<T>>) {
        self.listeners.add(listener);
    }

    fn progress(&self) -> f32 {
        if self.listeners.is_terminated() {
            1.0
        } else {
            0.0
        }
    }

    fn close(&self) -> Result<(), PipeError> {
        self.cancelled.store(true, Ordering::Release);
        for stream in self.sockets.lock().iter() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        if let Some(coordinator) = self.coordinator.lock().take() {
            let _ = coordinator.join();
        }
        Ok(())
    }
}
