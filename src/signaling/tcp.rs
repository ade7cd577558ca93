use std::{
    io::{BufRead, BufReader, Write},
    net::{Shutdown, TcpStream, ToSocketAddrs},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use crate::{
    log::LogSink,
    signaling::{
        HandlerRegistry, MessageHandler, SignalingChannel, SignalingError, SignalingMessage,
        SubscriptionId,
    },
    sink_debug, sink_info, sink_warn,
};

/// Newline-delimited JSON over a single TCP connection. A relay on the other
/// end forwards each line to the remote peer unchanged.
pub struct TcpSignalingChannel {
    writer: Mutex<TcpStream>,
    registry: Arc<HandlerRegistry>,
    connected: Arc<AtomicBool>,
    logger: Arc<dyn LogSink>,
}

impl TcpSignalingChannel {
    /// Connects and starts the reader thread.
    ///
    /// # Errors
    /// [`SignalingError::Io`] if the connection or the stream clone fails.
    pub fn connect(addr: impl ToSocketAddrs, logger: Arc<dyn LogSink>) -> Result<Self, SignalingError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let read_stream = stream.try_clone()?;

        let registry = Arc::new(HandlerRegistry::new());
        let connected = Arc::new(AtomicBool::new(true));
        {
            let registry = Arc::clone(&registry);
            let connected = Arc::clone(&connected);
            let logger = Arc::clone(&logger);
            thread::Builder::new()
                .name("signaling-reader".into())
                .spawn(move || read_loop(read_stream, &registry, &connected, logger.as_ref()))?;
        }

        sink_info!(logger, "[SIGNALING] connected to {peer}");
        Ok(Self {
            writer: Mutex::new(stream),
            registry,
            connected,
            logger,
        })
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

fn read_loop(
    stream: TcpStream,
    registry: &HandlerRegistry,
    connected: &AtomicBool,
    logger: &dyn LogSink,
) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                sink_warn!(logger, "[SIGNALING] read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match SignalingMessage::from_json(&line) {
            Ok(msg) => {
                sink_debug!(logger, "[SIGNALING] -> {}", msg.kind());
                registry.dispatch(&msg);
            }
            Err(e) => sink_warn!(logger, "[SIGNALING] dropping malformed line: {e}"),
        }
    }
    connected.store(false, Ordering::SeqCst);
    sink_info!(logger, "[SIGNALING] connection closed");
}

impl SignalingChannel for TcpSignalingChannel {
    fn send(&self, msg: &SignalingMessage) -> Result<(), SignalingError> {
        if !self.is_connected() {
            return Err(SignalingError::Disconnected);
        }
        let mut line = msg.to_json()?;
        line.push('\n');

        let mut stream = self.writer.lock().map_err(|_| SignalingError::Disconnected)?;
        stream.write_all(line.as_bytes())?;
        stream.flush()?;
        sink_debug!(self.logger, "[SIGNALING] <- {}", msg.kind());
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) -> SubscriptionId {
        self.registry.add(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registry.remove(id);
    }
}

impl Drop for TcpSignalingChannel {
    fn drop(&mut self) {
        if let Ok(stream) = self.writer.lock() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
