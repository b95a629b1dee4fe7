use crate::Error;
use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

/// Cache of idle plaintext sockets keyed by (host, port).
///
/// Holds at most one idle socket per key. Clones share the underlying map,
/// so a single pool can serve concurrent requests on many threads; acquire
/// and release are single map operations under the lock and thus
/// linearisable. TLS connections never enter the pool.
#[derive(Clone, Default)]
pub struct Pool {
    idle: Arc<Mutex<HashMap<(String, u16), TcpStream>>>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new() -> Pool {
        Pool::default()
    }

    /// Take the idle socket under the key, if present.
    pub(crate) fn acquire(&self, host: &str, port: u16) -> Option<TcpStream> {
        let got = {
            let mut idle = self.idle.lock().unwrap();
            idle.remove(&(host.to_string(), port))
        };

        if got.is_some() {
            trace!("Pool hit: {}:{}", host, port);
        }

        got
    }

    /// Stash an idle socket under the key. A previous entry under the same
    /// key is closed after the swap; the pool keeps the newer socket.
    pub(crate) fn release(&self, host: &str, port: u16, socket: TcpStream) {
        let prev = {
            let mut idle = self.idle.lock().unwrap();
            idle.insert((host.to_string(), port), socket)
        };

        trace!("Pool release: {}:{}", host, port);

        // dropping outside the lock closes the displaced socket.
        drop(prev);
    }

    /// Close every idle socket and empty the pool.
    pub fn close(&self) {
        let drained: Vec<_> = {
            let mut idle = self.idle.lock().unwrap();
            idle.drain().collect()
        };

        debug!("Pool close: {} idle sockets", drained.len());

        drop(drained);
    }

    /// Number of idle sockets currently held.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap().len()
    }
}

/// Run `f` with a fresh pool, closed again on all exit paths. The sockets
/// of a pool abandoned by a panic close when the map drops with it.
pub fn with_pool<T, F>(f: F) -> Result<T, Error>
where
    F: FnOnce(&Pool) -> Result<T, Error>,
{
    let pool = Pool::new();
    let ret = f(&pool);
    pool.close();
    ret
}
