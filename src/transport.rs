use crate::Error;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, StreamOwned};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, OnceLock};

/// A byte-oriented duplex stream to a peer. Either a plaintext socket or a
/// TLS stream over a freshly connected one, behind a uniform
/// `Read`/`Write`.
pub(crate) struct Transport(Inner);

enum Inner {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Transport {
    /// Resolve the host and connect to the first resolved address,
    /// performing the TLS handshake when `secure`.
    pub fn dial(secure: bool, host: &str, port: u16) -> Result<Transport, Error> {
        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("No address for host: {}", host),
            )
        })?;

        trace!("Dial {}:{} ({})", host, port, addr);

        let tcp = TcpStream::connect(addr)?;

        if !secure {
            return Ok(Transport(Inner::Plain(tcp)));
        }

        let name = ServerName::try_from(host.to_string()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Host is not a valid server name: {}", host),
            )
        })?;

        let conn = ClientConnection::new(tls_config(), name)?;

        Ok(Transport(Inner::Tls(Box::new(StreamOwned::new(conn, tcp)))))
    }

    /// Wrap a pooled plaintext socket.
    pub fn from_tcp(tcp: TcpStream) -> Transport {
        Transport(Inner::Plain(tcp))
    }

    /// The plaintext socket, if this is one. TLS streams are never pooled,
    /// their lifetime is tied to the request that opened them.
    pub fn into_tcp(self) -> Option<TcpStream> {
        match self.0 {
            Inner::Plain(tcp) => Some(tcp),
            Inner::Tls(_) => None,
        }
    }
}

fn tls_config() -> Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

    CONFIG
        .get_or_init(|| {
            let roots = rustls::RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect(),
            };
            Arc::new(
                ClientConfig::builder()
                    .with_root_certificates(roots)
                    .with_no_client_auth(),
            )
        })
        .clone()
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.0 {
            Inner::Plain(v) => v.read(buf),
            Inner::Tls(v) => v.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.0 {
            Inner::Plain(v) => v.write(buf),
            Inner::Tls(v) => v.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Inner::Plain(v) => v.flush(),
            Inner::Tls(v) => v.flush(),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.0 {
            Inner::Plain(_) => write!(f, "Transport::Plain"),
            Inner::Tls(_) => write!(f, "Transport::Tls"),
        }
    }
}
