//! TcpServerForwarder - broadcast to every connected client

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, Forwarder};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

type Clients = Arc<Mutex<Vec<(SocketAddr, TcpStream)>>>;

/// Listens on a port; each sentence is written to all current clients.
///
/// A client whose write fails is dropped; the forwarder itself keeps running.
pub struct TcpServerForwarder {
    name: String,
    local_addr: SocketAddr,
    clients: Clients,
    acceptor: Option<JoinHandle<()>>,
}

impl TcpServerForwarder {
    /// Listen on every interface
    pub async fn bind(port: u16) -> std::io::Result<Self> {
        Self::bind_addr(("0.0.0.0", port)).await
    }

    #[instrument(name = "tcp_forwarder_bind", skip(addr))]
    pub async fn bind_addr(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let name = format!("tcp:{}", local_addr.port());
        let clients = Clients::default();

        let acceptor = tokio::spawn(accept_loop(
            name.clone(),
            listener,
            Arc::clone(&clients),
        ));
        debug!(%local_addr, "tcp forwarder listening");

        Ok(Self {
            name,
            local_addr,
            clients,
            acceptor: Some(acceptor),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

async fn accept_loop(name: String, listener: TcpListener, clients: Clients) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(forwarder = %name, %peer, error = %e, "set_nodelay failed");
                }
                debug!(forwarder = %name, %peer, "client connected");
                clients.lock().await.push((peer, stream));
            }
            Err(e) => {
                warn!(forwarder = %name, error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

impl Forwarder for TcpServerForwarder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, line: &[u8]) -> Result<(), ContractError> {
        let mut clients = self.clients.lock().await;
        let mut alive = Vec::with_capacity(clients.len());
        for (peer, mut stream) in clients.drain(..) {
            match stream.write_all(line).await {
                Ok(()) => alive.push((peer, stream)),
                Err(e) => debug!(forwarder = %self.name, %peer, error = %e, "client dropped"),
            }
        }
        *clients = alive;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(acceptor) = self.acceptor.take() {
            acceptor.abort();
        }
        let mut clients = self.clients.lock().await;
        for (_, stream) in clients.iter_mut() {
            let _ = stream.shutdown().await;
        }
        clients.clear();
        Ok(())
    }
}

impl Drop for TcpServerForwarder {
    fn drop(&mut self) {
        if let Some(acceptor) = self.acceptor.take() {
            acceptor.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn wait_for_clients(forwarder: &TcpServerForwarder, expected: usize) {
        for _ in 0..100 {
            if forwarder.client_count().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("clients never reached {expected}");
    }

    #[tokio::test]
    async fn test_broadcast_to_clients() {
        let mut forwarder = TcpServerForwarder::bind_addr("127.0.0.1:0").await.unwrap();
        let addr = forwarder.local_addr();

        let mut first = TcpStream::connect(addr).await.unwrap();
        let mut second = TcpStream::connect(addr).await.unwrap();
        wait_for_clients(&forwarder, 2).await;

        let line = b"$CCVDR,84.4,T,,M,0.50,N,,*00\r\n";
        forwarder.write(line).await.unwrap();

        for client in [&mut first, &mut second] {
            let mut buf = vec![0u8; line.len()];
            client.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf[..], &line[..]);
        }

        forwarder.close().await.unwrap();
        assert_eq!(forwarder.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_write_without_clients() {
        let mut forwarder = TcpServerForwarder::bind_addr("127.0.0.1:0").await.unwrap();
        assert!(forwarder.write(b"$GPZDA,1*00\r\n").await.is_ok());
        forwarder.close().await.unwrap();
    }
}
