//! UdpForwarder - one datagram per sentence

use contracts::{ContractError, Forwarder};
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

pub struct UdpForwarder {
    name: String,
    socket: Option<UdpSocket>,
}

impl UdpForwarder {
    /// Bind an ephemeral local port and connect it to `host:port`
    #[instrument(name = "udp_forwarder_connect")]
    pub async fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect((host, port)).await?;
        debug!(local = ?socket.local_addr().ok(), "udp forwarder connected");

        Ok(Self {
            name: format!("udp:{host}:{port}"),
            socket: Some(socket),
        })
    }
}

impl Forwarder for UdpForwarder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, line: &[u8]) -> Result<(), ContractError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ContractError::forwarder_write(&self.name, "socket closed"))?;
        match socket.send(line).await {
            Ok(_) => Ok(()),
            // nobody listening yet; the datagram is lost, the forwarder is not
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                debug!(forwarder = %self.name, "no listener, datagram dropped");
                Ok(())
            }
            Err(e) => Err(ContractError::forwarder_write(&self.name, e.to_string())),
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        // datagrams are not buffered
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        Ok(())
    }
}
