//! Built-in forwarder construction

use contracts::{ContractError, ForwarderDescriptor, ForwarderKind};
use tracing::info;

use crate::error::{ForwarderError, Result};
use crate::handle::ForwarderHandle;
use crate::sinks::{ConsoleForwarder, FileForwarder, TcpServerForwarder, UdpForwarder};

/// Open the transport described by `descriptor` and spawn its worker.
///
/// `custom` kinds are resolved by the registry's factory table, not here.
pub async fn build_forwarder(descriptor: &ForwarderDescriptor) -> Result<ForwarderHandle> {
    descriptor.validate()?;
    let name = descriptor.identity().to_string();

    let handle = match &descriptor.kind {
        ForwarderKind::Console => {
            ForwarderHandle::spawn(descriptor.clone(), ConsoleForwarder::new())
        }
        ForwarderKind::File { path, append } => {
            let forwarder = FileForwarder::open(path, *append)
                .await
                .map_err(|e| ForwarderError::open(&name, e))?;
            ForwarderHandle::spawn(descriptor.clone(), forwarder)
        }
        ForwarderKind::Udp { host, port } => {
            let forwarder = UdpForwarder::connect(host, *port)
                .await
                .map_err(|e| ForwarderError::open(&name, e))?;
            ForwarderHandle::spawn(descriptor.clone(), forwarder)
        }
        ForwarderKind::Tcp { port } => {
            let forwarder = TcpServerForwarder::bind(*port)
                .await
                .map_err(|e| ForwarderError::open(&name, e))?;
            ForwarderHandle::spawn(descriptor.clone(), forwarder)
        }
        ForwarderKind::Custom { factory, .. } => {
            return Err(ContractError::unsupported_kind("forwarder", factory.as_str()).into());
        }
    };

    info!(forwarder = %name, "forwarder started");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_line;
    use contracts::FactoryParams;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_forwarder_end_to_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.nmea");
        let descriptor = ForwarderDescriptor::new(ForwarderKind::File {
            path: path.clone(),
            append: false,
        });

        let handle = build_forwarder(&descriptor).await.unwrap();
        assert_eq!(handle.identity(), &descriptor.identity());
        assert!(handle.try_send(frame_line("$GPZDA,1*00")));
        assert!(handle.try_send(frame_line("$GPZDA,2*00")));
        handle.stop().await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "$GPZDA,1*00\r\n$GPZDA,2*00\r\n");
    }

    #[tokio::test]
    async fn test_custom_kind_is_not_built_in() {
        let descriptor = ForwarderDescriptor::new(ForwarderKind::Custom {
            factory: "mqtt".into(),
            params: FactoryParams::default(),
        });
        let err = build_forwarder(&descriptor).await.unwrap_err();
        assert!(matches!(
            err,
            ForwarderError::Contract(ContractError::UnsupportedKind { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_descriptor_rejected() {
        let descriptor = ForwarderDescriptor {
            queue_capacity: 0,
            ..ForwarderDescriptor::new(ForwarderKind::Console)
        };
        assert!(matches!(
            build_forwarder(&descriptor).await,
            Err(ForwarderError::Contract(ContractError::ConfigValidation { .. }))
        ));
    }
}
