//! Built-in sentence sources

mod file;
mod lines;
mod random;
mod task;
mod tcp;
mod zda;

pub use file::FileSource;
pub use random::RandomSource;
pub use tcp::TcpSource;
pub use zda::ZdaSource;

use contracts::{ChannelDescriptor, ChannelKind, SentenceSource};

use crate::{ChannelError, Result};

/// Build the source for a built-in channel kind.
///
/// `custom` kinds are resolved by the registry's factories, not here.
pub fn build_source(descriptor: &ChannelDescriptor) -> Result<Box<dyn SentenceSource>> {
    descriptor.validate()?;
    let source: Box<dyn SentenceSource> = match &descriptor.kind {
        ChannelKind::File {
            path,
            loop_playback,
            between_records_ms,
        } => Box::new(FileSource::new(
            path.clone(),
            *loop_playback,
            *between_records_ms,
        )),
        ChannelKind::Tcp { host, port } => Box::new(TcpSource::new(host.clone(), *port)),
        ChannelKind::Rnd { period_ms } => Box::new(RandomSource::new(*period_ms)),
        ChannelKind::Zda { period_ms } => Box::new(ZdaSource::new(*period_ms)),
        ChannelKind::Custom { .. } => {
            return Err(ChannelError::UnsupportedKind {
                kind: descriptor.kind.tag().to_string(),
            })
        }
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_builtin_and_reject_custom() {
        let tcp = ChannelDescriptor::new(ChannelKind::Tcp {
            host: "localhost".into(),
            port: 7001,
        });
        assert_eq!(build_source(&tcp).unwrap().name(), "tcp:localhost:7001");

        let custom = ChannelDescriptor::new(ChannelKind::Custom {
            factory: "bmp180".into(),
            params: Default::default(),
        });
        assert!(matches!(
            build_source(&custom),
            Err(ChannelError::UnsupportedKind { .. })
        ));

        let invalid = ChannelDescriptor::new(ChannelKind::Tcp {
            host: String::new(),
            port: 7001,
        });
        assert!(matches!(build_source(&invalid), Err(ChannelError::Invalid(_))));
    }
}
