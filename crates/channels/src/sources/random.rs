//! Random transducer generator, handy to exercise a setup without instruments.

use std::time::Duration;

use contracts::{SentenceCallback, SentenceSource};
use nmea_codec::{generate, Transducer};
use rand::Rng;

use super::task::SourceTask;
use crate::ChannelError;

const TALKER: &str = "RN";

/// Emits one XDR sentence per period
#[derive(Debug)]
pub struct RandomSource {
    period: Duration,
    task: SourceTask,
}

impl RandomSource {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period: Duration::from_millis(period_ms.max(1)),
            task: SourceTask::default(),
        }
    }
}

fn reading(kind: char, value: f64, unit: char, name: &str) -> Transducer {
    Transducer {
        kind,
        value: Some(value),
        unit: Some(unit),
        name: Some(name.to_string()),
    }
}

/// One XDR sentence with humidity, pressure, air temperature and voltage
pub(crate) fn random_xdr<R: Rng>(rng: &mut R) -> String {
    generate::xdr(
        TALKER,
        &[
            reading('H', rng.random_range(30.0..90.0), 'P', "HUMI"),
            reading('P', rng.random_range(0.990..1.030), 'B', "BARO"),
            reading('C', rng.random_range(5.0..30.0), 'C', "AIRT"),
            reading('U', rng.random_range(11.5..13.8), 'V', "BAT"),
        ],
    )
}

async fn generate_readings(period: Duration, callback: SentenceCallback) -> Result<(), ChannelError> {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        callback(random_xdr(&mut rand::rng()));
    }
}

impl SentenceSource for RandomSource {
    fn name(&self) -> &str {
        "rnd"
    }

    fn listen(&self, callback: SentenceCallback) {
        self.task.spawn("rnd", generate_readings(self.period, callback));
    }

    fn stop(&self) {
        self.task.stop();
    }

    fn is_listening(&self) -> bool {
        self.task.is_listening()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmea_codec::{valid_checksum, DecodedSentence, FieldDecoder, Nmea0183Decoder};

    #[test]
    fn test_random_xdr_is_valid() {
        let line = random_xdr(&mut rand::rng());
        assert!(valid_checksum(&line));
        let DecodedSentence::Xdr(readings) = Nmea0183Decoder.decode(&line).unwrap() else {
            panic!("expected XDR");
        };
        assert_eq!(readings.len(), 4);
        let humidity = readings[0].value.unwrap();
        assert!((30.0..90.0).contains(&humidity));
    }
}
