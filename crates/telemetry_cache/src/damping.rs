//! Bounded per-key sample history.

use std::fmt;

use contracts::MeasurementValue;
use ringbuf::{traits::*, HeapRb};

/// Last `size` raw values written for one key.
///
/// Full buffers overwrite their oldest sample, so the length never exceeds
/// the configured size.
pub struct DampingBuffer {
    samples: HeapRb<MeasurementValue>,
}

impl fmt::Debug for DampingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DampingBuffer")
            .field("len", &self.samples.occupied_len())
            .field("size", &self.size())
            .finish()
    }
}

impl DampingBuffer {
    /// Create a buffer holding at most `size` samples (at least one)
    pub fn new(size: usize) -> Self {
        Self {
            samples: HeapRb::new(size.max(1)),
        }
    }

    #[inline]
    pub fn push(&mut self, value: MeasurementValue) {
        self.samples.push_overwrite(value);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.samples.capacity().get()
    }

    /// Copy of the samples, oldest first
    pub fn samples(&self) -> Vec<MeasurementValue> {
        self.samples.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_evicted_first() {
        let mut buffer = DampingBuffer::new(3);
        for v in 1..=5 {
            buffer.push(MeasurementValue::Scalar(v as f64));
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(
            buffer.samples(),
            vec![
                MeasurementValue::Scalar(3.0),
                MeasurementValue::Scalar(4.0),
                MeasurementValue::Scalar(5.0)
            ]
        );
    }

    #[test]
    fn test_zero_size_holds_one() {
        let mut buffer = DampingBuffer::new(0);
        buffer.push(MeasurementValue::Scalar(1.0));
        buffer.push(MeasurementValue::Scalar(2.0));
        assert_eq!(buffer.size(), 1);
        assert_eq!(buffer.samples(), vec![MeasurementValue::Scalar(2.0)]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = DampingBuffer::new(2);
        buffer.push(MeasurementValue::Scalar(1.0));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
