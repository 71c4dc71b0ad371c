//! Linear and circular averaging of measurement samples.

use contracts::{Angle, Measure, MeasurementValue};

/// Direction of the resultant of unit vectors, degrees in (-180, 180].
///
/// `None` for an empty input.
pub fn circular_mean<I>(degrees: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (mut sum_sin, mut sum_cos, mut n) = (0.0_f64, 0.0_f64, 0usize);
    for d in degrees {
        let r = d.to_radians();
        sum_sin += r.sin();
        sum_cos += r.cos();
        n += 1;
    }
    if n == 0 {
        return None;
    }
    let (avg_sin, avg_cos) = (sum_sin / n as f64, sum_cos / n as f64);
    Some(avg_sin.atan2(avg_cos).to_degrees())
}

/// Arithmetic mean, `None` for an empty input
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Average a damping window.
///
/// The first sample fixes the variant; samples of another variant (or unit)
/// are skipped. Non-numeric variants yield `None`.
pub fn average(samples: &[MeasurementValue]) -> Option<MeasurementValue> {
    match samples.first()? {
        MeasurementValue::Angle(first) => {
            let kind = first.kind;
            let mean = circular_mean(samples.iter().filter_map(|s| match s {
                MeasurementValue::Angle(a) if a.kind == kind => Some(a.degrees),
                _ => None,
            }))?;
            Some(MeasurementValue::Angle(Angle::new(kind, mean)))
        }
        MeasurementValue::Measure(first) => {
            let unit = first.unit;
            let mean = mean(samples.iter().filter_map(|s| match s {
                MeasurementValue::Measure(m) if m.unit == unit => Some(m.value),
                _ => None,
            }))?;
            Some(MeasurementValue::Measure(Measure::new(unit, mean)))
        }
        MeasurementValue::Scalar(_) => {
            let mean = mean(samples.iter().filter_map(|s| match s {
                MeasurementValue::Scalar(v) => Some(*v),
                _ => None,
            }))?;
            Some(MeasurementValue::Scalar(mean))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angular_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_circular_mean_wraps_north() {
        let m = circular_mean([350.0, 10.0]).unwrap();
        assert!(angular_distance(m, 0.0) < 1e-9, "got {m}");
    }

    #[test]
    fn test_circular_mean_regular() {
        let m = circular_mean([80.0, 90.0, 100.0]).unwrap();
        assert!((m - 90.0).abs() < 1e-9);
        assert!(circular_mean(std::iter::empty()).is_none());
    }

    #[test]
    fn test_average_angle_keeps_range() {
        let samples = vec![
            MeasurementValue::Angle(Angle::deg360(350.0)),
            MeasurementValue::Angle(Angle::deg360(10.0)),
        ];
        let avg = average(&samples).unwrap().as_f64().unwrap();
        assert!((0.0..360.0).contains(&avg));
        assert!(angular_distance(avg, 0.0) < 1e-9);

        let samples = vec![
            MeasurementValue::Angle(Angle::deg180(-170.0)),
            MeasurementValue::Angle(Angle::deg180(170.0)),
        ];
        let avg = average(&samples).unwrap().as_f64().unwrap();
        assert!(angular_distance(avg, 180.0) < 1e-9);
    }

    #[test]
    fn test_average_measure() {
        let samples = vec![
            MeasurementValue::Measure(Measure::knots(5.0)),
            MeasurementValue::Measure(Measure::knots(7.0)),
        ];
        assert_eq!(
            average(&samples),
            Some(MeasurementValue::Measure(Measure::knots(6.0)))
        );
    }

    #[test]
    fn test_average_composite_is_none() {
        let samples = vec![MeasurementValue::Text("x".into())];
        assert!(average(&samples).is_none());
        assert!(average(&[]).is_none());
    }
}
