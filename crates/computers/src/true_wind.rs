//! True wind and current from the boat's speed triangle.
//!
//! Angles are degrees; speeds knots. Vectors are resolved along the bow
//! (or north) and starboard (or east) axes.

use contracts::CurrentVector;

/// True wind relative to the boat and to north
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrueWind {
    pub speed: f64,
    /// -180..180, port negative
    pub angle: f64,
    /// 0..360
    pub direction: f64,
}

fn fold_180(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Remove the boat's own motion from the apparent wind
pub fn true_wind(aws: f64, awa: f64, bsp: f64, heading: f64) -> TrueWind {
    let awa = awa.to_radians();
    let along = aws * awa.cos() - bsp;
    let across = aws * awa.sin();

    let speed = along.hypot(across);
    let angle = if speed == 0.0 {
        0.0
    } else {
        fold_180(across.atan2(along).to_degrees())
    };
    TrueWind {
        speed,
        angle,
        direction: (heading + angle).rem_euclid(360.0),
    }
}

/// Ground track minus water track
pub fn current(cog: f64, sog: f64, heading: f64, bsp: f64) -> CurrentVector {
    let (cog, heading) = (cog.to_radians(), heading.to_radians());
    let north = sog * cog.cos() - bsp * heading.cos();
    let east = sog * cog.sin() - bsp * heading.sin();

    let drift = north.hypot(east);
    let set = if drift == 0.0 {
        0.0
    } else {
        east.atan2(north).to_degrees().rem_euclid(360.0)
    };
    CurrentVector { set, drift }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_true_wind_when_motoring_in_calm() {
        let tw = true_wind(6.0, 0.0, 6.0, 45.0);
        assert!(tw.speed < 1e-9);
        assert_eq!(tw.angle, 0.0);
    }

    #[test]
    fn test_beam_reach_true_wind() {
        // 10 kn of true wind on the beam at 10 kn of speed shows 45 degrees apparent
        let aws = 10.0 * 2f64.sqrt();
        let tw = true_wind(aws, 45.0, 10.0, 0.0);
        assert!((tw.speed - 10.0).abs() < 1e-9);
        assert!((tw.angle - 90.0).abs() < 1e-9);
        assert!((tw.direction - 90.0).abs() < 1e-9);

        let port = true_wind(aws, -45.0, 10.0, 10.0);
        assert!((port.angle + 90.0).abs() < 1e-9);
        assert!((port.direction - 280.0).abs() < 1e-9);
    }

    #[test]
    fn test_current_from_tracks() {
        // Heading north at 5 kn, pushed east at 1 kn
        let sog = 26f64.sqrt();
        let cog = (1.0f64).atan2(5.0).to_degrees();
        let c = current(cog, sog, 0.0, 5.0);
        assert!((c.drift - 1.0).abs() < 1e-9);
        assert!((c.set - 90.0).abs() < 1e-9);

        let still = current(120.0, 4.0, 120.0, 4.0);
        assert!(still.drift < 1e-9);
    }
}
