/// Chapman-layer electron density [m-3] at `altitude_km`.
pub fn chapman_density(altitude_km: f64, peak_density: f64, peak_km: f64, scale_km: f64) -> f64 {
    let z = (altitude_km - peak_km) / scale_km;
    peak_density * (0.5 * (1.0 - z - (-z).exp())).exp()
}

/// Ion temperature [K] rising linearly with altitude from a lower-thermosphere base.
pub fn ion_temperature(altitude_km: f64) -> f64 {
    (400.0 + 2.5 * (altitude_km - 100.0)).clamp(400.0, 2000.0)
}

/// Electron temperature [K], kept above the ion temperature.
pub fn electron_temperature(altitude_km: f64) -> f64 {
    ion_temperature(altitude_km) * 1.6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapman_peaks_at_peak_altitude() {
        let peak = chapman_density(300.0, 2e11, 300.0, 50.0);
        assert!((peak - 2e11).abs() < 1.0);
        assert!(chapman_density(200.0, 2e11, 300.0, 50.0) < peak);
        assert!(chapman_density(450.0, 2e11, 300.0, 50.0) < peak);
    }

    #[test]
    fn temperatures_increase_with_altitude() {
        assert!(ion_temperature(300.0) > ion_temperature(200.0));
        assert!(electron_temperature(300.0) > ion_temperature(300.0));
    }
}
