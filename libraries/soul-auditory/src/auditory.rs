//! Auditory frequency scales
//!
//! Conversions between frequency in Hz and the Cam (ERB-number) scale of
//! ANSI S3.4-2007 (sec 3.5), plus the loudness-level mapping used to report
//! model output in phons.

/// ERB of the auditory filter centred at `centre_freq` Hz (Cambridge ERB, Hz)
///
/// ANSI S3.4-2007 Eq (1).
#[inline]
pub fn erb_width(centre_freq: f64) -> f64 {
    24.673 * (4368e-6 * centre_freq + 1.0)
}

/// Convert frequency in Hz to ERB number in Cams
///
/// ANSI S3.4-2007 Eq (4).
#[inline]
pub fn hz_to_cam(freq: f64) -> f64 {
    21.366 * (4368e-6 * freq + 1.0).log10()
}

/// Convert ERB number in Cams to frequency in Hz
#[inline]
pub fn cam_to_hz(cam: f64) -> f64 {
    (10.0_f64.powf(cam / 21.366) - 1.0) / 4368e-6
}

/// Smallest loudness (sones) given to [`sone_to_phon`], about -49 phons
pub const MIN_SONE: f64 = 1e-15;

/// Convert loudness in sones to loudness level in phons
///
/// Piecewise polynomials of `ln(sone)` fitted to a 1 kHz tone presented at
/// -50 to 137 dB SPL (Moore, Glasberg & Baer 1997). Set `ansi_high_level`
/// when the specific loudness stage uses the ANSI S3.4-2007 high-level law.
///
/// Loudness below [`MIN_SONE`] (including silence) maps to the level of
/// `MIN_SONE`, close to the bottom of the fitted range.
pub fn sone_to_phon(sone: f64, ansi_high_level: bool) -> f64 {
    let s = sone.max(MIN_SONE).ln();

    // above 100 dB
    if s >= 4.253_665_490_676_303_8 {
        if ansi_high_level {
            0.158_076_913_744_744_81 * s.powi(4) - 3.354_456_463_719_172_3 * s.powi(3)
                + 26.263_239_744_515_747 * s.powi(2)
                - 77.333_716_130_360_571 * s
                + 160.228_681_352_926_51
        } else {
            0.001_139_324_922_729_270_3 * s.powi(4) + 0.137_261_268_669_617_21 * s.powi(3)
                - 3.728_344_888_923_078_1 * s.powi(2)
                + 35.999_178_091_248_588 * s
                + 3.432_817_408_500_982_4
        }
    } else if s >= -4.713_705_464_880_052_7 {
        0.000_712_701_248_637_225_98 * s.powi(6) + 0.001_706_164_242_343_532 * s.powi(5)
            - 0.036_623_964_553_686_571 * s.powi(4)
            - 0.128_184_644_568_214_68 * s.powi(3)
            + 1.164_402_138_844_889_5 * s.powi(2)
            + 12.722_826_749_265_581 * s
            + 40.018_310_769_092_793
    } else if s >= -6.790_095_794_016_506_8 {
        0.137_051_643_435_410_46 * s.powi(3)
            + 2.568_304_497_007_050_5 * s.powi(2)
            + 18.190_233_135_520_316 * s
            + 47.984_354_836_906_057
    } else {
        0.000_152_097_985_563_039_97 * s.powi(3)
            + 0.011_105_494_476_957_356 * s.powi(2)
            + 1.990_430_846_672_142_5 * s
            + 12.839_992_137_905_567
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cam_round_trip() {
        for freq in [20.0, 50.0, 100.0, 1000.0, 4000.0, 20000.0] {
            let back = cam_to_hz(hz_to_cam(freq));
            assert!(
                ((back - freq) / freq).abs() < 1e-9,
                "{} Hz came back as {}",
                freq,
                back
            );
        }
    }

    #[test]
    fn test_known_cam_values() {
        // 1 kHz sits at about 15.6 Cams
        assert!((hz_to_cam(1000.0) - 15.59).abs() < 0.01);
        assert_eq!(hz_to_cam(0.0), 0.0);
    }

    #[test]
    fn test_erb_width() {
        // ERB at 1 kHz is about 132.4 Hz
        assert!((erb_width(1000.0) - 132.44).abs() < 0.1);
    }

    #[test]
    fn test_sone_to_phon_reference() {
        // 1 sone is 40 phons by definition
        assert!((sone_to_phon(1.0, true) - 40.0).abs() < 0.1);
        // doubling loudness adds roughly 10 phons at moderate levels
        let p2 = sone_to_phon(2.0, true);
        assert!(p2 > 48.0 && p2 < 52.0, "2 sones -> {} phons", p2);
    }

    #[test]
    fn test_sone_to_phon_silence_is_finite() {
        let floor = sone_to_phon(MIN_SONE, true);
        assert!(floor > -55.0 && floor < -45.0, "floor {} phons", floor);
        assert_eq!(sone_to_phon(0.0, true), floor);
        assert_eq!(sone_to_phon(0.0, false), floor);
        assert!(floor < sone_to_phon(1e-4, true));
    }

    #[test]
    fn test_sone_to_phon_monotonic() {
        let mut previous = f64::NEG_INFINITY;
        let mut sone = 1e-4;
        while sone < 500.0 {
            let phon = sone_to_phon(sone, true);
            assert!(phon > previous);
            previous = phon;
            sone *= 1.1;
        }
    }
}
