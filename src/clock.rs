// src/clock.rs
//! System clock access and the privilege check that guards it

use crate::error::{ClockSyncError, Result};
use crate::gps::data::GpsTimestamp;

/// Something that can set the UTC wall clock
pub trait ClockSetter {
    fn set_utc(&mut self, timestamp: &GpsTimestamp) -> Result<()>;
}

/// The real system clock (`CLOCK_REALTIME`).
///
/// Only Linux and other non-Apple Unix targets can set it; elsewhere
/// `set_utc` reports `ClockSetFailed`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSetter for SystemClock {
    #[cfg(all(unix, not(target_os = "macos")))]
    fn set_utc(&mut self, timestamp: &GpsTimestamp) -> Result<()> {
        use nix::sys::time::TimeSpec;
        use nix::time::{clock_settime, ClockId};

        let when = TimeSpec::new(epoch_seconds(timestamp)?, 0);
        clock_settime(ClockId::CLOCK_REALTIME, when).map_err(|errno| {
            ClockSyncError::ClockSetFailed(format!("clock_settime to {} rejected: {}", timestamp, errno))
        })
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn set_utc(&mut self, timestamp: &GpsTimestamp) -> Result<()> {
        Err(ClockSyncError::ClockSetFailed(format!(
            "setting the clock to {} is not supported on this platform",
            timestamp
        )))
    }
}

/// Seconds since the epoch as the platform's `time_t`.
///
/// A 32-bit `time_t` cannot hold instants past January 2038.
#[cfg(all(unix, not(target_os = "macos")))]
fn epoch_seconds(timestamp: &GpsTimestamp) -> Result<nix::libc::time_t> {
    let seconds = timestamp
        .to_naive()
        .ok_or_else(|| {
            ClockSyncError::MalformedTimestamp(format!("{} is not a valid calendar time", timestamp))
        })?
        .and_utc()
        .timestamp();

    nix::libc::time_t::try_from(seconds).map_err(|_| {
        ClockSyncError::ClockSetFailed(format!(
            "{} is outside the range of this platform's {}-bit time_t",
            timestamp,
            std::mem::size_of::<nix::libc::time_t>() * 8
        ))
    })
}

/// Logs the timestamp instead of touching the clock
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunClock;

impl ClockSetter for DryRunClock {
    fn set_utc(&mut self, timestamp: &GpsTimestamp) -> Result<()> {
        tracing::info!("Dry run: would set system clock to {} UTC", timestamp);
        Ok(())
    }
}

/// Set the clock through `clock`
pub fn apply_clock<C: ClockSetter + ?Sized>(clock: &mut C, timestamp: &GpsTimestamp) -> Result<()> {
    tracing::info!("Setting system clock to {} UTC", timestamp);
    clock.set_utc(timestamp)
}

/// Fail with `InsufficientPrivilege` unless running as root
#[cfg(unix)]
pub fn ensure_privileged() -> Result<()> {
    if nix::unistd::geteuid().is_root() {
        Ok(())
    } else {
        Err(ClockSyncError::InsufficientPrivilege)
    }
}

#[cfg(not(unix))]
pub fn ensure_privileged() -> Result<()> {
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every timestamp it is asked to set
    #[derive(Debug, Default)]
    pub(crate) struct RecordingClock {
        pub calls: Vec<String>,
        pub reject: bool,
    }

    impl ClockSetter for RecordingClock {
        fn set_utc(&mut self, timestamp: &GpsTimestamp) -> Result<()> {
            self.calls.push(timestamp.to_string());
            if self.reject {
                Err(ClockSyncError::ClockSetFailed("EPERM: Operation not permitted".into()))
            } else {
                Ok(())
            }
        }
    }

    fn reference() -> GpsTimestamp {
        GpsTimestamp {
            year: "2094".into(),
            month: "03".into(),
            day: "23".into(),
            hour: "12".into(),
            minute: "35".into(),
            second: "19".into(),
        }
    }

    #[test]
    fn test_apply_clock_passes_formatted_timestamp() {
        let mut clock = RecordingClock::default();
        apply_clock(&mut clock, &reference()).unwrap();
        assert_eq!(clock.calls, vec!["2094-03-23 12:35:19"]);
    }

    #[test]
    fn test_apply_clock_surfaces_rejection() {
        let mut clock = RecordingClock {
            reject: true,
            ..Default::default()
        };
        assert!(matches!(
            apply_clock(&mut clock, &reference()),
            Err(ClockSyncError::ClockSetFailed(_))
        ));
    }

    #[test]
    fn test_dry_run_never_fails() {
        assert!(apply_clock(&mut DryRunClock, &reference()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_privilege_check_matches_euid() {
        let root = nix::unistd::geteuid().is_root();
        assert_eq!(ensure_privileged().is_ok(), root);
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_epoch_seconds_fits_or_reports_range() {
        let expected = reference().to_naive().unwrap().and_utc().timestamp();
        match epoch_seconds(&reference()) {
            Ok(seconds) => assert_eq!(i64::from(seconds), expected),
            Err(ClockSyncError::ClockSetFailed(msg)) => {
                assert_eq!(std::mem::size_of::<nix::libc::time_t>(), 4);
                assert!(msg.contains("32-bit time_t"), "{}", msg);
            }
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_epoch_seconds_before_2038() {
        let ts = GpsTimestamp {
            year: "2024".into(),
            month: "01".into(),
            day: "01".into(),
            hour: "00".into(),
            minute: "00".into(),
            second: "00".into(),
        };
        assert_eq!(i64::from(epoch_seconds(&ts).unwrap()), 1_704_067_200);
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    #[test]
    fn test_system_clock_unsupported_platform() {
        assert!(matches!(
            SystemClock.set_utc(&reference()),
            Err(ClockSyncError::ClockSetFailed(_))
        ));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_system_clock_rejected_without_root() {
        if nix::unistd::geteuid().is_root() {
            return;
        }
        assert!(matches!(
            SystemClock.set_utc(&reference()),
            Err(ClockSyncError::ClockSetFailed(_))
        ));
    }
}
