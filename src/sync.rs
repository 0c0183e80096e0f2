// src/sync.rs
//! Drives a single clock sync from port scan to clock update

use crate::{
    clock::{apply_clock, ClockSetter},
    config::SyncConfig,
    error::{ClockSyncError, Result},
    extractor,
    gps::{
        data::{FixResult, GpsTimestamp},
        nmea::derive_timestamp,
    },
};

/// Where a sync run currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Scanning,
    FixFound(FixResult),
    TimestampDerived(GpsTimestamp),
    ClockSet(GpsTimestamp),
    Failed(String),
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub fix: FixResult,
    pub timestamp: GpsTimestamp,
}

/// One-shot sync: scan ports, derive the time, set the clock.
///
/// There are no retries; the first failure is terminal.
pub struct ClockSync<C: ClockSetter> {
    config: SyncConfig,
    clock: C,
    phase: SyncPhase,
}

impl<C: ClockSetter> ClockSync<C> {
    pub fn new(config: SyncConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            phase: SyncPhase::Idle,
        }
    }

    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Scan every candidate port, then finish with the first fix
    pub async fn run(&mut self) -> Result<SyncOutcome> {
        self.transition(SyncPhase::Scanning);

        let fix = match extractor::extract_fix(&self.config).await {
            Ok(fix) => fix,
            Err(e) => return Err(self.fail(e)),
        };

        self.complete(fix)
    }

    /// Derive the timestamp from `fix` and set the clock
    pub fn complete(&mut self, fix: FixResult) -> Result<SyncOutcome> {
        self.transition(SyncPhase::FixFound(fix.clone()));

        let timestamp = match derive_timestamp(&fix) {
            Ok(ts) => ts,
            Err(e) => return Err(self.fail(e)),
        };
        self.transition(SyncPhase::TimestampDerived(timestamp.clone()));

        if let Err(e) = apply_clock(&mut self.clock, &timestamp) {
            return Err(self.fail(e));
        }
        self.transition(SyncPhase::ClockSet(timestamp.clone()));

        Ok(SyncOutcome { fix, timestamp })
    }

    fn transition(&mut self, phase: SyncPhase) {
        tracing::debug!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn fail(&mut self, error: ClockSyncError) -> ClockSyncError {
        self.transition(SyncPhase::Failed(error.to_string()));
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::tests::RecordingClock;
    use crate::gps::nmea::{classify_line, LineOutcome};

    fn fix(line: &str) -> FixResult {
        match classify_line("/dev/ttyUSB0", line) {
            LineOutcome::Fix(fix) => fix,
            other => panic!("expected a fix, got {:?}", other),
        }
    }

    fn sync_with(clock: RecordingClock) -> ClockSync<RecordingClock> {
        ClockSync::new(SyncConfig::default(), clock)
    }

    #[test]
    fn test_reference_sentence_sets_clock() {
        let mut sync = sync_with(RecordingClock::default());
        let outcome = sync
            .complete(fix("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A"))
            .unwrap();

        assert_eq!(outcome.timestamp.to_string(), "2094-03-23 12:35:19");
        assert_eq!(outcome.fix.port, "/dev/ttyUSB0");
        assert_eq!(sync.clock().calls, vec!["2094-03-23 12:35:19"]);
        assert_eq!(sync.phase(), &SyncPhase::ClockSet(outcome.timestamp));
    }

    #[test]
    fn test_malformed_timestamp_never_touches_clock() {
        let mut sync = sync_with(RecordingClock::default());
        let err = sync
            .complete(fix("$GPRMC,1235,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A"))
            .unwrap_err();

        assert!(matches!(err, ClockSyncError::MalformedTimestamp(_)));
        assert!(sync.clock().calls.is_empty());
        assert!(matches!(sync.phase(), SyncPhase::Failed(_)));
    }

    #[test]
    fn test_clock_rejection_is_terminal() {
        let mut sync = sync_with(RecordingClock {
            reject: true,
            ..Default::default()
        });
        let err = sync
            .complete(fix("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A"))
            .unwrap_err();

        assert!(matches!(err, ClockSyncError::ClockSetFailed(_)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(sync.clock().calls.len(), 1);
        assert!(matches!(sync.phase(), SyncPhase::Failed(msg) if msg.contains("EPERM")));
    }

    #[tokio::test]
    async fn test_no_devices_fails_before_clock() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyncConfig {
            device_dir: dir.path().to_string_lossy().into_owned(),
            port_prefixes: vec!["ttyUSB".to_string()],
            ..SyncConfig::default()
        };
        let mut sync = ClockSync::new(config, RecordingClock::default());

        let err = sync.run().await.unwrap_err();
        assert!(matches!(err, ClockSyncError::NoDevicesFound));
        assert_eq!(err.exit_code(), 1);
        assert!(sync.clock().calls.is_empty());
        assert!(matches!(sync.phase(), SyncPhase::Failed(_)));
    }
}
