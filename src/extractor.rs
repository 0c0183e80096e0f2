// src/extractor.rs
//! Serial port discovery and GPRMC fix extraction

use crate::{
    config::SyncConfig,
    error::{ClockSyncError, Result},
    gps::{
        data::{FixResult, SerialPort},
        nmea::{classify_line, LineOutcome},
    },
};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};

/// Enumerate candidate ports in scan order.
///
/// Explicitly configured ports are returned as given. Otherwise devices are
/// grouped by the first prefix they match, in prefix order, and sorted by
/// path within each group.
pub async fn discover_ports(config: &SyncConfig) -> Result<Vec<SerialPort>> {
    let paths = if config.ports.is_empty() {
        candidate_paths(config).await?
    } else {
        config.ports.clone()
    };

    if paths.is_empty() {
        return Err(ClockSyncError::NoDevicesFound);
    }

    tracing::debug!("Candidate ports: {:?}", paths);
    Ok(paths.into_iter().map(|p| config.serial_port(p)).collect())
}

#[cfg(not(windows))]
async fn candidate_paths(config: &SyncConfig) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(&config.device_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Device directory {} does not exist", config.device_dir);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push((
            entry.file_name().to_string_lossy().into_owned(),
            entry.path().to_string_lossy().into_owned(),
        ));
    }

    Ok(order_by_prefix(names, &config.port_prefixes))
}

#[cfg(windows)]
async fn candidate_paths(config: &SyncConfig) -> Result<Vec<String>> {
    let names = tokio_serial::available_ports()?
        .into_iter()
        .map(|info| (info.port_name.clone(), info.port_name))
        .collect();

    Ok(order_by_prefix(names, &config.port_prefixes))
}

/// Keep `(name, path)` pairs whose name starts with a prefix, ordered by prefix then path
fn order_by_prefix(names: Vec<(String, String)>, prefixes: &[String]) -> Vec<String> {
    let mut matched: Vec<(usize, String)> = names
        .into_iter()
        .filter_map(|(name, path)| {
            prefixes
                .iter()
                .position(|prefix| name.starts_with(prefix.as_str()))
                .map(|rank| (rank, path))
        })
        .collect();

    matched.sort();
    matched.into_iter().map(|(_, path)| path).collect()
}

/// Open `port` in raw 8N1 mode and look for an active GPRMC fix.
///
/// The port handle lives only for this call and is closed on every return.
pub async fn scan_port(port: &SerialPort) -> Result<FixResult> {
    tracing::info!("Scanning {} at {} baud", port.path, port.baudrate);

    let serial = tokio_serial::new(&port.path, port.baudrate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(port.read_timeout)
        .open_native_async()
        .map_err(|e| no_fix(port, format!("failed to open serial port: {}", e)))?;

    let mut reader = BufReader::new(serial);
    scan_lines(&mut reader, port).await
}

/// Read up to `port.max_lines` lines from `reader` and return the first active fix.
///
/// A read that exceeds `port.read_timeout`, end of stream, or an I/O error
/// ends the scan of this port.
pub async fn scan_lines<R>(reader: &mut R, port: &SerialPort) -> Result<FixResult>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    for _ in 0..port.max_lines {
        buf.clear();
        match tokio::time::timeout(port.read_timeout, reader.read_until(b'\n', &mut buf)).await {
            Err(_) => {
                return Err(no_fix(
                    port,
                    format!("no data within {:?}", port.read_timeout),
                ))
            }
            Ok(Err(e)) => return Err(no_fix(port, format!("read error: {}", e))),
            Ok(Ok(0)) => return Err(no_fix(port, "end of stream".to_string())),
            Ok(Ok(_)) => {}
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim();

        match classify_line(&port.path, line) {
            LineOutcome::Ignored => tracing::trace!("{}: {}", port.path, line),
            LineOutcome::NoFix => tracing::info!("{}: GPRMC with no fix: {}", port.path, line),
            LineOutcome::Fix(fix) => {
                tracing::info!("{}: active fix: {}", port.path, fix.raw_sentence);
                return Ok(fix);
            }
        }
    }

    Err(no_fix(
        port,
        format!("{} lines without an active fix", port.max_lines),
    ))
}

/// Discover ports and return the first active fix across them
pub async fn extract_fix(config: &SyncConfig) -> Result<FixResult> {
    let ports = discover_ports(config).await?;
    first_fix(&ports, scan_port).await
}

/// Scan `ports` in order with `scan`, stopping at the first fix.
///
/// Per-port failures are logged and skipped; any other error aborts.
pub async fn first_fix<'a, F, Fut>(ports: &'a [SerialPort], mut scan: F) -> Result<FixResult>
where
    F: FnMut(&'a SerialPort) -> Fut,
    Fut: Future<Output = Result<FixResult>>,
{
    for port in ports {
        match scan(port).await {
            Ok(fix) => return Ok(fix),
            Err(e) if e.is_per_port() => tracing::warn!("{}", e),
            Err(e) => return Err(e),
        }
    }

    Err(ClockSyncError::NoValidFix {
        ports_scanned: ports.len(),
    })
}

/// Print the ports discovery would scan
pub async fn list_serial_ports(config: &SyncConfig) -> Result<usize> {
    match discover_ports(config).await {
        Ok(ports) => {
            println!("Candidate serial ports:");
            for port in &ports {
                println!("  {}", port.path);
            }
            Ok(ports.len())
        }
        Err(ClockSyncError::NoDevicesFound) => {
            println!("No serial ports found.");
            Err(ClockSyncError::NoDevicesFound)
        }
        Err(e) => Err(e),
    }
}

fn no_fix(port: &SerialPort, reason: String) -> ClockSyncError {
    ClockSyncError::NoFixOnPort {
        port: port.path.clone(),
        reason,
    }
}
