//! Host fact readers and the fixed text each one renders to.
//!
//! Readers return raw values or errors; the `render_*`/`format_*` functions turn
//! them into display text, including the fallback strings. Nothing here caches.

#![allow(missing_docs)]

use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::Path;

pub const UPTIME_UNAVAILABLE: &str = "Up: N/A";
pub const TEMP_UNAVAILABLE: &str = "Temp: N/A";
pub const HOST_UNKNOWN: &str = "Host: Unknown";
pub const IP_NO_NETWORK: &str = "IP: No Network";
pub const IP_ERROR: &str = "IP: Error";

const SECS_PER_DAY: u64 = 86_400;

// ──────────────────── uptime ────────────────────

/// Whole seconds from the first field of `/proc/uptime` style content.
#[must_use]
pub fn parse_uptime_secs(raw: &str) -> Option<u64> {
    let first = raw.split_whitespace().next()?;
    let whole = first.split('.').next()?;
    whole.parse::<u64>().ok()
}

/// `Up: DDd HHh MMm` from one day on, `Up: HH:MM:SS` below that.
#[must_use]
pub fn format_uptime(secs: u64) -> String {
    let hours = (secs % SECS_PER_DAY) / 3600;
    let minutes = (secs % 3600) / 60;
    if secs >= SECS_PER_DAY {
        let days = secs / SECS_PER_DAY;
        format!("Up: {days:02}d {hours:02}h {minutes:02}m")
    } else {
        let seconds = secs % 60;
        format!("Up: {hours:02}:{minutes:02}:{seconds:02}")
    }
}

pub fn read_uptime(path: &Path) -> String {
    fs::read_to_string(path)
        .ok()
        .as_deref()
        .and_then(parse_uptime_secs)
        .map_or_else(|| UPTIME_UNAVAILABLE.to_string(), format_uptime)
}

// ──────────────────── temperature ────────────────────

#[must_use]
pub fn parse_millidegrees(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// `CPU: 45.2C` for a reading of 45231 millidegrees.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_temperature(millidegrees: i64) -> String {
    let celsius = millidegrees as f64 / 1000.0;
    format!("CPU: {celsius:.1}C")
}

pub fn read_temperature(path: &Path) -> String {
    fs::read_to_string(path)
        .ok()
        .as_deref()
        .and_then(parse_millidegrees)
        .map_or_else(|| TEMP_UNAVAILABLE.to_string(), format_temperature)
}

// ──────────────────── hostname ────────────────────

pub fn render_hostname<E>(result: std::result::Result<String, E>) -> String {
    match result {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => HOST_UNKNOWN.to_string(),
    }
}

#[cfg(unix)]
pub fn read_hostname() -> String {
    render_hostname(
        nix::unistd::gethostname().map(|name| name.to_string_lossy().into_owned()),
    )
}

#[cfg(not(unix))]
pub fn read_hostname() -> String {
    HOST_UNKNOWN.to_string()
}

// ──────────────────── network ────────────────────

/// First IPv4 address on any interface not named `loopback`, in enumeration order.
pub fn first_ipv4<I, S>(addrs: I, loopback: &str) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = (S, Option<Ipv4Addr>)>,
    S: AsRef<str>,
{
    addrs
        .into_iter()
        .filter(|(name, _)| name.as_ref() != loopback)
        .find_map(|(_, addr)| addr)
}

pub fn render_ip(result: io::Result<Option<Ipv4Addr>>) -> String {
    match result {
        Ok(Some(addr)) => addr.to_string(),
        Ok(None) => IP_NO_NETWORK.to_string(),
        Err(_) => IP_ERROR.to_string(),
    }
}

/// Every `(interface, IPv4)` pair the kernel reports; non-IPv4 entries carry `None`.
#[cfg(unix)]
pub fn interface_addrs() -> io::Result<Vec<(String, Option<Ipv4Addr>)>> {
    let addrs = nix::ifaddrs::getifaddrs().map_err(io::Error::from)?;
    Ok(addrs
        .map(|ifa| {
            let v4 = ifa
                .address
                .as_ref()
                .and_then(|storage| storage.as_sockaddr_in())
                .map(|sin| Ipv4Addr::from(sin.ip()));
            (ifa.interface_name, v4)
        })
        .collect())
}

#[cfg(not(unix))]
pub fn interface_addrs() -> io::Result<Vec<(String, Option<Ipv4Addr>)>> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

pub fn read_ip_address(loopback: &str) -> String {
    render_ip(interface_addrs().map(|addrs| first_ipv4(addrs, loopback)))
}
