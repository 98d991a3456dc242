//! Nmap normal-output scraping.
//!
//! `nmap -sn` prints one block per live host:
//!
//! ```text
//! Nmap scan report for router.lan (192.168.1.1)
//! Host is up (0.0021s latency).
//! MAC Address: AA:BB:CC:DD:EE:FF (Acme Corp)
//! ```
//!
//! Three line rules (host with name, host only, hardware address) are the
//! whole contract with nmap's text format and live in this module alone.
//! [`ReportParser`] threads the current host through the lines and yields a
//! [`DiscoveredDevice`] each time a hardware-address line completes a host.

use std::iter::FusedIterator;
use std::str::Lines;
use std::sync::OnceLock;

use regex::Regex;

use lanledger_core::{DiscoveredDevice, MacAddress};

const HOST_WITH_NAME: &str = r"Nmap scan report for (.+?) \(([\d.]+)\)";
const HOST_ONLY: &str = r"Nmap scan report for ([\d.]+)";
const HARDWARE_ADDRESS: &str = r"MAC Address: ([0-9A-Fa-f:]+) \((.+?)\)";
const RUN_SUMMARY: &str =
    r"Nmap done: (\d+) IP address(?:es)? \((\d+) hosts? up\) scanned in ([\d.]+) seconds";

struct Rules {
    host_with_name: Regex,
    host_only: Regex,
    hardware_address: Regex,
    run_summary: Regex,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        host_with_name: Regex::new(HOST_WITH_NAME).expect("host-with-name pattern"),
        host_only: Regex::new(HOST_ONLY).expect("host-only pattern"),
        hardware_address: Regex::new(HARDWARE_ADDRESS).expect("hardware-address pattern"),
        run_summary: Regex::new(RUN_SUMMARY).expect("run-summary pattern"),
    })
}

/// A `Nmap scan report for ...` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostHeader<'a> {
    pub ip: &'a str,
    pub hostname: Option<&'a str>,
}

/// A `MAC Address: ... (...)` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareAddress<'a> {
    pub mac: &'a str,
    pub vendor: &'a str,
}

/// Match a host header. The resolved-name form wins over the bare-IP form.
pub fn match_host_header(line: &str) -> Option<HostHeader<'_>> {
    let rules = rules();

    if let Some(caps) = rules.host_with_name.captures(line) {
        let hostname = caps.get(1).map(|m| m.as_str().trim()).filter(|h| !h.is_empty());
        return Some(HostHeader {
            ip: caps.get(2)?.as_str(),
            hostname,
        });
    }

    let caps = rules.host_only.captures(line)?;
    Some(HostHeader {
        ip: caps.get(1)?.as_str(),
        hostname: None,
    })
}

pub fn match_hardware_address(line: &str) -> Option<HardwareAddress<'_>> {
    let caps = rules().hardware_address.captures(line)?;
    Some(HardwareAddress {
        mac: caps.get(1)?.as_str(),
        vendor: caps.get(2)?.as_str().trim(),
    })
}

/// Lazy, one-shot iterator over the devices of one report.
///
/// Hardware-address lines with no pending host are dropped, as are hosts
/// whose block never reports a hardware address.
pub struct ReportParser<'a> {
    lines: Lines<'a>,
    current: Option<HostHeader<'a>>,
}

/// Start parsing a complete report.
pub fn parse_report(report: &str) -> ReportParser<'_> {
    ReportParser {
        lines: report.lines(),
        current: None,
    }
}

impl<'a> Iterator for ReportParser<'a> {
    type Item = DiscoveredDevice;

    fn next(&mut self) -> Option<DiscoveredDevice> {
        for line in self.lines.by_ref() {
            if let Some(header) = match_host_header(line) {
                self.current = Some(header);
            }

            let Some(hw) = match_hardware_address(line) else {
                continue;
            };

            // take() resets the context so one host never absorbs two MACs.
            match self.current.take() {
                Some(host) => {
                    return Some(DiscoveredDevice {
                        ip: host.ip.to_string(),
                        hostname: host.hostname.map(String::from),
                        mac: MacAddress::new(hw.mac),
                        vendor: hw.vendor.to_string(),
                    });
                }
                None => {
                    tracing::debug!(mac = hw.mac, "Dropping hardware address without host context");
                }
            }
        }
        None
    }
}

impl FusedIterator for ReportParser<'_> {}

/// Totals from nmap's closing `Nmap done:` line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub addresses_scanned: u32,
    pub hosts_up: u32,
    pub elapsed_secs: f64,
}

/// Extract the run summary, if the report has one.
pub fn parse_run_summary(report: &str) -> Option<RunSummary> {
    let rules = rules();
    report.lines().find_map(|line| {
        let caps = rules.run_summary.captures(line)?;
        Some(RunSummary {
            addresses_scanned: caps.get(1)?.as_str().parse().ok()?,
            hosts_up: caps.get(2)?.as_str().parse().ok()?,
            elapsed_secs: caps.get(3)?.as_str().parse().ok()?,
        })
    })
}
