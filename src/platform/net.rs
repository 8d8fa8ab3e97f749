//! Wired-link detection for the status bar and the network info screen.
//!
//! Address and flag data comes from `getifaddrs`; carrier state, default
//! gateway, and DNS servers come from the kernel's text interfaces
//! (`/sys/class/net`, `/proc/net/route`, `/etc/resolv.conf`). The text
//! parsers are pure so they can be exercised against fixture strings.

use std::fmt::Write as _;
use std::fs;
use std::net::Ipv4Addr;

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;

/// Snapshot of one interface's addressing and link state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Interface name, e.g. "eth0".
    pub interface: String,
    /// Assigned IPv4 address, if any.
    pub ip: Option<Ipv4Addr>,
    /// Subnet mask paired with the address.
    pub netmask: Option<Ipv4Addr>,
    /// Interface up with carrier present.
    pub link_up: bool,
}

impl NetworkInfo {
    /// Connected means link up with an assigned IPv4 address.
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.link_up && self.ip.is_some()
    }
}

/// Polls one named interface.
#[derive(Debug, Clone)]
pub struct NetworkDetector {
    interface: String,
}

impl NetworkDetector {
    #[must_use]
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    /// Current interface snapshot. A missing interface yields a default
    /// (down, unaddressed) snapshot rather than an error.
    #[must_use]
    pub fn info(&self) -> NetworkInfo {
        let mut info = NetworkInfo {
            interface: self.interface.clone(),
            ..NetworkInfo::default()
        };

        let Ok(addrs) = getifaddrs() else {
            return info;
        };
        for entry in addrs {
            if entry.interface_name != self.interface {
                continue;
            }
            let flags_up = entry
                .flags
                .contains(InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING);
            info.link_up = info.link_up || (flags_up && self.carrier_up());

            if let Some(addr) = entry.address.as_ref().and_then(|a| a.as_sockaddr_in()) {
                let ip = Ipv4Addr::from(addr.ip());
                if !ip.is_loopback() {
                    info.ip = Some(ip);
                    info.netmask = entry
                        .netmask
                        .as_ref()
                        .and_then(|m| m.as_sockaddr_in())
                        .map(|m| Ipv4Addr::from(m.ip()));
                }
            }
        }
        info
    }

    /// Short status for the status bar: connected flag plus an abbreviated
    /// `a.b.*` address, or "No Network".
    #[must_use]
    pub fn status(&self) -> (bool, String) {
        let info = self.info();
        match info.ip {
            Some(ip) if info.connected() => {
                let octets = ip.octets();
                (true, format!("{}.{}.*", octets[0], octets[1]))
            }
            _ => (false, "No Network".to_string()),
        }
    }

    /// Formatted lines for the network info screen.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        let info = self.info();
        let gateway = fs::read_to_string("/proc/net/route")
            .ok()
            .and_then(|raw| parse_default_gateway(&raw));
        let dns = fs::read_to_string("/etc/resolv.conf")
            .map(|raw| parse_nameservers(&raw))
            .unwrap_or_default();
        detail_lines(&info, gateway, &dns)
    }

    fn carrier_up(&self) -> bool {
        let path = format!("/sys/class/net/{}/carrier", self.interface);
        match fs::read_to_string(path) {
            Ok(raw) => raw.trim() == "1",
            // Assume up when carrier state is unreadable.
            Err(_) => true,
        }
    }
}

/// Render the info-screen lines from a snapshot. Pure.
#[must_use]
pub fn detail_lines(info: &NetworkInfo, gateway: Option<Ipv4Addr>, dns: &[Ipv4Addr]) -> Vec<String> {
    let mut lines = vec![format!("Interface: {}", info.interface)];

    if !info.link_up {
        lines.push("Status: Link Down".to_string());
        lines.push("Cable: Not Connected".to_string());
        return lines;
    }

    let Some(ip) = info.ip else {
        lines.push("Status: Link Up".to_string());
        lines.push("IP Address: Not Assigned".to_string());
        lines.push("DHCP: Waiting...".to_string());
        return lines;
    };

    lines.push("Status: Connected".to_string());
    lines.push(format!("IP Address: {ip}"));
    if let Some(mask) = info.netmask {
        lines.push(format!("Subnet Mask: {mask}"));
    }
    if let Some(gw) = gateway {
        lines.push(format!("Gateway: {gw}"));
    }
    if !dns.is_empty() {
        let mut line = String::from("DNS: ");
        for (i, server) in dns.iter().enumerate() {
            if i > 0 {
                line.push_str(", ");
            }
            let _ = write!(line, "{server}");
        }
        lines.push(line);
    }
    lines
}

/// Default gateway from `/proc/net/route` contents: the route whose
/// destination is `00000000`, gateway field decoded from little-endian hex.
#[must_use]
pub fn parse_default_gateway(contents: &str) -> Option<Ipv4Addr> {
    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() >= 3 && fields[1] == "00000000" {
            if let Ok(raw) = u32::from_str_radix(fields[2], 16) {
                return Some(Ipv4Addr::from(raw.swap_bytes()));
            }
        }
    }
    None
}

/// IPv4 nameservers from `resolv.conf` contents, excluding loopback.
#[must_use]
pub fn parse_nameservers(contents: &str) -> Vec<Ipv4Addr> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let server = line.strip_prefix("nameserver")?.trim();
            let ip: Ipv4Addr = server.parse().ok()?;
            (!ip.is_loopback()).then_some(ip)
        })
        .collect()
}
