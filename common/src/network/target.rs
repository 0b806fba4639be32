//! # Scan Target Model
//!
//! A scan or ping target is either a literal IP address or a hostname that
//! still has to be resolved.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// An address used as-is.
    Ip(IpAddr),
    /// A name to resolve before probing.
    Hostname(String),
}

impl Target {
    /// The literal address, if no resolution is needed.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Target::Ip(ip) => Some(*ip),
            Target::Hostname(_) => None,
        }
    }
}

impl FromStr for Target {
    type Err = String;

    /// Parses a string into a `Target`.
    ///
    /// Supported formats:
    /// * **Address**: IPv4 or IPv6 (e.g., "192.168.1.5", "::1").
    /// * **Hostname**: dotted labels of letters, digits and hyphens
    ///   (e.g., "scanme.example.org"). A trailing dot is dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed: &str = s.trim();
        if trimmed.is_empty() {
            return Err("target cannot be empty".to_string());
        }

        if let Some(target) = parse_ip(trimmed) {
            return Ok(target);
        }

        parse_hostname(trimmed)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Ip(ip) => write!(f, "{ip}"),
            Target::Hostname(name) => f.write_str(name),
        }
    }
}

fn parse_ip(s: &str) -> Option<Target> {
    s.parse::<IpAddr>().ok().map(Target::Ip)
}

fn parse_hostname(s: &str) -> Result<Target, String> {
    let name: &str = s.strip_suffix('.').unwrap_or(s);

    if name.len() > MAX_HOSTNAME_LEN {
        return Err(format!("hostname is longer than {MAX_HOSTNAME_LEN} characters: {s}"));
    }

    for label in name.split('.') {
        validate_label(label).map_err(|reason| format!("invalid target '{s}': {reason}"))?;
    }

    // Something like "300.1.1.1" is a typo'd address, not a hostname.
    if name.split('.').all(|label| label.chars().all(|c| c.is_ascii_digit())) {
        return Err(format!("invalid IP address: {s}"));
    }

    Ok(Target::Hostname(name.to_ascii_lowercase()))
}

fn validate_label(label: &str) -> Result<(), String> {
    if label.is_empty() {
        return Err("empty label".to_string());
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(format!("label '{label}' exceeds {MAX_LABEL_LEN} characters"));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(format!("label '{label}' starts or ends with a hyphen"));
    }
    if let Some(bad) = label.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_')) {
        return Err(format!("unexpected character '{bad}'"));
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
