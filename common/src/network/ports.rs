//! Port list parsing for the scanner, e.g. `"22,80,8000-8100"`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Ports probed when the user names none.
pub const WELL_KNOWN_PORTS: [u16; 14] = [
    21, 22, 23, 25, 53, 80, 110, 143, 443, 993, 995, 3306, 3389, 5432,
];

/// A sorted, duplicate-free set of ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortList {
    ports: Vec<u16>,
}

impl PortList {
    pub fn well_known() -> Self {
        Self {
            ports: WELL_KNOWN_PORTS.to_vec(),
        }
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl Default for PortList {
    fn default() -> Self {
        Self::well_known()
    }
}

impl FromStr for PortList {
    type Err = String;

    /// Parses comma-separated ports and inclusive `start-end` ranges.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ports: BTreeSet<u16> = BTreeSet::new();

        for part in s.split(',') {
            let part: &str = part.trim();
            if part.is_empty() {
                continue;
            }

            match part.split_once('-') {
                Some((start, end)) => {
                    let start: u16 = parse_port(start)?;
                    let end: u16 = parse_port(end)?;
                    if start > end {
                        return Err(format!("range start is after its end: {part}"));
                    }
                    ports.extend(start..=end);
                }
                None => {
                    ports.insert(parse_port(part)?);
                }
            }
        }

        if ports.is_empty() {
            return Err("no ports given".to_string());
        }

        Ok(Self {
            ports: ports.into_iter().collect(),
        })
    }
}

impl fmt::Display for PortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.ports.iter().map(u16::to_string).collect();
        f.write_str(&joined.join(","))
    }
}

fn parse_port(s: &str) -> Result<u16, String> {
    let s: &str = s.trim();
    match s.parse::<u16>() {
        Ok(0) => Err("port 0 is not scannable".to_string()),
        Ok(port) => Ok(port),
        Err(e) => Err(format!("invalid port '{s}': {e}")),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
