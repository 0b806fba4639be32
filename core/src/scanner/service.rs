/// Services named by their well-known port.
const PORT_SERVICES: [(u16, &str); 14] = [
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
];

/// Checked in order against the lowercased banner.
const BANNER_KEYWORDS: [(&str, &str); 4] = [("ssh", "SSH"), ("http", "HTTP"), ("ftp", "FTP"), ("smtp", "SMTP")];

/// Names the service behind an open port: the port table wins, the banner
/// is only consulted for unlisted ports.
pub fn identify_service(port: u16, banner: Option<&str>) -> Option<&'static str> {
    if let Some((_, name)) = PORT_SERVICES.iter().find(|(known, _)| *known == port) {
        return Some(*name);
    }

    let banner: String = banner?.to_ascii_lowercase();
    BANNER_KEYWORDS
        .iter()
        .find(|(keyword, _)| banner.contains(keyword))
        .map(|(_, name)| *name)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
