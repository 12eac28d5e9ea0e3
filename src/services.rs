//! Service detection based on well-known port numbers.
//!
//! Provides mapping from port numbers to registered service names, using the
//! names found in a typical `/etc/services`.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Label used for ports with no registered service.
pub const CUSTOM_LABEL: &str = "CUSTOM";

/// Static map of well-known TCP ports to service names.
static PORT_SERVICES: LazyLock<HashMap<u16, &'static str>> = LazyLock::new(|| {
    [
        (7, "echo"),
        (9, "discard"),
        (13, "daytime"),
        (20, "ftp-data"),
        (21, "ftp"),
        (22, "ssh"),
        (23, "telnet"),
        (25, "smtp"),
        (37, "time"),
        (43, "whois"),
        (53, "domain"),
        (70, "gopher"),
        (79, "finger"),
        (80, "http"),
        (88, "kerberos"),
        (110, "pop3"),
        (111, "sunrpc"),
        (113, "auth"),
        (119, "nntp"),
        (123, "ntp"),
        (135, "epmap"),
        (137, "netbios-ns"),
        (138, "netbios-dgm"),
        (139, "netbios-ssn"),
        (143, "imap2"),
        (161, "snmp"),
        (179, "bgp"),
        (194, "irc"),
        (389, "ldap"),
        (443, "https"),
        (445, "microsoft-ds"),
        (464, "kpasswd"),
        (465, "submissions"),
        (513, "login"),
        (514, "shell"),
        (515, "printer"),
        (543, "klogin"),
        (544, "kshell"),
        (548, "afpovertcp"),
        (554, "rtsp"),
        (587, "submission"),
        (631, "ipp"),
        (636, "ldaps"),
        (873, "rsync"),
        (993, "imaps"),
        (995, "pop3s"),
        (1080, "socks"),
        (1194, "openvpn"),
        (1433, "ms-sql-s"),
        (1434, "ms-sql-m"),
        (1521, "ncube-lm"),
        (1701, "l2f"),
        (1723, "pptp"),
        (1812, "radius"),
        (1813, "radius-acct"),
        (1883, "mqtt"),
        (2049, "nfs"),
        (2181, "zookeeper"),
        (2375, "docker"),
        (2376, "docker-s"),
        (3128, "squid"),
        (3260, "iscsi-target"),
        (3306, "mysql"),
        (3389, "ms-wbt-server"),
        (3690, "svn"),
        (4369, "epmd"),
        (5060, "sip"),
        (5061, "sip-tls"),
        (5222, "xmpp-client"),
        (5269, "xmpp-server"),
        (5353, "mdns"),
        (5432, "postgresql"),
        (5672, "amqp"),
        (5900, "rfb"),
        (5984, "couchdb"),
        (6379, "redis"),
        (6443, "sun-sr-https"),
        (6667, "ircd"),
        (8080, "http-alt"),
        (8443, "pcsync-https"),
        (9042, "cassandra"),
        (9100, "jetdirect"),
        (9418, "git"),
        (10000, "webmin"),
        (11211, "memcache"),
        (27017, "mongodb"),
    ]
    .into_iter()
    .collect()
});

/// Look up the registered service name for a given TCP port.
///
/// Returns `None` if the port is not in the well-known services table.
pub fn get_service_name(port: u16) -> Option<&'static str> {
    PORT_SERVICES.get(&port).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_ports() {
        assert_eq!(get_service_name(22), Some("ssh"));
        assert_eq!(get_service_name(80), Some("http"));
        assert_eq!(get_service_name(443), Some("https"));
        assert_eq!(get_service_name(3306), Some("mysql"));
    }

    #[test]
    fn test_unknown_port() {
        assert_eq!(get_service_name(12345), None);
    }
}
