//! Task generation: the cross product of hosts and ports.

use crate::types::{Port, ScanTask};

/// The set of probes one scan run performs.
///
/// A single value covers both shapes of scan: one host against a port
/// range, or many hosts (e.g. an expanded CIDR block) against the same
/// range. Tasks iterate host-major, so a multi-host scan walks each host's
/// ports consecutively. An empty set is valid and drains immediately.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    hosts: Vec<String>,
    ports: Vec<Port>,
}

impl TaskSet {
    /// Create a task set from resolved hosts and a port list.
    pub fn new(hosts: Vec<String>, ports: Vec<Port>) -> Self {
        Self { hosts, ports }
    }

    /// Create a task set for a single host.
    pub fn single(host: impl Into<String>, ports: Vec<Port>) -> Self {
        Self {
            hosts: vec![host.into()],
            ports,
        }
    }

    /// Total number of probe tasks this set generates.
    pub fn len(&self) -> usize {
        self.hosts.len() * self.ports.len()
    }

    /// Check if the set generates no tasks at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct hosts.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Number of ports probed per host.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Iterate tasks in generation (FIFO) order.
    pub fn iter(&self) -> impl Iterator<Item = ScanTask> + '_ {
        self.hosts.iter().flat_map(move |host| {
            self.ports
                .iter()
                .map(move |&port| ScanTask::new(host.clone(), port))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(raw: &[u16]) -> Vec<Port> {
        raw.iter().map(|&p| Port::new(p).unwrap()).collect()
    }

    #[test]
    fn test_cross_product() {
        let set = TaskSet::new(
            vec!["10.0.0.1".into(), "10.0.0.2".into()],
            ports(&[80, 443]),
        );
        assert_eq!(set.len(), 4);

        let tasks: Vec<String> = set.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            tasks,
            vec![
                "10.0.0.1:80",
                "10.0.0.1:443",
                "10.0.0.2:80",
                "10.0.0.2:443"
            ]
        );
    }

    #[test]
    fn test_single_host() {
        let set = TaskSet::single("127.0.0.1", ports(&[20, 21, 22]));
        assert_eq!(set.host_count(), 1);
        assert_eq!(set.port_count(), 3);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_empty_sets() {
        let no_ports = TaskSet::single("127.0.0.1", Vec::new());
        assert!(no_ports.is_empty());
        assert_eq!(no_ports.iter().count(), 0);

        let no_hosts = TaskSet::new(Vec::new(), ports(&[80]));
        assert!(no_hosts.is_empty());
    }
}
