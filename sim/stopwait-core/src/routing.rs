//! Static routing: which link a node sends a packet on to reach a destination.

use crate::{topology::NetworkSpec, LinkId, NodeAddress};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

type Entry = (NodeAddress, NodeAddress);

/// Maps `(node, destination)` to the link `node` should send on to get a
/// packet closer to `destination`.
///
/// The table is fixed for the life of a simulation. It performs no
/// reachability or loop checking; a destination with no entry is simply
/// unroutable from that node.
///
/// ```
/// # use stopwait_core::{routing::RoutingTable, LinkId, NodeAddress};
/// let table: RoutingTable = [
///     ((NodeAddress::new(0), NodeAddress::new(1)), LinkId::new(1)),
///     ((NodeAddress::new(1), NodeAddress::new(0)), LinkId::new(1)),
/// ]
/// .into_iter()
/// .collect();
/// assert_eq!(table.next_hop(NodeAddress::new(0), NodeAddress::new(1)), Some(LinkId::new(1)));
/// assert_eq!(table.next_hop(NodeAddress::new(0), NodeAddress::new(2)), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: FxHashMap<Entry, LinkId>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a route, returning the link it previously used.
    pub fn insert(
        &mut self,
        node: NodeAddress,
        destination: NodeAddress,
        link: LinkId,
    ) -> Option<LinkId> {
        self.routes.insert((node, destination), link)
    }

    /// The link `node` should forward a packet for `destination` on.
    pub fn next_hop(&self, node: NodeAddress, destination: NodeAddress) -> Option<LinkId> {
        self.routes.get(&(node, destination)).copied()
    }

    /// The routes leaving a node, as `(destination, link)` pairs.
    pub fn routes_from(
        &self,
        node: NodeAddress,
    ) -> impl Iterator<Item = (NodeAddress, LinkId)> + '_ {
        self.routes
            .iter()
            .filter(move |((from, _), _)| *from == node)
            .map(|((_, destination), link)| (*destination, *link))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Derives a table that sends every packet along a path with the fewest
    /// hops. Among equally short paths the one leaving on the lowest
    /// numbered link wins.
    pub fn shortest_paths(network: &NetworkSpec) -> Self {
        let mut table = Self::new();
        for source in network.nodes().iter().map(|node| node.address) {
            let mut visited = FxHashSet::default();
            visited.insert(source);

            // Each entry carries the link the path left the source on
            let mut frontier = VecDeque::new();
            for attachment in network.attachments(source) {
                if visited.insert(attachment.peer) {
                    table.insert(source, attachment.peer, attachment.link);
                    frontier.push_back((attachment.peer, attachment.link));
                }
            }

            while let Some((node, first_hop)) = frontier.pop_front() {
                for attachment in network.attachments(node) {
                    if visited.insert(attachment.peer) {
                        table.insert(source, attachment.peer, first_hop);
                        frontier.push_back((attachment.peer, first_hop));
                    }
                }
            }
        }
        table
    }
}

impl FromIterator<(Entry, LinkId)> for RoutingTable {
    fn from_iter<T: IntoIterator<Item = (Entry, LinkId)>>(iter: T) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Entry, LinkId)> for RoutingTable {
    fn extend<T: IntoIterator<Item = (Entry, LinkId)>>(&mut self, iter: T) {
        self.routes.extend(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{LinkSpec, NodeSpec};

    fn addr(n: u32) -> NodeAddress {
        NodeAddress::new(n)
    }

    #[test]
    fn five_node_shortest_paths() {
        let nodes = (0..5).map(|n| NodeSpec::new(addr(n))).collect();
        let links = [(0, 1), (0, 2), (1, 2), (3, 4), (2, 3), (2, 4)]
            .into_iter()
            .map(|(a, b)| LinkSpec::new(addr(a), addr(b)))
            .collect();
        let network = NetworkSpec::new(nodes, links).unwrap();
        let table = RoutingTable::shortest_paths(&network);

        // Row per node, column per destination, 0 on the diagonal
        let expected: [[u16; 5]; 5] = [
            [0, 1, 2, 2, 2],
            [1, 0, 2, 2, 2],
            [1, 2, 0, 3, 4],
            [2, 2, 2, 0, 1],
            [2, 2, 2, 1, 0],
        ];
        for (node, row) in expected.iter().enumerate() {
            for (destination, link) in row.iter().enumerate() {
                let actual = table.next_hop(addr(node as u32), addr(destination as u32));
                if node == destination {
                    assert_eq!(actual, None);
                } else {
                    assert_eq!(actual, Some(LinkId::new(*link)), "{node} -> {destination}");
                }
            }
        }
        assert_eq!(table.len(), 20);
    }

    #[test]
    fn unreachable_nodes_have_no_route() {
        let nodes = (0..3).map(|n| NodeSpec::new(addr(n))).collect();
        let links = vec![LinkSpec::new(addr(0), addr(1))];
        let network = NetworkSpec::new(nodes, links).unwrap();
        let table = RoutingTable::shortest_paths(&network);
        assert_eq!(table.next_hop(addr(0), addr(1)), Some(LinkId::new(1)));
        assert_eq!(table.next_hop(addr(0), addr(2)), None);
        assert_eq!(table.routes_from(addr(2)).count(), 0);
    }

    #[test]
    fn insert_replaces() {
        let mut table = RoutingTable::new();
        assert_eq!(table.insert(addr(0), addr(1), LinkId::new(1)), None);
        assert_eq!(
            table.insert(addr(0), addr(1), LinkId::new(2)),
            Some(LinkId::new(1))
        );
        assert_eq!(table.next_hop(addr(0), addr(1)), Some(LinkId::new(2)));
    }
}
