//! Tests on reading network descriptions from files.
use std::time::Duration;
use stopwait::ndl::{
    self,
    parsing::{DecType, ParseError},
    GenerateError, NdlError,
};
use stopwait::simulations::{FIVE_NODE, LOSSY_FIVE_NODE, TWO_NODE};
use stopwait_core::{ConfigError, LinkId, NodeAddress, RoutingTable};

fn addr(n: u32) -> NodeAddress {
    NodeAddress::new(n)
}

/// Loads a fixture, expecting it to be rejected while parsing.
fn parse_error(file_path: &str) -> ParseError {
    match ndl::load(file_path) {
        Err(NdlError::Invalid {
            source: GenerateError::Parse(e),
            ..
        }) => e,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
#[ntest::timeout(100)]
fn valid() {
    let (network, routes) = ndl::load("./tests/ndl/valid.ndl").unwrap();
    assert_eq!(network.nodes().len(), 2);
    assert_eq!(network.node(addr(0)).unwrap().name.as_deref(), Some("left"));

    let link = &network.links()[0];
    assert_eq!(link.bandwidth, 9600);
    assert_eq!(link.propagation_delay, Duration::from_millis(10));
    assert_eq!(link.loss, 0.5);
    assert_eq!(link.corruption, 0.25);

    assert_eq!(routes.next_hop(addr(0), addr(1)), Some(LinkId::new(1)));
    assert_eq!(routes.next_hop(addr(1), addr(0)), Some(LinkId::new(1)));
}

#[test]
#[ntest::timeout(100)]
fn four_spaces_and_comments() {
    let (network, _) = ndl::load("./tests/ndl/spaces_and_comments.ndl").unwrap();
    assert!(network.contains(addr(10)));
    assert!(network.contains(addr(11)));
    assert_eq!(network.links().len(), 1);
}

#[test]
#[ntest::timeout(100)]
fn bad_indent() {
    assert_eq!(
        parse_error("./tests/ndl/bad_indent.ndl"),
        ParseError::Indentation {
            line: 3,
            expected: 1,
            found: 2
        }
    );
}

#[test]
#[ntest::timeout(100)]
fn unexpected_type() {
    assert_eq!(
        parse_error("./tests/ndl/unexpected_type.ndl"),
        ParseError::UnexpectedType {
            line: 4,
            expected: DecType::Link,
            found: DecType::Node
        }
    );
}

#[test]
#[ntest::timeout(100)]
fn duplicate_section() {
    assert_eq!(
        parse_error("./tests/ndl/duplicate_section.ndl"),
        ParseError::DuplicateSection {
            line: 3,
            dectype: DecType::Nodes
        }
    );
}

#[test]
#[ntest::timeout(100)]
fn missing_argument() {
    assert_eq!(
        parse_error("./tests/ndl/missing_argument.ndl"),
        ParseError::MissingArgument {
            line: 5,
            dectype: DecType::Link,
            name: "b"
        }
    );
}

#[test]
#[ntest::timeout(100)]
fn unknown_node() {
    assert!(matches!(
        ndl::load("./tests/ndl/unknown_node.ndl"),
        Err(NdlError::Invalid {
            source: GenerateError::Config(ConfigError::UnknownNode(node)),
            ..
        }) if node == addr(2)
    ));
}

#[test]
#[ntest::timeout(100)]
fn missing_file() {
    assert!(matches!(
        ndl::load("./tests/ndl/nowhere.ndl"),
        Err(NdlError::Io { .. })
    ));
}

#[test]
#[ntest::timeout(100)]
fn routes_section_replaces_shortest_paths() {
    let (_, routes) = ndl::load("./tests/ndl/partial_routes.ndl").unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes.next_hop(addr(0), addr(2)), Some(LinkId::new(1)));
    assert_eq!(routes.next_hop(addr(2), addr(0)), None);
}

#[test]
#[ntest::timeout(100)]
fn five_node_routes_are_shortest_paths() {
    let (network, routes) = ndl::generate(FIVE_NODE).unwrap();
    assert_eq!(routes.len(), 20);
    assert_eq!(routes, RoutingTable::shortest_paths(&network));

    let (lossy, lossy_routes) = ndl::generate(LOSSY_FIVE_NODE).unwrap();
    assert_eq!(lossy.nodes(), network.nodes());
    assert_eq!(lossy_routes, routes);
    assert!(lossy.links().iter().all(|link| link.loss == 0.1));
}

#[test]
#[ntest::timeout(100)]
fn two_node() {
    let (network, routes) = ndl::generate(TWO_NODE).unwrap();
    assert_eq!(network.nodes().len(), 2);
    assert_eq!(routes.len(), 2);
}
