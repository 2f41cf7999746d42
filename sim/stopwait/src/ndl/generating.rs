//! Turns a parsed description into a network and its routing table.

use super::parsing::{DecType, Declaration, Ndl, ParseError};
use std::{str::FromStr, time::Duration};
use stopwait_core::{
    topology::{LinkSpec, NetworkSpec, NodeSpec, DEFAULT_BANDWIDTH, DEFAULT_PROPAGATION_DELAY},
    ConfigError, LinkId, NodeAddress, RoutingTable,
};
use thiserror::Error as ThisError;

/// Builds the network a description declares. Without a `[Routes]` section
/// every node routes along shortest paths.
pub fn core_generator(ndl: &Ndl) -> Result<(NetworkSpec, RoutingTable), GenerateError> {
    let nodes = ndl
        .nodes
        .iter()
        .map(|node| {
            let address = NodeAddress::new(required(node, "address")?);
            Ok(match node.options.get("name") {
                Some(name) => NodeSpec::named(address, name),
                None => NodeSpec::new(address),
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    let links = ndl
        .links
        .iter()
        .map(|link| {
            let a = NodeAddress::new(required(link, "a")?);
            let b = NodeAddress::new(required(link, "b")?);
            let delay = optional(link, "delay")?
                .map(Duration::from_micros)
                .unwrap_or(DEFAULT_PROPAGATION_DELAY);
            Ok(LinkSpec::new(a, b)
                .bandwidth(optional(link, "bandwidth")?.unwrap_or(DEFAULT_BANDWIDTH))
                .propagation_delay(delay)
                .loss(optional(link, "loss")?.unwrap_or(0.0))
                .corruption(optional(link, "corruption")?.unwrap_or(0.0)))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    let network = NetworkSpec::new(nodes, links)?;

    let routes = match &ndl.routes {
        Some(routes) => routes
            .iter()
            .map(|route| {
                let node = NodeAddress::new(required(route, "node")?);
                let destination = NodeAddress::new(required(route, "destination")?);
                let link = LinkId::new(required(route, "link")?);
                Ok(((node, destination), link))
            })
            .collect::<Result<RoutingTable, ParseError>>()?,
        None => RoutingTable::shortest_paths(&network),
    };

    Ok((network, routes))
}

/// Reads an argument a declaration must have.
fn required<T: Number>(declaration: &Declaration, name: &'static str) -> Result<T, ParseError> {
    optional(declaration, name)?.ok_or(ParseError::MissingArgument {
        line: declaration.line,
        dectype: declaration.dectype,
        name,
    })
}

/// Reads an argument a declaration may leave out.
fn optional<T: Number>(
    declaration: &Declaration,
    name: &'static str,
) -> Result<Option<T>, ParseError> {
    declaration
        .options
        .get(name)
        .map(|value| {
            T::from_ndl(value).ok_or_else(|| ParseError::InvalidValue {
                line: declaration.line,
                name,
                value: value.to_string(),
            })
        })
        .transpose()
}

/// Numbers that may appear as argument values. Integers can be written in
/// decimal or as hex with a `0x` prefix.
trait Number: Sized {
    fn from_ndl(s: &str) -> Option<Self>;
}

macro_rules! integer {
    ($($t:ty),*) => {
        $(
            impl Number for $t {
                fn from_ndl(s: &str) -> Option<Self> {
                    match s.strip_prefix("0x") {
                        Some(hex) => <$t>::from_str_radix(hex, 16).ok(),
                        None => s.parse().ok(),
                    }
                }
            }
        )*
    };
}

integer!(u16, u32, u64);

impl Number for f64 {
    fn from_ndl(s: &str) -> Option<Self> {
        f64::from_str(s).ok()
    }
}

#[derive(Debug, ThisError, Clone, PartialEq)]
pub enum GenerateError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndl::parsing::Params;

    fn declaration(dectype: DecType, options: &[(&str, &str)]) -> Declaration {
        Declaration {
            dectype,
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Params>(),
            line: 7,
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(u32::from_ndl("0x10"), Some(16));
        assert_eq!(u16::from_ndl("70000"), None);
        assert_eq!(f64::from_ndl("0.5"), Some(0.5));
    }

    #[test]
    fn link_defaults() {
        let ndl = Ndl {
            nodes: vec![
                declaration(DecType::Node, &[("address", "0")]),
                declaration(DecType::Node, &[("address", "1"), ("name", "b")]),
            ],
            links: vec![declaration(DecType::Link, &[("a", "0"), ("b", "1")])],
            routes: None,
        };
        let (network, routes) = core_generator(&ndl).unwrap();
        let link = &network.links()[0];
        assert_eq!(link.bandwidth, DEFAULT_BANDWIDTH);
        assert_eq!(link.propagation_delay, DEFAULT_PROPAGATION_DELAY);
        assert_eq!(link.loss, 0.0);
        assert_eq!(network.nodes()[1].name.as_deref(), Some("b"));
        assert_eq!(
            routes.next_hop(NodeAddress::new(0), NodeAddress::new(1)),
            Some(LinkId::new(1))
        );
    }

    #[test]
    fn missing_and_invalid_arguments() {
        let ndl = Ndl {
            nodes: vec![declaration(DecType::Node, &[("name", "nobody")])],
            ..Ndl::default()
        };
        assert_eq!(
            core_generator(&ndl).unwrap_err(),
            GenerateError::Parse(ParseError::MissingArgument {
                line: 7,
                dectype: DecType::Node,
                name: "address"
            })
        );

        let ndl = Ndl {
            nodes: vec![declaration(DecType::Node, &[("address", "zero")])],
            ..Ndl::default()
        };
        assert_eq!(
            core_generator(&ndl).unwrap_err(),
            GenerateError::Parse(ParseError::InvalidValue {
                line: 7,
                name: "address",
                value: "zero".to_string()
            })
        );
    }
}
