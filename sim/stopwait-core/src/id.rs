use std::fmt::Display;

/// The address of a node in the simulated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeAddress(u32);

impl NodeAddress {
    /// Creates a new node address with the given number.
    pub const fn new(address: u32) -> Self {
        Self(address)
    }

    /// Gets the underlying address number.
    pub fn into_inner(self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeAddress {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

impl From<NodeAddress> for u32 {
    fn from(address: NodeAddress) -> Self {
        address.0
    }
}

impl Display for NodeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one of a node's physical links.
///
/// Links are numbered from 1 in the order they are attached to a node, so a
/// node with three links has links 1, 2 and 3.
///
/// ```
/// # use stopwait_core::LinkId;
/// let link = LinkId::from_index(0);
/// assert_eq!(link, LinkId::new(1));
/// assert_eq!(link.index(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(u16);

impl LinkId {
    /// Creates a link ID from its 1-based link number.
    pub const fn new(number: u16) -> Self {
        Self(number)
    }

    /// Creates a link ID from a 0-based position in a node's link list.
    pub const fn from_index(index: usize) -> Self {
        Self(index as u16 + 1)
    }

    /// The 0-based position of this link in a node's link list, or `usize::MAX`
    /// for the invalid link number 0 so that lookups with it always miss.
    pub fn index(self) -> usize {
        (self.0 as usize).checked_sub(1).unwrap_or(usize::MAX)
    }

    /// Gets the 1-based link number.
    pub fn into_inner(self) -> u16 {
        self.0
    }
}

impl From<u16> for LinkId {
    fn from(n: u16) -> Self {
        Self(n)
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
