use crate::nibbles::{hex_prefix_decode, hex_prefix_encode, Nibbles};
use crate::store::NodeStore;
use crate::Error;
use alloy_primitives::{keccak256, B256};
use alloy_rlp::{Buf, BufMut, Decodable, Encodable, Header};

/// A reference to a child node: absent, embedded verbatim (encoding under
/// 32 bytes), or addressed by its Keccak-256 hash in the node store.
///
/// This is the "nodes >= 32 bytes are referenced by their Keccak-256"
/// rule: a short child's RLP structure is spliced directly into its
/// parent's encoding instead of paying for a separate store round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Empty,
    Embedded(Vec<u8>),
    Hashed(B256),
}

impl NodeRef {
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }

    /// Resolves this reference to its decoded [`Node`], reading through the
    /// node store for a hashed reference.
    pub fn resolve(&self, store: &impl NodeStore) -> Result<Node, Error> {
        match self {
            NodeRef::Empty => Ok(Node::Empty),
            NodeRef::Embedded(bytes) => Node::decode_rlp(&mut &bytes[..]),
            NodeRef::Hashed(hash) => {
                let bytes = store
                    .get_node(hash)?
                    .ok_or(Error::MissingNode(*hash))?;
                Node::decode_rlp(&mut &bytes[..])
            }
        }
    }

    /// Encodes `node` and wraps it as a reference, committing it to the
    /// node store if its encoding is 32 bytes or longer.
    pub fn from_node(node: &Node, store: &mut impl NodeStore) -> NodeRef {
        if matches!(node, Node::Empty) {
            return NodeRef::Empty;
        }
        let encoded = node.encode_rlp();
        if encoded.len() < 32 {
            NodeRef::Embedded(encoded)
        } else {
            let hash = keccak256(&encoded);
            store.put_node(hash, encoded);
            NodeRef::Hashed(hash)
        }
    }

    fn write_as_rlp_item(&self, out: &mut dyn BufMut) {
        match self {
            NodeRef::Empty => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
            NodeRef::Embedded(bytes) => out.put_slice(bytes),
            NodeRef::Hashed(hash) => hash.encode(out),
        }
    }

    fn rlp_item_length(&self) -> usize {
        match self {
            NodeRef::Empty => 1,
            NodeRef::Embedded(bytes) => bytes.len(),
            NodeRef::Hashed(hash) => hash.length(),
        }
    }

    fn decode_as_rlp_item(buf: &mut &[u8]) -> alloy_rlp::Result<NodeRef> {
        if buf.is_empty() {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        let first = buf[0];
        if first == alloy_rlp::EMPTY_STRING_CODE {
            buf.advance(1);
            return Ok(NodeRef::Empty);
        }
        if first <= 0xbf {
            // a single RLP string item: either the 32-byte hash, or (in
            // principle) a short inline node whose only item happens to be
            // a string — re-encode the raw bytes of that one item.
            let start = *buf;
            let header = Header::decode(buf)?;
            let consumed = start.len() - buf.len() + header.payload_length;
            buf.advance(header.payload_length);
            let raw = &start[..consumed];
            if header.payload_length == 32 {
                return Ok(NodeRef::Hashed(B256::from_slice(&raw[consumed - 32..])));
            }
            return Ok(NodeRef::Embedded(raw.to_vec()));
        }
        // an inline list: capture its raw bytes (header + payload).
        let start = *buf;
        let header = Header::decode(buf)?;
        let consumed = start.len() - buf.len() + header.payload_length;
        buf.advance(header.payload_length);
        Ok(NodeRef::Embedded(start[..consumed].to_vec()))
    }
}

/// A decoded Modified Merkle-Patricia Trie node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Empty,
    Leaf { path: Nibbles, value: Vec<u8> },
    Extension { path: Nibbles, child: NodeRef },
    Branch { children: [NodeRef; 16], value: Option<Vec<u8>> },
}

impl Node {
    pub fn empty_branch() -> Self {
        Node::Branch {
            children: std::array::from_fn(|_| NodeRef::Empty),
            value: None,
        }
    }

    /// Canonical RLP encoding of this node, per the trie contract: a leaf
    /// or extension is `[hex_prefix(path), value_or_child]`; a branch is
    /// the 17-item `[child_0..child_15, value]`.
    pub fn encode_rlp(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Node::Empty => out.push(alloy_rlp::EMPTY_STRING_CODE),
            Node::Leaf { path, value } => {
                let encoded_path = hex_prefix_encode(path, true);
                let payload_length = encoded_path.length() + value.as_slice().length();
                Header { list: true, payload_length }.encode(&mut out);
                encoded_path.encode(&mut out);
                value.as_slice().encode(&mut out);
            }
            Node::Extension { path, child } => {
                let encoded_path = hex_prefix_encode(path, false);
                let payload_length = encoded_path.length() + child.rlp_item_length();
                Header { list: true, payload_length }.encode(&mut out);
                encoded_path.encode(&mut out);
                child.write_as_rlp_item(&mut out);
            }
            Node::Branch { children, value } => {
                let value_len = match value {
                    Some(v) => v.as_slice().length(),
                    None => 1,
                };
                let payload_length: usize =
                    children.iter().map(NodeRef::rlp_item_length).sum::<usize>() + value_len;
                Header { list: true, payload_length }.encode(&mut out);
                for child in children {
                    child.write_as_rlp_item(&mut out);
                }
                match value {
                    Some(v) => v.as_slice().encode(&mut out),
                    None => out.push(alloy_rlp::EMPTY_STRING_CODE),
                }
            }
        }
        out
    }

    pub fn decode_rlp(buf: &mut &[u8]) -> Result<Node, Error> {
        if buf.first() == Some(&alloy_rlp::EMPTY_STRING_CODE) {
            *buf = &buf[1..];
            return Ok(Node::Empty);
        }
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(Error::Rlp(alloy_rlp::Error::UnexpectedString));
        }
        let started_len = buf.len();
        let mut items: Vec<&[u8]> = Vec::new();
        // Peel off raw item slices without fully decoding children yet, so
        // branch children can be re-parsed as NodeRefs.
        while started_len - buf.len() < header.payload_length {
            let item_start = *buf;
            skip_one_rlp_item(buf)?;
            let consumed = item_start.len() - buf.len();
            items.push(&item_start[..consumed]);
        }
        match items.len() {
            2 => {
                let mut path_buf = items[0];
                let path_bytes = alloy_rlp::Bytes::decode(&mut path_buf)?;
                let (path, is_leaf) = hex_prefix_decode(&path_bytes);
                if is_leaf {
                    let mut value_buf = items[1];
                    let value = alloy_rlp::Bytes::decode(&mut value_buf)?.to_vec();
                    Ok(Node::Leaf { path, value })
                } else {
                    let mut child_buf = items[1];
                    let child = NodeRef::decode_as_rlp_item(&mut child_buf)?;
                    Ok(Node::Extension { path, child })
                }
            }
            17 => {
                let mut children: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::Empty);
                for (i, child) in children.iter_mut().enumerate() {
                    let mut item_buf = items[i];
                    *child = NodeRef::decode_as_rlp_item(&mut item_buf)?;
                }
                let mut value_buf = items[16];
                let value_bytes = alloy_rlp::Bytes::decode(&mut value_buf)?;
                let value = if value_bytes.is_empty() {
                    None
                } else {
                    Some(value_bytes.to_vec())
                };
                Ok(Node::Branch { children, value })
            }
            n => Err(Error::Rlp(alloy_rlp::Error::ListLengthMismatch {
                expected: 17,
                got: n,
            })),
        }
    }
}

fn skip_one_rlp_item(buf: &mut &[u8]) -> Result<(), alloy_rlp::Error> {
    if buf.is_empty() {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    let first = buf[0];
    if first <= 0xbf {
        let bytes = alloy_rlp::Bytes::decode(buf)?;
        let _ = bytes;
    } else {
        let header = Header::decode(buf)?;
        buf.advance(header.payload_length);
    }
    Ok(())
}
