//! Node paths and node metadata documents.

use std::fmt;

use h5z_storage::{
    ReadableStorageTraits, ReadableWritableListableStorage, StoreKey, StorePrefix,
    WritableStorageTraits,
};
use serde::{Deserialize, Serialize};

use crate::{Datatype, EngineError, Filter};

/// The name of the metadata document of every node.
pub(crate) const METADATA_NAME: &str = ".h5z.json";

/// The name of the prefix holding the chunks of a dataset.
const CHUNKS_NAME: &str = "c";

/// The metadata document of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "snake_case")]
pub enum NodeMetadata {
    /// A group.
    Group,
    /// A dataset.
    Dataset(DatasetMetadata),
}

/// The metadata of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// The current extents.
    pub shape: Vec<u64>,
    /// The maximum extents, [`None`] for unlimited.
    pub max_shape: Vec<Option<u64>>,
    /// The element datatype.
    pub datatype: Datatype,
    /// The storage layout.
    pub layout: Layout,
    /// The filters applied to each chunk, in encoding order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

impl DatasetMetadata {
    /// The shape of a storage chunk.
    ///
    /// A contiguous dataset is stored as a single chunk covering the array.
    #[must_use]
    pub fn chunk_shape(&self) -> Vec<u64> {
        match &self.layout {
            Layout::Contiguous => self.shape.iter().map(|extent| (*extent).max(1)).collect(),
            Layout::Chunked { chunk_shape } => chunk_shape.clone(),
        }
    }
}

/// The storage layout of a dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layout {
    /// One block covering the whole array.
    Contiguous,
    /// Fixed-size chunks.
    Chunked {
        /// The chunk extents.
        chunk_shape: Vec<u64>,
    },
}

/// An absolute path to a node, as a list of names below the root group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodePath(Vec<String>);

impl NodePath {
    /// Parse a `/` separated path. A leading `/` is optional and the empty path is the root group.
    pub(crate) fn parse(path: &str) -> Result<Self, EngineError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Ok(Self(vec![]));
        }
        let components: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        if components
            .iter()
            .any(|name| name.is_empty() || name == "." || name == ".." || name == METADATA_NAME)
        {
            return Err(EngineError::InvalidPath(path.to_string()));
        }
        Ok(Self(components))
    }

    pub(crate) fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The proper ancestors of the node below the root, outermost first.
    pub(crate) fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (1..self.0.len()).map(|depth| Self(self.0[..depth].to_vec()))
    }

    pub(crate) fn prefix(&self) -> Result<StorePrefix, EngineError> {
        Ok(StorePrefix::from_components(self.0.iter().map(String::as_str))?)
    }

    pub(crate) fn metadata_key(&self) -> Result<StoreKey, EngineError> {
        Ok(self.prefix()?.key(METADATA_NAME)?)
    }

    pub(crate) fn chunk_key(&self, chunk_indices: &[u64]) -> Result<StoreKey, EngineError> {
        let indices: Vec<String> = chunk_indices.iter().map(u64::to_string).collect();
        Ok(self
            .prefix()?
            .key(&format!("{CHUNKS_NAME}/{}", indices.join("/")))?)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

/// Retrieve the metadata of a node, or [`None`] if the node does not exist.
pub(crate) fn load(
    store: &ReadableWritableListableStorage,
    node: &NodePath,
) -> Result<Option<NodeMetadata>, EngineError> {
    let key = node.metadata_key()?;
    let Some(bytes) = store.get(&key)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| EngineError::InvalidMetadata {
            key: key.to_string(),
            message: err.to_string(),
        })
}

/// Store the metadata of a node.
pub(crate) fn save(
    store: &ReadableWritableListableStorage,
    node: &NodePath,
    metadata: &NodeMetadata,
) -> Result<(), EngineError> {
    let key = node.metadata_key()?;
    let bytes = serde_json::to_vec_pretty(metadata).map_err(|err| EngineError::InvalidMetadata {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    store.set(&key, bytes.into())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ByteOrder, ScaleType};

    #[test]
    fn node_path() {
        let node = NodePath::parse("/a/b/c").unwrap();
        assert_eq!(node, NodePath::parse("a/b/c").unwrap());
        assert_eq!(node.to_string(), "/a/b/c");
        assert_eq!(
            node.ancestors().map(|a| a.to_string()).collect::<Vec<_>>(),
            vec!["/a", "/a/b"]
        );
        assert_eq!(node.metadata_key().unwrap().as_str(), "a/b/c/.h5z.json");
        assert_eq!(node.chunk_key(&[0, 12]).unwrap().as_str(), "a/b/c/c/0/12");

        let root = NodePath::parse("/").unwrap();
        assert!(root.is_root());
        assert_eq!(root.metadata_key().unwrap().as_str(), ".h5z.json");
        assert_eq!(root.ancestors().count(), 0);

        assert!(NodePath::parse("a//b").is_err());
        assert!(NodePath::parse("a/../b").is_err());
        assert!(NodePath::parse("a/.h5z.json").is_err());
    }

    #[test]
    fn dataset_metadata_json() {
        let metadata = NodeMetadata::Dataset(DatasetMetadata {
            shape: vec![0, 2],
            max_shape: vec![None, Some(2)],
            datatype: Datatype::Enum {
                base: Box::new(Datatype::Integer {
                    size: 4,
                    signed: true,
                    order: ByteOrder::Little,
                }),
                members: vec![crate::EnumMember {
                    name: "A".to_string(),
                    value: 1,
                }],
            },
            layout: Layout::Chunked {
                chunk_shape: vec![1, 2],
            },
            filters: vec![
                Filter::ScaleOffset {
                    scale_type: ScaleType::Int,
                    factor: 0,
                },
                Filter::Shuffle,
                Filter::Deflate { level: 4 },
            ],
        });
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.starts_with(r#"{"node_type":"dataset","shape":[0,2],"max_shape":[null,2]"#));
        assert!(json.contains(r#""filters":[{"id":"scale_offset","scale_type":"int","factor":0},{"id":"shuffle"},{"id":"deflate","level":4}]"#));
        assert_eq!(
            serde_json::from_str::<NodeMetadata>(&json).unwrap(),
            metadata
        );

        let group: NodeMetadata = serde_json::from_str(r#"{"node_type":"group"}"#).unwrap();
        assert_eq!(group, NodeMetadata::Group);
    }
}
