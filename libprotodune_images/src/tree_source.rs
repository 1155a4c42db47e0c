use fxhash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::constants::{NEUTRINO_TREE_PATH, STANDARD_TREE_PATH};
use super::error::SourceError;

/// Values of one field for a single event: one array per sub-event
pub type JaggedEvent = Vec<Vec<i32>>;
/// Values of one field for every event in a tree
pub type JaggedField = Vec<JaggedEvent>;

/// Which window tree to read from the art::ROOT file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeKind {
    #[default]
    Standard,
    NeutrinoOnly,
}

impl TreeKind {
    pub fn new(neutrino_only: bool) -> Self {
        if neutrino_only {
            Self::NeutrinoOnly
        } else {
            Self::Standard
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Standard => STANDARD_TREE_PATH,
            Self::NeutrinoOnly => NEUTRINO_TREE_PATH,
        }
    }
}

/// A tree of per-event jagged arrays, read one whole field at a time.
pub trait TreeSource {
    fn read_field(&mut self, name: &str) -> Result<JaggedField, SourceError>;
}

/// A TreeSource held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    fields: FxHashMap<String, JaggedField>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, values: JaggedField) -> Self {
        self.fields.insert(name.to_string(), values);
        self
    }
}

impl TreeSource for MemoryTree {
    fn read_field(&mut self, name: &str) -> Result<JaggedField, SourceError> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::MissingField(name.to_string()))
    }
}

/// A window tree inside an art::ROOT file
#[cfg(feature = "root")]
pub struct RootTree {
    tree: oxyroot::ReaderTree,
}

#[cfg(feature = "root")]
impl RootTree {
    pub fn open(path: &Path, kind: TreeKind) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::BadFilePath(path.to_path_buf()));
        }
        let mut file =
            oxyroot::RootFile::open(path).map_err(|e| SourceError::Root(e.to_string()))?;
        let tree = file
            .get_tree(kind.path())
            .map_err(|_| SourceError::MissingTree(kind.path().to_string()))?;
        Ok(Self { tree })
    }
}

#[cfg(feature = "root")]
impl TreeSource for RootTree {
    fn read_field(&mut self, name: &str) -> Result<JaggedField, SourceError> {
        let branch = self
            .tree
            .branch(name)
            .ok_or_else(|| SourceError::MissingField(name.to_string()))?;
        let values = branch
            .as_iter::<Vec<Vec<i32>>>()
            .map_err(|e| SourceError::Root(e.to_string()))?
            .collect();
        Ok(values)
    }
}

/// Open the window tree of an art::ROOT file
#[cfg(feature = "root")]
pub fn open_root_tree(path: &Path, kind: TreeKind) -> Result<Box<dyn TreeSource>, SourceError> {
    Ok(Box::new(RootTree::open(path, kind)?))
}

/// Open the window tree of an art::ROOT file
#[cfg(not(feature = "root"))]
pub fn open_root_tree(path: &Path, _kind: TreeKind) -> Result<Box<dyn TreeSource>, SourceError> {
    if !path.exists() {
        return Err(SourceError::BadFilePath(path.to_path_buf()));
    }
    Err(SourceError::Unsupported(path.to_path_buf()))
}

/// Read a list of input files, one per line. Blank lines are ignored.
pub fn read_file_list(path: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if !path.exists() {
        return Err(SourceError::BadFilePath(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut files = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            files.push(PathBuf::from(trimmed));
        }
    }
    Ok(files)
}
