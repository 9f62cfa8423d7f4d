//! Lazy per-path introspection over an injected list of device nodes.

use std::path::{Path, PathBuf};

use log::debug;

use crate::capabilities::{DeviceReport, assemble};
use crate::codes::CodeLimits;
use crate::device::{NodeOpener, Opener};
use crate::error::Result;

pub struct Enumerator<O> {
    opener: O,
    limits: CodeLimits,
}

impl Enumerator<NodeOpener> {
    /// Enumerator over real device nodes.
    pub fn nodes(limits: CodeLimits) -> Self {
        Self::new(NodeOpener, limits)
    }
}

impl<O: Opener> Enumerator<O> {
    pub fn new(opener: O, limits: CodeLimits) -> Self {
        Self { opener, limits }
    }

    pub fn limits(&self) -> &CodeLimits {
        &self.limits
    }

    /// Opens and inspects one node. The handle is released before this returns.
    pub fn probe(&self, path: &Path) -> Result<DeviceReport> {
        let dev = self.opener.open(path)?;
        let report = assemble(&dev, &self.limits);
        drop(dev);
        report
    }

    /// Yields one `(path, outcome)` pair per input path, in input order. A failing device
    /// never stops the sequence. Each device is opened and closed within the `next()` call
    /// that yields it, so dropping the iterator early leaves nothing open.
    pub fn enumerate<'a, I>(
        &'a self,
        paths: I,
    ) -> impl Iterator<Item = (PathBuf, Result<DeviceReport>)> + 'a
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
        I::IntoIter: 'a,
    {
        paths.into_iter().map(move |path| {
            let path = path.as_ref().to_path_buf();
            let outcome = self.probe(&path);
            if let Err(e) = &outcome {
                debug!("{}: {e}", path.display());
            }
            (path, outcome)
        })
    }
}
