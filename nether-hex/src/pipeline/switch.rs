//! Conditional pipe

use super::{DoublePipe, ReadPipe, WritePipe};
use crate::context::HexContext;
use crate::cursor::Cursor;
use crate::error::Result;

type Case<T> = (fn(&T) -> bool, Box<dyn DoublePipe<T>>);

/// Picks the first case whose predicate holds for the object.
///
/// The same case list serves reads and writes. A predicate must give the
/// same answer for an object when it is written as it did when that object
/// was read (typically by testing a field decoded earlier), otherwise the
/// round trip breaks. This is not checked. When no case matches, nothing
/// happens.
pub struct SwitchPipe<T> {
    cases: Vec<Case<T>>,
}

impl<T: 'static> SwitchPipe<T> {
    pub fn new() -> Self {
        Self { cases: Vec::new() }
    }

    #[must_use]
    pub fn case<P: DoublePipe<T> + 'static>(mut self, predicate: fn(&T) -> bool, pipe: P) -> Self {
        self.cases.push((predicate, Box::new(pipe)));
        self
    }

    /// Fallback case that always matches; add it last
    #[must_use]
    pub fn otherwise<P: DoublePipe<T> + 'static>(self, pipe: P) -> Self {
        self.case(|_| true, pipe)
    }
}

impl<T: 'static> Default for SwitchPipe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SwitchPipe<T> {
    fn select(&self, target: &T) -> Option<(usize, &dyn DoublePipe<T>)> {
        self.cases
            .iter()
            .enumerate()
            .find(|(_, (predicate, _))| predicate(target))
            .map(|(index, (_, pipe))| (index, &**pipe))
    }
}

impl<T> ReadPipe<T> for SwitchPipe<T> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        match self.select(target) {
            Some((case, pipe)) => {
                tracing::trace!(case, "switch read");
                pipe.read(target, cursor, ctx)
            }
            None => {
                tracing::trace!("switch read: no case matched");
                Ok(())
            }
        }
    }
}

impl<T> WritePipe<T> for SwitchPipe<T> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        match self.select(target) {
            Some((case, pipe)) => {
                tracing::trace!(case, "switch write");
                pipe.write(cursor, target, ctx)
            }
            None => {
                tracing::trace!("switch write: no case matched");
                Ok(())
            }
        }
    }
}
