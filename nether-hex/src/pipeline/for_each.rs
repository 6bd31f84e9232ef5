//! Per-child pipe

use super::{DoublePipe, ReadPipe, WritePipe};
use crate::context::HexContext;
use crate::cursor::Cursor;
use crate::error::Result;

/// Runs a sub-pipe for every child selected from the parent.
///
/// Each child gets a fresh fork of the cursor, so whatever one child's pipe
/// does to its position never leaks into the next child. With a stride,
/// child `i` starts at `position + i * stride` (for tables of fixed-size
/// records); without one, every child starts at the parent's position.
pub struct ForEachPipe<T, S> {
    select: fn(&mut T) -> Vec<&mut S>,
    pipe: Box<dyn DoublePipe<S>>,
    stride: Option<u64>,
}

impl<T, S: 'static> ForEachPipe<T, S> {
    pub fn new<P: DoublePipe<S> + 'static>(select: fn(&mut T) -> Vec<&mut S>, pipe: P) -> Self {
        Self {
            select,
            pipe: Box::new(pipe),
            stride: None,
        }
    }

    /// Place consecutive children `stride` bytes apart
    #[must_use]
    pub fn stride(mut self, stride: u64) -> Self {
        self.stride = Some(stride);
        self
    }
}

impl<T, S> ForEachPipe<T, S> {
    fn fork_for(&self, cursor: &Cursor, index: usize) -> Cursor {
        match self.stride {
            Some(stride) => cursor.fork_at(cursor.position() + index as u64 * stride),
            None => cursor.fork(),
        }
    }
}

impl<T, S> ReadPipe<T> for ForEachPipe<T, S> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        let children = (self.select)(target);
        tracing::trace!(children = children.len(), at = cursor.position(), "for-each read");
        for (index, child) in children.into_iter().enumerate() {
            let mut fork = self.fork_for(cursor, index);
            self.pipe.read(child, &mut fork, ctx)?;
        }
        Ok(())
    }
}

impl<T, S> WritePipe<T> for ForEachPipe<T, S> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        let children = (self.select)(target);
        tracing::trace!(children = children.len(), at = cursor.position(), "for-each write");
        for (index, child) in children.into_iter().enumerate() {
            let mut fork = self.fork_for(cursor, index);
            self.pipe.write(&mut fork, child, ctx)?;
        }
        Ok(())
    }
}
