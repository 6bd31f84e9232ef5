//! Sequential pipe

use std::rc::Rc;

use super::{DoublePipe, ReadPipe, WritePipe};
use crate::context::HexContext;
use crate::cursor::Cursor;
use crate::error::Result;

/// Runs steps in order without branching.
///
/// Read order and write order are independent lists; the write list does
/// not have to mirror the read list.
pub struct LinearPipe<T> {
    read: Vec<Box<dyn ReadPipe<T>>>,
    write: Vec<Box<dyn WritePipe<T>>>,
}

impl<T: 'static> LinearPipe<T> {
    pub fn new() -> Self {
        Self {
            read: Vec::new(),
            write: Vec::new(),
        }
    }

    /// Append a step to both the read and the write list
    #[must_use]
    pub fn then<P: DoublePipe<T> + 'static>(mut self, pipe: P) -> Self {
        self.push(pipe);
        self
    }

    /// Append a read-only step
    #[must_use]
    pub fn then_read<P: ReadPipe<T> + 'static>(mut self, pipe: P) -> Self {
        self.push_read(pipe);
        self
    }

    /// Append a write-only step
    #[must_use]
    pub fn then_write<P: WritePipe<T> + 'static>(mut self, pipe: P) -> Self {
        self.push_write(pipe);
        self
    }

    pub fn push<P: DoublePipe<T> + 'static>(&mut self, pipe: P) {
        let shared = Rc::new(pipe);
        self.read.push(Box::new(Rc::clone(&shared)));
        self.write.push(Box::new(shared));
    }

    pub fn push_read<P: ReadPipe<T> + 'static>(&mut self, pipe: P) {
        self.read.push(Box::new(pipe));
    }

    pub fn push_write<P: WritePipe<T> + 'static>(&mut self, pipe: P) {
        self.write.push(Box::new(pipe));
    }

    pub fn read_len(&self) -> usize {
        self.read.len()
    }

    pub fn write_len(&self) -> usize {
        self.write.len()
    }
}

impl<T: 'static> Default for LinearPipe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadPipe<T> for LinearPipe<T> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        for step in &self.read {
            step.read(target, cursor, ctx)?;
        }
        Ok(())
    }
}

impl<T> WritePipe<T> for LinearPipe<T> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        for step in &self.write {
            step.write(cursor, target, ctx)?;
        }
        Ok(())
    }
}

/// Runs lifecycle hooks in registration order, in either direction.
pub(crate) struct HookPipe<T> {
    hooks: Vec<crate::layout::Hook<T>>,
}

impl<T> HookPipe<T> {
    pub(crate) fn new(hooks: Vec<crate::layout::Hook<T>>) -> Self {
        Self { hooks }
    }

    fn run(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        for hook in &self.hooks {
            hook(target, cursor, ctx).map_err(crate::error::HexError::Hook)?;
        }
        Ok(())
    }
}

impl<T> ReadPipe<T> for HookPipe<T> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        self.run(target, cursor, ctx)
    }
}

impl<T> WritePipe<T> for HookPipe<T> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        self.run(target, cursor, ctx)
    }
}
