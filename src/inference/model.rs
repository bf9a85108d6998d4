//! Calling convention for the external digit classifier.
//!
//! The classifier owns its buffers: callers marshal a tensor into a
//! classifier-side buffer, run the prediction into another one, read it back
//! and release both. [`ScopedBuffer`] ties each release to a drop so no exit
//! path can leak a buffer across repeated per-stroke calls.

use std::collections::HashMap;

use crate::{Error, Result, CLASS_COUNT, TENSOR_LEN};

/// Opaque identifier of a classifier-side numeric buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

pub trait Classifier {
    /// Load model parameters from `resource`. Called once before any prediction.
    fn load(&mut self, resource: &str) -> Result<()>;

    /// Copy `values` into a new classifier-side buffer.
    fn alloc(&mut self, values: &[f64]) -> Result<BufferHandle>;

    /// Run inference over the buffer `input`, producing a new output buffer.
    fn predict(&mut self, input: BufferHandle) -> Result<BufferHandle>;

    /// Copy a buffer's contents out.
    fn read(&self, handle: BufferHandle) -> Result<Vec<f64>>;

    /// Free a buffer. Unknown handles are ignored.
    fn release(&mut self, handle: BufferHandle);

    /// Number of buffers currently allocated on the classifier side.
    fn live_buffers(&self) -> usize;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn load(&mut self, resource: &str) -> Result<()> {
        (**self).load(resource)
    }

    fn alloc(&mut self, values: &[f64]) -> Result<BufferHandle> {
        (**self).alloc(values)
    }

    fn predict(&mut self, input: BufferHandle) -> Result<BufferHandle> {
        (**self).predict(input)
    }

    fn read(&self, handle: BufferHandle) -> Result<Vec<f64>> {
        (**self).read(handle)
    }

    fn release(&mut self, handle: BufferHandle) {
        (**self).release(handle)
    }

    fn live_buffers(&self) -> usize {
        (**self).live_buffers()
    }
}

/// A classifier buffer that is released when the guard drops.
pub struct ScopedBuffer<'a, C: Classifier + ?Sized> {
    owner: &'a mut C,
    handle: BufferHandle,
}

impl<'a, C: Classifier + ?Sized> ScopedBuffer<'a, C> {
    pub fn alloc(owner: &'a mut C, values: &[f64]) -> Result<Self> {
        let handle = owner.alloc(values)?;
        Ok(Self { owner, handle })
    }

    /// Take ownership of a handle the classifier already produced.
    pub fn adopt(owner: &'a mut C, handle: BufferHandle) -> Self {
        Self { owner, handle }
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn owner_mut(&mut self) -> &mut C {
        &mut *self.owner
    }

    pub fn read(&self) -> Result<Vec<f64>> {
        self.owner.read(self.handle)
    }
}

impl<C: Classifier + ?Sized> Drop for ScopedBuffer<'_, C> {
    fn drop(&mut self) {
        self.owner.release(self.handle);
    }
}

/// Marshal `input`, predict, and unmarshal the output, releasing both buffers.
pub fn run_prediction<C: Classifier + ?Sized>(model: &mut C, input: &[f64]) -> Result<Vec<f64>> {
    let mut input = ScopedBuffer::alloc(model, input)?;
    let handle = input.handle();
    let produced = input.owner_mut().predict(handle)?;
    let output = ScopedBuffer::adopt(input.owner_mut(), produced);
    output.read()
}

/// Handle table for classifier implementations that keep buffers in memory.
#[derive(Debug, Default)]
pub struct BufferArena {
    next_id: u64,
    buffers: HashMap<u64, Vec<f64>>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, values: Vec<f64>) -> BufferHandle {
        self.next_id += 1;
        self.buffers.insert(self.next_id, values);
        BufferHandle(self.next_id)
    }

    pub fn get(&self, handle: BufferHandle) -> Result<&[f64]> {
        self.buffers
            .get(&handle.0)
            .map(Vec::as_slice)
            .ok_or(Error::InvalidBuffer(handle.0))
    }

    pub fn remove(&mut self, handle: BufferHandle) -> Option<Vec<f64>> {
        self.buffers.remove(&handle.0)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// Reference classifier that assigns every digit the same probability.
///
/// Loads any non-empty resource name. Useful as a stand-in collaborator for
/// the worker protocol and for exercising the pad without a trained model.
#[derive(Debug, Default)]
pub struct UniformModel {
    loaded: bool,
    arena: BufferArena,
}

impl UniformModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for UniformModel {
    fn load(&mut self, resource: &str) -> Result<()> {
        if resource.trim().is_empty() {
            return Err(Error::ModelLoad("empty model resource".into()));
        }
        self.loaded = true;
        Ok(())
    }

    fn alloc(&mut self, values: &[f64]) -> Result<BufferHandle> {
        Ok(self.arena.insert(values.to_vec()))
    }

    fn predict(&mut self, input: BufferHandle) -> Result<BufferHandle> {
        if !self.loaded {
            return Err(Error::NotReady);
        }
        let len = self.arena.get(input)?.len();
        if len != TENSOR_LEN {
            return Err(Error::Shape { expected: TENSOR_LEN, actual: len });
        }
        Ok(self.arena.insert(vec![1.0 / CLASS_COUNT as f64; CLASS_COUNT]))
    }

    fn read(&self, handle: BufferHandle) -> Result<Vec<f64>> {
        self.arena.get(handle).map(<[f64]>::to_vec)
    }

    fn release(&mut self, handle: BufferHandle) {
        self.arena.remove(handle);
    }

    fn live_buffers(&self) -> usize {
        self.arena.len()
    }
}
