//! Classifier reached through a child process speaking the worker protocol

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use log::debug;

use crate::inference::model::{BufferArena, BufferHandle, Classifier};
use crate::inference::worker::{WorkerReply, WorkerRequest};
use crate::{Error, Result};

/// Spawns an external classifier and exchanges one JSON line per call.
///
/// Input and output buffers live on this side of the pipe; only the
/// prediction itself crosses it. The child is killed on drop.
pub struct ProcessModel {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    arena: BufferArena,
}

impl ProcessModel {
    pub fn spawn(program: &str, args: &[&str]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Worker(format!("failed to spawn '{}': {}", program, e)))?;

        let stdin = child.stdin.take().ok_or_else(|| Error::Worker("worker stdin unavailable".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| Error::Worker("worker stdout unavailable".into()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            arena: BufferArena::new(),
        })
    }

    /// Spawn from a whitespace-separated command line such as `"digitpad worker"`.
    pub fn from_command_line(cmd: &str) -> Result<Self> {
        let mut parts = cmd.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::ConfigError("empty worker command".into()))?;
        let args: Vec<&str> = parts.collect();
        Self::spawn(program, &args)
    }

    fn call(&mut self, request: &WorkerRequest) -> Result<WorkerReply> {
        writeln!(self.stdin, "{}", serde_json::to_string(request)?)?;
        self.stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(Error::Worker("worker closed its output".into()));
        }
        debug!("worker reply: {}", line.trim_end());
        let reply: WorkerReply = serde_json::from_str(line.trim_end())?;
        if !reply.ok {
            return Err(Error::Worker(reply.error.unwrap_or_else(|| "unknown worker failure".into())));
        }
        Ok(reply)
    }
}

impl Classifier for ProcessModel {
    fn load(&mut self, resource: &str) -> Result<()> {
        self.call(&WorkerRequest::Load { resource: resource.to_string() })
            .map(|_| ())
            .map_err(|e| Error::ModelLoad(e.to_string()))
    }

    fn alloc(&mut self, values: &[f64]) -> Result<BufferHandle> {
        Ok(self.arena.insert(values.to_vec()))
    }

    fn predict(&mut self, input: BufferHandle) -> Result<BufferHandle> {
        let input = self.arena.get(input)?.to_vec();
        let reply = self.call(&WorkerRequest::Predict { input })?;
        let output = reply
            .output
            .ok_or_else(|| Error::Inference("worker reply carried no output".into()))?;
        Ok(self.arena.insert(output))
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

impl Drop for ProcessModel {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
