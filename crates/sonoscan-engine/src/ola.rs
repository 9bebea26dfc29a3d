//! Overlap-add ring buffers.
//!
//! Frames are summed into the ring at the write cursor; [`OlaRing::commit`]
//! then marks the first `hop` samples of the frame as final, since no later
//! frame reaches back that far. [`OlaRing::pull`] hands final samples out
//! from the read cursor and zeroes them so the next pass around the ring
//! accumulates onto silence.

/// Mono overlap-add ring.
#[derive(Debug, Clone)]
pub struct OlaRing {
    buffer: Vec<f32>,
    write: usize,
    read: usize,
    ready: usize,
}

impl OlaRing {
    /// A ring of `capacity` samples (at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write: 0,
            read: 0,
            ready: 0,
        }
    }

    /// Ring length.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Final samples waiting to be pulled.
    pub fn ready(&self) -> usize {
        self.ready
    }

    /// Sum `frame` into the ring starting at the write cursor.
    ///
    /// Samples that would overwrite not-yet-pulled output are dropped.
    pub fn add(&mut self, frame: &[f32]) {
        let cap = self.buffer.len();
        let room = cap - self.ready;
        let mut idx = self.write;
        for &s in frame.iter().take(room) {
            self.buffer[idx] += s;
            idx += 1;
            if idx == cap {
                idx = 0;
            }
        }
    }

    /// Advance the write cursor by `hop`, making that many samples ready.
    pub fn commit(&mut self, hop: usize) {
        let cap = self.buffer.len();
        let hop = hop.min(cap - self.ready);
        self.write = (self.write + hop) % cap;
        self.ready += hop;
    }

    /// Copy up to `out.len()` ready samples out, zeroing them in the ring.
    ///
    /// Returns the number of samples written.
    pub fn pull(&mut self, out: &mut [f32]) -> usize {
        let cap = self.buffer.len();
        let n = out.len().min(self.ready);
        for slot in out.iter_mut().take(n) {
            *slot = self.buffer[self.read];
            self.buffer[self.read] = 0.0;
            self.read += 1;
            if self.read == cap {
                self.read = 0;
            }
        }
        self.ready -= n;
        n
    }

    /// Zero the ring and reset both cursors.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write = 0;
        self.read = 0;
        self.ready = 0;
    }
}

/// Left/right pair of [`OlaRing`]s advanced in lockstep.
#[derive(Debug, Clone)]
pub struct StereoOla {
    left: OlaRing,
    right: OlaRing,
    hop: usize,
}

impl StereoOla {
    /// Two rings of `capacity`, advanced by `hop` per added frame.
    pub fn new(capacity: usize, hop: usize) -> Self {
        Self {
            left: OlaRing::new(capacity),
            right: OlaRing::new(capacity),
            hop: hop.max(1),
        }
    }

    /// Samples committed per frame.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Ready stereo frames.
    pub fn ready(&self) -> usize {
        self.left.ready()
    }

    /// Sum a stereo frame in and commit one hop.
    pub fn add(&mut self, left: &[f32], right: &[f32]) {
        self.left.add(left);
        self.right.add(right);
        self.left.commit(self.hop);
        self.right.commit(self.hop);
    }

    /// Pull up to `min(left.len(), right.len())` ready frames.
    pub fn pull(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        let n = left.len().min(right.len());
        let got = self.left.pull(&mut left[..n]);
        self.right.pull(&mut right[..got]);
        got
    }

    /// Zero both rings.
    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}
