//! Traversal strategies over the active queue.
//!
//! A [`SequenceAlgorithm`] walks an index range `[0, length)` one step at a
//! time. `next`/`prev` report `true` exactly when the step completed a full
//! cycle, which is what the queue manager uses to decide loop behavior.

/// A pluggable traversal strategy over `[0, length)`.
///
/// Callers clamp `index` into range before use; `set_length` and `set_seed`
/// re-derive any internal state deterministically.
pub trait SequenceAlgorithm: Send {
    /// Current position.
    fn index(&self) -> usize;
    /// Reposition without disturbing cycle detection.
    fn set_index(&mut self, index: usize);
    /// Length of the traversed range.
    fn length(&self) -> usize;
    /// Change the traversed range. A no-op when unchanged.
    fn set_length(&mut self, length: usize);
    /// The seed driving the traversal, if any.
    fn seed(&self) -> i32;
    /// Reseed deterministically.
    fn set_seed(&mut self, seed: i32);
    /// Step forward. Returns `true` iff the step completed a full cycle.
    fn next(&mut self) -> bool;
    /// Step backward. Returns `true` iff the step completed a full cycle.
    fn prev(&mut self) -> bool;
}

/// In-order traversal: 0, 1, ..., length-1, 0, ...
///
/// The seed is ignored.
#[derive(Debug, Default)]
pub struct Sequential {
    index: usize,
    length: usize,
}

impl Sequential {
    /// Create a sequential traversal over `length` items.
    #[must_use]
    pub const fn new(length: usize) -> Self {
        Self { index: 0, length }
    }
}

impl SequenceAlgorithm for Sequential {
    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        if index < self.length {
            self.index = index;
        }
    }

    fn length(&self) -> usize {
        self.length
    }

    fn set_length(&mut self, length: usize) {
        self.length = length;
        if self.index >= length {
            self.index = 0;
        }
    }

    fn seed(&self) -> i32 {
        0
    }

    fn set_seed(&mut self, _seed: i32) {}

    fn next(&mut self) -> bool {
        if self.length <= 1 {
            self.index = 0;
            return true;
        }
        if self.index + 1 >= self.length {
            self.index = 0;
            true
        } else {
            self.index += 1;
            false
        }
    }

    fn prev(&mut self) -> bool {
        if self.length <= 1 {
            self.index = 0;
            return true;
        }
        if self.index == 0 {
            self.index = self.length - 1;
            true
        } else {
            self.index -= 1;
            false
        }
    }
}

/// Maximal-length Galois tap masks for register widths 2..=32.
///
/// Entry `w - 2` holds the mask for width `w`; each polynomial is primitive,
/// so the register cycles through every non-zero state exactly once.
const TAPS: [u32; 31] = [
    0x3,        // 2
    0x6,        // 3
    0xC,        // 4
    0x14,       // 5
    0x30,       // 6
    0x60,       // 7
    0xB8,       // 8
    0x110,      // 9
    0x240,      // 10
    0x500,      // 11
    0x829,      // 12
    0x100D,     // 13
    0x2015,     // 14
    0x6000,     // 15
    0xD008,     // 16
    0x12000,    // 17
    0x20400,    // 18
    0x40023,    // 19
    0x90000,    // 20
    0x140000,   // 21
    0x300000,   // 22
    0x420000,   // 23
    0xE10000,   // 24
    0x1200000,  // 25
    0x2000023,  // 26
    0x4000013,  // 27
    0x9000000,  // 28
    0x14000000, // 29
    0x20000029, // 30
    0x48000000, // 31
    0x80200003, // 32
];

const MIN_WIDTH: u32 = 2;
const MAX_WIDTH: u32 = 32;

/// Seeded pseudo-random traversal visiting every index exactly once per
/// cycle.
///
/// A Galois LFSR runs over the smallest register width whose period covers
/// `length`; register states map to indices as `state - 1` and states outside
/// the range are skipped. The seed selects the starting state, so the whole
/// visitation order is reproducible from `(seed, length)` alone. Cycle
/// completion is detected when the register re-enters its seed-derived start
/// state.
#[derive(Debug)]
pub struct PseudoRandomCycle {
    length: usize,
    seed: i32,
    width: u32,
    taps: u32,
    state: u32,
    start: u32,
}

impl PseudoRandomCycle {
    /// Create a shuffled traversal over `length` items with the given seed.
    #[must_use]
    pub fn new(length: usize, seed: i32) -> Self {
        let length = length.min(u32::MAX as usize);
        let width = width_for(length);
        let mut cycle = Self {
            length,
            seed,
            width,
            taps: TAPS[(width - MIN_WIDTH) as usize],
            state: 1,
            start: 1,
        };
        cycle.apply_seed();
        cycle
    }

    /// Derive the start state from `(seed, length)` and move there.
    fn apply_seed(&mut self) {
        if self.length == 0 {
            self.start = 1;
        } else {
            self.start = (self.seed as u32) % (self.length as u32) + 1;
        }
        self.state = self.start;
    }

    /// One Galois step forward. Valid for any non-zero state below
    /// `2^width`.
    const fn step_forward(&self, state: u32) -> u32 {
        let lsb = state & 1;
        let shifted = state >> 1;
        if lsb == 1 { shifted ^ self.taps } else { shifted }
    }

    /// Exact inverse of [`Self::step_forward`]: the top bit records which
    /// branch the forward step took.
    const fn step_back(&self, state: u32) -> u32 {
        let top = 1 << (self.width - 1);
        if state & top != 0 {
            ((state ^ self.taps) << 1) | 1
        } else {
            state << 1
        }
    }

    /// Whether `state` maps to an index inside `[0, length)`.
    const fn accepted(&self, state: u32) -> bool {
        (state as usize) <= self.length
    }
}

impl SequenceAlgorithm for PseudoRandomCycle {
    fn index(&self) -> usize {
        if self.length == 0 {
            0
        } else {
            (self.state - 1) as usize
        }
    }

    fn set_index(&mut self, index: usize) {
        if index < self.length {
            self.state = index as u32 + 1;
        }
    }

    fn length(&self) -> usize {
        self.length
    }

    fn set_length(&mut self, length: usize) {
        let length = length.min(u32::MAX as usize);
        if length == self.length {
            return;
        }
        self.length = length;
        self.width = width_for(length);
        self.taps = TAPS[(self.width - MIN_WIDTH) as usize];
        self.apply_seed();
    }

    fn seed(&self) -> i32 {
        self.seed
    }

    fn set_seed(&mut self, seed: i32) {
        self.seed = seed;
        self.apply_seed();
    }

    fn next(&mut self) -> bool {
        if self.length <= 1 {
            return true;
        }
        loop {
            self.state = self.step_forward(self.state);
            if self.accepted(self.state) {
                break;
            }
        }
        self.state == self.start
    }

    fn prev(&mut self) -> bool {
        if self.length <= 1 {
            return true;
        }
        let wrapped = self.state == self.start;
        loop {
            self.state = self.step_back(self.state);
            if self.accepted(self.state) {
                break;
            }
        }
        wrapped
    }
}

/// Smallest register width whose period `2^w - 1` covers `length`.
fn width_for(length: usize) -> u32 {
    let mut width = MIN_WIDTH;
    while width < MAX_WIDTH && ((1u64 << width) - 1) < length as u64 {
        width += 1;
    }
    width
}
