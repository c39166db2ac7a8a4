//! Model lookup (§4.3): trigram accumulation over the binary model file.
//!
//! Every query starts by seeking to the first record of the target word's block (via the offset
//! index) and reads forward until the `mid` field changes, matching the on-disk contract that
//! records sharing a `mid` are contiguous.

use crate::offset_index::OffsetIndex;
use crate::reader::{BinaryReader, Whence};

const RECORD_SIZE: i64 = 16;

#[derive(Debug, Clone, Copy)]
struct Record {
    mid: i32,
    prev: i32,
    next: i32,
    count: i32,
}

/// A frequency-keyed collector: entries are pushed in query order, and the "best" one is whichever
/// carries the greatest count, ties broken in favor of the most-recently-pushed entry (mirroring a
/// multimap keyed by count, read from its greatest key).
#[derive(Debug)]
pub struct Accumulator<T> {
    entries: Vec<(i32, T)>,
}

impl<T> Default for Accumulator<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> Accumulator<T> {
    fn push(&mut self, count: i32, value: T) {
        self.entries.push((count, value));
    }

    /// Exposes `push` to other modules' tests that need to build an accumulator directly.
    #[cfg(test)]
    pub fn push_for_test(&mut self, count: i32, value: T) {
        self.push(count, value);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&(i32, T)> {
        self.entries.iter().max_by_key(|(count, _)| *count)
    }

    /// Entries sorted by descending count, used by the conflict-resolution pruning heuristic.
    pub fn sorted_descending(&self) -> Vec<&(i32, T)> {
        let mut out: Vec<&(i32, T)> = self.entries.iter().collect();
        out.sort_by(|a, b| b.0.cmp(&a.0));
        out
    }

    pub fn mean(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let sum: i64 = self.entries.iter().map(|(c, _)| *c as i64).sum();
        sum as f64 / self.entries.len() as f64
    }

    pub fn extend(&mut self, other: Accumulator<T>) {
        self.entries.extend(other.entries);
    }

    pub fn map_value<U>(self, f: impl Fn(T) -> U) -> Accumulator<U> {
        Accumulator {
            entries: self.entries.into_iter().map(|(count, value)| (count, f(value))).collect(),
        }
    }
}

fn read_block(reader: &mut BinaryReader, offsets: &OffsetIndex, mid: u32) -> Vec<Record> {
    let Some(record_index) = offsets.get(mid) else {
        return Vec::new();
    };
    if reader.seek(record_index as i64 * RECORD_SIZE, Whence::Begin).is_err() {
        return Vec::new();
    }

    let mut records = Vec::new();
    loop {
        let Ok(m) = reader.read_i32() else { break };
        if m != mid as i32 {
            break;
        }
        let (Ok(prev), Ok(next), Ok(count)) = (reader.read_i32(), reader.read_i32(), reader.read_i32())
        else {
            break;
        };
        records.push(Record { mid: m, prev, next, count });
    }
    records
}

/// Single-word mode: sums every count in `mid`'s block into one entry.
pub fn lookup_single(reader: &mut BinaryReader, offsets: &OffsetIndex, mid: u32) -> Accumulator<u32> {
    let mut acc = Accumulator::default();
    let records = read_block(reader, offsets, mid);
    if !records.is_empty() {
        let total: i64 = records.iter().map(|r| r.count as i64).sum();
        acc.push(total.clamp(i32::MIN as i64, i32::MAX as i64) as i32, mid);
    }
    acc
}

/// Pair mode: every record in `mid`'s block whose `prev` field equals `prev` (the `next` field is
/// a wildcard). The caller chooses which side of the pair is the word being restored - see
/// `Engine::accumulate_pair_left`/`Engine::accumulate_pair_right` for the left/right orientations
/// this is used in.
pub fn lookup_pair(
    reader: &mut BinaryReader,
    offsets: &OffsetIndex,
    mid: u32,
    prev: u32,
) -> Accumulator<(u32, u32)> {
    let mut acc = Accumulator::default();
    for record in read_block(reader, offsets, mid) {
        if record.prev as u32 == prev {
            acc.push(record.count, (prev, mid));
        }
    }
    acc
}

/// Triple mode: every record in `mid`'s block whose `prev` and `next` both match.
pub fn lookup_triple(
    reader: &mut BinaryReader,
    offsets: &OffsetIndex,
    mid: u32,
    prev: u32,
    next: u32,
) -> Accumulator<u32> {
    let mut acc = Accumulator::default();
    for record in read_block(reader, offsets, mid) {
        if record.prev as u32 == prev && record.next as u32 == next {
            acc.push(record.count, mid);
        }
    }
    acc
}
