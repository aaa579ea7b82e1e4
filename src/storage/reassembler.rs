use std::collections::BTreeMap;
use std::ops::Bound;

use super::ByteStream;

/// Rebuilds a contiguous byte stream from fragments addressed by their
/// absolute offset.
///
/// Fragments may arrive out of order, duplicated or overlapping; whatever
/// prefix of the stream becomes contiguous is pushed into the downstream
/// [`ByteStream`] immediately. Fragments are only held within the window the
/// downstream writer could accept, so the reassembler never buffers more
/// than the stream's capacity on top of it.
///
/// [`ByteStream`]: struct.ByteStream.html
#[derive(Debug)]
pub struct Reassembler {
    output: ByteStream,
    /// Pending fragments keyed by their absolute first index. Disjoint and
    /// non-adjacent after every insert.
    pending: BTreeMap<u64, Vec<u8>>,
    /// Index one past the final byte of the stream, once known.
    end_index: Option<u64>,
}

impl Reassembler {
    /// Create a reassembler writing into `output`.
    pub fn new(output: ByteStream) -> Reassembler {
        Reassembler {
            output,
            pending: BTreeMap::new(),
            end_index: None,
        }
    }

    /// The index of the next byte the downstream stream is waiting for.
    pub fn next_index(&self) -> u64 {
        self.output.bytes_pushed()
    }

    /// Accept the fragment of the stream starting at `first_index`.
    ///
    /// `is_last` marks the fragment carrying the final bytes of the stream;
    /// the downstream writer is closed once everything up to its end was
    /// delivered. Data below the next needed index or beyond the acceptance
    /// window is discarded.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool) {
        if is_last {
            self.end_index = Some(first_index + data.len() as u64);
        }

        let next_index = self.next_index();
        let window_end = next_index + self.output.available_capacity() as u64;

        // Clip to the window, dropping what is too old or unstorable.
        let begin = first_index.max(next_index);
        let end = (first_index + data.len() as u64).min(window_end);
        if begin < end {
            let clipped = &data[(begin - first_index) as usize..(end - first_index) as usize];
            // The first fragment to claim an index keeps it; later arrivals
            // at the same index only contribute through the merge pass.
            self.pending.entry(begin).or_insert_with(|| clipped.to_vec());
            self.merge_pending();
        }

        // Deliver the contiguous prefix.
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.output.bytes_pushed() {
                break;
            }
            let chunk = entry.remove();
            self.output.push(&chunk);
        }

        if self.end_index == Some(self.output.bytes_pushed()) {
            self.output.close();
        }
    }

    /// Fuse overlapping or adjacent fragments.
    fn merge_pending(&mut self) {
        let mut key = match self.pending.keys().next() {
            Some(&key) => key,
            None => return,
        };

        loop {
            let successor = self
                .pending
                .range((Bound::Excluded(key), Bound::Unbounded))
                .next()
                .map(|(&start, chunk)| (start, chunk.len() as u64));
            let (succ_start, succ_len) = match successor {
                Some(successor) => successor,
                None => break,
            };

            let end = key + self.pending[&key].len() as u64;
            if end < succ_start {
                key = succ_start;
            } else if end >= succ_start + succ_len {
                // The successor lies entirely within the predecessor.
                self.pending.remove(&succ_start);
            } else {
                // Extend the predecessor by the non-overlapping tail.
                let tail = self.pending.remove(&succ_start).unwrap();
                let overlap = (end - succ_start) as usize;
                self.pending
                    .get_mut(&key)
                    .unwrap()
                    .extend_from_slice(&tail[overlap..]);
            }
        }
    }

    /// The number of bytes held back waiting for earlier fragments.
    pub fn bytes_pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// The downstream stream.
    pub fn stream(&self) -> &ByteStream {
        &self.output
    }

    /// The downstream stream, mutably.
    pub fn stream_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }
}
