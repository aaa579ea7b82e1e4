use core::fmt;

/// A TCP sequence number.
///
/// A sequence number is a monotonically advancing integer modulo
/// 2<sup>32</sup>. The first sequence number of a stream is a random
/// zero point; [`wrap`] and [`unwrap`] convert between the 32-bit wire
/// representation and the unbounded 64-bit stream offset relative to it.
///
/// [`wrap`]: #method.wrap
/// [`unwrap`]: #method.unwrap
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct SeqNumber(pub u32);

impl SeqNumber {
    /// The wire representation of the absolute sequence number `n` on a
    /// stream starting at `zero`.
    pub fn wrap(n: u64, zero: SeqNumber) -> SeqNumber {
        SeqNumber(zero.0.wrapping_add(n as u32))
    }

    /// The absolute sequence number this wire value stands for, on a stream
    /// starting at `zero`.
    ///
    /// Of the infinitely many absolute numbers sharing the low 32 bits, the
    /// one closest to `checkpoint` is returned; an exact tie resolves to the
    /// smaller value.
    pub fn unwrap(self, zero: SeqNumber, checkpoint: u64) -> u64 {
        const SPAN: u64 = 1 << 32;

        let offset = u64::from(self.0.wrapping_sub(zero.0));
        if checkpoint <= offset {
            // No candidate below the checkpoint exists, or the lowest
            // candidate already sits at or beyond it.
            return offset;
        }

        // The two candidates straddling the checkpoint; `delta` is the
        // distance down to the lower one.
        let delta = (checkpoint - offset) % SPAN;
        let below = checkpoint - delta;
        if delta == 0 {
            return below;
        }

        match below.checked_add(SPAN) {
            // Strict: on an exact tie the smaller candidate wins.
            Some(above) if above - checkpoint < delta => above,
            _ => below,
        }
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
