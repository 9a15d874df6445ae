//! Block-rate audio values with a scalar fast path.
//!
//! A [`SignalFloat`] holds one block of samples, but most control-rate values
//! in a patch are constant across the block (a gain of `0.5`, a frequency of
//! `440`). Those stay in *scalar* representation: only element 0 is
//! meaningful and the rest of the buffer is never touched. Operations between
//! two scalars produce a scalar; as soon as one operand is a vector the result
//! is a vector, with scalars broadcast across the block.
//!
//! Expansion of a scalar into a full buffer is lazy and happens at most once
//! per write, see [`SignalFloat::expand`].
//!
//! Read access goes through [`SignalRef`], which covers both upstream buffers
//! and plain scalars (unconnected inputs, literals) without allocating.

/// One block of audio samples with scalar/vector representation.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFloat {
    samples: Box<[f32]>,
    is_scalar: bool,
    is_expanded: bool,
}

impl SignalFloat {
    /// Creates a scalar signal of `0.0` backed by a block of `len` samples.
    ///
    /// `len` is clamped to at least one sample.
    pub fn new(len: usize) -> Self {
        Self::from_scalar(len, 0.0)
    }

    /// Creates a scalar signal with the given value.
    pub fn from_scalar(len: usize, value: f32) -> Self {
        let mut samples = vec![0.0; len.max(1)].into_boxed_slice();
        samples[0] = value;
        Self {
            samples,
            is_scalar: true,
            is_expanded: false,
        }
    }

    /// Creates a vector signal holding a copy of `samples`.
    pub fn from_samples(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::new(1);
        }
        Self {
            samples: samples.to_vec().into_boxed_slice(),
            is_scalar: false,
            is_expanded: false,
        }
    }

    /// Block length in samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a signal holds at least one sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the signal is in scalar representation.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.is_scalar
    }

    /// Whether a scalar has been expanded into the full buffer.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    /// The scalar value, or the first sample of a vector.
    #[inline]
    pub fn scalar(&self) -> f32 {
        self.samples[0]
    }

    /// Returns sample `i`, broadcasting scalars.
    #[inline]
    pub fn sample(&self, i: usize) -> f32 {
        if self.is_scalar {
            self.samples[0]
        } else {
            self.samples[i]
        }
    }

    /// Switches to scalar representation and stores `value`.
    ///
    /// Any previous vector contents are discarded.
    #[inline]
    pub fn set_scalar(&mut self, value: f32) {
        self.samples[0] = value;
        self.is_scalar = true;
        self.is_expanded = false;
    }

    /// Fills the buffer with the scalar value.
    ///
    /// Does nothing for vectors or for scalars that were already expanded.
    pub fn expand(&mut self) {
        if self.is_scalar && !self.is_expanded {
            let value = self.samples[0];
            self.samples.fill(value);
            self.is_expanded = true;
        }
    }

    /// Returns the full buffer if it is valid without expansion.
    pub fn as_slice(&self) -> Option<&[f32]> {
        if !self.is_scalar || self.is_expanded {
            Some(&self.samples)
        } else {
            None
        }
    }

    /// Expands (if needed) and returns the full buffer.
    pub fn expanded(&mut self) -> &[f32] {
        self.expand();
        &self.samples
    }

    /// Switches to vector representation and returns the buffer for writing.
    ///
    /// A scalar is expanded first, so the buffer never holds stale samples
    /// from an earlier vector.
    pub fn samples_mut(&mut self) -> &mut [f32] {
        self.expand();
        self.is_scalar = false;
        self.is_expanded = false;
        &mut self.samples
    }

    /// Copies `src` into this signal, keeping scalars scalar.
    pub fn set(&mut self, src: SignalRef<'_>) {
        match src.as_vector() {
            None => self.set_scalar(src.scalar()),
            Some(other) => {
                let n = self.samples.len().min(other.len());
                self.samples_mut()[..n].copy_from_slice(&other[..n]);
            }
        }
    }

    /// Sets this signal to `src * gain`.
    pub fn set_mul(&mut self, src: SignalRef<'_>, gain: f32) {
        match src.as_vector() {
            None => self.set_scalar(src.scalar() * gain),
            Some(other) => {
                let out = self.samples_mut();
                for (o, s) in out.iter_mut().zip(other) {
                    *o = s * gain;
                }
            }
        }
    }

    /// Adds `other` to this signal.
    pub fn add(&mut self, other: SignalRef<'_>) {
        self.add_mul(other, 1.0);
    }

    /// Adds `other * gain` to this signal.
    pub fn add_mul(&mut self, other: SignalRef<'_>, gain: f32) {
        if self.is_scalar && other.is_scalar() {
            let value = self.samples[0] + other.scalar() * gain;
            self.set_scalar(value);
            return;
        }
        let out = self.samples_mut();
        match other.as_vector() {
            None => {
                let v = other.scalar() * gain;
                for o in out.iter_mut() {
                    *o += v;
                }
            }
            Some(samples) => {
                for (o, s) in out.iter_mut().zip(samples) {
                    *o += s * gain;
                }
            }
        }
    }

    /// Multiplies this signal by `other`.
    ///
    /// A scalar `0` collapses the result to a scalar zero and a scalar `1` is
    /// a no-op.
    pub fn mul(&mut self, other: SignalRef<'_>) {
        if other.is_scalar() {
            let gain = other.scalar();
            if gain == 0.0 {
                self.set_scalar(0.0);
                return;
            }
            if gain == 1.0 {
                return;
            }
            if self.is_scalar {
                let value = self.samples[0] * gain;
                self.set_scalar(value);
                return;
            }
            for o in self.samples.iter_mut() {
                *o *= gain;
            }
            return;
        }
        let out = self.samples_mut();
        for (i, o) in out.iter_mut().enumerate() {
            *o *= other.sample(i);
        }
    }

    /// Writes `op(a, b)` sample by sample, broadcasting scalars.
    ///
    /// Two scalar operands yield a scalar result without touching the buffer.
    pub fn set_binary(&mut self, a: SignalRef<'_>, b: SignalRef<'_>, op: impl Fn(f32, f32) -> f32) {
        if a.is_scalar() && b.is_scalar() {
            self.set_scalar(op(a.scalar(), b.scalar()));
            return;
        }
        let n = a.block_len().min(b.block_len());
        let out = self.samples_mut();
        let n = n.min(out.len());
        for (i, o) in out[..n].iter_mut().enumerate() {
            *o = op(a.sample(i), b.sample(i));
        }
    }

    /// Average over the block.
    pub fn mean(&self) -> f32 {
        if self.is_scalar {
            return self.samples[0];
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    /// Borrowed read view of this signal.
    #[inline]
    pub fn view(&self) -> SignalRef<'_> {
        SignalRef::Buffer(self)
    }
}

/// Read view of a signal input.
///
/// Unconnected inputs and literals are [`Scalar`](SignalRef::Scalar); connected
/// inputs borrow the upstream output buffer.
#[derive(Debug, Clone, Copy)]
pub enum SignalRef<'a> {
    /// A constant value for the whole block.
    Scalar(f32),
    /// An upstream signal.
    Buffer(&'a SignalFloat),
}

impl SignalRef<'_> {
    /// Whether the value is constant across the block.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        match self {
            Self::Scalar(_) => true,
            Self::Buffer(s) => s.is_scalar(),
        }
    }

    /// The scalar value, or the first sample of a vector.
    #[inline]
    pub fn scalar(&self) -> f32 {
        match self {
            Self::Scalar(v) => *v,
            Self::Buffer(s) => s.scalar(),
        }
    }

    /// Sample `i`, broadcasting scalars.
    #[inline]
    pub fn sample(&self, i: usize) -> f32 {
        match self {
            Self::Scalar(v) => *v,
            Self::Buffer(s) => s.sample(i),
        }
    }

    /// The vector samples, or `None` for scalars.
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Self::Scalar(_) => None,
            Self::Buffer(s) if s.is_scalar() => None,
            Self::Buffer(s) => Some(&s.samples),
        }
    }

    /// Average over the block.
    pub fn mean(&self) -> f32 {
        match self {
            Self::Scalar(v) => *v,
            Self::Buffer(s) => s.mean(),
        }
    }

    fn block_len(&self) -> usize {
        match self {
            Self::Scalar(_) => usize::MAX,
            Self::Buffer(s) => s.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_signal_is_scalar_zero() {
        let s = SignalFloat::new(64);
        assert!(s.is_scalar());
        assert!(!s.is_expanded());
        assert_eq!(s.scalar(), 0.0);
        assert_eq!(s.len(), 64);
    }

    #[test]
    fn expand_fills_every_sample() {
        let mut s = SignalFloat::from_scalar(8, 0.25);
        assert!(s.as_slice().is_none());
        assert!(s.expanded().iter().all(|&v| v == 0.25));
        assert!(s.is_expanded());
        assert!(s.is_scalar());
    }

    #[test]
    fn set_scalar_discards_vector() {
        let mut s = SignalFloat::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        s.set_scalar(7.0);
        assert!(s.is_scalar());
        assert!(!s.is_expanded());
        assert!(s.expanded().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn samples_mut_never_exposes_stale_vector() {
        let mut s = SignalFloat::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        s.set_scalar(5.0);
        let buf = s.samples_mut();
        assert_eq!(buf, &[5.0, 5.0, 5.0, 5.0]);
        assert!(!s.is_scalar());
    }

    #[test]
    fn scalar_plus_scalar_stays_scalar() {
        let mut s = SignalFloat::from_scalar(16, 2.0);
        s.add(SignalRef::Scalar(3.0));
        assert!(s.is_scalar());
        assert_eq!(s.scalar(), 5.0);
    }

    #[test]
    fn scalar_plus_vector_broadcasts() {
        let v = SignalFloat::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        let mut s = SignalFloat::from_scalar(4, 10.0);
        s.add(v.view());
        assert!(!s.is_scalar());
        assert_eq!(s.as_slice(), Some(&[11.0, 12.0, 13.0, 14.0][..]));
    }

    #[test]
    fn add_mul_scales_other() {
        let v = SignalFloat::from_samples(&[1.0, 2.0]);
        let mut s = SignalFloat::from_scalar(2, 1.0);
        s.add_mul(v.view(), 0.5);
        assert_eq!(s.as_slice(), Some(&[1.5, 2.0][..]));
    }

    #[test]
    fn mul_by_zero_collapses_to_scalar() {
        let mut s = SignalFloat::from_samples(&[1.0, 2.0, 3.0]);
        s.mul(SignalRef::Scalar(0.0));
        assert!(s.is_scalar());
        assert_eq!(s.scalar(), 0.0);
    }

    #[test]
    fn mul_by_one_is_noop() {
        let mut s = SignalFloat::from_samples(&[1.0, 2.0, 3.0]);
        s.mul(SignalRef::Scalar(1.0));
        assert_eq!(s.as_slice(), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn mul_vector_by_vector() {
        let a = SignalFloat::from_samples(&[2.0, 3.0]);
        let mut s = SignalFloat::from_samples(&[4.0, 5.0]);
        s.mul(a.view());
        assert_eq!(s.as_slice(), Some(&[8.0, 15.0][..]));
    }

    #[test]
    fn set_mul_keeps_scalar() {
        let mut s = SignalFloat::new(4);
        s.set_mul(SignalRef::Scalar(3.0), 2.0);
        assert!(s.is_scalar());
        assert_eq!(s.scalar(), 6.0);
    }

    #[test]
    fn set_binary_broadcasts_scalar_operand() {
        let a = SignalFloat::from_samples(&[2.0; 64]);
        let mut out = SignalFloat::new(64);
        out.set_binary(a.view(), SignalRef::Scalar(3.0), |x, y| x + y);
        assert!(!out.is_scalar());
        assert!(out.as_slice().is_some_and(|s| s.iter().all(|&v| v == 5.0)));
    }

    #[test]
    fn mean_of_vector() {
        let s = SignalFloat::from_samples(&[1.0, 2.0, 3.0, 6.0]);
        assert_eq!(s.mean(), 3.0);
        assert_eq!(SignalRef::Scalar(4.0).mean(), 4.0);
    }

    #[test]
    fn set_copies_vector() {
        let src = SignalFloat::from_samples(&[0.5, -0.5]);
        let mut dst = SignalFloat::new(2);
        dst.set(src.view());
        assert_eq!(dst, src);
    }
}
