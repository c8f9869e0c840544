//! Structural serialization of the amplitude buffer
//!
//! Emits a length-2^N sequence of `[real, imag]` pairs. When the
//! configured chop threshold is positive, any real or imaginary part
//! with absolute value at or below it is emitted as exactly 0,
//! independently per component.

use crate::buffer::AmpBuffer;
use crate::vector::QubitVector;
use serde::ser::{Serialize, SerializeSeq, Serializer};

impl<B: AmpBuffer> Serialize for QubitVector<B> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let chop = self.config().chop_threshold;
        let mut seq = serializer.serialize_seq(Some(self.size()))?;

        if chop > 0.0 {
            for amp in self.amplitudes() {
                let re = if amp.re.abs() > chop { amp.re } else { 0.0 };
                let im = if amp.im.abs() > chop { amp.im } else { 0.0 };
                seq.serialize_element(&[re, im])?;
            }
        } else {
            for amp in self.amplitudes() {
                seq.serialize_element(&[amp.re, amp.im])?;
            }
        }

        seq.end()
    }
}
