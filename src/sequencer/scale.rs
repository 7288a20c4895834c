/// Koto reduced scales
/// yonabuki drops the 4th and 7th degrees (F, B), nirobuki drops the 2nd and 6th (D, A)
use super::{Instrument, Pitch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScaleMode {
    pub yonabuki: bool,
    pub nirobuki: bool,
}

impl ScaleMode {
    pub fn new(yonabuki: bool, nirobuki: bool) -> Self {
        Self { yonabuki, nirobuki }
    }

    pub fn disables(self, instrument: &Instrument, pitch: Pitch) -> bool {
        is_disabled(instrument, pitch, self.yonabuki, self.nirobuki)
    }
}

/// Only the koto is affected; every other instrument keeps all seven pitches.
pub fn is_disabled(instrument: &Instrument, pitch: Pitch, yonabuki: bool, nirobuki: bool) -> bool {
    if !instrument.is_koto() {
        return false;
    }

    (yonabuki && matches!(pitch, Pitch::F | Pitch::B))
        || (nirobuki && matches!(pitch, Pitch::D | Pitch::A))
}
