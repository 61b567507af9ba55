//! One verifier function per meeting, mirroring `meeting1.py`/`meeting2.py` (Meeting 3 has
//! no standalone original source; see `meeting3`'s module doc).

pub mod meeting1;
pub mod meeting2;
pub mod meeting3;
