pub mod util;
pub mod vanguard;
