pub mod refresh;
pub mod util;
