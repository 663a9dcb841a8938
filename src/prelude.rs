pub use snafu::{OptionExt as _, ResultExt as _};

pub use crate::error::{Error, Result};
