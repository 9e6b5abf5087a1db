#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

use anyhow::Result;
use vergen::EmitBuilder;

fn main() -> Result<()> {
    // The commit is printed next to the version whenever the client fails.
    EmitBuilder::builder().all_build().git_describe(true, true, None).emit()?;

    return Ok(());
}
