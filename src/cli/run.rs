use crate::error::StageError;

/// Full pipeline: extract, then train and report from the fresh artifact.
pub fn run() -> Result<(), StageError> {
    let settings = super::checked_settings()?;
    super::extract::extract(&settings)?;
    println!();
    super::train::train(&settings)
}
