pub mod bounded;
#[cfg(test)]
pub mod dense;
pub mod needleman_wunsch;
