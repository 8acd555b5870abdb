pub mod codec;
pub mod tcp;

#[cfg(test)]
mod tests;

pub use codec::MESSAGE_SEPARATOR;
pub use tcp::{read_frame, write_frame};
