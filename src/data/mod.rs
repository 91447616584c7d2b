//! Loading training and test problems from text files

pub mod libsvm;

pub use self::libsvm::*;
