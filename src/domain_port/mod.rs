// store

mod token_store;

pub use token_store::*;

// time

mod clock;

pub use clock::*;
