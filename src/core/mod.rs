pub mod branching;
pub mod choices;
pub mod context;
pub mod enumeration;
pub mod injector;
pub mod lexicon;
pub mod node;
pub mod operation;
pub mod phrase;
pub mod pipeline;
