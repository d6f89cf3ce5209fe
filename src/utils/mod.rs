pub mod char_index;
pub mod id;
pub mod span;
pub mod tokenizer;
